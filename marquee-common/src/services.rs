//! Account and review workflows on top of the repository
//!
//! These are the checks the form handlers perform before touching storage:
//! username availability, password and comment length, credential checks.

use tracing::info;

use crate::credentials::{hash_password, verify_password};
use crate::model::{Review, ReviewTarget, User};
use crate::repository::CatalogueRepository;
use crate::{EntityKind, Error, Result};

pub const MIN_PASSWORD_LEN: usize = 4;
pub const MIN_COMMENT_LEN: usize = 4;

/// Register a new user, hashing the password
pub async fn register_user(
    repo: &dyn CatalogueRepository,
    username: &str,
    password: &str,
) -> Result<User> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::InvalidInput(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let user = User::new(username, hash_password(password))?;
    if repo.get_user(user.username()).await?.is_some() {
        return Err(Error::Duplicate {
            kind: EntityKind::User,
            key: user.username().to_string(),
        });
    }

    repo.add_user(user.clone()).await?;
    info!("Registered user '{}'", user.username());
    Ok(user)
}

/// Resolve a user by name and password
pub async fn authenticate(
    repo: &dyn CatalogueRepository,
    username: &str,
    password: &str,
) -> Result<User> {
    match repo.get_user(username).await? {
        Some(user) if verify_password(password, user.password_hash()) => Ok(user),
        _ => Err(Error::InvalidCredentials),
    }
}

/// Validate and store a review by an existing user
pub async fn post_review(
    repo: &dyn CatalogueRepository,
    username: &str,
    target: ReviewTarget,
    comment: &str,
    rating: u8,
) -> Result<Review> {
    let comment = comment.trim();
    if comment.chars().count() < MIN_COMMENT_LEN {
        return Err(Error::InvalidInput("comment too short".to_string()));
    }

    let review = Review::new(username, target, comment, rating)?;
    repo.add_review(review.clone()).await?;
    info!("'{}' reviewed {}", review.username(), review.target());
    Ok(review)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Movie;
    use crate::MemoryRepository;

    async fn repo_with_movie() -> MemoryRepository {
        let repo = MemoryRepository::new();
        repo.add_movie(Movie::new("Prometheus", 2012).unwrap())
            .await
            .unwrap();
        repo
    }

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let repo = MemoryRepository::new();

        let user = register_user(&repo, "Kurisu", "1234Qwer").await.unwrap();
        assert_eq!(user.username(), "kurisu");
        assert_ne!(user.password_hash(), "1234Qwer");

        let found = authenticate(&repo, "KURISU", "1234Qwer").await.unwrap();
        assert_eq!(found, user);
    }

    #[tokio::test]
    async fn test_register_rejects_taken_username() {
        let repo = MemoryRepository::new();
        register_user(&repo, "kurisu", "1234Qwer").await.unwrap();

        let result = register_user(&repo, "Kurisu", "other-pass").await;
        assert!(matches!(
            result,
            Err(Error::Duplicate { kind: EntityKind::User, .. })
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let repo = MemoryRepository::new();
        let result = register_user(&repo, "kurisu", "123").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_authenticate_failures() {
        let repo = MemoryRepository::new();
        register_user(&repo, "kurisu", "1234Qwer").await.unwrap();

        assert!(matches!(
            authenticate(&repo, "kurisu", "wrong").await,
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&repo, "nobody", "1234Qwer").await,
            Err(Error::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_post_review() {
        let repo = repo_with_movie().await;
        register_user(&repo, "kurisu", "1234Qwer").await.unwrap();

        let review = post_review(
            &repo,
            "Kurisu",
            ReviewTarget::Movie("Prometheus".to_string()),
            "  =w=?ss  ",
            10,
        )
        .await
        .unwrap();

        assert_eq!(review.comment(), "=w=?ss");
        let movie = repo.get_movie("Prometheus").await.unwrap().unwrap();
        assert_eq!(movie.reviews(), [review]);
    }

    #[tokio::test]
    async fn test_post_review_rejects_short_comment() {
        let repo = repo_with_movie().await;
        register_user(&repo, "kurisu", "1234Qwer").await.unwrap();

        let result = post_review(
            &repo,
            "kurisu",
            ReviewTarget::Movie("Prometheus".to_string()),
            "Hey",
            10,
        )
        .await;

        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(repo.get_all_reviews().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_post_review_requires_user() {
        let repo = repo_with_movie().await;
        let result = post_review(
            &repo,
            "ghost",
            ReviewTarget::Movie("Prometheus".to_string()),
            "boo boo boo",
            3,
        )
        .await;
        assert!(matches!(
            result,
            Err(Error::UnknownReference { kind: EntityKind::User, .. })
        ));
    }
}
