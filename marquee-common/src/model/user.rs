//! Registered users

use std::fmt;
use std::hash::{Hash, Hasher};

use super::require_identity;
use crate::Result;

/// A registered user
///
/// The username is lower-cased on construction, which makes every lookup by
/// username case-insensitive. The password is whatever the credential
/// collaborator produced; this type never sees plain text.
#[derive(Clone)]
pub struct User {
    username: String,
    password_hash: String,
}

impl User {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Result<Self> {
        Ok(Self {
            username: require_identity("username", username)?.to_lowercase(),
            password_hash: password_hash.into(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.username == other.username
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.username.hash(state);
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}
