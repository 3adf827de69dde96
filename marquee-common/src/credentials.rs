//! Password hashing
//!
//! Stored form is `<salt-hex>$<sha256-hex>` where the digest covers the salt
//! bytes followed by the password bytes.

use rand::RngCore;
use sha2::digest::Output;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const SALT_LEN: usize = 16;

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn from_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
        .collect()
}

fn digest(salt: &[u8], password: &str) -> Output<Sha256> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize()
}

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    format!("{}${:x}", to_hex(&salt), digest(&salt, password))
}

/// Check a password against a stored hash; malformed hashes never verify
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let (Some(salt), Some(expected)) = (from_hex(salt_hex), from_hex(digest_hex)) else {
        return false;
    };
    // Constant time over the digest bytes
    digest(&salt, password).as_slice().ct_eq(&expected).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verifies() {
        let stored = hash_password("1234Qwer");
        assert!(verify_password("1234Qwer", &stored));
        assert!(!verify_password("1234qwer", &stored));
    }

    #[test]
    fn test_salt_differs_per_hash() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn test_malformed_hash_rejected() {
        assert!(!verify_password("pw", "no-separator"));
        assert!(!verify_password("pw", "zz$abcd"));
        assert!(!verify_password("pw", "abc$abcd"));
    }

    #[test]
    fn test_digest_must_match_in_full() {
        let stored = hash_password("1234Qwer");
        let truncated = &stored[..stored.len() - 2];
        assert!(!verify_password("1234Qwer", truncated));

        let (salt, digest_hex) = stored.split_once('$').unwrap();
        assert_eq!(digest_hex.len(), 64);
        let upper = format!("{}${}", salt, digest_hex.to_uppercase());
        assert!(verify_password("1234Qwer", &upper));
    }

    #[test]
    fn test_hex_round_trip() {
        assert_eq!(from_hex(&to_hex(&[0, 15, 255])), Some(vec![0, 15, 255]));
    }
}
