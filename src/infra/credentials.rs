//! Credential checks shared by the bundled identity adapters.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use tokio::task::{spawn_blocking, JoinError};

use crate::domain::value_objects::is_valid_email;
use crate::ports::{AuthError, StoreError};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Lower-cased, trimmed email if it passes the shared email rule.
pub fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    if is_valid_email(&email) { Ok(email) } else { Err(AuthError::InvalidEmail) }
}

pub fn check_password_policy(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword { min: MIN_PASSWORD_LENGTH });
    }
    Ok(())
}

/// Argon2id hash in PHC string format. Runs on the blocking pool.
pub async fn hash_password(password: &str) -> Result<String, AuthError> {
    let password = password.to_owned();
    spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Unavailable(StoreError::Unavailable(format!("password hashing failed: {e}"))))
    })
    .await
    .map_err(worker_lost)?
}

/// Checks `password` against a stored PHC string on the blocking pool.
/// An unparseable hash never verifies.
pub async fn verify_password(password: &str, phc: &str) -> Result<bool, AuthError> {
    let (password, phc) = (password.to_owned(), phc.to_owned());
    spawn_blocking(move || {
        let Ok(parsed) = PasswordHash::new(&phc) else { return false };
        Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    })
    .await
    .map_err(worker_lost)
}

fn worker_lost(e: JoinError) -> AuthError {
    AuthError::Unavailable(StoreError::Unavailable(format!("password worker failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Asha@Example.COM ").unwrap(), "asha@example.com");
        assert!(matches!(normalize_email("asha"), Err(AuthError::InvalidEmail)));
        assert!(matches!(normalize_email("asha@localhost"), Err(AuthError::InvalidEmail)));
        assert!(matches!(normalize_email("a b@example.com"), Err(AuthError::InvalidEmail)));
    }

    #[test]
    fn test_password_policy() {
        assert!(matches!(check_password_policy("12345"), Err(AuthError::WeakPassword { min: 6 })));
        assert!(check_password_policy("stand-easy").is_ok());
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let phc = hash_password("stand-easy").await.unwrap();
        assert!(verify_password("stand-easy", &phc).await.unwrap());
        assert!(!verify_password("sit-easy", &phc).await.unwrap());
        assert!(!verify_password("stand-easy", "not a hash").await.unwrap());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_hashing_leaves_the_runtime_responsive() {
        let hashing = tokio::spawn(async { hash_password("stand-easy").await });
        let other = tokio::spawn(async { tokio::task::yield_now().await });
        other.await.unwrap();
        assert!(!hashing.is_finished());
        assert!(hashing.await.unwrap().unwrap().starts_with("$argon2id$"));
    }
}
