//! Argon2 hashing for room passwords.

use argon2::{
    password_hash::{PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use quizlobby_domain::{PasswordHash, RoomPassword};
use rand::rngs::OsRng;

#[derive(Debug, thiserror::Error)]
#[error("Password hashing failed: {0}")]
pub struct PasswordHashError(String);

pub fn hash_password(password: &RoomPassword) -> Result<PasswordHash, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.expose().as_bytes(), &salt)
        .map_err(|e| PasswordHashError(e.to_string()))?;
    Ok(PasswordHash::from_encoded(hash.to_string()))
}

/// `false` for a wrong password and for a stored hash that cannot be parsed.
pub fn verify_password(candidate: &str, hash: &PasswordHash) -> bool {
    let parsed = match argon2::PasswordHash::new(hash.as_str()) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::error!(error = %e, "Stored room password hash is unreadable");
            return false;
        }
    };
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}

/// [`hash_password`] on the blocking pool, off the async workers.
pub async fn hash_password_blocking(
    password: RoomPassword,
) -> Result<PasswordHash, PasswordHashError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordHashError(e.to_string()))?
}

/// [`verify_password`] on the blocking pool. A panicked check never verifies.
pub async fn verify_password_blocking(candidate: String, hash: PasswordHash) -> bool {
    tokio::task::spawn_blocking(move || verify_password(&candidate, &hash))
        .await
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let password = RoomPassword::new("hunter22").unwrap();
        let hash = hash_password(&password).unwrap();

        assert!(hash.as_str().starts_with("$argon2"));
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
    }

    #[tokio::test]
    async fn blocking_pool_variants_agree() {
        let password = RoomPassword::new("letmein").unwrap();
        let hash = hash_password_blocking(password).await.unwrap();

        assert!(verify_password_blocking("letmein".to_string(), hash.clone()).await);
        assert!(!verify_password_blocking("letmeout".to_string(), hash).await);
    }

    #[test]
    fn garbage_hash_never_verifies() {
        let hash = PasswordHash::from_encoded("not-a-phc-string".to_string());
        assert!(!verify_password("anything", &hash));
    }
}
