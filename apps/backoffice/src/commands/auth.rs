//! # Login
//!
//! Back-office users in the `login` collection. Passwords are stored as
//! Argon2 PHC strings and checked here, never by comparing plaintext.
//!
//! ```text
//! authenticate("admin", "s3cret")
//!   login where username == "admin" ── none ──────┐
//!      │                                          │
//!      ▼                                          ▼
//!   Argon2 verify against passwordHash ── no ──► "Invalid username or password"
//!      │
//!      ▼
//!   UserAccount
//! ```

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::Utc;
use tracing::{debug, info, warn};

use apotheca_core::validation::{validate_password, validate_username};
use apotheca_core::UserAccount;

use crate::error::{ApiError, ApiResult};
use crate::state::DbState;

/// Hashes a password into a PHC string with a fresh salt.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))
}

/// `false` for a wrong password and for a malformed stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub async fn create_user(db: &DbState, username: &str, password: &str) -> ApiResult<UserAccount> {
    debug!(username = %username, "create_user command");
    validate_username(username)?;
    validate_password(password)?;

    let mut user = UserAccount {
        id: String::new(),
        username: username.trim().to_string(),
        password_hash: hash_password(password)?,
        created_at: Utc::now(),
    };
    user.id = db.inner().users().insert(&user).await?;

    info!(id = %user.id, username = %user.username, "User created");
    Ok(user)
}

/// Checks credentials. Unknown user and wrong password give the same error.
pub async fn authenticate(db: &DbState, username: &str, password: &str) -> ApiResult<UserAccount> {
    debug!(username = %username, "authenticate command");
    let user = db.inner().users().find_by_username(username.trim()).await?;

    match user {
        Some(user) if verify_password(password, &user.password_hash) => {
            info!(username = %user.username, "Login succeeded");
            Ok(user)
        }
        _ => {
            warn!(username = %username, "Login failed");
            Err(ApiError::unauthorized())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "plaintext"));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let db = DbState::in_memory();
        let user = create_user(&db, "admin", "pharmacy123").await.unwrap();
        assert_ne!(user.password_hash, "pharmacy123");

        let found = authenticate(&db, "admin", "pharmacy123").await.unwrap();
        assert_eq!(found.id, user.id);

        let wrong = authenticate(&db, "admin", "nope").await.unwrap_err();
        let unknown = authenticate(&db, "ghost", "pharmacy123").await.unwrap_err();
        assert_eq!(wrong.code, ErrorCode::Unauthorized);
        assert_eq!(wrong.message, unknown.message);
        assert_eq!(wrong.message, "Invalid username or password");
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = DbState::in_memory();
        create_user(&db, "admin", "pharmacy123").await.unwrap();
        let err = create_user(&db, "admin", "another123").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
