//! Authentication, sessions, and the staff capability.
//!
//! Credentials resolve over username or email, case-insensitively. Unknown
//! identities still pay for one hash comparison so the response time does not
//! reveal whether an account exists.

use crate::db::{ClubDbManager, NewUser, Role, UserRecord};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

const SALT_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username/email or password")]
    InvalidCredentials,

    #[error("Instructor role required")]
    Forbidden,

    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// Capability proving the holder is an authenticated instructor. Staff
/// workflow operations take this by reference; constructing it is the role
/// check.
#[derive(Debug, Clone)]
pub struct StaffAuth {
    pub staff: UserRecord,
}

impl StaffAuth {
    pub fn for_instructor(user: UserRecord) -> Result<StaffAuth, AuthError> {
        if user.role == Role::Instructor {
            Ok(StaffAuth { staff: user })
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

/// Self-registration input. Registrations always produce students at the
/// starting skill level; instructor accounts are provisioned out of band.
#[derive(Debug, Clone, Deserialize)]
pub struct StudentRegistration {
    pub username: String,
    pub password: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Hashes a password with a fresh random salt, producing `salt$hexdigest`.
pub fn hash_password(password: &str) -> String {
    let salt: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LEN)
        .map(char::from)
        .collect();
    let digest = salted_digest(&salt, password);
    format!("{salt}${digest}")
}

/// Checks a password against a stored `salt$hexdigest` value.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) => salted_digest(salt, password) == digest,
        None => false,
    }
}

fn salted_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..])
}

/// Resolves a handle-or-email plus password to a user.
pub fn authenticate(
    db: &ClubDbManager,
    identifier: &str,
    password: &str,
) -> Result<UserRecord, AuthError> {
    match db.find_user_credentials(identifier)? {
        Some((user, stored)) => {
            if verify_password(password, &stored) {
                Ok(user)
            } else {
                Err(AuthError::InvalidCredentials)
            }
        }
        None => {
            // Burn a comparison so unknown handles cost the same as bad
            // passwords.
            let _ = verify_password(password, &placeholder_hash());
            Err(AuthError::InvalidCredentials)
        }
    }
}

fn placeholder_hash() -> String {
    format!("{}${}", "0".repeat(SALT_LEN), salted_digest(&"0".repeat(SALT_LEN), "placeholder"))
}

/// Opens a bearer-token session for an authenticated user.
pub fn open_session(db: &ClubDbManager, user: &UserRecord) -> Result<String, AuthError> {
    let token = Uuid::new_v4().to_string();
    db.create_session(user.user_id, &token)?;
    Ok(token)
}

/// Resolves a bearer token back to its user, if the session exists.
pub fn session_user(db: &ClubDbManager, token: &str) -> Result<Option<UserRecord>, AuthError> {
    Ok(db.session_user(token)?)
}

/// Creates a student account from a self-registration.
pub fn register_student(
    db: &ClubDbManager,
    registration: &StudentRegistration,
) -> Result<UserRecord, AuthError> {
    if registration.username.trim().is_empty() || registration.password.is_empty() {
        return Err(AuthError::Validation {
            message: "username and password are required".to_string(),
        });
    }
    if db.username_taken(&registration.username)? {
        return Err(AuthError::Validation {
            message: "username already taken".to_string(),
        });
    }

    let password_hash = hash_password(&registration.password);
    let user_id = db.create_user(&NewUser {
        username: &registration.username,
        role: Role::Student,
        first_name: &registration.first_name,
        last_name: &registration.last_name,
        email: &registration.email,
        phone: &registration.phone,
        skill_level: 1,
        password_hash: &password_hash,
    })?;
    db.get_user(user_id)?.ok_or(AuthError::InvalidCredentials)
}

/// Helper module for hex encoding (avoiding extra dependency).
mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(username: &str) -> StudentRegistration {
        StudentRegistration {
            username: username.to_string(),
            password: "topspin".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Diaz".to_string(),
            email: format!("{username}@example.com"),
            phone: String::new(),
        }
    }

    #[test]
    fn test_password_round_trip() {
        let stored = hash_password("topspin");
        assert!(verify_password("topspin", &stored));
        assert!(!verify_password("slice", &stored));
        assert!(!verify_password("topspin", "not-a-stored-hash"));
    }

    #[test]
    fn test_register_student_defaults() {
        let db = ClubDbManager::new(":memory:");
        let user = register_student(&db, &registration("ana")).unwrap();
        assert_eq!(user.role, Role::Student);
        assert_eq!(user.skill_level, 1);

        let duplicate = register_student(&db, &registration("ana"));
        assert!(matches!(duplicate, Err(AuthError::Validation { .. })));
    }

    #[test]
    fn test_authenticate_by_username_or_email_case_insensitive() {
        let db = ClubDbManager::new(":memory:");
        register_student(&db, &registration("Ana")).unwrap();

        assert!(authenticate(&db, "ana", "topspin").is_ok());
        assert!(authenticate(&db, "ANA@EXAMPLE.COM", "topspin").is_ok());
        assert!(matches!(
            authenticate(&db, "ana", "wrong"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&db, "nobody", "topspin"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_sessions_resolve_back_to_user() {
        let db = ClubDbManager::new(":memory:");
        let user = register_student(&db, &registration("ana")).unwrap();
        let token = open_session(&db, &user).unwrap();

        let resolved = session_user(&db, &token).unwrap().unwrap();
        assert_eq!(resolved.user_id, user.user_id);
        assert!(session_user(&db, "bogus-token").unwrap().is_none());
    }

    #[test]
    fn test_staff_capability_requires_instructor() {
        let db = ClubDbManager::new(":memory:");
        let student = register_student(&db, &registration("ana")).unwrap();
        assert!(matches!(
            StaffAuth::for_instructor(student),
            Err(AuthError::Forbidden)
        ));
    }
}
