//! Account use-case service.
//!
//! # Responsibility
//! - Sign up users with hashed passwords.
//! - Authenticate email/password pairs.
//! - Seed demo accounts into an empty store.
//!
//! # Invariants
//! - Passwords are stored as unsalted, single-round SHA-256 hex digests. This
//!   keeps existing stored hashes valid; it is not a strong password scheme.
//! - A password mismatch is `Ok(None)`, never an error.

use crate::model::user::{User, UserRole};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::user_repo::UserRepository;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// SHA-256 of `password`, shared by every demo account.
pub const DEMO_PASSWORD_HASH: &str =
    "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8";

/// Accounts created by [`AuthService::initialize_demo_data`].
pub const DEMO_ACCOUNTS: [(&str, UserRole); 2] = [
    ("admin@company.com", UserRole::Main),
    ("user@company.com", UserRole::Team),
];

#[derive(Debug)]
pub enum AuthServiceError {
    InvalidEmail(String),
    EmptyPassword,
    Repo(RepoError),
}

impl Display for AuthServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmail(value) => write!(f, "invalid email address: `{value}`"),
            Self::EmptyPassword => write!(f, "password cannot be empty"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AuthServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Lowercase hex SHA-256 digest of `password`.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Account service facade over a user repository.
pub struct AuthService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> AuthService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new account from a plaintext password.
    ///
    /// The email is trimmed and checked for an `a@b.c` shape; uniqueness is
    /// enforced by the repository.
    pub fn sign_up(
        &self,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, AuthServiceError> {
        let email = email.trim();
        if !EMAIL_RE.is_match(email) {
            return Err(AuthServiceError::InvalidEmail(email.to_string()));
        }
        if password.is_empty() {
            return Err(AuthServiceError::EmptyPassword);
        }

        let user = self
            .repo
            .create_user(email, &hash_password(password), role)?;
        Ok(user)
    }

    /// Returns the user only when `password` hashes to the stored digest.
    pub fn authenticate_user(&self, email: &str, password: &str) -> RepoResult<Option<User>> {
        let Some(user) = self.repo.get_user_by_email(email)? else {
            debug!("event=auth_login module=service status=rejected reason=unknown_user");
            return Ok(None);
        };

        if hash_password(password) == user.password_hash {
            info!(
                "event=auth_login module=service status=ok user_id={}",
                user.id
            );
            Ok(Some(user))
        } else {
            debug!(
                "event=auth_login module=service status=rejected reason=password_mismatch user_id={}",
                user.id
            );
            Ok(None)
        }
    }

    /// Creates the demo accounts when the store has no users.
    ///
    /// Both accounts are written in one transaction, so a failure leaves the
    /// store empty and a later call retries. Returns how many accounts were
    /// created (zero once any user exists).
    pub fn initialize_demo_data(&self) -> RepoResult<usize> {
        let accounts = DEMO_ACCOUNTS.map(|(email, role)| (email, DEMO_PASSWORD_HASH, role));
        let created = self.repo.create_users_if_empty(&accounts)?;
        if !created.is_empty() {
            info!(
                "event=demo_seed module=service status=ok users={}",
                created.len()
            );
        }
        Ok(created.len())
    }

    pub fn list_users(&self) -> RepoResult<Vec<User>> {
        self.repo.get_all_users()
    }
}

#[cfg(test)]
mod tests {
    use super::{hash_password, DEMO_PASSWORD_HASH, EMAIL_RE};

    #[test]
    fn demo_hash_matches_password() {
        assert_eq!(hash_password("password"), DEMO_PASSWORD_HASH);
        assert_ne!(hash_password("Password"), DEMO_PASSWORD_HASH);
    }

    #[test]
    fn email_shape_check() {
        assert!(EMAIL_RE.is_match("ops@company.com"));
        assert!(!EMAIL_RE.is_match("ops@company"));
        assert!(!EMAIL_RE.is_match("ops company@x.com"));
    }
}
