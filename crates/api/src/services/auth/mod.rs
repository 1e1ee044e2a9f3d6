//! Authentication service.
//!
//! Password accounts with opaque bearer tokens. A token is 32 random bytes,
//! hex encoded and shown to the client once. The database stores only its
//! HMAC-SHA256 digest keyed with the configured token secret.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use sqlx::PgPool;

use recipe_book_core::Email;

use crate::config::ApiConfig;
use crate::db::{RepositoryError, TokenRepository, UserRepository};
use crate::models::user::{NewUser, User, UserChanges};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 5;

/// Maximum display name length (matches the `VARCHAR(255)` column).
const MAX_NAME_LENGTH: usize = 255;

/// Random bytes per issued token.
const TOKEN_BYTES: usize = 32;

type HmacSha256 = Hmac<Sha256>;

/// Profile fields supplied by the client. `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct ProfileUpdate<'p> {
    pub email: Option<&'p str>,
    pub name: Option<&'p str>,
    pub password: Option<&'p str>,
}

/// Authentication service.
///
/// Handles registration, token issuance and token resolution.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: TokenRepository<'a>,
    token_secret: &'a SecretString,
    token_ttl: Option<Duration>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(pool: &'a PgPool, config: &'a ApiConfig) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: TokenRepository::new(pool),
            token_secret: &config.token_secret,
            token_ttl: config
                .token_ttl_days
                .map(|days| Duration::days(i64::from(days))),
        }
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[tracing::instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<User, AuthError> {
        self.create_account(email, password, name, false).await
    }

    /// Create an active staff + superuser account.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::register`].
    #[tracing::instrument(skip(self, password))]
    pub async fn create_superuser(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, AuthError> {
        self.create_account(email, password, name, true).await
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        name: &str,
        operator: bool,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let name = validate_name(name)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(&NewUser {
                email,
                name,
                password_hash,
                is_staff: operator,
                is_superuser: operator,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "user created");
        Ok(user)
    }

    /// Apply a profile update, with the same validation as registration.
    ///
    /// # Errors
    ///
    /// Returns validation errors as for [`AuthService::register`], or
    /// `AuthError::Repository` if the user no longer exists.
    #[tracing::instrument(skip(self, user, update), fields(user_id = %user.id))]
    pub async fn update_profile(
        &self,
        user: &User,
        update: ProfileUpdate<'_>,
    ) -> Result<User, AuthError> {
        let email = update.email.map(Email::parse).transpose()?;
        let name = update.name.map(validate_name).transpose()?;
        let password_hash = match update.password {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let changes = UserChanges {
            email,
            name,
            password_hash,
        };

        self.users
            .update(user.id, &changes)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    /// Check credentials and issue a new token.
    ///
    /// Every failure (unknown email, wrong or blank password, inactive
    /// account) is reported as `AuthError::InvalidCredentials`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if authentication fails.
    #[tracing::instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<String, AuthError> {
        if password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        if let Some(cutoff) = self.issued_after() {
            let pruned = self.tokens.delete_for_user_before(user.id, cutoff).await?;
            if pruned > 0 {
                tracing::debug!(user_id = %user.id, pruned, "expired tokens removed");
            }
        }

        let token = generate_token();
        let digest = hash_token(self.token_secret, &token)?;
        self.tokens.create(user.id, &digest).await?;

        tracing::info!(user_id = %user.id, "token issued");
        Ok(token)
    }

    /// Resolve a raw token to an active user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is unknown, expired,
    /// or belongs to an inactive user.
    pub async fn current_user(&self, token: &str) -> Result<User, AuthError> {
        let digest = hash_token(self.token_secret, token)?;
        let user = self
            .tokens
            .find_user(&digest, self.issued_after())
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !user.is_active {
            return Err(AuthError::InvalidToken);
        }
        Ok(user)
    }

    fn issued_after(&self) -> Option<DateTime<Utc>> {
        self.token_ttl.map(|ttl| Utc::now() - ttl)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Trim and length-check a display name.
fn validate_name(name: &str) -> Result<String, AuthError> {
    let name = name.trim();
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AuthError::InvalidName(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_owned())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Generate a fresh raw token.
fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    hex::encode(bytes)
}

/// Keyed digest of a raw token, as stored in `auth_token.token_hash`.
fn hash_token(secret: &SecretString, token: &str) -> Result<String, AuthError> {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| AuthError::TokenHash)?;
    mac.update(token.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
