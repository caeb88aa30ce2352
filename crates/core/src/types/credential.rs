//! Login and registration input with client-side validation.
//!
//! Validation failures never reach the network: the caller gets a
//! [`ValidationError`] and can show it next to the offending field.

use serde::Serialize;

use super::email::{Email, EmailError};

/// Minimum password length accepted by the backend.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimum username length accepted by the backend.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Client-side validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("email is required")]
    EmptyEmail,
    #[error("password is required")]
    EmptyPassword,
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("username must be at least {min} characters")]
    UsernameTooShort { min: usize },
    #[error("invalid email: {0}")]
    InvalidEmail(EmailError),
}

impl From<EmailError> for ValidationError {
    fn from(err: EmailError) -> Self {
        match err {
            EmailError::Empty => Self::EmptyEmail,
            other => Self::InvalidEmail(other),
        }
    }
}

/// Email and password for `POST /api/auth/login`.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Check that both fields are present and the email is well formed.
    ///
    /// Login deliberately does not enforce the password length: an account
    /// created under an older rule must still be able to sign in.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule.
    pub fn validate(&self) -> Result<Email, ValidationError> {
        let email = Email::parse(&self.email)?;
        if self.password.is_empty() {
            return Err(ValidationError::EmptyPassword);
        }
        Ok(email)
    }
}

/// Payload for `POST /api/auth/register`.
#[derive(Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Registration {
    /// Check username length, email shape and password length.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule.
    pub fn validate(&self) -> Result<Email, ValidationError> {
        if self.username.trim().chars().count() < MIN_USERNAME_LENGTH {
            return Err(ValidationError::UsernameTooShort {
                min: MIN_USERNAME_LENGTH,
            });
        }
        let email = Email::parse(&self.email)?;
        if self.password.is_empty() {
            return Err(ValidationError::EmptyPassword);
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LENGTH,
            });
        }
        Ok(email)
    }
}
