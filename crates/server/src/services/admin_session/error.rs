//! Admin authentication error types.

use thiserror::Error;

/// Errors that can occur during admin authentication.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdminAuthError {
    /// No admin password is configured, so nobody can log in.
    #[error("admin login is disabled")]
    Disabled,

    /// The submitted password does not match.
    #[error("invalid password")]
    InvalidPassword,

    /// Token missing, unknown or expired.
    #[error("unauthorized")]
    Unauthorized,
}
