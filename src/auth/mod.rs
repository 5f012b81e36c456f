//! Credential & session issuer: one-time-code verification and bearer
//! token issuance with single-active-session enforcement.

pub mod otp;
pub mod token;

pub use otp::OtpCache;
pub use token::{issue_token, verify_token, Claims};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Bad or expired one-time code.
    #[error("Invalid or expired OTP")]
    InvalidCredential,

    /// Missing, malformed, or expired token.
    #[error("Authentication required")]
    Unauthenticated,

    /// Token's embedded session id no longer matches the identity's
    /// current session (a newer login superseded it).
    #[error("Session superseded by a newer login")]
    SessionSuperseded,

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}
