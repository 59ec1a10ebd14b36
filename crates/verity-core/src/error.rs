//! Error types for Verity

use thiserror::Error;

use crate::BAD_CREDENTIALS_MESSAGE;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Authentication failures
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Bad credentials")]
    BadCredentials,

    // Stored data errors
    #[error("Malformed credential data: {0}")]
    MalformedCredentialData(String),

    #[error("Incorrect result size: expected {expected}, actual {actual}")]
    IncorrectResultSize { expected: usize, actual: usize },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Directory errors
    #[error("Directory error: {0}")]
    Directory(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::UserNotFound(_) => "UserNotFound",
            Error::BadCredentials => "BadCredentials",
            Error::MalformedCredentialData(_) => "MalformedCredentialData",
            Error::IncorrectResultSize { .. } => "IncorrectResultSize",
            Error::InvalidConfig(_) => "InvalidConfig",
            Error::Directory(_) => "DirectoryError",
            Error::Io(_) => "IoError",
        }
    }

    /// True for the failures attributable to the supplied credentials.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Error::UserNotFound(_) | Error::BadCredentials)
    }

    /// Text safe to show to the person who attempted to log in.
    ///
    /// `UserNotFound` and `BadCredentials` collapse to the same message so the
    /// response does not reveal whether the username exists.
    pub fn public_message(&self) -> String {
        if self.is_authentication_failure() {
            BAD_CREDENTIALS_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kinds_share_public_message() {
        let not_found = Error::UserNotFound("alice".to_string());
        let bad = Error::BadCredentials;

        assert!(not_found.is_authentication_failure());
        assert!(bad.is_authentication_failure());
        assert_eq!(not_found.public_message(), bad.public_message());
        assert!(!not_found.public_message().contains("alice"));
        assert_ne!(not_found.code(), bad.code());
    }

    #[test]
    fn test_data_errors_are_not_authentication_failures() {
        let err = Error::MalformedCredentialData("hash too short".to_string());
        assert!(!err.is_authentication_failure());
        assert_eq!(err.code(), "MalformedCredentialData");
        assert!(err.public_message().contains("hash too short"));

        let err = Error::Directory("connection refused".to_string());
        assert!(!err.is_authentication_failure());
    }
}
