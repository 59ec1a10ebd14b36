//! Verity Core Library
//!
//! Error taxonomy, configuration model and shared constants for the Verity
//! directory password-compare authenticator.

pub mod config;
pub mod error;

pub use config::VerityConfig;
pub use error::{Error, Result};

/// Verity version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default name of the attribute holding the stored password
pub const DEFAULT_PASSWORD_ATTRIBUTE: &str = "userPassword";

/// Placeholder substituted with the username in DN patterns and search filters
pub const USERNAME_PLACEHOLDER: &str = "{0}";

/// Message shown to end users for every authentication failure kind
pub const BAD_CREDENTIALS_MESSAGE: &str = "Bad credentials";
