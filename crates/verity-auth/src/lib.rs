//! Directory password-compare authentication for Verity
//!
//! A user is located in the directory (DN patterns first, then an optional
//! filter search) and the submitted password, encoded the way the directory
//! stores it, is checked with an LDAP compare on the password attribute.
//!
//! ```no_run
//! use verity_auth::LdapAuthProvider;
//! use verity_core::VerityConfig;
//!
//! # async fn run() -> verity_core::Result<()> {
//! let mut config = VerityConfig::default();
//! config.ldap.base_dn = "dc=example,dc=com".to_string();
//! config.auth.user_dn_patterns = vec!["uid={0},ou=people".to_string()];
//!
//! let provider = LdapAuthProvider::new(&config)?;
//! let user = provider.authenticate("bob", "secret").await?;
//! println!("authenticated {}", user.dn());
//! # Ok(())
//! # }
//! ```

pub mod compare;
pub mod directory;
pub mod ldap;
pub mod resolver;

#[cfg(test)]
mod testing;

pub use compare::{encoding_from_config, PasswordComparisonAuthenticator};
pub use directory::{
    DirectoryCompare, DirectoryLookup, DirectoryRecord, DirectorySearch, Lookup, SearchScope,
};
pub use ldap::{LdapAuthProvider, LdapDirectory};
pub use resolver::{DirectoryUserResolver, FilterUserSearch, UserResolver};
