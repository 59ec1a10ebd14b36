//! LDAP directory access
//!
//! Provides the directory capabilities over a real server:
//! - Entry lookup by DN
//! - Filter-based user search
//! - Attribute-value compare
//! - TLS/STARTTLS support

mod client;

pub use client::{LdapAuthProvider, LdapDirectory};
