//! Password hashing primitives for Verity
//!
//! - Digest algorithms used by LDAP `{TAG}base64` password schemes
//! - Salted hash codec (SSHA family)
//! - Tagged password encoding strategy

pub mod encoding;
pub mod hash;
pub mod ssha;

pub use encoding::PasswordEncoding;
pub use hash::DigestAlgorithm;
pub use ssha::{CodecError, SaltedHash, SaltedHashCodec};
