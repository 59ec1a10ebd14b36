//! Password encoding strategy
//!
//! Selects how a submitted password is turned into the value handed to the
//! directory compare.

use crate::hash::DigestAlgorithm;
use crate::ssha::{CodecError, SaltedHashCodec};

/// How the submitted password is encoded before comparing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordEncoding {
    /// Salted digest; the salt is read back from the stored attribute
    SaltedDigest(SaltedHashCodec),
    /// Unsalted digest; the stored attribute is never read
    PlainDigest(SaltedHashCodec),
    /// The password itself, for directories storing cleartext
    Plaintext,
}

impl Default for PasswordEncoding {
    fn default() -> Self {
        Self::SaltedDigest(SaltedHashCodec::sha1())
    }
}

impl PasswordEncoding {
    pub fn salted(algorithm: DigestAlgorithm) -> Self {
        Self::SaltedDigest(SaltedHashCodec::new(algorithm))
    }

    pub fn digest(algorithm: DigestAlgorithm) -> Self {
        Self::PlainDigest(SaltedHashCodec::new(algorithm))
    }

    /// Whether a salt must be extracted from the stored value first
    pub fn is_salt_aware(&self) -> bool {
        matches!(self, Self::SaltedDigest(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SaltedDigest(codec) => codec.algorithm().salted_tag(),
            Self::PlainDigest(codec) => codec.algorithm().plain_tag(),
            Self::Plaintext => "PLAINTEXT",
        }
    }

    /// Salt carried by a stored value, `None` for an unsalted digest.
    ///
    /// Only salt-aware encodings look at the stored value; the others
    /// always return `Ok(None)`.
    pub fn extract_salt(&self, stored: &str) -> Result<Option<Vec<u8>>, CodecError> {
        match self {
            Self::SaltedDigest(codec) => Ok(codec.decode(stored)?.into_salt()),
            Self::PlainDigest(_) | Self::Plaintext => Ok(None),
        }
    }

    /// Encode `plaintext` into the textual compare value.
    pub fn encode(&self, plaintext: &str, salt: Option<&[u8]>) -> String {
        match self {
            Self::SaltedDigest(codec) => codec.encode(plaintext, salt),
            Self::PlainDigest(codec) => codec.encode(plaintext, None),
            Self::Plaintext => plaintext.to_string(),
        }
    }
}
