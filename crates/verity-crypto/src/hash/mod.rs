//! Hash utilities

use digest::Digest;
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha256, Sha512};

/// Digest algorithm behind an LDAP password scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DigestAlgorithm {
    #[default]
    Sha1,
    Sha256,
    Sha512,
    Md5,
}

impl DigestAlgorithm {
    /// Digest size in bytes
    pub fn output_len(&self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
            Self::Md5 => 16,
        }
    }

    /// Scheme tag for unsalted values, e.g. `SHA` in `{SHA}...`
    pub fn plain_tag(&self) -> &'static str {
        match self {
            Self::Sha1 => "SHA",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
            Self::Md5 => "MD5",
        }
    }

    /// Scheme tag for salted values, e.g. `SSHA` in `{SSHA}...`
    pub fn salted_tag(&self) -> &'static str {
        match self {
            Self::Sha1 => "SSHA",
            Self::Sha256 => "SSHA256",
            Self::Sha512 => "SSHA512",
            Self::Md5 => "SMD5",
        }
    }

    /// Digest of the concatenation of `parts`.
    pub fn digest(&self, parts: &[&[u8]]) -> Vec<u8> {
        match self {
            Self::Sha1 => digest_parts::<Sha1>(parts),
            Self::Sha256 => digest_parts::<Sha256>(parts),
            Self::Sha512 => digest_parts::<Sha512>(parts),
            Self::Md5 => digest_parts::<Md5>(parts),
        }
    }
}

fn digest_parts<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = D::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().to_vec()
}
