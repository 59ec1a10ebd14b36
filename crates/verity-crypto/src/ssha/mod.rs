//! Salted hash codec
//!
//! Stored values look like `{SSHA}base64(hash || salt)`: a scheme tag in
//! braces followed by the Base64 of the raw digest with the salt appended.
//! An unsalted value (`{SHA}base64(hash)`) decodes to exactly the digest
//! length and carries no salt.

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;
use thiserror::Error;

use crate::hash::DigestAlgorithm;

/// Codec errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Invalid Base64 in stored password: {0}")]
    InvalidBase64(String),

    #[error("Stored password hash is {actual} bytes, shorter than the {expected}-byte digest")]
    HashTooShort { expected: usize, actual: usize },
}

/// A stored credential split into digest and salt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaltedHash {
    hash: Vec<u8>,
    salt: Vec<u8>,
}

impl SaltedHash {
    pub fn hash(&self) -> &[u8] {
        &self.hash
    }

    /// Salt bytes, empty for an unsalted digest
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn is_salted(&self) -> bool {
        !self.salt.is_empty()
    }

    pub fn into_salt(self) -> Option<Vec<u8>> {
        if self.salt.is_empty() {
            None
        } else {
            Some(self.salt)
        }
    }
}

/// Encoder/decoder for `{TAG}base64(hash || salt)` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaltedHashCodec {
    algorithm: DigestAlgorithm,
    lowercase_prefix: bool,
}

impl SaltedHashCodec {
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm,
            lowercase_prefix: false,
        }
    }

    /// Salted SHA-1, the LDAP `{SSHA}` scheme
    pub fn sha1() -> Self {
        Self::new(DigestAlgorithm::Sha1)
    }

    /// Emit `{ssha}` style tags instead of `{SSHA}`.
    pub fn with_lowercase_prefix(mut self, lowercase: bool) -> Self {
        self.lowercase_prefix = lowercase;
        self
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Split a stored value into digest and salt.
    ///
    /// Everything up to and including the last `}` is discarded, the rest is
    /// Base64-decoded. The first `output_len()` bytes are the digest and any
    /// remainder is the salt.
    pub fn decode(&self, stored: &str) -> Result<SaltedHash, CodecError> {
        let encoded = match stored.rfind('}') {
            Some(idx) => &stored[idx + 1..],
            None => stored,
        };

        let mut decoded = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| CodecError::InvalidBase64(e.to_string()))?;

        let digest_len = self.algorithm.output_len();
        if decoded.len() < digest_len {
            return Err(CodecError::HashTooShort {
                expected: digest_len,
                actual: decoded.len(),
            });
        }

        let salt = decoded.split_off(digest_len);
        Ok(SaltedHash {
            hash: decoded,
            salt,
        })
    }

    /// Encode `plaintext` the way the directory stores it.
    ///
    /// With a salt the result is `{SSHA}base64(digest(plaintext || salt) || salt)`,
    /// without one it is `{SHA}base64(digest(plaintext))`. An empty salt keeps
    /// the salted tag over the bare digest, which decodes to an empty salt.
    pub fn encode(&self, plaintext: &str, salt: Option<&[u8]>) -> String {
        match salt {
            Some(salt) => {
                let mut value = self.algorithm.digest(&[plaintext.as_bytes(), salt]);
                value.extend_from_slice(salt);
                self.tagged(self.algorithm.salted_tag(), &value)
            }
            None => {
                let value = self.algorithm.digest(&[plaintext.as_bytes()]);
                self.tagged(self.algorithm.plain_tag(), &value)
            }
        }
    }

    /// Encode with a freshly generated salt of `salt_len` bytes.
    pub fn encode_with_random_salt(&self, plaintext: &str, salt_len: usize) -> String {
        let mut salt = vec![0u8; salt_len];
        rand::rng().fill_bytes(&mut salt);
        self.encode(plaintext, Some(salt.as_slice()))
    }

    fn tagged(&self, tag: &str, value: &[u8]) -> String {
        let tag = if self.lowercase_prefix {
            tag.to_ascii_lowercase()
        } else {
            tag.to_string()
        };
        format!("{{{}}}{}", tag, STANDARD.encode(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(tag: &str, hash: &[u8], salt: &[u8]) -> String {
        let mut raw = hash.to_vec();
        raw.extend_from_slice(salt);
        format!("{{{}}}{}", tag, STANDARD.encode(raw))
    }

    #[test]
    fn test_decode_splits_hash_and_salt() {
        let hash = [7u8; 20];
        let salt = [1u8, 2, 3, 4];
        let decoded = SaltedHashCodec::sha1()
            .decode(&stored("SSHA", &hash, &salt))
            .unwrap();

        assert_eq!(decoded.hash(), &hash);
        assert_eq!(decoded.salt(), &salt);
        assert!(decoded.is_salted());
    }

    #[test]
    fn test_decode_unsalted_digest() {
        let hash = [9u8; 20];
        let decoded = SaltedHashCodec::sha1()
            .decode(&stored("SHA", &hash, &[]))
            .unwrap();

        assert_eq!(decoded.hash(), &hash);
        assert!(decoded.salt().is_empty());
        assert_eq!(decoded.into_salt(), None);
    }

    #[test]
    fn test_decode_too_short() {
        for len in [0usize, 1, 10, 19] {
            let value = stored("SSHA", &vec![0u8; len], &[]);
            let err = SaltedHashCodec::sha1().decode(&value).unwrap_err();
            assert_eq!(
                err,
                CodecError::HashTooShort {
                    expected: 20,
                    actual: len
                }
            );
        }
    }

    #[test]
    fn test_decode_strips_up_to_last_brace() {
        let hash = [3u8; 20];
        let salt = b"pepper";
        let value = format!("{{crypt}}{}", stored("SSHA", &hash, salt));

        let decoded = SaltedHashCodec::sha1().decode(&value).unwrap();
        assert_eq!(decoded.salt(), salt);

        // No tag at all: the whole value is Base64
        let bare = STANDARD.encode([hash.as_slice(), salt.as_slice()].concat());
        let decoded = SaltedHashCodec::sha1().decode(&bare).unwrap();
        assert_eq!(decoded.salt(), salt);
    }

    #[test]
    fn test_decode_invalid_base64() {
        let err = SaltedHashCodec::sha1().decode("{SSHA}not*base64").unwrap_err();
        assert!(matches!(err, CodecError::InvalidBase64(_)));
    }

    #[test]
    fn test_decode_uses_algorithm_digest_length() {
        let codec = SaltedHashCodec::new(DigestAlgorithm::Sha256);
        let decoded = codec.decode(&stored("SSHA256", &[5u8; 32], b"ab")).unwrap();
        assert_eq!(decoded.hash().len(), 32);
        assert_eq!(decoded.salt(), b"ab");

        // 20 bytes is a full SHA-1 digest but too short for SHA-256
        assert!(codec.decode(&stored("SHA", &[5u8; 20], &[])).is_err());
    }

    #[test]
    fn test_encode_unsalted_sha1() {
        let encoded = SaltedHashCodec::sha1().encode("password", None);
        assert_eq!(encoded, "{SHA}W6ph5Mm5Pz8GgiULbPgzG37mj9g=");
    }

    #[test]
    fn test_encode_empty_salt_keeps_salted_tag() {
        let codec = SaltedHashCodec::sha1();
        let empty: &[u8] = &[];
        let encoded = codec.encode("password", Some(empty));
        assert_eq!(encoded, "{SSHA}W6ph5Mm5Pz8GgiULbPgzG37mj9g=");
        assert!(!codec.decode(&encoded).unwrap().is_salted());
    }

    #[test]
    fn test_encode_salted_appends_salt_after_plaintext() {
        let codec = SaltedHashCodec::sha1();
        let salt: &[u8] = b"\x01\x02\x03\x04";
        let encoded = codec.encode("secret", Some(salt));
        assert!(encoded.starts_with("{SSHA}"));

        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded.salt(), salt);
        assert_eq!(
            decoded.hash(),
            DigestAlgorithm::Sha1.digest(&[b"secret", salt]).as_slice()
        );
    }

    #[test]
    fn test_round_trip_recovers_salt() {
        let codec = SaltedHashCodec::sha1();
        let salts: [&[u8]; 4] = [b"", b"s", b"\x00\xff\x10\x80", b"a much longer salt value"];

        for salt in salts {
            for plaintext in ["", "pw", "pässwörd"] {
                let decoded = codec.decode(&codec.encode(plaintext, Some(salt))).unwrap();
                assert_eq!(decoded.salt(), salt);
            }
        }
    }

    #[test]
    fn test_lowercase_prefix() {
        let codec = SaltedHashCodec::sha1().with_lowercase_prefix(true);
        assert!(codec.encode("pw", Some(b"salt".as_slice())).starts_with("{ssha}"));
        assert!(codec.encode("pw", None).starts_with("{sha}"));
    }

    #[test]
    fn test_random_salt() {
        let codec = SaltedHashCodec::new(DigestAlgorithm::Sha512);
        let first = codec.encode_with_random_salt("pw", 8);
        let second = codec.encode_with_random_salt("pw", 8);

        assert!(first.starts_with("{SSHA512}"));
        assert_ne!(first, second);
        assert_eq!(codec.decode(&first).unwrap().salt().len(), 8);
    }
}
