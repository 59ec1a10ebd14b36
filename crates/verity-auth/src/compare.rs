//! Password comparison authenticator
//!
//! Authenticates by asking the directory to compare an encoded password with
//! the stored password attribute, so the stored secret never has to be read
//! back. For salted schemes the salt is taken from the stored value first.

use std::sync::Arc;
use tracing::{debug, error, info};
use verity_core::config::{AuthConfig, EncodingConfig, EncodingScheme, HashAlgorithmName};
use verity_core::{Error, Result, DEFAULT_PASSWORD_ATTRIBUTE};
use verity_crypto::{DigestAlgorithm, PasswordEncoding, SaltedHashCodec};

use crate::directory::{DirectoryCompare, DirectoryRecord, Lookup};
use crate::resolver::UserResolver;

/// Authenticator using a remote LDAP "compare" on the password attribute
pub struct PasswordComparisonAuthenticator {
    resolver: Arc<dyn UserResolver>,
    directory: Arc<dyn DirectoryCompare>,
    password_attribute: String,
    encoding: PasswordEncoding,
}

impl PasswordComparisonAuthenticator {
    /// Compares `userPassword` using salted SHA-1.
    pub fn new(resolver: Arc<dyn UserResolver>, directory: Arc<dyn DirectoryCompare>) -> Self {
        Self {
            resolver,
            directory,
            password_attribute: DEFAULT_PASSWORD_ATTRIBUTE.to_string(),
            encoding: PasswordEncoding::default(),
        }
    }

    pub fn from_config(
        config: &AuthConfig,
        resolver: Arc<dyn UserResolver>,
        directory: Arc<dyn DirectoryCompare>,
    ) -> Result<Self> {
        Ok(Self::new(resolver, directory)
            .with_password_attribute(config.password_attribute.clone())?
            .with_encoding(encoding_from_config(&config.encoding)))
    }

    pub fn with_password_attribute(mut self, attribute: impl Into<String>) -> Result<Self> {
        let attribute = attribute.into();
        if attribute.is_empty() {
            return Err(Error::InvalidConfig(
                "password_attribute must not be empty".into(),
            ));
        }
        self.password_attribute = attribute;
        Ok(self)
    }

    pub fn with_encoding(mut self, encoding: PasswordEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn password_attribute(&self) -> &str {
        &self.password_attribute
    }

    pub fn encoding(&self) -> &PasswordEncoding {
        &self.encoding
    }

    /// Authenticate `username` with `password`, returning the user's entry.
    ///
    /// # Errors
    /// * `UserNotFound` - no candidate entry exists; compare is not attempted
    /// * `BadCredentials` - the directory reported a mismatch
    /// * `MalformedCredentialData` - a salted scheme is configured but the
    ///   stored value is missing, empty or shorter than the digest
    /// * anything raised by the resolver or the directory, unchanged
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<DirectoryRecord> {
        let user = match self.resolver.resolve(username).await? {
            Lookup::Found(user) => user,
            Lookup::Absent => {
                debug!("User not found: {}", username);
                return Err(Error::UserNotFound(username.to_string()));
            }
        };

        debug!(
            "Performing LDAP compare of password attribute '{}' for user '{}'",
            self.password_attribute,
            user.dn()
        );

        let salt = if self.encoding.is_salt_aware() {
            self.extract_salt(&user)?
        } else {
            None
        };

        let encoded = self.encoding.encode(password, salt.as_deref());

        let matched = self
            .directory
            .compare(user.dn(), &self.password_attribute, encoded.as_bytes())
            .await?;

        if !matched {
            debug!("Password compare failed for user '{}'", user.dn());
            return Err(Error::BadCredentials);
        }

        info!("Authenticated user '{}'", user.dn());
        Ok(user)
    }

    fn extract_salt(&self, user: &DirectoryRecord) -> Result<Option<Vec<u8>>> {
        let stored = user
            .attribute(&self.password_attribute)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                error!(
                    "The {} attribute of '{}' is not set or empty",
                    self.password_attribute,
                    user.dn()
                );
                Error::MalformedCredentialData(format!(
                    "The {} attribute of the user is not set or empty",
                    self.password_attribute
                ))
            })?;

        let stored = std::str::from_utf8(stored).map_err(|_| {
            error!(
                "The {} attribute of '{}' is not valid UTF-8",
                self.password_attribute,
                user.dn()
            );
            Error::MalformedCredentialData(format!(
                "The {} attribute of the user is not valid UTF-8",
                self.password_attribute
            ))
        })?;

        self.encoding.extract_salt(stored).map_err(|e| {
            error!("Stored password of '{}' is malformed: {}", user.dn(), e);
            Error::MalformedCredentialData(e.to_string())
        })
    }
}

/// Map the configured scheme onto an encoding strategy
pub fn encoding_from_config(config: &EncodingConfig) -> PasswordEncoding {
    let algorithm = match config.algorithm {
        HashAlgorithmName::Sha1 => DigestAlgorithm::Sha1,
        HashAlgorithmName::Sha256 => DigestAlgorithm::Sha256,
        HashAlgorithmName::Sha512 => DigestAlgorithm::Sha512,
        HashAlgorithmName::Md5 => DigestAlgorithm::Md5,
    };
    let codec = SaltedHashCodec::new(algorithm).with_lowercase_prefix(config.lowercase_prefix);

    match config.scheme {
        EncodingScheme::Salted => PasswordEncoding::SaltedDigest(codec),
        EncodingScheme::Digest => PasswordEncoding::PlainDigest(codec),
        EncodingScheme::Plaintext => PasswordEncoding::Plaintext,
    }
}
