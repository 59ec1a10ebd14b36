//! Configuration for Verity

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_PASSWORD_ATTRIBUTE, USERNAME_PLACEHOLDER};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerityConfig {
    #[serde(default)]
    pub ldap: LdapConfigSection,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl VerityConfig {
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::Error::InvalidConfig(format!("Failed to parse config: {}", e)))
    }

    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build a configuration from defaults overlaid with `VERITY_*` variables
    /// looked up through `var`.
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = var("VERITY_LDAP_URL") {
            config.ldap.server_url = url;
        }
        if let Some(start_tls) = var("VERITY_LDAP_START_TLS") {
            config.ldap.start_tls = start_tls == "true";
        }
        if let Some(skip) = var("VERITY_LDAP_SKIP_TLS_VERIFY") {
            config.ldap.skip_tls_verify = skip == "true";
        }
        if let Some(dn) = var("VERITY_BIND_DN") {
            config.ldap.bind_dn = dn;
        }
        if let Some(password) = var("VERITY_BIND_PASSWORD") {
            config.ldap.bind_password = password;
        }
        if let Some(base) = var("VERITY_BASE_DN") {
            config.ldap.base_dn = base;
        }
        if let Some(timeout) = var("VERITY_LDAP_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                config.ldap.timeout_seconds = t;
            }
        }

        if let Some(attribute) = var("VERITY_PASSWORD_ATTRIBUTE") {
            config.auth.password_attribute = attribute;
        }
        if let Some(scheme) = var("VERITY_ENCODING_SCHEME").and_then(|v| EncodingScheme::parse(&v))
        {
            config.auth.encoding.scheme = scheme;
        }
        if let Some(algorithm) =
            var("VERITY_ENCODING_ALGORITHM").and_then(|v| HashAlgorithmName::parse(&v))
        {
            config.auth.encoding.algorithm = algorithm;
        }
        if let Some(lowercase) = var("VERITY_ENCODING_LOWERCASE_PREFIX") {
            config.auth.encoding.lowercase_prefix = lowercase == "true";
        }
        if let Some(attributes) = var("VERITY_USER_ATTRIBUTES") {
            config.auth.user_attributes = Some(
                attributes
                    .split(',')
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(String::from)
                    .collect(),
            );
        }
        // DNs contain commas, so patterns are separated by ';'
        if let Some(patterns) = var("VERITY_USER_DN_PATTERNS") {
            config.auth.user_dn_patterns = patterns
                .split(';')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(base) = var("VERITY_USER_SEARCH_BASE") {
            let search = config.auth.user_search.get_or_insert_with(UserSearchConfig::default);
            search.search_base = base;
        }
        if let Some(filter) = var("VERITY_USER_SEARCH_FILTER") {
            let search = config.auth.user_search.get_or_insert_with(UserSearchConfig::default);
            search.search_filter = filter;
        }

        if let Some(level) = var("VERITY_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = var("VERITY_LOG_FORMAT") {
            config.logging.format = format;
        }

        config
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.ldap.validate()?;
        self.auth.validate()
    }
}

/// LDAP connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdapConfigSection {
    /// LDAP server URL (ldap:// or ldaps://)
    #[serde(default = "default_ldap_url")]
    pub server_url: String,

    /// Use STARTTLS
    #[serde(default)]
    pub start_tls: bool,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub skip_tls_verify: bool,

    /// Bind DN for lookups and compares, empty for anonymous access
    #[serde(default)]
    pub bind_dn: String,

    /// Bind password
    #[serde(default)]
    pub bind_password: String,

    /// Root DN appended to user DN patterns
    #[serde(default)]
    pub base_dn: String,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_ldap_url() -> String {
    "ldap://localhost:389".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for LdapConfigSection {
    fn default() -> Self {
        Self {
            server_url: default_ldap_url(),
            start_tls: false,
            skip_tls_verify: false,
            bind_dn: String::new(),
            bind_password: String::new(),
            base_dn: String::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl LdapConfigSection {
    pub fn validate(&self) -> crate::Result<()> {
        if self.server_url.is_empty() {
            return Err(crate::Error::InvalidConfig("Server URL is required".into()));
        }

        if !self.server_url.starts_with("ldap://") && !self.server_url.starts_with("ldaps://") {
            return Err(crate::Error::InvalidConfig(
                "Server URL must start with ldap:// or ldaps://".into(),
            ));
        }

        Ok(())
    }
}

/// Password comparison settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Attribute compared against the encoded password
    #[serde(default = "default_password_attribute")]
    pub password_attribute: String,

    /// How the submitted password is encoded before the compare
    #[serde(default)]
    pub encoding: EncodingConfig,

    /// DN patterns tried in order, `{0}` is replaced with the username.
    /// Example: "uid={0},ou=people"
    #[serde(default)]
    pub user_dn_patterns: Vec<String>,

    /// Search used when no DN pattern resolves
    #[serde(default)]
    pub user_search: Option<UserSearchConfig>,

    /// Attributes fetched for the resolved entry, all user attributes when unset
    #[serde(default)]
    pub user_attributes: Option<Vec<String>>,
}

fn default_password_attribute() -> String {
    DEFAULT_PASSWORD_ATTRIBUTE.to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password_attribute: default_password_attribute(),
            encoding: EncodingConfig::default(),
            user_dn_patterns: Vec::new(),
            user_search: None,
            user_attributes: None,
        }
    }
}

impl AuthConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if self.password_attribute.is_empty() {
            return Err(crate::Error::InvalidConfig(
                "password_attribute must not be empty".into(),
            ));
        }

        if self.user_dn_patterns.is_empty() && self.user_search.is_none() {
            return Err(crate::Error::InvalidConfig(
                "Either user_dn_patterns or user_search must be configured".into(),
            ));
        }

        for pattern in &self.user_dn_patterns {
            if !pattern.contains(USERNAME_PLACEHOLDER) {
                return Err(crate::Error::InvalidConfig(format!(
                    "User DN pattern must contain {} placeholder: {}",
                    USERNAME_PLACEHOLDER, pattern
                )));
            }
        }

        if let Some(search) = &self.user_search {
            search.validate()?;
        }

        Ok(())
    }
}

/// Filter-based user search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSearchConfig {
    /// Absolute base DN of the search
    #[serde(default)]
    pub search_base: String,

    /// Search filter, `{0}` is replaced with the escaped username
    #[serde(default = "default_search_filter")]
    pub search_filter: String,

    /// Search the whole subtree instead of one level
    #[serde(default = "default_search_subtree")]
    pub search_subtree: bool,
}

fn default_search_filter() -> String {
    "(uid={0})".to_string()
}

fn default_search_subtree() -> bool {
    true
}

impl Default for UserSearchConfig {
    fn default() -> Self {
        Self {
            search_base: String::new(),
            search_filter: default_search_filter(),
            search_subtree: default_search_subtree(),
        }
    }
}

impl UserSearchConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if !self.search_filter.contains(USERNAME_PLACEHOLDER) {
            return Err(crate::Error::InvalidConfig(format!(
                "User search filter must contain {} placeholder",
                USERNAME_PLACEHOLDER
            )));
        }
        Ok(())
    }
}

/// Password encoding settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncodingConfig {
    #[serde(default)]
    pub scheme: EncodingScheme,

    #[serde(default)]
    pub algorithm: HashAlgorithmName,

    /// Emit lowercase scheme tags such as `{ssha}`
    #[serde(default)]
    pub lowercase_prefix: bool,
}

/// Password encoding scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EncodingScheme {
    /// Salted digest, salt taken from the stored attribute
    #[default]
    Salted,
    /// Unsalted digest
    Digest,
    /// Cleartext compare
    Plaintext,
}

impl EncodingScheme {
    /// Case-insensitive name as used in configuration files
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "salted" => Some(Self::Salted),
            "digest" => Some(Self::Digest),
            "plaintext" => Some(Self::Plaintext),
            _ => None,
        }
    }
}

/// Digest used by the digest schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithmName {
    #[default]
    Sha1,
    Sha256,
    Sha512,
    Md5,
}

impl HashAlgorithmName {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sha1" => Some(Self::Sha1),
            "sha256" => Some(Self::Sha256),
            "sha512" => Some(Self::Sha512),
            "md5" => Some(Self::Md5),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
