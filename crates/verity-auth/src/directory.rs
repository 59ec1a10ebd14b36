//! Directory capabilities consumed by the authenticator
//!
//! The authenticator never talks to a connection directly; it needs three
//! narrow capabilities (lookup an entry by DN, search, compare an attribute
//! value) which the LDAP client and test doubles implement.

use async_trait::async_trait;
use std::collections::HashMap;
use verity_core::Result;

/// A resolved directory entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryRecord {
    dn: String,
    attributes: HashMap<String, Vec<Vec<u8>>>,
}

impl DirectoryRecord {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    /// Add a value to an attribute, keeping earlier values.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.push_value(name.into(), value.into());
        self
    }

    pub(crate) fn push_value(&mut self, name: String, value: Vec<u8>) {
        match self.key_for(&name) {
            Some(key) => {
                if let Some(values) = self.attributes.get_mut(&key) {
                    values.push(value);
                }
            }
            None => {
                self.attributes.insert(name, vec![value]);
            }
        }
    }

    /// Distinguished name
    pub fn dn(&self) -> &str {
        &self.dn
    }

    /// First value of an attribute; attribute names match case-insensitively
    pub fn attribute(&self, name: &str) -> Option<&[u8]> {
        self.attribute_values(name)
            .and_then(|values| values.first())
            .map(Vec::as_slice)
    }

    pub fn attribute_values(&self, name: &str) -> Option<&[Vec<u8>]> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }

    /// First value of an attribute as UTF-8 text
    pub fn attribute_str(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(|v| std::str::from_utf8(v).ok())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute_values(name).is_some()
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    fn key_for(&self, name: &str) -> Option<String> {
        self.attributes
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .cloned()
    }
}

/// Outcome of looking up a single candidate entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(DirectoryRecord),
    Absent,
}

impl Lookup {
    pub fn into_record(self) -> Option<DirectoryRecord> {
        match self {
            Lookup::Found(record) => Some(record),
            Lookup::Absent => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

/// Search depth below the base DN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    OneLevel,
    Subtree,
}

/// Attribute-value compare
#[async_trait]
pub trait DirectoryCompare: Send + Sync {
    /// True when `attribute` of entry `dn` holds `value`.
    async fn compare(&self, dn: &str, attribute: &str, value: &[u8]) -> Result<bool>;
}

/// Read a single entry by DN
#[async_trait]
pub trait DirectoryLookup: Send + Sync {
    /// An empty `attributes` slice requests all user attributes.
    async fn lookup(&self, dn: &str, attributes: &[String]) -> Result<Lookup>;
}

/// Filter search below a base DN
#[async_trait]
pub trait DirectorySearch: Send + Sync {
    async fn search(
        &self,
        base: &str,
        filter: &str,
        scope: SearchScope,
        attributes: &[String],
    ) -> Result<Vec<DirectoryRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_lookup_is_case_insensitive() {
        let record = DirectoryRecord::new("uid=bob,ou=people,dc=example,dc=com")
            .with_attribute("userPassword", "{SHA}abc")
            .with_attribute("cn", "Bob");

        assert_eq!(record.attribute("userpassword"), Some(b"{SHA}abc".as_slice()));
        assert_eq!(record.attribute_str("USERPASSWORD"), Some("{SHA}abc"));
        assert!(record.has_attribute("CN"));
        assert!(!record.has_attribute("mail"));
        assert_eq!(record.attribute("mail"), None);
    }

    #[test]
    fn test_multi_valued_attribute() {
        let record = DirectoryRecord::new("uid=bob")
            .with_attribute("mail", "bob@example.com")
            .with_attribute("MAIL", "robert@example.com");

        let values = record.attribute_values("mail").unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(record.attribute_str("mail"), Some("bob@example.com"));
        assert_eq!(record.attribute_names().count(), 1);
    }

    #[test]
    fn test_binary_value_is_not_text() {
        let record = DirectoryRecord::new("uid=bob").with_attribute("jpegPhoto", vec![0xff, 0xd8]);
        assert!(record.attribute("jpegPhoto").is_some());
        assert_eq!(record.attribute_str("jpegPhoto"), None);
    }

    #[test]
    fn test_lookup_helpers() {
        let found = Lookup::Found(DirectoryRecord::new("uid=bob"));
        assert!(found.is_found());
        assert_eq!(found.into_record().unwrap().dn(), "uid=bob");
        assert_eq!(Lookup::Absent.into_record(), None);
    }
}
