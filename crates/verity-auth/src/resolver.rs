//! Username to directory entry resolution
//!
//! DN patterns are tried first, in configuration order; each candidate that
//! does not exist is skipped. When none resolves, an optional filter search
//! gets the last word.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use verity_core::config::{AuthConfig, LdapConfigSection, UserSearchConfig};
use verity_core::{Error, Result, USERNAME_PLACEHOLDER};

use crate::directory::{DirectoryLookup, DirectorySearch, Lookup, SearchScope};

/// Maps a username to its directory entry
#[async_trait]
pub trait UserResolver: Send + Sync {
    async fn resolve(&self, username: &str) -> Result<Lookup>;
}

/// Locates a user with a single filter search
pub struct FilterUserSearch {
    directory: Arc<dyn DirectorySearch>,
    search_base: String,
    search_filter: String,
    scope: SearchScope,
    attributes: Vec<String>,
}

impl FilterUserSearch {
    /// `search_filter` must contain `{0}`, which is replaced with the
    /// RFC 4515-escaped username.
    pub fn new(
        directory: Arc<dyn DirectorySearch>,
        search_base: impl Into<String>,
        search_filter: impl Into<String>,
    ) -> Self {
        Self {
            directory,
            search_base: search_base.into(),
            search_filter: search_filter.into(),
            scope: SearchScope::Subtree,
            attributes: Vec::new(),
        }
    }

    pub fn from_config(config: &UserSearchConfig, directory: Arc<dyn DirectorySearch>) -> Self {
        let scope = if config.search_subtree {
            SearchScope::Subtree
        } else {
            SearchScope::OneLevel
        };

        Self::new(directory, &config.search_base, &config.search_filter).with_scope(scope)
    }

    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_attributes(mut self, attributes: Vec<String>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn filter_for(&self, username: &str) -> String {
        self.search_filter
            .replace(USERNAME_PLACEHOLDER, &ldap3::ldap_escape(username))
    }

    /// Zero matches is `Absent`; more than one is an error since the
    /// username would be ambiguous.
    pub async fn search_for_user(&self, username: &str) -> Result<Lookup> {
        let filter = self.filter_for(username);
        debug!(
            "Searching for user '{}' with filter {} under '{}'",
            username, filter, self.search_base
        );

        let mut records = self
            .directory
            .search(&self.search_base, &filter, self.scope, &self.attributes)
            .await?;

        match records.len() {
            0 => Ok(Lookup::Absent),
            1 => Ok(records
                .pop()
                .map(Lookup::Found)
                .unwrap_or(Lookup::Absent)),
            actual => Err(Error::IncorrectResultSize {
                expected: 1,
                actual,
            }),
        }
    }
}

/// Pattern-then-search resolver over a directory
pub struct DirectoryUserResolver {
    directory: Arc<dyn DirectoryLookup>,
    dn_patterns: Vec<String>,
    base_dn: String,
    attributes: Vec<String>,
    user_search: Option<FilterUserSearch>,
}

impl DirectoryUserResolver {
    pub fn new(directory: Arc<dyn DirectoryLookup>) -> Self {
        Self {
            directory,
            dn_patterns: Vec::new(),
            base_dn: String::new(),
            attributes: Vec::new(),
            user_search: None,
        }
    }

    pub fn from_config<D>(ldap: &LdapConfigSection, auth: &AuthConfig, directory: Arc<D>) -> Self
    where
        D: DirectoryLookup + DirectorySearch + 'static,
    {
        let attributes = auth.user_attributes.clone().unwrap_or_default();
        let user_search = auth.user_search.as_ref().map(|search| {
            FilterUserSearch::from_config(search, directory.clone())
                .with_attributes(attributes.clone())
        });

        Self {
            directory,
            dn_patterns: auth.user_dn_patterns.clone(),
            base_dn: ldap.base_dn.clone(),
            attributes,
            user_search,
        }
    }

    /// Patterns such as `uid={0},ou=people`, tried in order.
    pub fn with_dn_patterns(mut self, patterns: Vec<String>) -> Self {
        self.dn_patterns = patterns;
        self
    }

    /// Root DN appended to every pattern-built DN
    pub fn with_base_dn(mut self, base_dn: impl Into<String>) -> Self {
        self.base_dn = base_dn.into();
        self
    }

    /// Attributes fetched for pattern-built candidates, empty for all
    pub fn with_attributes(mut self, attributes: Vec<String>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_user_search(mut self, search: FilterUserSearch) -> Self {
        self.user_search = Some(search);
        self
    }

    /// Candidate DNs for `username`, in the order they are tried.
    ///
    /// The base DN, when set, is appended to every pattern-built DN.
    pub fn user_dns(&self, username: &str) -> Vec<String> {
        let escaped = ldap3::dn_escape(username);
        self.dn_patterns
            .iter()
            .map(|pattern| {
                let relative = pattern.replace(USERNAME_PLACEHOLDER, &escaped);
                if self.base_dn.is_empty() {
                    relative
                } else {
                    format!("{},{}", relative, self.base_dn)
                }
            })
            .collect()
    }
}

#[async_trait]
impl UserResolver for DirectoryUserResolver {
    async fn resolve(&self, username: &str) -> Result<Lookup> {
        for dn in self.user_dns(username) {
            match self.directory.lookup(&dn, &self.attributes).await? {
                Lookup::Found(record) => return Ok(Lookup::Found(record)),
                Lookup::Absent => debug!("No entry at candidate DN '{}'", dn),
            }
        }

        match &self.user_search {
            Some(search) => search.search_for_user(username).await,
            None => Ok(Lookup::Absent),
        }
    }
}
