//! LDAP Client implementation
//!
//! Implements the directory capabilities over ldap3. Every operation opens
//! its own connection, so a single `LdapDirectory` can be shared freely
//! between concurrent authentications.

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, Scope, SearchEntry, SearchResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use verity_core::config::LdapConfigSection;
use verity_core::{Error, Result, VerityConfig};

use crate::compare::PasswordComparisonAuthenticator;
use crate::directory::{
    DirectoryCompare, DirectoryLookup, DirectoryRecord, DirectorySearch, Lookup, SearchScope,
};
use crate::resolver::DirectoryUserResolver;

/// Result code returned when the base DN of an operation does not exist
const LDAP_NO_SUCH_OBJECT: u32 = 32;

/// LDAP directory accessed through a service account
pub struct LdapDirectory {
    config: LdapConfigSection,
}

impl LdapDirectory {
    /// Create a new LDAP directory client
    pub fn new(config: LdapConfigSection) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LdapConfigSection {
        &self.config
    }

    /// Connect and bind, then unbind again
    pub async fn test_connection(&self) -> Result<()> {
        let mut ldap = self.connect().await?;
        let _ = ldap.unbind().await;
        info!("LDAP connection to {} succeeded", self.config.server_url);
        Ok(())
    }

    /// Open a connection and bind with the service account, if one is set
    async fn connect(&self) -> Result<Ldap> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(self.config.timeout_seconds))
            .set_starttls(self.config.start_tls)
            .set_no_tls_verify(self.config.skip_tls_verify);

        debug!("Connecting to LDAP server: {}", self.config.server_url);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &self.config.server_url)
            .await
            .map_err(|e| directory_error("Failed to connect to LDAP server", e))?;

        ldap3::drive!(conn);

        if !self.config.bind_dn.is_empty() {
            ldap.simple_bind(&self.config.bind_dn, &self.config.bind_password)
                .await
                .map_err(|e| directory_error("Service bind failed", e))?
                .success()
                .map_err(|e| directory_error("Service bind rejected", e))?;
        }

        Ok(ldap)
    }
}

#[async_trait]
impl DirectoryLookup for LdapDirectory {
    async fn lookup(&self, dn: &str, attributes: &[String]) -> Result<Lookup> {
        let mut ldap = self.connect().await?;

        let result = ldap
            .search(dn, Scope::Base, "(objectClass=*)", attributes.to_vec())
            .await;
        let _ = ldap.unbind().await;

        let SearchResult(entries, res) =
            result.map_err(|e| directory_error("Entry lookup failed", e))?;

        if res.rc == LDAP_NO_SUCH_OBJECT {
            return Ok(Lookup::Absent);
        }
        res.success()
            .map_err(|e| directory_error("Entry lookup error", e))?;

        Ok(entries
            .into_iter()
            .next()
            .map(|entry| Lookup::Found(record_from_entry(SearchEntry::construct(entry))))
            .unwrap_or(Lookup::Absent))
    }
}

#[async_trait]
impl DirectorySearch for LdapDirectory {
    async fn search(
        &self,
        base: &str,
        filter: &str,
        scope: SearchScope,
        attributes: &[String],
    ) -> Result<Vec<DirectoryRecord>> {
        let mut ldap = self.connect().await?;

        let scope = match scope {
            SearchScope::OneLevel => Scope::OneLevel,
            SearchScope::Subtree => Scope::Subtree,
        };

        let result = ldap.search(base, scope, filter, attributes.to_vec()).await;
        let _ = ldap.unbind().await;

        let (entries, _res) = result
            .map_err(|e| directory_error("User search failed", e))?
            .success()
            .map_err(|e| directory_error("User search error", e))?;

        debug!("Search {} under '{}' returned {} entries", filter, base, entries.len());

        Ok(entries
            .into_iter()
            .map(|entry| record_from_entry(SearchEntry::construct(entry)))
            .collect())
    }
}

#[async_trait]
impl DirectoryCompare for LdapDirectory {
    async fn compare(&self, dn: &str, attribute: &str, value: &[u8]) -> Result<bool> {
        let mut ldap = self.connect().await?;

        let result = ldap.compare(dn, attribute, value).await;
        let _ = ldap.unbind().await;

        result
            .map_err(|e| directory_error("Compare failed", e))?
            .equal()
            .map_err(|e| directory_error("Compare error", e))
    }
}

fn directory_error(context: &str, err: LdapError) -> Error {
    Error::Directory(format!("{}: {}", context, err))
}

/// Convert a search entry, keeping binary values as raw bytes
fn record_from_entry(entry: SearchEntry) -> DirectoryRecord {
    let mut record = DirectoryRecord::new(entry.dn);

    for (name, values) in entry.attrs {
        for value in values {
            record.push_value(name.clone(), value.into_bytes());
        }
    }
    for (name, values) in entry.bin_attrs {
        for value in values {
            record.push_value(name.clone(), value);
        }
    }

    record
}

/// Password-compare authentication wired to an LDAP server
pub struct LdapAuthProvider {
    directory: Arc<LdapDirectory>,
    authenticator: PasswordComparisonAuthenticator,
}

impl LdapAuthProvider {
    /// Build the directory client, resolver and authenticator from configuration
    pub fn new(config: &VerityConfig) -> Result<Self> {
        config.validate()?;

        let directory = Arc::new(LdapDirectory::new(config.ldap.clone()));
        let resolver = DirectoryUserResolver::from_config(&config.ldap, &config.auth, directory.clone());
        let authenticator = PasswordComparisonAuthenticator::from_config(
            &config.auth,
            Arc::new(resolver),
            directory.clone(),
        )?;

        Ok(Self {
            directory,
            authenticator,
        })
    }

    /// Authenticate user
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<DirectoryRecord> {
        self.authenticator.authenticate(username, password).await
    }

    /// Get underlying directory for connection checks
    pub fn directory(&self) -> Arc<LdapDirectory> {
        self.directory.clone()
    }

    pub fn authenticator(&self) -> &PasswordComparisonAuthenticator {
        &self.authenticator
    }
}
