//! In-memory directory used by the unit tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use verity_core::{Error, Result};

use crate::directory::{
    DirectoryCompare, DirectoryLookup, DirectoryRecord, DirectorySearch, Lookup, SearchScope,
};

#[derive(Default)]
pub(crate) struct InMemoryDirectory {
    entries: Vec<DirectoryRecord>,
    compare_calls: AtomicUsize,
    looked_up: Mutex<Vec<String>>,
    fail_with: Option<String>,
}

impl InMemoryDirectory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_entry(mut self, record: DirectoryRecord) -> Self {
        self.entries.push(record);
        self
    }

    /// Every operation fails as if the connection dropped.
    pub(crate) fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    pub(crate) fn compare_calls(&self) -> usize {
        self.compare_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn looked_up(&self) -> Vec<String> {
        self.looked_up.lock().unwrap().clone()
    }

    fn check_connection(&self) -> Result<()> {
        match &self.fail_with {
            Some(message) => Err(Error::Directory(message.clone())),
            None => Ok(()),
        }
    }

    fn entry(&self, dn: &str) -> Option<&DirectoryRecord> {
        self.entries.iter().find(|e| e.dn().eq_ignore_ascii_case(dn))
    }
}

fn project(record: &DirectoryRecord, attributes: &[String]) -> DirectoryRecord {
    if attributes.is_empty() {
        return record.clone();
    }

    let mut projected = DirectoryRecord::new(record.dn());
    for name in attributes {
        if let Some(values) = record.attribute_values(name) {
            for value in values {
                projected.push_value(name.clone(), value.clone());
            }
        }
    }
    projected
}

/// Supports only `(attr=value)` equality filters.
fn matches_filter(record: &DirectoryRecord, filter: &str) -> bool {
    let inner = filter.trim_start_matches('(').trim_end_matches(')');
    match inner.split_once('=') {
        Some((attr, value)) => record
            .attribute_values(attr)
            .map(|values| values.iter().any(|v| v.as_slice() == value.as_bytes()))
            .unwrap_or(false),
        None => false,
    }
}

fn in_scope(dn: &str, base: &str, scope: SearchScope) -> bool {
    let dn = dn.to_ascii_lowercase();
    let suffix = format!(",{}", base.to_ascii_lowercase());
    match dn.strip_suffix(&suffix) {
        Some(rdn) => match scope {
            SearchScope::Subtree => true,
            SearchScope::OneLevel => !rdn.contains(','),
        },
        None => false,
    }
}

#[async_trait]
impl DirectoryLookup for InMemoryDirectory {
    async fn lookup(&self, dn: &str, attributes: &[String]) -> Result<Lookup> {
        self.check_connection()?;
        self.looked_up.lock().unwrap().push(dn.to_string());

        Ok(match self.entry(dn) {
            Some(record) => Lookup::Found(project(record, attributes)),
            None => Lookup::Absent,
        })
    }
}

#[async_trait]
impl DirectorySearch for InMemoryDirectory {
    async fn search(
        &self,
        base: &str,
        filter: &str,
        scope: SearchScope,
        attributes: &[String],
    ) -> Result<Vec<DirectoryRecord>> {
        self.check_connection()?;

        Ok(self
            .entries
            .iter()
            .filter(|e| in_scope(e.dn(), base, scope) && matches_filter(e, filter))
            .map(|e| project(e, attributes))
            .collect())
    }
}

#[async_trait]
impl DirectoryCompare for InMemoryDirectory {
    async fn compare(&self, dn: &str, attribute: &str, value: &[u8]) -> Result<bool> {
        self.compare_calls.fetch_add(1, Ordering::SeqCst);
        self.check_connection()?;

        let record = self
            .entry(dn)
            .ok_or_else(|| Error::Directory(format!("No such object: {}", dn)))?;

        Ok(record
            .attribute_values(attribute)
            .map(|values| values.iter().any(|v| v.as_slice() == value))
            .unwrap_or(false))
    }
}
