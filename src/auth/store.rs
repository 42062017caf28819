//! Credential storage

use crate::auth::models::CredentialRecord;
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Username to credential mapping, loaded once at start-up
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    records: HashMap<String, CredentialRecord>,
}

impl CredentialStore {
    /// Build a store from configured records; duplicate usernames are rejected
    pub fn from_records(records: Vec<CredentialRecord>) -> Result<Self> {
        let mut map = HashMap::with_capacity(records.len());
        for record in records {
            if map.contains_key(&record.username) {
                return Err(Error::Config(format!(
                    "duplicate user '{}' in auth.users",
                    record.username
                )));
            }
            map.insert(record.username.clone(), record);
        }
        Ok(Self { records: map })
    }

    pub fn lookup(&self, username: &str) -> Option<&CredentialRecord> {
        self.records.get(username)
    }

    /// Look up `username` and check `password` against its bcrypt hash.
    /// Unknown users, wrong passwords and unreadable hashes all yield `None`.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<CredentialRecord> {
        let record = self.lookup(username)?;
        match bcrypt::verify(password, &record.password_hash) {
            Ok(true) => Some(record.clone()),
            Ok(false) => None,
            Err(e) => {
                tracing::warn!("Unreadable password hash for user {}: {}", username, e);
                None
            }
        }
    }

    /// All records, sorted by username
    pub fn records(&self) -> Vec<&CredentialRecord> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by(|a, b| a.username.cmp(&b.username));
        records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
