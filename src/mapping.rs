use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Legacy account id (shadow account) to email, keyed case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct AccountMapping {
    entries: HashMap<String, String>,
}

impl AccountMapping {
    /// Reads the CSV at `path`. Unreadable files are an error; malformed rows are not.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read CSV mapping {}", path.display()))?;
        // Legacy exports are not always UTF-8; bad bytes become U+FFFD
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    /// Parses `email,legacy-account-id` rows. The first line is always a header.
    pub fn parse(content: &str) -> Self {
        let mut mapping = Self::default();

        for line in content.lines().skip(1) {
            let cols: Vec<&str> = line.split(',').collect();
            if cols.len() < 2 {
                continue;
            }

            let email = cols[0].trim();
            let account = cols[1].trim();

            // First row for an account wins
            mapping
                .entries
                .entry(account.to_lowercase())
                .or_insert_with(|| email.to_string());
        }

        mapping
    }

    pub fn get(&self, account: &str) -> Option<&str> {
        self.entries
            .get(&account.to_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
