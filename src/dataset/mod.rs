//! Dataset case index

use std::path::Path;

use crate::error::{Error, Result};

/// Ordered case identifiers found under the dataset directory
#[derive(Debug, Clone, Default)]
pub struct DatasetIndex {
    ids: Vec<String>,
}

impl DatasetIndex {
    pub fn new(mut ids: Vec<String>) -> Self {
        ids.sort();
        Self { ids }
    }

    /// Index every sub-directory of `dir` as a case.
    /// A missing directory yields an empty index.
    pub fn scan(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            tracing::warn!("Dataset directory {} does not exist", dir.display());
            return Ok(Self::default());
        }

        let mut ids = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                ids.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        tracing::info!("Indexed {} cases in {}", ids.len(), dir.display());
        Ok(Self::new(ids))
    }

    pub fn list_ids(&self) -> &[String] {
        &self.ids
    }

    /// Full identifier of the `num`-th case
    pub fn case_id(&self, num: usize) -> Result<&str> {
        self.ids
            .get(num)
            .map(String::as_str)
            .ok_or_else(|| Error::NotFound(format!("No case at index {}", num)))
    }

    /// Short case number: the last three characters of the identifier
    pub fn case(&self, num: usize) -> Result<String> {
        let id = self.case_id(num)?;
        let chars: Vec<char> = id.chars().collect();
        let start = chars.len().saturating_sub(3);
        Ok(chars[start..].iter().collect())
    }
}
