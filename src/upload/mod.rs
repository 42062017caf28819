//! Upload validation and persistence for FLAIR/T1ce volume pairs

pub mod multipart;

use axum::body::Bytes;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::error::Result;

pub use multipart::read_files;

pub const FLAIR_SUFFIX: &str = "_flair.nii";
pub const T1CE_SUFFIX: &str = "_t1ce.nii";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Please upload exactly two files (received {0}).")]
    WrongCount(usize),

    #[error("File names must end with '_flair.nii' and '_t1ce.nii'.")]
    BadNaming,

    #[error("Invalid multipart data: {0}")]
    Multipart(String),

    #[error("Upload too large: {0}")]
    TooLarge(String),
}

/// A file received from a client
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content: Bytes,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// Persisted FLAIR/T1ce pair, owned by a single request.
/// The directory is also removed when the pair is dropped without `discard`.
#[derive(Debug)]
pub struct UploadPair {
    dir: PathBuf,
    pub flair_path: PathBuf,
    pub t1ce_path: PathBuf,
    removed: bool,
}

impl UploadPair {
    /// Request-scoped directory holding both files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Remove the request directory and both files
    pub async fn discard(mut self) {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => self.removed = true,
            Err(e) => {
                tracing::warn!("Failed to remove upload dir {}: {}", self.dir.display(), e)
            }
        }
    }
}

impl Drop for UploadPair {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => tracing::debug!("Removed abandoned upload dir {}", self.dir.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!("Failed to remove upload dir {}: {}", self.dir.display(), e)
            }
        }
    }
}

/// Final path component of a client-supplied filename
fn base_name(filename: &str) -> Option<&str> {
    let name = filename.rsplit(['/', '\\']).next()?;
    match name {
        "" | "." | ".." => None,
        name => Some(name),
    }
}

/// Check cardinality and naming of an upload set without touching the filesystem.
/// Returns the files ordered as (flair, t1ce).
pub fn classify(
    files: Vec<UploadedFile>,
) -> std::result::Result<(UploadedFile, UploadedFile), UploadError> {
    if files.len() != 2 {
        return Err(UploadError::WrongCount(files.len()));
    }

    let mut flair = None;
    let mut t1ce = None;

    for file in files {
        let name = base_name(&file.filename).ok_or(UploadError::BadNaming)?;
        let slot = if name.ends_with(FLAIR_SUFFIX) {
            &mut flair
        } else if name.ends_with(T1CE_SUFFIX) {
            &mut t1ce
        } else {
            return Err(UploadError::BadNaming);
        };

        if slot.is_some() {
            return Err(UploadError::BadNaming);
        }
        *slot = Some(UploadedFile {
            filename: name.to_string(),
            content: file.content,
        });
    }

    match (flair, t1ce) {
        (Some(flair), Some(t1ce)) => Ok((flair, t1ce)),
        _ => Err(UploadError::BadNaming),
    }
}

/// Validates upload sets and writes them under a per-request directory
#[derive(Debug, Clone)]
pub struct UploadValidator {
    root: PathBuf,
}

impl UploadValidator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate `files` and persist them. Nothing is written unless
    /// the set holds exactly one FLAIR and one T1ce file.
    pub async fn validate(&self, files: Vec<UploadedFile>) -> Result<UploadPair> {
        let (flair, t1ce) = classify(files)?;

        let dir = self.root.join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&dir).await?;

        let pair = UploadPair {
            flair_path: dir.join(&flair.filename),
            t1ce_path: dir.join(&t1ce.filename),
            dir,
            removed: false,
        };

        let written = async {
            tokio::fs::write(&pair.flair_path, &flair.content).await?;
            tokio::fs::write(&pair.t1ce_path, &t1ce.content).await
        }
        .await;

        if let Err(e) = written {
            pair.discard().await;
            return Err(e.into());
        }

        tracing::debug!(
            "Stored upload pair {} and {} in {}",
            flair.filename,
            t1ce.filename,
            pair.dir.display()
        );
        Ok(pair)
    }
}
