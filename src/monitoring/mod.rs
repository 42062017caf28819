//! Drift report generation and on-disk caching

pub mod generator;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Error, Result};

pub use generator::{ProcessReportGenerator, ReportGenerator};

/// Serves the drift report from disk, generating it on the first miss.
/// The cached file is never invalidated; delete it to force regeneration.
pub struct ReportCache {
    path: PathBuf,
    generator: Arc<dyn ReportGenerator>,
    generating: Mutex<()>,
}

impl ReportCache {
    pub fn new(path: impl Into<PathBuf>, generator: Arc<dyn ReportGenerator>) -> Self {
        Self {
            path: path.into(),
            generator,
            generating: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Report HTML, generating it if it is not cached yet
    pub async fn get(&self) -> Result<String> {
        if let Some(html) = self.read_cached().await? {
            return Ok(html);
        }

        let _guard = self.generating.lock().await;

        // Another request may have finished generating while we waited.
        if let Some(html) = self.read_cached().await? {
            return Ok(html);
        }

        self.generate().await?;

        self.read_cached()
            .await?
            .ok_or_else(|| Error::NotFound("Drift report is not available".to_string()))
    }

    async fn read_cached(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(html) => Ok(Some(html)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Generate into a temp file next to the report, then rename it in place
    async fn generate(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report.html".to_string());
        let tmp = self
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        tracing::info!("Generating drift report at {}", self.path.display());

        if let Err(e) = self.generator.generate(&tmp).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            tracing::error!("Drift report generation failed: {:#}", e);
            return Err(Error::NotFound(format!(
                "Drift report is not available: {}",
                e
            )));
        }

        if tokio::fs::metadata(&tmp).await.is_err() {
            return Err(Error::NotFound(
                "Drift report generator produced no output".to_string(),
            ));
        }

        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::info!("Drift report cached at {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReportGenerator for CountingGenerator {
        async fn generate(&self, dest: &Path) -> anyhow::Result<()> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::fs::write(dest, format!("<html>report {}</html>", n)).await?;
            Ok(())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl ReportGenerator for FailingGenerator {
        async fn generate(&self, _dest: &Path) -> anyhow::Result<()> {
            anyhow::bail!("reference data missing")
        }
    }

    #[tokio::test]
    async fn test_generates_once_then_serves_cache() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(CountingGenerator {
            calls: AtomicUsize::new(0),
        });
        let cache = ReportCache::new(dir.path().join("drift.html"), generator.clone());

        let first = cache.get().await.unwrap();
        let second = cache.get().await.unwrap();

        assert_eq!(first, "<html>report 0</html>");
        assert_eq!(first, second);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_generate_once() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(CountingGenerator {
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(ReportCache::new(
            dir.path().join("drift.html"),
            generator.clone(),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get().await.unwrap() })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), "<html>report 0</html>");
        }
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_existing_file_is_served() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drift.html");
        std::fs::write(&path, "<html>cached</html>").unwrap();

        let cache = ReportCache::new(&path, Arc::new(FailingGenerator));
        assert_eq!(cache.get().await.unwrap(), "<html>cached</html>");
    }

    #[tokio::test]
    async fn test_generation_failure_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ReportCache::new(dir.path().join("drift.html"), Arc::new(FailingGenerator));

        let result = cache.get().await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
