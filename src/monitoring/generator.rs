//! Drift report generators

use anyhow::{bail, Context};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::config::MonitoringConfig;

/// Writes a drift report as HTML to `dest`
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, dest: &Path) -> anyhow::Result<()>;
}

/// Runs `<command> <args..> --output <dest>`
#[derive(Debug, Clone)]
pub struct ProcessReportGenerator {
    command: String,
    args: Vec<String>,
}

impl ProcessReportGenerator {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn from_config(config: &MonitoringConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }
}

#[async_trait]
impl ReportGenerator for ProcessReportGenerator {
    async fn generate(&self, dest: &Path) -> anyhow::Result<()> {
        let output = Command::new(&self.command)
            .args(&self.args)
            .arg("--output")
            .arg(dest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to run report command '{}'", self.command))?;

        if !output.status.success() {
            bail!(
                "report command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_to_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("report.html");
        let generator = ProcessReportGenerator::new(
            "sh",
            vec![
                "-c".to_string(),
                r#"echo '<html>drift</html>' > "$2""#.to_string(),
                "report".to_string(),
            ],
        );

        generator.generate(&dest).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&dest).unwrap().trim(),
            "<html>drift</html>"
        );
    }

    #[tokio::test]
    async fn test_failure_is_error() {
        let generator = ProcessReportGenerator::new(
            "sh",
            vec!["-c".to_string(), "exit 1".to_string(), "report".to_string()],
        );
        assert!(generator.generate(Path::new("/tmp/unused.html")).await.is_err());
    }
}
