//! Segmentation model backed by an external command

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::{Evaluation, Prediction, SegmentationModel};
use crate::config::ModelConfig;

/// Runs `<command> <args..> <subcommand> ...` and reads JSON from stdout.
///
/// Subcommands:
/// - `predict --flair F --t1ce T` -> `{"shape": [...], "data": [...]}`
/// - `segmented --flair F --t1ce T --slice N` -> same
/// - `case --case-id ID --start-slice N` -> same
/// - `evaluate` -> `{"metrics": [...], "labels": [...]}`
#[derive(Debug, Clone)]
pub struct ProcessModel {
    command: String,
    args: Vec<String>,
}

impl ProcessModel {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }

    fn command(&self, subcommand: &str) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .arg(subcommand)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn run<T: DeserializeOwned>(&self, mut cmd: Command) -> anyhow::Result<T> {
        let output = cmd
            .output()
            .await
            .with_context(|| format!("failed to run model command '{}'", self.command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "model command exited with {}: {}",
                output.status,
                stderr.trim()
            );
        }

        serde_json::from_slice(&output.stdout).context("model command produced invalid JSON")
    }
}

#[async_trait]
impl SegmentationModel for ProcessModel {
    async fn predict(&self, flair: &Path, t1ce: &Path) -> anyhow::Result<Prediction> {
        let mut cmd = self.command("predict");
        cmd.arg("--flair").arg(flair).arg("--t1ce").arg(t1ce);
        self.run(cmd).await
    }

    async fn predict_segmented(
        &self,
        flair: &Path,
        t1ce: &Path,
        slice: usize,
    ) -> anyhow::Result<Prediction> {
        let mut cmd = self.command("segmented");
        cmd.arg("--flair")
            .arg(flair)
            .arg("--t1ce")
            .arg(t1ce)
            .arg("--slice")
            .arg(slice.to_string());
        self.run(cmd).await
    }

    async fn predict_case(&self, case_id: &str, start_slice: usize) -> anyhow::Result<Prediction> {
        let mut cmd = self.command("case");
        cmd.arg("--case-id")
            .arg(case_id)
            .arg("--start-slice")
            .arg(start_slice.to_string());
        self.run(cmd).await
    }

    async fn evaluate(&self) -> anyhow::Result<Evaluation> {
        let cmd = self.command("evaluate");
        self.run(cmd).await
    }
}
