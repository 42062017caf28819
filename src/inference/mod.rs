//! Inference dispatch to the external segmentation model

pub mod evaluation;
pub mod orchestrator;
pub mod process;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub use evaluation::Evaluation;
pub use orchestrator::InferenceOrchestrator;
pub use process::ProcessModel;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    #[error("Model failure: {0}")]
    ModelFailure(String),

    #[error("Inference timed out after {0:?}")]
    Timeout(Duration),
}

/// The segmentation model collaborator.
///
/// Implementations may block for a long time; callers bound every call
/// with a timeout and drop the future on expiry.
#[async_trait]
pub trait SegmentationModel: Send + Sync {
    /// Segment a FLAIR/T1ce volume pair
    async fn predict(&self, flair: &Path, t1ce: &Path) -> anyhow::Result<Prediction>;

    /// Segment a pair and return the view centred on `slice`
    async fn predict_segmented(
        &self,
        flair: &Path,
        t1ce: &Path,
        slice: usize,
    ) -> anyhow::Result<Prediction>;

    /// Segment a case from the model's own dataset
    async fn predict_case(&self, case_id: &str, start_slice: usize) -> anyhow::Result<Prediction>;

    /// Evaluate on the held-out test set
    async fn evaluate(&self) -> anyhow::Result<Evaluation>;
}

/// Dense row-major numeric volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl Prediction {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
        Self { shape, data }
    }

    /// Number of elements implied by the shape, `None` if it overflows
    pub fn expected_len(&self) -> Option<usize> {
        element_count(&self.shape)
    }

    pub fn is_consistent(&self) -> bool {
        self.expected_len() == Some(self.data.len())
    }

    /// Nested JSON arrays whose nesting follows `shape`.
    /// Null when the data does not fill the shape.
    pub fn to_nested(&self) -> Value {
        if !self.is_consistent() {
            return Value::Null;
        }
        nest(&self.data, &self.shape)
    }
}

fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

// Callers guarantee `data.len()` equals the element count of `shape`.
fn nest(data: &[f32], shape: &[usize]) -> Value {
    match shape.split_first() {
        None => data.first().map(|v| serde_json::json!(v)).unwrap_or(Value::Null),
        Some((0, _)) => Value::Array(Vec::new()),
        Some((_, [])) => Value::Array(data.iter().map(|v| serde_json::json!(v)).collect()),
        Some((&len, rest)) => {
            let stride = data.len() / len;
            Value::Array(
                (0..len)
                    .map(|i| nest(&data[i * stride..(i + 1) * stride], rest))
                    .collect(),
            )
        }
    }
}
