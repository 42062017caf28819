//! Bounded dispatch of inference calls

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use super::{Evaluation, InferenceError, Prediction, SegmentationModel};
use crate::upload::UploadPair;

/// Aborts the wrapped task when dropped, so an abandoned request
/// does not leave the model call running.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Thin dispatcher in front of the model. Adds no retries, batching or caching.
#[derive(Clone)]
pub struct InferenceOrchestrator {
    model: Arc<dyn SegmentationModel>,
    timeout: Duration,
}

impl InferenceOrchestrator {
    pub fn new(model: Arc<dyn SegmentationModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn predict(&self, pair: &UploadPair) -> Result<Prediction, InferenceError> {
        let model = Arc::clone(&self.model);
        let (flair, t1ce) = (pair.flair_path.clone(), pair.t1ce_path.clone());
        let prediction = self
            .dispatch("predict", async move { model.predict(&flair, &t1ce).await })
            .await?;
        checked(prediction)
    }

    pub async fn predict_segmented(
        &self,
        pair: &UploadPair,
        slice: usize,
    ) -> Result<Prediction, InferenceError> {
        let model = Arc::clone(&self.model);
        let (flair, t1ce) = (pair.flair_path.clone(), pair.t1ce_path.clone());
        let prediction = self
            .dispatch("predict_segmented", async move {
                model.predict_segmented(&flair, &t1ce, slice).await
            })
            .await?;
        checked(prediction)
    }

    pub async fn predict_case(
        &self,
        case_id: &str,
        start_slice: usize,
    ) -> Result<Prediction, InferenceError> {
        let model = Arc::clone(&self.model);
        let case_id = case_id.to_string();
        let prediction = self
            .dispatch("predict_case", async move {
                model.predict_case(&case_id, start_slice).await
            })
            .await?;
        checked(prediction)
    }

    pub async fn evaluate(&self) -> Result<Evaluation, InferenceError> {
        let model = Arc::clone(&self.model);
        let evaluation = self
            .dispatch("evaluate", async move { model.evaluate().await })
            .await?;
        evaluation.check()?;
        Ok(evaluation)
    }

    /// Run a model call on its own task under the configured timeout.
    /// Errors and panics from the model surface as `ModelFailure`.
    async fn dispatch<T, F>(&self, op: &'static str, call: F) -> Result<T, InferenceError>
    where
        T: Send + 'static,
        F: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let started = Instant::now();
        let mut task = AbortOnDrop(tokio::spawn(call));

        let outcome = match tokio::time::timeout(self.timeout, &mut task.0).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(e))) => Err(InferenceError::ModelFailure(format!("{:#}", e))),
            Ok(Err(join_err)) if join_err.is_panic() => Err(InferenceError::ModelFailure(
                "model panicked during inference".to_string(),
            )),
            Ok(Err(join_err)) => Err(InferenceError::ModelFailure(join_err.to_string())),
            Err(_) => Err(InferenceError::Timeout(self.timeout)),
        };

        match &outcome {
            Ok(_) => tracing::info!("{} finished in {:?}", op, started.elapsed()),
            Err(e) => tracing::error!("{} failed after {:?}: {}", op, started.elapsed(), e),
        }
        outcome
    }
}

fn checked(prediction: Prediction) -> Result<Prediction, InferenceError> {
    if !prediction.is_consistent() {
        let needed = match prediction.expected_len() {
            Some(len) => len.to_string(),
            None => "more than usize::MAX".to_string(),
        };
        return Err(InferenceError::ModelFailure(format!(
            "prediction has {} values but shape {:?} needs {}",
            prediction.data.len(),
            prediction.shape,
            needed
        )));
    }
    Ok(prediction)
}
