//! API route handlers

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::extract::{ApiForm, ApiQuery};
use super::server::AppState;
use crate::auth::{require_role, Claims, LoginForm, Role, TokenResponse};
use crate::error::{Error, Result};
use crate::inference::Prediction;
use crate::upload;

/// Default slice for the segmented views
const DEFAULT_SLICE: usize = 60;

// Request/Response types

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: serde_json::Value,
}

impl From<Prediction> for PredictionResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            prediction: prediction.to_nested(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SliceQuery {
    pub slice: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CaseQuery {
    pub num: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CasePredictionQuery {
    pub numcase: usize,
    pub start_slice: Option<usize>,
}

// Public routes

pub async fn welcome() -> Json<MessageResponse> {
    Json(MessageResponse::new("Welcome"))
}

pub async fn login(
    State(state): State<AppState>,
    ApiForm(form): ApiForm<LoginForm>,
) -> Result<Json<TokenResponse>> {
    let store = Arc::clone(&state.credentials);
    let username = form.username.clone();

    // bcrypt verification is CPU bound
    let record = tokio::task::spawn_blocking(move || {
        store.authenticate(&form.username, &form.password)
    })
    .await
    .map_err(|e| Error::Other(format!("login task failed: {}", e)))?;

    let Some(record) = record else {
        tracing::warn!("Failed login for {}", username);
        return Err(Error::Unauthenticated(
            "Incorrect username or password".to_string(),
        ));
    };

    let token = state
        .tokens
        .issue(&record.username, record.role)
        .map_err(|e| Error::Other(e.to_string()))?;

    tracing::info!("Issued token for {} ({})", record.username, record.role);
    Ok(Json(TokenResponse::bearer(token)))
}

pub async fn monitoring(State(state): State<AppState>) -> Result<Html<String>> {
    Ok(Html(state.reports.get().await?))
}

// Authenticated routes

pub async fn read_users_me(Extension(claims): Extension<Claims>) -> Json<Claims> {
    Json(claims)
}

pub async fn predict(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResponse>> {
    let files = upload::read_files(multipart?).await?;
    let pair = state.uploads.validate(files).await?;

    tracing::info!("Prediction requested by {}", claims.sub);
    let result = state.inference.predict(&pair).await;
    pair.discard().await;

    Ok(Json(result?.into()))
}

pub async fn show_predict_segmented(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiQuery(query): ApiQuery<SliceQuery>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResponse>> {
    let slice = query.slice.unwrap_or(DEFAULT_SLICE);
    let files = upload::read_files(multipart?).await?;
    let pair = state.uploads.validate(files).await?;

    tracing::info!("Segmented view at slice {} requested by {}", slice, claims.sub);
    let result = state.inference.predict_segmented(&pair, slice).await;
    pair.discard().await;

    Ok(Json(result?.into()))
}

pub async fn show_predicts_by_id(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CasePredictionQuery>,
) -> Result<Json<PredictionResponse>> {
    let case = state.dataset.case(query.numcase)?;
    let start_slice = query.start_slice.unwrap_or(DEFAULT_SLICE);

    let prediction = state.inference.predict_case(&case, start_slice).await?;
    Ok(Json(prediction.into()))
}

pub async fn samples_list(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.dataset.list_ids().to_vec())
}

pub async fn get_case(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CaseQuery>,
) -> Result<Json<String>> {
    Ok(Json(state.dataset.case(query.num.unwrap_or(0))?))
}

// Admin routes

/// Model metrics as a JSON object, or as an HTML table when the client accepts HTML
pub async fn evaluate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> Result<Response> {
    require_role(&claims, Role::Admin)?;

    let evaluation = state.inference.evaluate().await?;

    if wants_html(&headers) {
        Ok(Html(evaluation.to_html()?).into_response())
    } else {
        Ok(Json(evaluation.to_map()).into_response())
    }
}

pub async fn show_drift(Extension(claims): Extension<Claims>) -> Result<Json<MessageResponse>> {
    require_role(&claims, Role::Admin)?;
    Ok(Json(MessageResponse::new(
        "No drift detected (this is a placeholder)",
    )))
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("text/html"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_wants_html() {
        let mut headers = HeaderMap::new();
        assert!(!wants_html(&headers));

        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        assert!(!wants_html(&headers));

        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        assert!(wants_html(&headers));
    }

    #[test]
    fn test_prediction_response_nests() {
        let response = PredictionResponse::from(Prediction::new(vec![1, 2], vec![0.0, 1.0]));
        assert_eq!(response.prediction, serde_json::json!([[0.0, 1.0]]));
    }
}
