//! Error types for segmentd

use axum::{
    extract::multipart::MultipartRejection,
    extract::rejection::{FormRejection, QueryRejection},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::auth::TokenError;
use crate::inference::InferenceError;
use crate::upload::UploadError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file not found. Run 'segmentd init' first.")]
    ConfigNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{message}")]
    InvalidRequest { status: StatusCode, message: String },

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Short tag for the failure kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) | Error::ConfigNotFound | Error::TomlParse(_) => "config",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Template(_) => "template",
            Error::Unauthenticated(_) => "unauthenticated",
            Error::Forbidden(_) => "forbidden",
            Error::InvalidRequest { .. } | Error::Upload(_) => "bad_request",
            Error::Inference(_) => "inference",
            Error::NotFound(_) => "not_found",
            Error::Other(_) => "other",
        }
    }

    /// HTTP status this error collapses to at the response boundary
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::InvalidRequest { status, .. } => *status,
            Error::Upload(UploadError::TooLarge(_)) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Upload(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Inference(InferenceError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TokenError> for Error {
    fn from(err: TokenError) -> Self {
        Error::Unauthenticated(format!("Could not validate credentials: {}", err))
    }
}

// Extractor rejections keep axum's status but use the `{"detail"}` body

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::InvalidRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<FormRejection> for Error {
    fn from(rejection: FormRejection) -> Self {
        Error::InvalidRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<MultipartRejection> for Error {
    fn from(rejection: MultipartRejection) -> Self {
        Error::InvalidRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();

        if status.is_server_error() {
            tracing::error!(kind = self.kind(), status = %status, "{}", detail);
        } else {
            tracing::warn!(kind = self.kind(), status = %status, "{}", detail);
        }

        let body = Json(serde_json::json!({ "detail": detail }));
        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_unauthenticated_advertises_bearer() {
        let response = Error::Unauthenticated("missing token".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            Error::Forbidden("no".to_string()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            Error::Upload(UploadError::WrongCount(3)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Inference(InferenceError::ModelFailure("boom".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::Inference(InferenceError::Timeout(Duration::from_secs(5))).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            Error::NotFound("gone".to_string()).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_upload_too_large_is_413() {
        assert_eq!(
            Error::Upload(UploadError::TooLarge("length limit exceeded".to_string())).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_invalid_request_keeps_status() {
        let err = Error::InvalidRequest {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "missing field `password`".to_string(),
        };
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.kind(), "bad_request");
    }

    #[test]
    fn test_forbidden_has_no_auth_header() {
        let response = Error::Forbidden("Not enough permissions".to_string()).into_response();
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
