//! Extractors that reject with the crate `Error`

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::Error;

/// `Query` whose rejection renders as `{"detail": ...}`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct ApiQuery<T>(pub T);

/// `Form` whose rejection renders as `{"detail": ...}`
#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(Error))]
pub struct ApiForm<T>(pub T);
