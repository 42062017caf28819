//! segmentd - authenticated HTTP gateway for brain tumor segmentation
//!
//! Issues bearer tokens, gates prediction, evaluation and drift-report
//! endpoints behind them, and dispatches validated uploads to an external
//! segmentation model.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod inference;
pub mod monitoring;
pub mod upload;

pub use config::Config;
pub use error::Error;
