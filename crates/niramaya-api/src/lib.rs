//! Niramaya API Library
//!
//! This crate provides the HTTP handlers, the streaming upload pipeline and the
//! application setup.

mod handlers;
pub mod services;
pub mod setup;

pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError, SuccessResponse};
pub use state::{AppState, UploadState};
