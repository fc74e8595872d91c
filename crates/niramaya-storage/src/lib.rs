//! Niramaya Storage Library
//!
//! This crate provides the storage sink abstraction used by the upload pipeline and
//! its local filesystem implementation.
//!
//! # Storage key format
//!
//! Keys are flat object names generated by the upload pipeline (`{base}-{token}{ext}`).
//! They must be a single path component: no separators, no `.` or `..`.

#[cfg(feature = "storage-local")]
pub mod local;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use traits::{StorageError, StorageResult, StorageSink, WriteDestination};
