//! # Galeria Core
//!
//! Core library for the Galeria photo gallery: discovers JPEG files under a
//! photo directory and turns them into an in-memory [`PhotoIndex`] of
//! fixed-size thumbnails before the HTTP layer starts serving.
//!
//! ## Overview
//!
//! - **Enumeration**: recursive, case-insensitive `*.jpg` discovery in a
//!   deterministic order ([`enumerate`])
//! - **Bounded concurrency**: a semaphore-backed limiter caps in-flight
//!   thumbnail work ([`limiter`])
//! - **Thumbnails**: orientation-aware decode, contain fit and JPEG encode
//!   ([`thumbnail`])
//! - **Validation tokens**: SHA-256 over the encoded thumbnail bytes
//!   ([`hash`])
//! - **Completion barrier**: [`pipeline::IndexBuilder`] fans work out and
//!   only returns once every slot of the index is populated
//!
//! ## Example
//!
//! ```no_run
//! use galeria_core::{ConcurrencyBudget, IndexBuilder};
//!
//! async fn load(root: &std::path::Path) -> galeria_core::Result<()> {
//!     let index = IndexBuilder::new(ConcurrencyBudget::available_parallelism())
//!         .build_index(root)
//!         .await?;
//!     println!("{} photos ready", index.len());
//!     Ok(())
//! }
//! ```

/// Error taxonomy for the thumbnail pipeline
pub mod error;

/// Recursive JPEG discovery
pub mod enumerate;

/// Content hashing for cache validation
pub mod hash;

/// Bounded-concurrency task admission
pub mod limiter;

/// Photo index data model
pub mod photo;

/// Pipeline driver, state machine and completion barrier
pub mod pipeline;

/// Progress observation hooks
pub mod progress;

/// Decode, orient, fit and encode
pub mod thumbnail;

pub use error::{BatchFailure, GalleryError, Result};
pub use limiter::{ConcurrencyBudget, ConcurrencyLimiter, TaskHandle};
pub use photo::{ImagePath, PhotoIndex, PhotoSlot, ThumbnailRecord};
pub use pipeline::{
    FailurePolicy, IndexBuilder, PipelineState, PipelineStatus,
};
pub use progress::{NoopProgress, ProgressSink, TracingProgress};
pub use thumbnail::ThumbnailSpec;
