//! Sieve Core - review-and-render library for image curation.
//!
//! A reviewer walks a folder of images and decides keep, discard or modify
//! for each one. Accepted images are archived untouched and re-rendered as a
//! phone-style JPEG: sensor noise, slight chromatic aberration and freshly
//! synthesized capture metadata.
//!
//! # Architecture
//!
//! ```text
//! ReviewQueue → decision → settings snapshot → TaskDispatcher
//!                                                  ↓
//!   ArchiveCoordinator: copy to archive/ + Decode → Realism → Synthesize EXIF → Encode → <category>/
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use sieve_core::{Config, ReviewSession};
//!
//! #[tokio::main]
//! async fn main() -> sieve_core::Result<()> {
//!     let config = Config::load()?;
//!     let (mut session, _outcomes) = ReviewSession::new(config, tokio::runtime::Handle::current());
//!     session.load_folder("./holiday".as_ref())?;
//!     session.keep()?;
//!     session.shutdown().await;
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod archive;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod pipeline;
pub mod review;
pub mod session;
pub mod types;

// Re-exports for convenient access
pub use archive::ArchiveCoordinator;
pub use config::Config;
pub use dispatch::{JobId, JobOutcome, TaskDispatcher};
pub use error::{
    ConfigError, DispatchError, JobError, PipelineError, PipelineResult, Result, SieveError,
};
pub use pipeline::ImageProcessor;
pub use review::{Decided, ReviewQueue, ReviewState};
pub use session::{DecisionReceipt, ReviewSession};
pub use types::{
    Category, ChromaSubsampling, Committed, Decision, EffectConfig, ExifData, ProcessReport,
    SynthesizedMetadata,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
