//! Image processing pipeline components.
//!
//! This module contains all the stages of the per-image pipeline:
//! - **decode**: Load and decode images from various formats
//! - **discovery**: Find candidate images in a folder
//! - **realism**: Luminance-aware noise and chromatic aberration
//! - **synth**: Synthesize plausible phone capture metadata
//! - **metadata**: Serialize EXIF, and read it back
//! - **encode**: JPEG encoding with quality-dependent chroma subsampling
//! - **processor**: Orchestrates the full pipeline

pub mod decode;
pub mod discovery;
pub mod encode;
pub mod metadata;
pub mod processor;
pub mod realism;
pub mod synth;

// Re-exports for convenient access
pub use decode::{DecodedImage, ImageDecoder, ImageInfo};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use encode::{probe_subsampling, EncodedJpeg, JpegWriter};
pub use metadata::{ExifWriter, MetadataExtractor};
pub use processor::{ImageProcessor, RenderedImage};
pub use realism::RealismEffectEngine;
pub use synth::MetadataSynthesizer;
