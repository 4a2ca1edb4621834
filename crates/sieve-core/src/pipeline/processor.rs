//! Pipeline orchestration: decode, realism, metadata synthesis, encode, write.

use chrono::Local;
use rand::Rng;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{EffectConfig, ProcessReport, SynthesizedMetadata};

use super::decode::ImageDecoder;
use super::encode::{EncodedJpeg, JpegWriter};
use super::metadata::ExifWriter;
use super::realism::RealismEffectEngine;
use super::synth::MetadataSynthesizer;

/// An output image rendered in memory, not yet on disk.
pub struct RenderedImage {
    pub jpeg: EncodedJpeg,
    pub width: u32,
    pub height: u32,
    /// `None` when embedding failed and the JPEG carries no EXIF
    pub metadata: Option<SynthesizedMetadata>,
}

impl RenderedImage {
    /// Describe this render as written to `output`.
    pub fn report(&self, source: &Path, output: &Path, effects: &EffectConfig) -> ProcessReport {
        ProcessReport {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            width: self.width,
            height: self.height,
            quality: effects.clamped_quality(),
            subsampling: self.jpeg.subsampling,
            metadata: self.metadata.clone(),
        }
    }
}

/// Turns one source image into one phone-style JPEG.
#[derive(Debug, Clone, Default)]
pub struct ImageProcessor {
    decoder: ImageDecoder,
    realism: RealismEffectEngine,
    synthesizer: MetadataSynthesizer,
}

impl ImageProcessor {
    /// Create a new image processor with the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            realism: RealismEffectEngine::new(),
            synthesizer: MetadataSynthesizer::new(config.metadata.clone()),
        }
    }

    /// Render `source` into JPEG bytes.
    ///
    /// Fails if the source cannot be decoded or encoded. An EXIF block that
    /// cannot be built is logged and the image is rendered without it.
    pub fn render<R: Rng + ?Sized>(
        &self,
        source: &Path,
        effects: &EffectConfig,
        rng: &mut R,
    ) -> PipelineResult<RenderedImage> {
        let start = std::time::Instant::now();
        tracing::debug!("Rendering: {:?}", source);

        let decoded = self.decoder.decode(source)?;
        tracing::trace!("  Decode: {:?}", start.elapsed());

        let effect_start = std::time::Instant::now();
        let pixels = if effects.apply_realism {
            self.realism.apply(&decoded.image, rng)
        } else {
            decoded.image.to_rgb8()
        };
        drop(decoded.image);
        tracing::trace!("  Effects: {:?}", effect_start.elapsed());

        let metadata = self.synthesizer.synthesize(rng, Local::now().naive_local());
        let (width, height) = pixels.dimensions();
        let payload = match ExifWriter::app1_payload(&metadata, width, height) {
            Ok(payload) => Some(payload),
            Err(e) => {
                let err = PipelineError::Metadata {
                    path: source.to_path_buf(),
                    message: e.to_string(),
                };
                tracing::warn!("Writing without synthesized metadata: {}", err);
                None
            }
        };

        let encode_start = std::time::Instant::now();
        let jpeg = JpegWriter::encode(&pixels, effects, payload.as_deref(), source)?;
        tracing::trace!("  Encode: {:?}", encode_start.elapsed());

        tracing::debug!(
            "Rendered {:?} in {:?} ({}x{}, q{}, {})",
            source,
            start.elapsed(),
            width,
            height,
            effects.clamped_quality(),
            jpeg.subsampling
        );

        let metadata = jpeg.exif_embedded.then_some(metadata);
        Ok(RenderedImage {
            jpeg,
            width,
            height,
            metadata,
        })
    }

    /// Render `source` and write it to `dest`.
    ///
    /// On failure `dest` is left untouched: nothing is written until the
    /// image is fully encoded, and the write goes through a staging file.
    pub fn process<R: Rng + ?Sized>(
        &self,
        source: &Path,
        dest: &Path,
        effects: &EffectConfig,
        rng: &mut R,
    ) -> PipelineResult<ProcessReport> {
        let rendered = self.render(source, effects, rng)?;
        write_atomic(dest, &rendered.jpeg.bytes)?;
        Ok(rendered.report(source, dest, effects))
    }
}

/// Hidden temporary file next to `dest`. Removed on drop unless persisted.
pub(crate) fn staging_file(dest: &Path) -> PipelineResult<NamedTempFile> {
    let dir = match dest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    tempfile::Builder::new()
        .prefix(".sieve-")
        .suffix(".partial")
        .tempfile_in(dir)
        .map_err(|e| PipelineError::write(dest, e))
}

/// Rename a staged file over `dest`.
pub(crate) fn persist(staged: NamedTempFile, dest: &Path) -> PipelineResult<()> {
    staged
        .persist(dest)
        .map(|_| ())
        .map_err(|e| PipelineError::write(dest, e.error))
}

/// Write `bytes` to a fresh staging file and rename it over `dest`.
pub(crate) fn write_atomic(dest: &Path, bytes: &[u8]) -> PipelineResult<()> {
    let mut staged = staging_file(dest)?;
    staged
        .write_all(bytes)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|e| PipelineError::write(dest, e))?;
    persist(staged, dest)
}
