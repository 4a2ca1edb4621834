//! JPEG encoding with phone-style chroma subsampling and an APP1 EXIF segment.

use image::RgbImage;
use jpeg_encoder::{ColorType, Encoder, SamplingFactor};
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{ChromaSubsampling, EffectConfig};

/// Bytes of one encoded JPEG.
#[derive(Debug, Clone)]
pub struct EncodedJpeg {
    pub bytes: Vec<u8>,
    pub subsampling: ChromaSubsampling,
    /// Whether the EXIF segment made it into the file
    pub exif_embedded: bool,
}

/// Encodes RGB buffers the way a phone camera would.
pub struct JpegWriter;

impl JpegWriter {
    /// Encode `image` at the configured quality.
    ///
    /// 4:4:4 at quality >= 90, 4:2:0 below. A rejected EXIF segment is
    /// logged and the image is encoded without it; `source` is only used
    /// for error and log context.
    pub fn encode(
        image: &RgbImage,
        effects: &EffectConfig,
        exif_app1: Option<&[u8]>,
        source: &Path,
    ) -> PipelineResult<EncodedJpeg> {
        let (width, height) = image.dimensions();
        let (w, h) = match (u16::try_from(width), u16::try_from(height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                return Err(PipelineError::Encode {
                    path: source.to_path_buf(),
                    message: format!("{width}x{height} exceeds the JPEG size limit"),
                })
            }
        };

        let subsampling = effects.subsampling();
        let mut bytes = Vec::new();
        let mut encoder = Encoder::new(&mut bytes, effects.clamped_quality());
        encoder.set_sampling_factor(match subsampling {
            ChromaSubsampling::Full444 => SamplingFactor::F_1_1,
            ChromaSubsampling::Half420 => SamplingFactor::F_2_2,
        });

        let mut exif_embedded = false;
        if let Some(payload) = exif_app1 {
            match encoder.add_app_segment(1, payload) {
                Ok(()) => exif_embedded = true,
                Err(e) => tracing::warn!(
                    "Writing {:?} without synthesized metadata: EXIF segment rejected ({})",
                    source,
                    e
                ),
            }
        }

        encoder
            .encode(image.as_raw(), w, h, ColorType::Rgb)
            .map_err(|e| PipelineError::Encode {
                path: source.to_path_buf(),
                message: e.to_string(),
            })?;

        Ok(EncodedJpeg {
            bytes,
            subsampling,
            exif_embedded,
        })
    }
}

/// Read the chroma subsampling from a JPEG's frame header.
///
/// Returns `None` for non-JPEG data, grayscale frames, or layouts other than
/// 4:4:4 and 4:2:0.
pub fn probe_subsampling(bytes: &[u8]) -> Option<ChromaSubsampling> {
    if bytes.get(0..2)? != [0xFF, 0xD8] {
        return None;
    }

    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        let len = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
        let segment = bytes.get(pos + 4..pos + 2 + len)?;

        match marker {
            0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => {
                return parse_frame_sampling(segment)
            }
            // Start of scan: no frame header seen.
            0xDA => return None,
            _ => pos += 2 + len,
        }
    }
    None
}

fn parse_frame_sampling(frame: &[u8]) -> Option<ChromaSubsampling> {
    // precision(1) height(2) width(2) components(1), then id/sampling/table per component
    let components = *frame.get(5)? as usize;
    if components < 3 {
        return None;
    }
    let luma = *frame.get(7)?;
    let cb = *frame.get(10)?;
    let cr = *frame.get(13)?;

    match (luma, cb, cr) {
        (y, b, r) if y == b && b == r => Some(ChromaSubsampling::Full444),
        (0x22, 0x11, 0x11) => Some(ChromaSubsampling::Half420),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::metadata::{ExifWriter, MetadataExtractor};
    use crate::pipeline::synth::MetadataSynthesizer;
    use chrono::Local;
    use image::Rgb;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gradient() -> RgbImage {
        RgbImage::from_fn(48, 32, |x, y| Rgb([(x * 5) as u8, (y * 7) as u8, 120]))
    }

    fn effects(quality: u8) -> EffectConfig {
        EffectConfig {
            quality,
            apply_realism: false,
        }
    }

    #[test]
    fn test_subsampling_follows_quality() {
        for (quality, expected) in [
            (50, ChromaSubsampling::Half420),
            (85, ChromaSubsampling::Half420),
            (89, ChromaSubsampling::Half420),
            (90, ChromaSubsampling::Full444),
            (100, ChromaSubsampling::Full444),
        ] {
            let encoded =
                JpegWriter::encode(&gradient(), &effects(quality), None, Path::new("g.png"))
                    .unwrap();
            assert_eq!(encoded.subsampling, expected, "quality {quality}");
            assert_eq!(
                probe_subsampling(&encoded.bytes),
                Some(expected),
                "quality {quality}"
            );
        }
    }

    #[test]
    fn test_output_decodes() {
        let encoded =
            JpegWriter::encode(&gradient(), &effects(85), None, Path::new("g.png")).unwrap();
        let decoded = image::load_from_memory(&encoded.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (48, 32));
    }

    #[test]
    fn test_exif_segment_embedded() {
        let meta = MetadataSynthesizer::default()
            .synthesize(&mut StdRng::seed_from_u64(8), Local::now().naive_local());
        let payload = ExifWriter::app1_payload(&meta, 48, 32).unwrap();

        let encoded = JpegWriter::encode(
            &gradient(),
            &effects(92),
            Some(payload.as_slice()),
            Path::new("g.png"),
        )
        .unwrap();
        assert!(encoded.exif_embedded);

        let data = MetadataExtractor::extract_from_bytes(&encoded.bytes).unwrap();
        assert_eq!(data.camera_model.as_deref(), Some(meta.model.as_str()));
    }

    #[test]
    fn test_oversized_exif_degrades_to_plain_image() {
        let payload = vec![0u8; 70_000];
        let encoded = JpegWriter::encode(
            &gradient(),
            &effects(75),
            Some(payload.as_slice()),
            Path::new("g.png"),
        )
        .unwrap();
        assert!(!encoded.exif_embedded);
        assert!(MetadataExtractor::extract_from_bytes(&encoded.bytes).is_none());
        assert!(image::load_from_memory(&encoded.bytes).is_ok());
    }

    #[test]
    fn test_probe_rejects_non_jpeg() {
        assert_eq!(probe_subsampling(b"\x89PNG\r\n\x1a\n"), None);
        assert_eq!(probe_subsampling(&[]), None);
    }
}
