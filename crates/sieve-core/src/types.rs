//! Core data types shared across the review loop and the processing pipeline.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Lowest accepted JPEG quality.
pub const MIN_QUALITY: u8 = 50;

/// Highest accepted JPEG quality.
pub const MAX_QUALITY: u8 = 100;

/// Quality at and above which chroma is kept at full resolution.
pub const FULL_CHROMA_QUALITY: u8 = 90;

/// Output settings captured by value when a decision is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectConfig {
    /// JPEG quality (50-100)
    pub quality: u8,
    /// Apply the realism transform before encoding
    pub apply_realism: bool,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            quality: 85,
            apply_realism: true,
        }
    }
}

impl EffectConfig {
    /// Quality clamped into the accepted range.
    pub fn clamped_quality(&self) -> u8 {
        self.quality.clamp(MIN_QUALITY, MAX_QUALITY)
    }

    /// Chroma subsampling a phone encoder would use at this quality.
    pub fn subsampling(&self) -> ChromaSubsampling {
        if self.clamped_quality() >= FULL_CHROMA_QUALITY {
            ChromaSubsampling::Full444
        } else {
            ChromaSubsampling::Half420
        }
    }
}

/// Chroma subsampling of an encoded JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChromaSubsampling {
    /// Full-resolution chroma
    #[serde(rename = "4:4:4")]
    Full444,
    /// Chroma halved in both directions
    #[serde(rename = "4:2:0")]
    Half420,
}

impl fmt::Display for ChromaSubsampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full444 => f.write_str("4:4:4"),
            Self::Half420 => f.write_str("4:2:0"),
        }
    }
}

/// A reviewer's verdict on the current candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Keep,
    Discard,
    Modify,
}

impl Decision {
    /// Output category for accepting decisions; `None` for discard.
    pub fn category(self) -> Option<Category> {
        match self {
            Decision::Keep => Some(Category::Keep),
            Decision::Modify => Some(Category::Modify),
            Decision::Discard => None,
        }
    }
}

/// Output subfolder for an accepted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Keep,
    Modify,
}

impl Category {
    /// Folder name under the base output directory.
    pub fn dir_name(self) -> &'static str {
        match self {
            Category::Keep => "keep",
            Category::Modify => "modify",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// An unsigned EXIF rational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratio {
    pub num: u32,
    pub denom: u32,
}

impl Ratio {
    pub const fn new(num: u32, denom: u32) -> Self {
        Self { num, denom }
    }

    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.denom as f64
    }
}

/// One GPS axis as degree/minute/second rationals plus hemisphere letter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsAxis {
    /// `N`/`S` for latitude, `E`/`W` for longitude
    pub reference: char,
    /// Degrees, minutes, seconds
    pub dms: [Ratio; 3],
}

impl GpsAxis {
    /// Signed decimal degrees.
    pub fn to_decimal(&self) -> f64 {
        let [d, m, s] = self.dms;
        let value = d.to_f64() + m.to_f64() / 60.0 + s.to_f64() / 3600.0;
        if matches!(self.reference, 'S' | 'W') {
            -value
        } else {
            value
        }
    }
}

/// Synthesized GPS block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPosition {
    pub latitude: GpsAxis,
    pub longitude: GpsAxis,
}

/// Fabricated capture metadata for one output image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedMetadata {
    pub make: String,
    pub model: String,
    pub software: String,
    pub captured_at: NaiveDateTime,
    pub exposure_time: Ratio,
    pub f_number: Ratio,
    pub iso: u16,
    pub focal_length: Ratio,
    pub digital_zoom: Ratio,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps: Option<GpsPosition>,
}

impl SynthesizedMetadata {
    /// Capture time in EXIF form: `YYYY:MM:DD HH:MM:SS`.
    pub fn exif_datetime(&self) -> String {
        self.captured_at.format(EXIF_DATETIME_FORMAT).to_string()
    }
}

/// EXIF DateTime layout.
pub const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// EXIF metadata read back from a file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExifData {
    /// When the photo was captured (EXIF DateTime form)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<String>,

    /// Camera manufacturer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_make: Option<String>,

    /// Camera model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_model: Option<String>,

    /// Processing software
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software: Option<String>,

    /// GPS latitude (decimal degrees)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_latitude: Option<f64>,

    /// GPS longitude (decimal degrees)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_longitude: Option<f64>,

    /// ISO sensitivity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso: Option<u32>,

    /// Aperture (e.g., "f/1.8")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aperture: Option<String>,

    /// Shutter speed (e.g., "1/125")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutter_speed: Option<String>,

    /// Focal length in mm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<f32>,
}

/// What a successful pipeline run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub subsampling: ChromaSubsampling,
    /// `None` when embedding failed and the image was written without EXIF
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SynthesizedMetadata>,
}

/// Files produced by one accepted decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Committed {
    pub category: Category,
    pub archived: PathBuf,
    pub processed: PathBuf,
    pub report: ProcessReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsampling_threshold() {
        let at = |quality| EffectConfig {
            quality,
            apply_realism: false,
        };
        assert_eq!(at(50).subsampling(), ChromaSubsampling::Half420);
        assert_eq!(at(89).subsampling(), ChromaSubsampling::Half420);
        assert_eq!(at(90).subsampling(), ChromaSubsampling::Full444);
        assert_eq!(at(100).subsampling(), ChromaSubsampling::Full444);
    }

    #[test]
    fn test_decision_categories() {
        assert_eq!(Decision::Keep.category(), Some(Category::Keep));
        assert_eq!(Decision::Modify.category(), Some(Category::Modify));
        assert_eq!(Decision::Discard.category(), None);
        assert_eq!(Category::Modify.dir_name(), "modify");
    }

    #[test]
    fn test_gps_axis_sign() {
        let axis = GpsAxis {
            reference: 'W',
            dms: [Ratio::new(118, 1), Ratio::new(15, 1), Ratio::new(0, 100)],
        };
        assert!((axis.to_decimal() + 118.25).abs() < 1e-9);
    }

    #[test]
    fn test_report_json_shape() {
        let report = ProcessReport {
            source: PathBuf::from("/in/a.png"),
            output: PathBuf::from("/out/keep/IMG_20240101_000000.jpg"),
            width: 4,
            height: 3,
            quality: 85,
            subsampling: ChromaSubsampling::Half420,
            metadata: None,
        };
        let json = serde_json::to_value(Committed {
            category: Category::Keep,
            archived: PathBuf::from("/out/archive/a.png"),
            processed: report.output.clone(),
            report,
        })
        .unwrap();

        assert_eq!(json["category"], "keep");
        assert_eq!(json["report"]["subsampling"], "4:2:0");
        assert!(json["report"].get("metadata").is_none());
    }
}
