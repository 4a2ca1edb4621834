//! The `sieve inspect` command: what a rendered file actually carries.

use clap::Args;
use console::Style;
use serde::Serialize;
use sieve_core::pipeline::decode::format_to_string;
use sieve_core::pipeline::{probe_subsampling, ImageDecoder, MetadataExtractor};
use sieve_core::{Config, ExifData};
use std::path::{Path, PathBuf};

/// Arguments for the `inspect` command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Image file to inspect
    pub file: PathBuf,

    /// Print a JSON object instead of a summary
    #[arg(long)]
    pub json: bool,
}

/// Everything `inspect` reports about one file.
#[derive(Debug, Serialize)]
pub struct Inspection {
    pub path: PathBuf,
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    /// Only known for baseline JPEGs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chroma_subsampling: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exif: Option<ExifData>,
}

impl Inspection {
    pub fn of(path: &Path, config: &Config) -> anyhow::Result<Self> {
        let info = ImageDecoder::new(config.limits.clone()).probe(path)?;
        let bytes = std::fs::read(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            format: format_to_string(info.format),
            width: info.width,
            height: info.height,
            file_size: bytes.len() as u64,
            chroma_subsampling: probe_subsampling(&bytes).map(|s| s.to_string()),
            exif: MetadataExtractor::extract_from_bytes(&bytes),
        })
    }
}

/// Execute the inspect command.
pub async fn execute(args: InspectArgs, config: &Config) -> anyhow::Result<()> {
    let inspection = Inspection::of(&args.file, config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
    } else {
        print_summary(&inspection);
    }
    Ok(())
}

fn print_summary(inspection: &Inspection) {
    let label = Style::new().bold();
    let dim = Style::new().dim();

    println!("{}", inspection.path.display());
    println!(
        "  {:<14} {} {}x{} ({:.1} KB)",
        label.apply_to("Image:"),
        inspection.format,
        inspection.width,
        inspection.height,
        inspection.file_size as f64 / 1024.0
    );
    if let Some(subsampling) = &inspection.chroma_subsampling {
        println!("  {:<14} {}", label.apply_to("Chroma:"), subsampling);
    }

    let Some(exif) = &inspection.exif else {
        println!("  {:<14} {}", label.apply_to("EXIF:"), dim.apply_to("none"));
        return;
    };

    let rows = [
        ("Camera:", join(&[&exif.camera_make, &exif.camera_model])),
        ("Software:", exif.software.clone()),
        ("Captured:", exif.captured_at.clone()),
        ("Exposure:", exif.shutter_speed.clone()),
        ("Aperture:", exif.aperture.clone()),
        ("ISO:", exif.iso.map(|v| v.to_string())),
        ("Focal length:", exif.focal_length.map(|v| format!("{v:.2} mm"))),
        (
            "GPS:",
            exif.gps_latitude
                .zip(exif.gps_longitude)
                .map(|(lat, lon)| format!("{lat:.5}, {lon:.5}")),
        ),
    ];
    for (name, value) in rows {
        if let Some(value) = value {
            println!("  {:<14} {}", label.apply_to(name), value);
        }
    }
}

fn join(parts: &[&Option<String>]) -> Option<String> {
    let present: Vec<&str> = parts.iter().filter_map(|p| p.as_deref()).collect();
    (!present.is_empty()).then(|| present.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sieve_core::{EffectConfig, ImageProcessor};

    #[test]
    fn inspects_rendered_output() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.png");
        RgbImage::from_pixel(32, 24, Rgb([90, 120, 150]))
            .save(&source)
            .unwrap();
        let dest = dir.path().join("out.jpg");
        let effects = EffectConfig {
            quality: 95,
            apply_realism: true,
        };
        ImageProcessor::default()
            .process(&source, &dest, &effects, &mut StdRng::seed_from_u64(9))
            .unwrap();

        let inspection = Inspection::of(&dest, &Config::default()).unwrap();
        assert_eq!(inspection.format, "jpeg");
        assert_eq!((inspection.width, inspection.height), (32, 24));
        assert_eq!(inspection.chroma_subsampling.as_deref(), Some("4:4:4"));
        let exif = inspection.exif.unwrap();
        assert!(exif.camera_make.is_some());

        let json = serde_json::to_value(Inspection::of(&dest, &Config::default()).unwrap())
            .unwrap();
        assert_eq!(json["format"], "jpeg");
    }

    #[test]
    fn png_has_no_subsampling_or_exif() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("plain.png");
        RgbImage::from_pixel(4, 4, Rgb([0, 0, 0])).save(&source).unwrap();

        let inspection = Inspection::of(&source, &Config::default()).unwrap();
        assert_eq!(inspection.format, "png");
        assert!(inspection.chroma_subsampling.is_none());
        assert!(inspection.exif.is_none());
    }

    #[test]
    fn join_skips_missing_parts() {
        let make = Some("Apple".to_string());
        let none = None;
        assert_eq!(join(&[&make, &none]), Some("Apple".to_string()));
        assert_eq!(join(&[&none, &none]), None);
    }
}
