//! EXIF serialization of synthesized metadata, and EXIF read-back.

use exif::experimental::Writer;
use exif::{Field, In, Reader, Tag, Value};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

use crate::types::{ExifData, GpsAxis, Ratio, SynthesizedMetadata};

/// Identifier that opens a JPEG APP1 EXIF payload.
pub const EXIF_APP1_HEADER: &[u8] = b"Exif\0\0";

/// Serializes synthesized metadata into a TIFF-structured EXIF block.
pub struct ExifWriter;

impl ExifWriter {
    /// Build the APP1 payload (`Exif\0\0` + TIFF) for an image of the given size.
    pub fn app1_payload(
        metadata: &SynthesizedMetadata,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, exif::Error> {
        let fields = Self::fields(metadata, width, height);
        let mut writer = Writer::new();
        for field in &fields {
            writer.push_field(field);
        }

        let mut tiff = Cursor::new(Vec::new());
        writer.write(&mut tiff, false)?;

        let mut payload = EXIF_APP1_HEADER.to_vec();
        payload.extend_from_slice(&tiff.into_inner());
        Ok(payload)
    }

    fn fields(metadata: &SynthesizedMetadata, width: u32, height: u32) -> Vec<Field> {
        let datetime = metadata.exif_datetime();
        let mut fields = vec![
            field(Tag::Make, ascii(&metadata.make)),
            field(Tag::Model, ascii(&metadata.model)),
            field(Tag::Software, ascii(&metadata.software)),
            field(Tag::DateTime, ascii(&datetime)),
            field(Tag::Orientation, Value::Short(vec![1])),
            field(Tag::DateTimeOriginal, ascii(&datetime)),
            field(Tag::DateTimeDigitized, ascii(&datetime)),
            field(Tag::ExposureTime, rational(&[metadata.exposure_time])),
            field(Tag::FNumber, rational(&[metadata.f_number])),
            field(Tag::PhotographicSensitivity, Value::Short(vec![metadata.iso])),
            field(Tag::FocalLength, rational(&[metadata.focal_length])),
            field(Tag::DigitalZoomRatio, rational(&[metadata.digital_zoom])),
            // Flash did not fire, auto mode.
            field(Tag::Flash, Value::Short(vec![16])),
            // sRGB
            field(Tag::ColorSpace, Value::Short(vec![1])),
            field(Tag::PixelXDimension, Value::Long(vec![width])),
            field(Tag::PixelYDimension, Value::Long(vec![height])),
        ];

        if let Some(gps) = &metadata.gps {
            fields.push(field(Tag::GPSVersionID, Value::Byte(vec![2, 2, 0, 0])));
            fields.push(field(Tag::GPSLatitudeRef, ascii(&gps.latitude.reference.to_string())));
            fields.push(field(Tag::GPSLatitude, dms(&gps.latitude)));
            fields.push(field(Tag::GPSLongitudeRef, ascii(&gps.longitude.reference.to_string())));
            fields.push(field(Tag::GPSLongitude, dms(&gps.longitude)));
        }

        fields
    }
}

fn field(tag: Tag, value: Value) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value,
    }
}

fn ascii(text: &str) -> Value {
    Value::Ascii(vec![text.as_bytes().to_vec()])
}

fn rational(values: &[Ratio]) -> Value {
    Value::Rational(
        values
            .iter()
            .map(|r| exif::Rational {
                num: r.num,
                denom: r.denom,
            })
            .collect(),
    )
}

fn dms(axis: &GpsAxis) -> Value {
    rational(&axis.dms)
}

/// Extracts EXIF metadata from image files.
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Extract EXIF data from an image file.
    ///
    /// Returns `None` if the file has no EXIF data or if extraction fails.
    pub fn extract(path: &Path) -> Option<ExifData> {
        let file = File::open(path).ok()?;
        let mut reader = BufReader::new(file);
        let exif = Reader::new().read_from_container(&mut reader).ok()?;
        Self::collect(&exif)
    }

    /// Extract EXIF data from an in-memory container (JPEG, PNG, TIFF...).
    pub fn extract_from_bytes(bytes: &[u8]) -> Option<ExifData> {
        let exif = Reader::new()
            .read_from_container(&mut Cursor::new(bytes))
            .ok()?;
        Self::collect(&exif)
    }

    fn collect(exif: &exif::Exif) -> Option<ExifData> {
        let data = ExifData {
            captured_at: Self::get_datetime(exif),
            camera_make: Self::get_string(exif, Tag::Make),
            camera_model: Self::get_string(exif, Tag::Model),
            software: Self::get_string(exif, Tag::Software),
            gps_latitude: Self::get_gps_coord(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef),
            gps_longitude: Self::get_gps_coord(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef),
            iso: Self::get_u32(exif, Tag::PhotographicSensitivity),
            aperture: Self::get_aperture(exif),
            shutter_speed: Self::get_shutter_speed(exif),
            focal_length: Self::get_focal_length(exif),
        };

        let any = data.captured_at.is_some()
            || data.camera_make.is_some()
            || data.camera_model.is_some()
            || data.iso.is_some()
            || data.gps_latitude.is_some();
        any.then_some(data)
    }

    fn get_string(exif: &exif::Exif, tag: Tag) -> Option<String> {
        exif.get_field(tag, In::PRIMARY).map(|f| {
            let s = f.display_value().to_string();
            s.trim_matches('"').to_string()
        })
    }

    fn get_u32(exif: &exif::Exif, tag: Tag) -> Option<u32> {
        exif.get_field(tag, In::PRIMARY)
            .and_then(|f| match &f.value {
                Value::Short(v) => v.first().map(|&x| x as u32),
                Value::Long(v) => v.first().copied(),
                _ => None,
            })
    }

    /// Prefers DateTimeOriginal over DateTime, keeping the raw EXIF layout.
    fn get_datetime(exif: &exif::Exif) -> Option<String> {
        exif.get_field(Tag::DateTimeOriginal, In::PRIMARY)
            .or_else(|| exif.get_field(Tag::DateTime, In::PRIMARY))
            .and_then(|f| match &f.value {
                Value::Ascii(parts) => parts
                    .first()
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            })
    }

    fn get_gps_coord(exif: &exif::Exif, coord_tag: Tag, ref_tag: Tag) -> Option<f64> {
        let coord = exif.get_field(coord_tag, In::PRIMARY)?;
        let reference = exif.get_field(ref_tag, In::PRIMARY)?;

        let degrees = match &coord.value {
            Value::Rational(r) if r.len() >= 3 => {
                r[0].to_f64() + r[1].to_f64() / 60.0 + r[2].to_f64() / 3600.0
            }
            _ => return None,
        };
        let ref_str = reference.display_value().to_string();
        let sign = if ref_str.contains('S') || ref_str.contains('W') {
            -1.0
        } else {
            1.0
        };

        Some(sign * degrees)
    }

    fn get_aperture(exif: &exif::Exif) -> Option<String> {
        exif.get_field(Tag::FNumber, In::PRIMARY).and_then(|f| match &f.value {
            Value::Rational(v) => v.first().map(|r| format!("f/{:.1}", r.to_f64())),
            _ => None,
        })
    }

    fn get_shutter_speed(exif: &exif::Exif) -> Option<String> {
        exif.get_field(Tag::ExposureTime, In::PRIMARY).and_then(|f| match &f.value {
            Value::Rational(v) => v.first().map(|r| format!("{}/{}", r.num, r.denom)),
            _ => None,
        })
    }

    fn get_focal_length(exif: &exif::Exif) -> Option<f32> {
        exif.get_field(Tag::FocalLength, In::PRIMARY)
            .and_then(|f| match &f.value {
                Value::Rational(v) => v.first().map(|r| r.to_f64() as f32),
                _ => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::synth::MetadataSynthesizer;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample() -> SynthesizedMetadata {
        let reference = NaiveDate::from_ymd_opt(2026, 5, 2)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        MetadataSynthesizer::default().synthesize(&mut StdRng::seed_from_u64(21), reference)
    }

    #[test]
    fn test_extract_missing_file() {
        let result = MetadataExtractor::extract(Path::new("/nonexistent/file.jpg"));
        assert!(result.is_none());
    }

    #[test]
    fn test_app1_payload_reads_back() {
        let meta = sample();
        let payload = ExifWriter::app1_payload(&meta, 640, 480).unwrap();
        assert!(payload.starts_with(EXIF_APP1_HEADER));

        let tiff = payload[EXIF_APP1_HEADER.len()..].to_vec();
        let exif = Reader::new().read_raw(tiff).unwrap();
        let data = MetadataExtractor::collect(&exif).unwrap();

        assert_eq!(data.camera_make.as_deref(), Some(meta.make.as_str()));
        assert_eq!(data.camera_model.as_deref(), Some(meta.model.as_str()));
        assert_eq!(data.software.as_deref(), Some(meta.software.as_str()));
        assert_eq!(data.captured_at, Some(meta.exif_datetime()));
        assert_eq!(data.iso, Some(u32::from(meta.iso)));
        assert_eq!(
            data.shutter_speed,
            Some(format!("1/{}", meta.exposure_time.denom))
        );

        let gps = meta.gps.unwrap();
        let lat = data.gps_latitude.unwrap();
        assert!((lat - gps.latitude.to_decimal()).abs() < 1e-6);
        assert!(data.gps_longitude.unwrap() < 0.0);
    }

    #[test]
    fn test_app1_payload_without_gps() {
        let mut meta = sample();
        meta.gps = None;
        let payload = ExifWriter::app1_payload(&meta, 10, 10).unwrap();
        let exif = Reader::new()
            .read_raw(payload[EXIF_APP1_HEADER.len()..].to_vec())
            .unwrap();
        assert!(exif.get_field(Tag::GPSLatitude, In::PRIMARY).is_none());
        assert!(exif.get_field(Tag::Make, In::PRIMARY).is_some());
    }
}
