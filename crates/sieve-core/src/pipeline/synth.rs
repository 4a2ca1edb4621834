//! Capture metadata synthesis: device, timestamp, exposure and location.
//!
//! Every field is drawn independently per call from fixed curated sets, so
//! outputs look like ordinary phone captures without copying anything from
//! the source file.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use rand::Rng;

use crate::config::{CaptureTimePolicy, MetadataConfig};
use crate::types::{GpsAxis, GpsPosition, Ratio, SynthesizedMetadata};

/// A phone brand with its camera software string and model line-up.
#[derive(Debug, Clone, Copy)]
pub struct DeviceFamily {
    pub brand: &'static str,
    pub software: &'static str,
    pub models: &'static [&'static str],
}

/// Brands are picked uniformly first, so larger line-ups are not favoured.
pub const DEVICE_CATALOG: &[DeviceFamily] = &[
    DeviceFamily {
        brand: "Apple",
        software: "17.5.1",
        models: &[
            "iPhone 13",
            "iPhone 13 Pro",
            "iPhone 14",
            "iPhone 14 Pro",
            "iPhone 15",
        ],
    },
    DeviceFamily {
        brand: "Samsung",
        software: "S921BXXU1AXB6",
        models: &["Galaxy S22", "Galaxy S23", "Galaxy S23 Ultra", "Galaxy S24"],
    },
    DeviceFamily {
        brand: "Google",
        software: "HDR+ 1.0.641377693",
        models: &["Pixel 6", "Pixel 7", "Pixel 8", "Pixel 8 Pro"],
    },
];

/// Exposure time is always `1/n` for one of these.
pub const EXPOSURE_DENOMINATORS: &[u32] = &[30, 60, 125, 250, 500];

/// Aperture in tenths: f/1.6 to f/2.0.
pub const F_NUMBER_TENTHS: &[u32] = &[16, 17, 18, 19, 20];

pub const ISO_VALUES: &[u16] = &[50, 64, 80, 100, 125, 200];

/// Main-camera focal lengths in hundredths of a millimetre.
pub const FOCAL_LENGTH_HUNDREDTHS: &[u32] = &[400, 570, 690];

/// Digital zoom ratio in tenths: 1.0x, 1.5x, 2.0x.
pub const DIGITAL_ZOOM_TENTHS: &[u32] = &[10, 15, 20];

/// Latitude range of the synthesized location (decimal degrees).
pub const GPS_LATITUDE_RANGE: (f64, f64) = (34.0, 34.1);

/// Longitude range of the synthesized location (decimal degrees).
pub const GPS_LONGITUDE_RANGE: (f64, f64) = (-118.3, -118.2);

/// Produces a fresh, randomized capture record per output image.
#[derive(Debug, Clone, Default)]
pub struct MetadataSynthesizer {
    config: MetadataConfig,
}

impl MetadataSynthesizer {
    pub fn new(config: MetadataConfig) -> Self {
        Self { config }
    }

    /// Synthesize metadata relative to `reference` (normally "now").
    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        reference: NaiveDateTime,
    ) -> SynthesizedMetadata {
        let family = DEVICE_CATALOG[rng.gen_range(0..DEVICE_CATALOG.len())];
        let model = pick(rng, family.models);

        SynthesizedMetadata {
            make: family.brand.to_string(),
            model: model.to_string(),
            software: family.software.to_string(),
            captured_at: self.capture_time(rng, reference),
            exposure_time: Ratio::new(1, pick(rng, EXPOSURE_DENOMINATORS)),
            f_number: Ratio::new(pick(rng, F_NUMBER_TENTHS), 10),
            iso: pick(rng, ISO_VALUES),
            focal_length: Ratio::new(pick(rng, FOCAL_LENGTH_HUNDREDTHS), 100),
            digital_zoom: Ratio::new(pick(rng, DIGITAL_ZOOM_TENTHS), 10),
            gps: self.config.gps.then(|| random_position(rng)),
        }
    }

    fn capture_time<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        reference: NaiveDateTime,
    ) -> NaiveDateTime {
        let date = match self.config.capture_time {
            CaptureTimePolicy::Today => reference.date(),
            CaptureTimePolicy::Window => self
                .random_window_date(rng)
                .unwrap_or_else(|| reference.date()),
        };
        date.and_time(random_time_of_day(rng))
    }

    /// Uniform day in `[start-01-01, end-12-28)`.
    fn random_window_date<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(self.config.window_start_year, 1, 1)?;
        let end = NaiveDate::from_ymd_opt(self.config.window_end_year, 12, 28)?;
        let span = (end - start).num_days();
        if span <= 0 {
            return Some(start);
        }
        start.checked_add_days(Days::new(rng.gen_range(0..span) as u64))
    }
}

fn pick<T: Copy, R: Rng + ?Sized>(rng: &mut R, items: &[T]) -> T {
    items[rng.gen_range(0..items.len())]
}

fn random_time_of_day<R: Rng + ?Sized>(rng: &mut R) -> NaiveTime {
    NaiveTime::from_hms_opt(
        rng.gen_range(0..24),
        rng.gen_range(0..60),
        rng.gen_range(0..60),
    )
    .unwrap_or_default()
}

fn random_position<R: Rng + ?Sized>(rng: &mut R) -> GpsPosition {
    let lat = rng.gen_range(GPS_LATITUDE_RANGE.0..=GPS_LATITUDE_RANGE.1);
    let lon = rng.gen_range(GPS_LONGITUDE_RANGE.0..=GPS_LONGITUDE_RANGE.1);
    GpsPosition {
        latitude: to_axis(lat, 'N', 'S'),
        longitude: to_axis(lon, 'E', 'W'),
    }
}

/// Decimal degrees to `(deg/1, min/1, centiseconds/100)`.
fn to_axis(value: f64, positive: char, negative: char) -> GpsAxis {
    let reference = if value >= 0.0 { positive } else { negative };
    let abs = value.abs();
    let degrees = abs.trunc();
    let minutes_total = (abs - degrees) * 60.0;
    let minutes = minutes_total.trunc();
    let centiseconds = ((minutes_total - minutes) * 60.0 * 100.0).round() as u32;

    GpsAxis {
        reference,
        dms: [
            Ratio::new(degrees as u32, 1),
            Ratio::new(minutes as u32, 1),
            Ratio::new(centiseconds.min(5999), 100),
        ],
    }
}
