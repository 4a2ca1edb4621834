//! Image decoding with content-based format detection and size limits.

use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Image decoder with configurable limits.
#[derive(Debug, Clone, Default)]
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an image.
#[derive(Debug)]
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Original file size in bytes
    pub file_size: u64,
}

/// Header-level facts about a candidate, used by the review display.
#[derive(Debug, Clone, Copy)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Read and fully decode an image. Blocking; run it on a worker.
    pub fn decode(&self, path: &Path) -> Result<DecodedImage, PipelineError> {
        let meta = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PipelineError::FileNotFound(path.to_path_buf()),
            _ => PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot read metadata: {}", e),
            },
        })?;

        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if meta.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: meta.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let bytes = std::fs::read(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot open file: {}", e),
        })?;
        self.decode_bytes(bytes, path)
    }

    /// Read only the header: format and dimensions.
    pub fn probe(&self, path: &Path) -> Result<ImageInfo, PipelineError> {
        let decode_err = |message: String| PipelineError::Decode {
            path: path.to_path_buf(),
            message,
        };
        let reader = ImageReader::open(path)
            .map_err(|e| decode_err(format!("Cannot open file: {}", e)))?
            .with_guessed_format()
            .map_err(|e| decode_err(format!("Cannot detect image format: {}", e)))?;
        let format = reader
            .format()
            .ok_or_else(|| unsupported(path))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| decode_err(e.to_string()))?;
        Ok(ImageInfo {
            format,
            width,
            height,
        })
    }

    /// Decode in-memory bytes. Dimensions are checked from the header
    /// before any pixel buffer is allocated.
    fn decode_bytes(&self, bytes: Vec<u8>, path: &Path) -> Result<DecodedImage, PipelineError> {
        let decode_err = |message: String| PipelineError::Decode {
            path: path.to_path_buf(),
            message,
        };
        let file_size = bytes.len() as u64;

        let guessed = ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| decode_err(format!("Cannot detect image format: {}", e)))?
            .format();
        let format = match guessed {
            Some(f) => f,
            None => ImageFormat::from_path(path).map_err(|_| unsupported(path))?,
        };

        let (width, height) = ImageReader::with_format(Cursor::new(bytes.as_slice()), format)
            .into_dimensions()
            .map_err(|e| decode_err(e.to_string()))?;
        let max_dim = self.limits.max_image_dimension;
        if width > max_dim || height > max_dim {
            return Err(PipelineError::ImageTooLarge {
                path: path.to_path_buf(),
                width,
                height,
                max_dim,
            });
        }

        let image = ImageReader::with_format(Cursor::new(bytes), format)
            .decode()
            .map_err(|e| decode_err(e.to_string()))?;

        let (width, height) = image.dimensions();
        Ok(DecodedImage {
            image,
            format,
            width,
            height,
            file_size,
        })
    }
}

fn unsupported(path: &Path) -> PipelineError {
    PipelineError::UnsupportedFormat {
        path: path.to_path_buf(),
        format: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("unknown")
            .to_string(),
    }
}

/// Convert an ImageFormat to a string representation.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        _ => "unknown".to_string(),
    }
}
