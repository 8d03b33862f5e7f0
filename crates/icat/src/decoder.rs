//! Image decoding
//!
//! The terminal is always sent PNG. PNG files are passed through untouched;
//! any other supported format is decoded and re-encoded.

use crate::IcatError;
use image::ImageFormat;
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// PNG bytes of an image plus its pixel size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub trait ImageDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<DecodedImage, IcatError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PngDecoder;

impl ImageDecoder for PngDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, IcatError> {
        let bytes = std::fs::read(path).map_err(|e| decode_error(path, e))?;
        let format = image::guess_format(&bytes).map_err(|e| decode_error(path, e))?;
        let img = image::load_from_memory_with_format(&bytes, format)
            .map_err(|e| decode_error(path, e))?;
        let (width, height) = (img.width(), img.height());

        let png = if format == ImageFormat::Png {
            bytes
        } else {
            debug!("Converting {:?} image {} to PNG", format, path.display());
            let mut buf = Vec::new();
            img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
                .map_err(|e| decode_error(path, e))?;
            buf
        };

        if width == 0 || height == 0 || png.is_empty() {
            return Err(decode_error(
                path,
                format!("image has no pixels ({width}x{height})"),
            ));
        }

        debug!(
            "Decoded {} ({}x{} px, {} PNG bytes)",
            path.display(),
            width,
            height,
            png.len()
        );
        Ok(DecodedImage { png, width, height })
    }
}

fn decode_error(path: &Path, err: impl fmt::Display) -> IcatError {
    IcatError::Decode(format!("{}: {err}", path.display()))
}
