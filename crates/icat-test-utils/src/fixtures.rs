use anyhow::{Context, Result};
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Image files written into a temporary directory that lives as long as the
/// fixtures do
pub struct TestFixtures {
    temp_dir: TempDir,
}

impl TestFixtures {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    /// Write a solid-colour PNG of `width` x `height` pixels
    pub fn png(&self, name: &str, width: u32, height: u32) -> Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 255]))
            .save_with_format(&path, ImageFormat::Png)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    /// Write a PNG of pseudo-random pixels, which compresses poorly and so
    /// needs several protocol chunks
    pub fn noisy_png(&self, name: &str, width: u32, height: u32) -> Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        RgbaImage::from_fn(width, height, |x, y| {
            let v = (x.wrapping_mul(2_654_435_761) ^ y.wrapping_mul(40_503))
                .wrapping_mul(2_246_822_519);
            let [r, g, b, _] = v.to_le_bytes();
            Rgba([r, g, b, 255])
        })
        .save_with_format(&path, ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    /// Write a solid-colour JPEG, which the decoder has to convert to PNG
    pub fn jpeg(&self, name: &str, width: u32, height: u32) -> Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        RgbImage::from_pixel(width, height, Rgb([40, 40, 200]))
            .save_with_format(&path, ImageFormat::Jpeg)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    pub fn create_test_file(&self, name: &str, content: &[u8]) -> Result<PathBuf> {
        let file_path = self.temp_dir.path().join(name);
        std::fs::write(&file_path, content)?;
        Ok(file_path)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}

pub mod data {
    /// PNG signature followed by bytes that are not a valid image
    pub const TRUNCATED_PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    pub const NOT_AN_IMAGE: &[u8] = b"just some text\n";
}
