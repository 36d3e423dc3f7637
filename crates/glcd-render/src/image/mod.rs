//! Images: decoded frames, loaders and the per-skin cache

mod cache;
mod loader;

use std::path::{Path, PathBuf};

use crate::Color;

pub use cache::{ImageCache, ImageKey};
pub use loader::CodecImageLoader;

/// Frame delay used when an animation does not specify one
pub const DEFAULT_FRAME_DELAY: u32 = 100;

/// Image loading errors
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("cannot read image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("decode failed: {0}")]
    DecodeFailed(String),

    #[error("image has no frames: {0}")]
    Empty(PathBuf),
}

/// One frame of RGBA pixels
#[derive(Debug, Clone)]
pub struct ImageFrame {
    pub pixels: Vec<u8>,
    /// Display time in milliseconds
    pub delay: u32,
}

/// A decoded, possibly animated image ready for rendering
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub frames: Vec<ImageFrame>,
}

impl DecodedImage {
    /// Single frame from raw RGBA data
    pub fn from_rgba(pixels: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frames: vec![ImageFrame {
                pixels,
                delay: DEFAULT_FRAME_DELAY,
            }],
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Delay of `frame` in milliseconds, 0 when out of range
    pub fn delay(&self, frame: usize) -> u32 {
        self.frames.get(frame).map_or(0, |f| f.delay)
    }

    /// Get pixel at (x, y) of `frame`
    pub fn pixel(&self, frame: usize, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let pixels = &self.frames.get(frame)?.pixels;
        let idx = ((y * self.width + x) * 4) as usize;
        let p = pixels.get(idx..idx + 4)?;
        Some(Color::rgba(p[0], p[1], p[2], p[3]))
    }

    /// Target size for a scale request; a single given side keeps the
    /// aspect ratio
    pub fn scaled_size(&self, width: Option<u32>, height: Option<u32>) -> (u32, u32) {
        let (w, h) = (u64::from(self.width.max(1)), u64::from(self.height.max(1)));
        match (width, height) {
            (Some(tw), Some(th)) => (tw, th),
            (Some(tw), None) => (tw, ((u64::from(tw) * h + w / 2) / w) as u32),
            (None, Some(th)) => (((u64::from(th) * w + h / 2) / h) as u32, th),
            (None, None) => (self.width, self.height),
        }
    }

    /// Resize every frame to the requested scale
    pub fn resized(&self, width: Option<u32>, height: Option<u32>) -> Self {
        let (tw, th) = self.scaled_size(width, height);
        let (tw, th) = (tw.max(1), th.max(1));
        if (tw, th) == (self.width, self.height) {
            return self.clone();
        }
        let frames = self
            .frames
            .iter()
            .map(|frame| {
                let pixels = ::image::RgbaImage::from_raw(self.width, self.height, frame.pixels.clone())
                    .map(|img| {
                        ::image::imageops::resize(&img, tw, th, ::image::imageops::FilterType::Triangle).into_raw()
                    })
                    .unwrap_or_else(|| vec![0; (tw * th * 4) as usize]);
                ImageFrame {
                    pixels,
                    delay: frame.delay,
                }
            })
            .collect();
        Self {
            width: tw,
            height: th,
            frames,
        }
    }
}

/// Decodes image files
pub trait ImageLoader {
    fn load(&self, path: &Path) -> Result<DecodedImage, ImageError>;
}
