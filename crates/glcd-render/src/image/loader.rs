//! Image decoder for various formats
//!
//! Supports PNG, JPEG, BMP and animated GIF via the image crate.

use std::io::Cursor;
use std::path::Path;

use image::AnimationDecoder;
use image::codecs::gif::GifDecoder;

use super::{DEFAULT_FRAME_DELAY, DecodedImage, ImageError, ImageFrame, ImageLoader};

/// Default [`ImageLoader`] backed by the `image` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct CodecImageLoader;

impl CodecImageLoader {
    pub fn new() -> Self {
        Self
    }

    /// Decode from bytes; `path` is only used for error reporting
    pub fn decode(data: &[u8], path: &Path) -> Result<DecodedImage, ImageError> {
        let format = image::guess_format(data).map_err(|_| ImageError::UnsupportedFormat(path.to_path_buf()))?;
        match format {
            image::ImageFormat::Gif => Self::decode_gif(data, path),
            format => {
                let img = image::load_from_memory_with_format(data, format)
                    .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;
                let rgba = img.into_rgba8();
                let (width, height) = rgba.dimensions();
                Ok(DecodedImage::from_rgba(rgba.into_raw(), width, height))
            }
        }
    }

    fn decode_gif(data: &[u8], path: &Path) -> Result<DecodedImage, ImageError> {
        let decoder = GifDecoder::new(Cursor::new(data)).map_err(|e| ImageError::DecodeFailed(e.to_string()))?;
        let frames = decoder
            .into_frames()
            .collect_frames()
            .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

        let Some(first) = frames.first() else {
            return Err(ImageError::Empty(path.to_path_buf()));
        };
        let (width, height) = first.buffer().dimensions();

        let frames = frames
            .into_iter()
            .map(|frame| {
                let (numer, denom) = frame.delay().numer_denom_ms();
                let delay = if denom == 0 { 0 } else { numer / denom };
                ImageFrame {
                    delay: if delay == 0 { DEFAULT_FRAME_DELAY } else { delay },
                    pixels: frame.into_buffer().into_raw(),
                }
            })
            .collect();

        Ok(DecodedImage { width, height, frames })
    }
}

impl ImageLoader for CodecImageLoader {
    fn load(&self, path: &Path) -> Result<DecodedImage, ImageError> {
        let data = std::fs::read(path).map_err(|source| ImageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let image = Self::decode(&data, path)?;
        tracing::debug!(
            "Decoded {} ({}x{}, {} frames)",
            path.display(),
            image.width,
            image.height,
            image.frame_count()
        );
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        img.save(path).unwrap();
    }

    #[test]
    fn test_load_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        write_png(&path, 3, 2);
        let img = CodecImageLoader::new().load(&path).unwrap();
        assert_eq!((img.width, img.height), (3, 2));
        assert_eq!(img.frame_count(), 1);
        assert_eq!(img.pixel(0, 2, 1), Some(crate::Color::rgba(10, 20, 30, 255)));
    }

    #[test]
    fn test_missing_file() {
        let err = CodecImageLoader::new().load(Path::new("/nonexistent/x.png")).unwrap_err();
        assert!(matches!(err, ImageError::Io { .. }));
    }

    #[test]
    fn test_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello, not an image").unwrap();
        let err = CodecImageLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, ImageError::UnsupportedFormat(_)));
    }
}
