// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster: an owned, fully decoded in-memory image. Every stage of the
// pipeline produces or consumes one of these.

use std::io::Cursor;

use image::{ColorType, DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage};
use pagescan_core::error::{Result, ScanError};
use pagescan_core::PixelLayout;
use tracing::{debug, instrument};

/// Decoded, uncompressed pixel buffer with an explicit layout.
///
/// A `Raster` is always fully valid: the backing buffer length equals
/// `width * height * layout.bytes_per_pixel()`. Stages that derive a new
/// raster take the old one by value when they are meant to release it, so
/// the borrow checker enforces that a superseded raster is not reused.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    image: DynamicImage,
    layout: PixelLayout,
}

impl Raster {
    // -- Construction ---------------------------------------------------------

    /// Wrap an already-decoded `DynamicImage`.
    ///
    /// Layouts this crate does not model are converted to RGBA8.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        match layout_of(&image) {
            Some(layout) => Self { image, layout },
            None => {
                debug!(color = ?image.color(), "unmodelled layout, converting to RGBA8");
                Self::from_rgba_image(image.to_rgba8())
            }
        }
    }

    /// Wrap an RGBA8 buffer without copying it.
    pub fn from_rgba_image(image: RgbaImage) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(image),
            layout: PixelLayout::Rgba8,
        }
    }

    /// Build an RGBA8 raster from raw bytes, validating the buffer length.
    pub fn from_rgba(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self> {
        let expected = rgba_len(width, height)?;
        if bytes.len() != expected {
            return Err(ScanError::InvalidArgument(format!(
                "RGBA buffer for {width}x{height} must be {expected} bytes, got {}",
                bytes.len()
            )));
        }
        let image = RgbaImage::from_raw(width, height, bytes).ok_or_else(|| {
            ScanError::InvalidArgument(format!("buffer does not fit {width}x{height}"))
        })?;
        Ok(Self::from_rgba_image(image))
    }

    /// A raster where every pixel has the same RGBA value.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self::from_rgba_image(RgbaImage::from_pixel(width, height, Rgba(rgba)))
    }

    /// Decode encoded bytes (JPEG, PNG, ...) into a raster.
    ///
    /// With `format == None` the container is sniffed from the leading bytes.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn decode(data: &[u8], format: Option<ImageFormat>) -> Result<Self> {
        let image = match format {
            Some(format) => image::load_from_memory_with_format(data, format),
            None => ImageReader::new(Cursor::new(data))
                .with_guessed_format()
                .map_err(|err| {
                    ScanError::DecodeFailure(format!("failed to sniff image format: {err}"))
                })?
                .decode(),
        }
        .map_err(|err| ScanError::DecodeFailure(format!("failed to decode image: {err}")))?;

        debug!(
            width = image.width(),
            height = image.height(),
            "Image decoded from bytes"
        );
        Ok(Self::from_dynamic(image))
    }

    // -- Accessors ------------------------------------------------------------

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// The raw pixel bytes in the raster's own layout.
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_bytes()
    }

    /// Size of the pixel buffer in bytes.
    pub fn byte_len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the raster and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Consume the raster and return it as RGBA8. Already-RGBA8 rasters are
    /// moved out without copying; other layouts are converted.
    pub fn into_rgba8(self) -> RgbaImage {
        match self.image {
            DynamicImage::ImageRgba8(rgba) => rgba,
            other => other.to_rgba8(),
        }
    }

    /// Copy the pixels into a fresh RGBA8 buffer.
    pub fn to_rgba8(&self) -> RgbaImage {
        self.image.to_rgba8()
    }
}

/// Map an `image` colour type onto the layouts this crate models.
fn layout_of(image: &DynamicImage) -> Option<PixelLayout> {
    let layout = match image.color() {
        ColorType::L8 => PixelLayout::Gray8,
        ColorType::La8 => PixelLayout::GrayAlpha8,
        ColorType::Rgb8 => PixelLayout::Rgb8,
        ColorType::Rgba8 => PixelLayout::Rgba8,
        ColorType::L16 => PixelLayout::Gray16,
        ColorType::La16 => PixelLayout::GrayAlpha16,
        ColorType::Rgb16 => PixelLayout::Rgb16,
        ColorType::Rgba16 => PixelLayout::Rgba16,
        ColorType::Rgb32F => PixelLayout::Rgb32F,
        ColorType::Rgba32F => PixelLayout::Rgba32F,
        _ => return None,
    };
    Some(layout)
}

/// Byte length of an RGBA8 buffer, failing if it cannot be addressed.
pub(crate) fn rgba_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(PixelLayout::Rgba8.bytes_per_pixel()))
        .filter(|&len| len <= isize::MAX as usize)
        .ok_or_else(|| {
            ScanError::InvalidArgument(format!("{width}x{height} RGBA buffer is not addressable"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, RgbImage};
    use pagescan_core::ErrorKind;

    #[test]
    fn from_rgba_validates_length() {
        let ok = Raster::from_rgba(2, 3, vec![0; 24]).unwrap();
        assert_eq!((ok.width(), ok.height()), (2, 3));
        assert_eq!(ok.byte_len(), 24);

        let err = Raster::from_rgba(2, 3, vec![0; 23]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn layout_follows_source() {
        let gray = Raster::from_dynamic(DynamicImage::ImageLuma8(GrayImage::from_pixel(
            4,
            4,
            Luma([9]),
        )));
        assert_eq!(gray.layout(), PixelLayout::Gray8);
        assert_eq!(gray.byte_len(), 16);

        let rgb = Raster::from_dynamic(DynamicImage::ImageRgb8(RgbImage::new(4, 4)));
        assert_eq!(rgb.layout(), PixelLayout::Rgb8);
        assert_eq!(rgb.byte_len(), 48);
    }

    #[test]
    fn into_rgba8_moves_rgba_buffer() {
        let raster = Raster::filled(8, 8, [1, 2, 3, 4]);
        let ptr = raster.as_bytes().as_ptr();
        let rgba = raster.into_rgba8();
        assert_eq!(rgba.as_raw().as_ptr(), ptr);
    }

    #[test]
    fn decode_sniffs_png() {
        let source = RgbaImage::from_pixel(5, 7, Rgba([10, 20, 30, 255]));
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(source)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let raster = Raster::decode(&png, None).unwrap();
        assert_eq!((raster.width(), raster.height()), (5, 7));
        assert_eq!(raster.to_rgba8().get_pixel(2, 3), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = Raster::decode(b"definitely not an image", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
    }
}
