// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Camera sensor frames: a tagged set of byte planes as delivered by a
// capture session. Only JPEG-in-buffer frames can be turned into rasters.

use image::ImageFormat;
use pagescan_core::error::{Result, ScanError};
use tracing::{info, instrument, warn};

use super::run_blocking;
use crate::raster::Raster;

/// Encoding declared by the capture session for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameFormat {
    /// A complete JPEG stream in the first plane.
    Jpeg,
    /// Planar Y, U, V at 4:2:0.
    Yuv420,
    /// Semi-planar Y then interleaved V/U.
    Nv21,
    /// Unprocessed Bayer data.
    RawSensor,
}

/// One plane of a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    pub data: Vec<u8>,
    pub row_stride: usize,
    pub pixel_stride: usize,
}

impl Plane {
    /// A plane holding an opaque byte stream (no pixel geometry).
    pub fn opaque(data: Vec<u8>) -> Self {
        Self {
            data,
            row_stride: 0,
            pixel_stride: 0,
        }
    }
}

/// Frame captured from a camera sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSensorFrame {
    pub format: FrameFormat,
    /// Width reported by the sensor; 0 when unknown.
    pub width: u32,
    /// Height reported by the sensor; 0 when unknown.
    pub height: u32,
    pub planes: Vec<Plane>,
}

impl RawSensorFrame {
    /// Wrap a JPEG stream as a single-plane frame.
    pub fn jpeg(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            format: FrameFormat::Jpeg,
            width,
            height,
            planes: vec![Plane::opaque(data)],
        }
    }

    /// Decode the frame into a raster.
    ///
    /// The format tag is checked before any plane is touched; anything other
    /// than [`FrameFormat::Jpeg`] is `InvalidArgument`.
    #[instrument(skip(self), fields(format = ?self.format, planes = self.planes.len()))]
    pub fn to_raster(&self) -> Result<Raster> {
        if self.format != FrameFormat::Jpeg {
            return Err(ScanError::InvalidArgument(format!(
                "sensor frame must be JPEG, got {:?}",
                self.format
            )));
        }
        let plane = self.planes.first().ok_or_else(|| {
            ScanError::InvalidArgument("JPEG sensor frame has no planes".into())
        })?;

        let raster = Raster::decode(&plane.data, Some(ImageFormat::Jpeg))?;
        if self.width != 0
            && self.height != 0
            && (raster.width(), raster.height()) != (self.width, self.height)
        {
            warn!(
                declared_w = self.width,
                declared_h = self.height,
                decoded_w = raster.width(),
                decoded_h = raster.height(),
                "Sensor frame size differs from decoded JPEG"
            );
        }
        info!(width = raster.width(), height = raster.height(), "Sensor frame decoded");
        Ok(raster)
    }

    /// [`RawSensorFrame::to_raster`] on the blocking pool. The frame's
    /// planes are freed once decoding finishes.
    pub async fn into_raster(self) -> Result<Raster> {
        run_blocking(move || self.to_raster(), ScanError::DecodeFailure).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use image::{DynamicImage, Rgb, RgbImage};
    use pagescan_core::ErrorKind;

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut jpeg = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([240, 240, 240])))
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();
        jpeg
    }

    #[test]
    fn decodes_jpeg_frame() {
        let frame = RawSensorFrame::jpeg(32, 24, jpeg_bytes(32, 24));
        let raster = frame.to_raster().unwrap();
        assert_eq!((raster.width(), raster.height()), (32, 24));
    }

    #[test]
    fn non_jpeg_rejected_before_planes_are_read() {
        // No planes at all: a read would fail differently, so the error
        // message shows the tag check ran first.
        let frame = RawSensorFrame {
            format: FrameFormat::Nv21,
            width: 640,
            height: 480,
            planes: Vec::new(),
        };
        let err = frame.to_raster().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("must be JPEG"), "{err}");
    }

    #[test]
    fn jpeg_frame_without_planes_is_invalid() {
        let frame = RawSensorFrame {
            format: FrameFormat::Jpeg,
            width: 0,
            height: 0,
            planes: Vec::new(),
        };
        assert_eq!(frame.to_raster().unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn corrupt_jpeg_is_a_decode_failure() {
        let frame = RawSensorFrame::jpeg(0, 0, vec![0xFF, 0xD8, 0x00, 0x01]);
        assert_eq!(frame.to_raster().unwrap_err().kind(), ErrorKind::DecodeFailure);
    }

    #[tokio::test]
    async fn into_raster_runs_off_thread() {
        let frame = RawSensorFrame::jpeg(0, 0, jpeg_bytes(10, 20));
        let raster = frame.into_raster().await.unwrap();
        assert_eq!((raster.width(), raster.height()), (10, 20));
    }
}
