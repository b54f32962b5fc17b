// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quality compressor: encode a raster as JPEG at a given quality and decode
// it straight back, so the page carries the fidelity it will have once
// persisted at that quality.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use pagescan_core::error::{Result, ScanError};
use pagescan_core::Quality;
use tracing::{debug, info, instrument};

use crate::raster::Raster;

/// The JPEG encoder has no quality 0; its coarsest table is quality 1.
const CODEC_MIN_QUALITY: u8 = 1;

/// Transient JPEG stream that only lives inside the round trip.
pub(crate) struct EncodedImageBytes(Vec<u8>);

impl EncodedImageBytes {
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }
}

/// Lossy round trip: JPEG-encode `raster` at `quality`, then decode the
/// stream into a new RGBA8 raster with opaque alpha.
///
/// `quality` outside `0..=100` is rejected rather than clamped. The input is
/// left untouched; the caller decides whether to drop it.
#[instrument(skip(raster), fields(width = raster.width(), height = raster.height()))]
pub fn compress(raster: &Raster, quality: i32) -> Result<Raster> {
    let quality = Quality::new(quality)?;
    compress_with(raster, quality)
}

/// [`compress`] for an already-validated quality.
pub fn compress_with(raster: &Raster, quality: Quality) -> Result<Raster> {
    let encoded = encode_jpeg(raster, quality)?;
    debug!(quality = quality.value(), encoded_len = encoded.len(), "JPEG round trip encoded");

    let decoded = decode_jpeg(encoded)?;
    info!(
        width = decoded.width(),
        height = decoded.height(),
        quality = quality.value(),
        "Quality round trip complete"
    );
    Ok(decoded)
}

/// Encode the raster as a baseline JPEG. Alpha is discarded.
pub(crate) fn encode_jpeg(raster: &Raster, quality: Quality) -> Result<EncodedImageBytes> {
    if raster.width() == 0 || raster.height() == 0 {
        return Err(ScanError::EncodeFailure(format!(
            "cannot encode an empty {}x{} raster",
            raster.width(),
            raster.height()
        )));
    }

    let mut buffer = Vec::new();
    let rgb = raster.as_dynamic().to_rgb8();
    let encoder =
        JpegEncoder::new_with_quality(&mut buffer, quality.value().max(CODEC_MIN_QUALITY));
    rgb.write_with_encoder(encoder)
        .map_err(|err| ScanError::EncodeFailure(format!("JPEG encoding failed: {err}")))?;
    Ok(EncodedImageBytes(buffer))
}

/// Decode a stream produced by [`encode_jpeg`]. The stream is consumed and
/// freed before the raster is returned.
fn decode_jpeg(encoded: EncodedImageBytes) -> Result<Raster> {
    let EncodedImageBytes(bytes) = encoded;
    let image = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).map_err(|err| {
        ScanError::DecodeFailure(format!("self-encoded JPEG stream did not decode: {err}"))
    })?;
    drop(bytes);
    Ok(Raster::from_rgba_image(DynamicImage::into_rgba8(image)))
}
