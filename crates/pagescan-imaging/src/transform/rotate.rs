// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Orientation normalizer: rotate a raster about its centre into a canvas
// that exactly bounds the rotated content.

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use pagescan_core::error::{Result, ScanError};
use tracing::{debug, info, instrument};

use crate::raster::{Raster, rgba_len};

/// Colour written into canvas area not covered by the rotated source.
pub const FILL: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Rotate `raster` clockwise by `degrees`.
///
/// `degrees == 0` hands the input straight back. Any other value consumes
/// the input and frees its pixel buffer once the rotated copy exists, and
/// rejects a raster with a zero dimension. Quarter turns are exact and keep
/// the source layout; other angles are resampled bilinearly into an RGBA8
/// canvas with [`FILL`] in the corners.
#[instrument(skip(raster), fields(width = raster.width(), height = raster.height()))]
pub fn rotate(raster: Raster, degrees: i32) -> Result<Raster> {
    if degrees == 0 {
        return Ok(raster);
    }
    if raster.width() == 0 || raster.height() == 0 {
        return Err(ScanError::InvalidArgument(format!(
            "cannot rotate an empty {}x{} raster",
            raster.width(),
            raster.height()
        )));
    }

    let normalised = degrees.rem_euclid(360);
    let rotated = match normalised {
        0 => {
            debug!("Full turn, copying unchanged pixels");
            raster.clone()
        }
        90 => quarter_turn(raster, DynamicImage::rotate90),
        180 => quarter_turn(raster, DynamicImage::rotate180),
        270 => quarter_turn(raster, DynamicImage::rotate270),
        _ => rotate_arbitrary(raster.into_rgba8(), normalised)?,
    };

    info!(
        degrees,
        new_w = rotated.width(),
        new_h = rotated.height(),
        "Rotation complete"
    );
    Ok(rotated)
}

fn quarter_turn(raster: Raster, turn: fn(&DynamicImage) -> DynamicImage) -> Raster {
    Raster::from_dynamic(turn(raster.as_dynamic()))
}

/// Bilinear rotation into an expanded canvas.
fn rotate_arbitrary(source: RgbaImage, degrees: i32) -> Result<Raster> {
    let (width, height) = source.dimensions();
    let (new_w, new_h) = bounding_canvas(width, height, degrees)?;
    debug!(new_w, new_h, "General rotation canvas");

    // Bilinear sampling needs a neighbour on every side, so the last row and
    // column would otherwise read as FILL.
    let padded = replicate_border(&source)?;
    drop(source);

    let len = rgba_len(new_w, new_h).map_err(|err| ScanError::TransformFailure(err.to_string()))?;
    let mut pixels = Vec::new();
    pixels.try_reserve_exact(len).map_err(|err| {
        ScanError::TransformFailure(format!("cannot allocate {new_w}x{new_h} canvas: {err}"))
    })?;
    pixels.resize(len, 0);
    let mut canvas = RgbaImage::from_raw(new_w, new_h, pixels).ok_or_else(|| {
        ScanError::TransformFailure(format!("canvas buffer does not fit {new_w}x{new_h}"))
    })?;

    // Source content starts one pixel in from the padded origin.
    let projection = Projection::translate(
        -(width as f32 / 2.0 + 1.0),
        -(height as f32 / 2.0 + 1.0),
    )
    .and_then(Projection::rotate((degrees as f32).to_radians()))
    .and_then(Projection::translate(new_w as f32 / 2.0, new_h as f32 / 2.0));

    warp_into(&padded, &projection, Interpolation::Bilinear, FILL, &mut canvas);

    Ok(Raster::from_rgba_image(canvas))
}

/// Copy `source` into a buffer one pixel larger on every side, repeating the
/// outermost rows and columns.
fn replicate_border(source: &RgbaImage) -> Result<RgbaImage> {
    let (width, height) = source.dimensions();
    let (Some(padded_w), Some(padded_h)) = (width.checked_add(2), height.checked_add(2)) else {
        return Err(ScanError::TransformFailure(format!(
            "{width}x{height} raster is too large to pad"
        )));
    };
    Ok(RgbaImage::from_fn(padded_w, padded_h, |x, y| {
        let sx = x.saturating_sub(1).min(width - 1);
        let sy = y.saturating_sub(1).min(height - 1);
        *source.get_pixel(sx, sy)
    }))
}

/// Dimensions of the smallest axis-aligned canvas holding a `width` x
/// `height` rectangle rotated by `degrees`.
fn bounding_canvas(width: u32, height: u32, degrees: i32) -> Result<(u32, u32)> {
    let theta = f64::from(degrees).to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let (w, h) = (f64::from(width), f64::from(height));

    // Shave float noise so e.g. 400.0000000001 does not grow a pixel.
    let fit = |extent: f64| -> Result<u32> {
        let rounded = (extent - 1e-6).ceil().max(0.0);
        if rounded > f64::from(u32::MAX) {
            return Err(ScanError::TransformFailure(format!(
                "rotated extent {rounded} exceeds the addressable range"
            )));
        }
        Ok(rounded as u32)
    };

    Ok((fit(w * cos + h * sin)?, fit(w * sin + h * cos)?))
}
