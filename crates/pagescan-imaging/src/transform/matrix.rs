// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster adapter: copy pixels between a `Raster` and the dense row-major
// matrix handed to vision algorithms (edge detection, perspective warp).
// Both directions copy; a matrix never aliases a raster's buffer.

use pagescan_core::error::{Result, ScanError};
use pagescan_core::{ElementType, PixelLayout};
use tracing::{debug, instrument};

use crate::raster::Raster;

/// Element type and channel count of a matrix, as a vision consumer needs
/// to interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatrixDescriptor {
    pub element: ElementType,
    pub channels: usize,
}

impl MatrixDescriptor {
    /// Unsigned 8-bit, four channels in R, G, B, A order.
    pub const U8C4: MatrixDescriptor = MatrixDescriptor {
        element: ElementType::U8,
        channels: 4,
    };

    /// Bytes occupied by one matrix cell.
    pub const fn cell_size(self) -> usize {
        self.element.byte_size() * self.channels
    }
}

/// Dense 2D array of pixels, stored row-major without padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericMatrix {
    rows: usize,
    cols: usize,
    descriptor: MatrixDescriptor,
    data: Vec<u8>,
}

impl NumericMatrix {
    /// Build a matrix from raw row-major data, validating its length.
    pub fn new(
        rows: usize,
        cols: usize,
        element: ElementType,
        channels: usize,
        data: Vec<u8>,
    ) -> Result<Self> {
        let descriptor = MatrixDescriptor { element, channels };
        let expected = rows
            .checked_mul(cols)
            .and_then(|cells| cells.checked_mul(descriptor.cell_size()))
            .ok_or_else(|| {
                ScanError::InvalidArgument(format!("{rows}x{cols} matrix is not addressable"))
            })?;
        if data.len() != expected {
            return Err(ScanError::InvalidArgument(format!(
                "{rows}x{cols}x{channels} {element:?} matrix needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            rows,
            cols,
            descriptor,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn channels(&self) -> usize {
        self.descriptor.channels
    }

    pub fn element(&self) -> ElementType {
        self.descriptor.element
    }

    pub fn descriptor(&self) -> MatrixDescriptor {
        self.descriptor
    }

    /// Bytes per row.
    pub fn step(&self) -> usize {
        self.cols * self.descriptor.cell_size()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// One row of cells, or `None` past the last row.
    pub fn row(&self, row: usize) -> Option<&[u8]> {
        if row >= self.rows {
            return None;
        }
        let step = self.step();
        Some(&self.data[row * step..(row + 1) * step])
    }

    /// The channel values of one cell.
    pub fn pixel(&self, row: usize, col: usize) -> Option<&[u8]> {
        let range = self.cell_range(row, col)?;
        Some(&self.data[range])
    }

    pub fn pixel_mut(&mut self, row: usize, col: usize) -> Option<&mut [u8]> {
        let range = self.cell_range(row, col)?;
        Some(&mut self.data[range])
    }

    fn cell_range(&self, row: usize, col: usize) -> Option<std::ops::Range<usize>> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let cell = self.descriptor.cell_size();
        let start = row * self.step() + col * cell;
        Some(start..start + cell)
    }
}

/// Copy a raster into an 8-bit four-channel matrix of `height` rows and
/// `width` columns.
///
/// Non-RGBA8 rasters are converted first; channel order is R, G, B, A.
#[instrument(
    skip(raster),
    fields(width = raster.width(), height = raster.height(), layout = ?raster.layout())
)]
pub fn to_matrix(raster: &Raster) -> Result<NumericMatrix> {
    let (width, height) = (raster.width(), raster.height());
    if width == 0 || height == 0 {
        return Err(ScanError::InvalidArgument(format!(
            "cannot build a matrix from an empty {width}x{height} raster"
        )));
    }

    let data = match raster.layout() {
        PixelLayout::Rgba8 => raster.as_bytes().to_vec(),
        other => {
            debug!(layout = ?other, "Converting raster to RGBA8 before copy");
            raster.to_rgba8().into_raw()
        }
    };

    NumericMatrix::new(
        height as usize,
        width as usize,
        ElementType::U8,
        MatrixDescriptor::U8C4.channels,
        data,
    )
}

/// Copy an 8-bit four-channel matrix into a new RGBA8 raster of
/// `cols` x `rows` pixels.
#[instrument(skip(matrix), fields(rows = matrix.rows(), cols = matrix.cols()))]
pub fn from_matrix(matrix: &NumericMatrix) -> Result<Raster> {
    if matrix.rows() == 0 || matrix.cols() == 0 {
        return Err(ScanError::InvalidArgument(format!(
            "cannot build a raster from an empty {}x{} matrix",
            matrix.rows(),
            matrix.cols()
        )));
    }
    if matrix.descriptor() != MatrixDescriptor::U8C4 {
        return Err(ScanError::InvalidArgument(format!(
            "raster needs 4 U8 channels, matrix has {} {:?} channels",
            matrix.channels(),
            matrix.element()
        )));
    }

    let width = u32::try_from(matrix.cols()).map_err(|_| {
        ScanError::InvalidArgument(format!("{} columns exceed raster width range", matrix.cols()))
    })?;
    let height = u32::try_from(matrix.rows()).map_err(|_| {
        ScanError::InvalidArgument(format!("{} rows exceed raster height range", matrix.rows()))
    })?;

    Raster::from_rgba(width, height, matrix.as_bytes().to_vec())
}
