// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pixel stages: lossy quality round trip, rotation about the centre, and
// raster/matrix conversion for vision consumers.

pub mod compress;
pub mod matrix;
pub mod rotate;

pub use compress::compress;
pub use matrix::{MatrixDescriptor, NumericMatrix, from_matrix, to_matrix};
pub use rotate::rotate;
