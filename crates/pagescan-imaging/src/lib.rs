// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagescan-imaging: Image acquisition and pixel-format conversion for the
// document scanning pipeline.
//
// Provides the decoded `Raster` type, the pixel stages (lossy quality
// round trip, rotation, raster/matrix adapter), and the acquisition side
// (loader over a fetch collaborator, camera sensor frames, async pipeline).

pub mod raster;
pub mod scan;
pub mod transform;

// Re-export the primary items so callers can use `pagescan_imaging::Raster` etc.
pub use raster::Raster;
pub use scan::fetch::{ImageFetcher, PipelineFetcher};
pub use scan::loader::Loader;
pub use scan::pipeline::{PageOptions, ScanPipeline};
pub use scan::sensor::{FrameFormat, Plane, RawSensorFrame};
pub use transform::compress::compress;
pub use transform::matrix::{MatrixDescriptor, NumericMatrix, from_matrix, to_matrix};
pub use transform::rotate::rotate;
