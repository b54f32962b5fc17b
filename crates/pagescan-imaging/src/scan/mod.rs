// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Acquisition: fetch collaborator seam, loader, camera sensor frames, and
// the async pipeline that chains load, rotate, compress, and adapt.

pub mod fetch;
pub mod loader;
pub mod pipeline;
pub mod sensor;

pub use fetch::{
    CachePolicy, DataSource, DecodeOptions, FetchRequest, FetchedSource, ImageFetcher,
    PipelineFetcher, RotationOption,
};
pub use loader::Loader;
pub use pipeline::{PageOptions, ScanPipeline};
pub use sensor::{FrameFormat, Plane, RawSensorFrame};

use pagescan_core::error::{Result, ScanError};

/// Run CPU-bound work on tokio's blocking pool.
///
/// A panic inside `work` is reported through `on_panic` rather than
/// propagated, so the caller always gets one of the stage error kinds.
pub(crate) async fn run_blocking<T, W>(work: W, on_panic: fn(String) -> ScanError) -> Result<T>
where
    T: Send + 'static,
    W: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| on_panic(format!("worker task failed: {err}")))?
}
