// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan pipeline: async front door over the stages. Fetching is awaited on
// the calling task; every pixel stage runs on tokio's blocking pool.

use pagescan_core::error::{Result, ScanError};
use pagescan_core::{Locator, Quality, ScanConfig};
use tracing::{info, instrument};

use super::fetch::{ImageFetcher, PipelineFetcher};
use super::loader::Loader;
use super::run_blocking;
use crate::raster::Raster;
use crate::transform::{NumericMatrix, compress, from_matrix, rotate, to_matrix};

/// Per-page options for [`ScanPipeline::process`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageOptions {
    /// Clockwise rotation applied after loading.
    pub rotation_degrees: i32,
    /// Round-trip quality; `None` uses the configured default.
    pub quality: Option<i32>,
}

/// Load → rotate → compress → adapt, one page at a time.
///
/// Holds no per-page state, so one pipeline can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct ScanPipeline<F> {
    loader: Loader<F>,
    config: ScanConfig,
}

impl ScanPipeline<PipelineFetcher> {
    /// A pipeline over the default fetcher.
    pub fn from_config(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        let fetcher = PipelineFetcher::new(&config.fetch)?;
        Ok(Self::new(fetcher, config))
    }
}

impl<F: ImageFetcher> ScanPipeline<F> {
    pub fn new(fetcher: F, config: ScanConfig) -> Self {
        Self {
            loader: Loader::new(fetcher),
            config,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn loader(&self) -> &Loader<F> {
        &self.loader
    }

    /// See [`Loader::load`].
    pub async fn load(
        &self,
        locator: &Locator,
        rotation_degrees: i32,
        quality: i32,
    ) -> Result<Raster> {
        self.loader.load(locator, rotation_degrees, quality).await
    }

    /// [`rotate`] on the blocking pool.
    pub async fn rotate(&self, raster: Raster, degrees: i32) -> Result<Raster> {
        if degrees == 0 {
            return Ok(raster);
        }
        run_blocking(move || rotate(raster, degrees), ScanError::TransformFailure).await
    }

    /// [`compress`] on the blocking pool. The input raster is released once
    /// its successor exists.
    pub async fn compress(&self, raster: Raster, quality: i32) -> Result<Raster> {
        run_blocking(move || compress(&raster, quality), ScanError::EncodeFailure).await
    }

    /// [`to_matrix`] on the blocking pool, releasing the raster afterwards.
    pub async fn to_matrix(&self, raster: Raster) -> Result<NumericMatrix> {
        run_blocking(move || to_matrix(&raster), ScanError::InvalidArgument).await
    }

    /// [`from_matrix`] on the blocking pool, releasing the matrix afterwards.
    pub async fn from_matrix(&self, matrix: NumericMatrix) -> Result<Raster> {
        run_blocking(move || from_matrix(&matrix), ScanError::InvalidArgument).await
    }

    /// Run one page through every stage in order and return the matrix for
    /// the vision consumer.
    ///
    /// The page is loaded at full quality with its EXIF orientation, rotated
    /// by `options.rotation_degrees`, round-tripped at the requested quality,
    /// then copied into a matrix.
    #[instrument(skip(self, locator), fields(locator = %locator))]
    pub async fn process(&self, locator: &Locator, options: PageOptions) -> Result<NumericMatrix> {
        // Validate before any I/O so a bad request costs nothing.
        let quality = match options.quality {
            Some(value) => Quality::new(value)?,
            None => self.config.default_quality()?,
        };
        let quality = i32::from(quality.value());

        let loaded = self.loader.load_default(locator).await?;
        let rotated = self.rotate(loaded, options.rotation_degrees).await?;
        let compressed = self.compress(rotated, quality).await?;
        let matrix = self.to_matrix(compressed).await?;

        info!(rows = matrix.rows(), cols = matrix.cols(), quality, "Page processed");
        Ok(matrix)
    }
}
