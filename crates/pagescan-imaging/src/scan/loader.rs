// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Loader: obtain a decoded raster for a locator through the fetch
// collaborator, then pass it through the quality round trip.

use pagescan_core::error::{Result, ScanError};
use pagescan_core::{Locator, Quality};
use tracing::{debug, info, instrument};

use super::fetch::{
    CachePolicy, DataSource, DecodeOptions, FetchRequest, ImageFetcher, RotationOption,
};
use super::run_blocking;
use crate::raster::Raster;
use crate::transform::compress::compress_with;

/// Loads images through an [`ImageFetcher`] with caching disabled.
///
/// The loader keeps no decoded images between calls; callers that want a
/// cache keep one above this layer.
#[derive(Debug, Clone)]
pub struct Loader<F> {
    fetcher: F,
}

impl<F: ImageFetcher> Loader<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch and decode `locator`, then round-trip it at `quality`.
    ///
    /// A non-zero `rotation_degrees` forces that rotation at decode time in
    /// place of the EXIF orientation. `quality` is clamped into `0..=100`.
    /// The fetch handle is closed on every path, including when the returned
    /// future is dropped before completion.
    #[instrument(skip(self, locator), fields(locator = %locator))]
    pub async fn load(
        &self,
        locator: &Locator,
        rotation_degrees: i32,
        quality: i32,
    ) -> Result<Raster> {
        let quality = Quality::clamped(quality);
        let request = FetchRequest {
            locator: locator.clone(),
            rotation: RotationOption::from_degrees(rotation_degrees),
            cache: CachePolicy::disabled(),
            decode: DecodeOptions::default(),
        };

        let source = SourceGuard::new(self.fetcher.fetch(request).await?);

        let raster = run_blocking(
            move || {
                let mut source = source;
                let decoded = source.take_result()?;
                source.release();
                debug!(width = decoded.width(), height = decoded.height(), "Decoded, compressing");
                compress_with(&decoded, quality)
            },
            ScanError::DecodeFailure,
        )
        .await?;

        info!(
            width = raster.width(),
            height = raster.height(),
            quality = quality.value(),
            "Image loaded"
        );
        Ok(raster)
    }

    /// [`Loader::load`] with no forced rotation at full quality.
    pub async fn load_default(&self, locator: &Locator) -> Result<Raster> {
        self.load(locator, 0, i32::from(Quality::MAX.value())).await
    }
}

/// Owns a [`DataSource`] and closes it when dropped.
struct SourceGuard<S: DataSource> {
    source: S,
}

impl<S: DataSource> SourceGuard<S> {
    fn new(source: S) -> Self {
        Self { source }
    }

    fn take_result(&mut self) -> Result<Raster> {
        self.source.take_result()
    }

    /// Close the source now rather than at the end of scope.
    fn release(mut self) {
        self.source.close();
    }
}

impl<S: DataSource> Drop for SourceGuard<S> {
    fn drop(&mut self) {
        self.source.close();
    }
}
