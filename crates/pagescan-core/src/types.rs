// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core value types for the Pagescan imaging layer.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, ScanError};

/// Lossy encode quality in `0..=100`.
///
/// 100 means minimal loss, 0 maximal loss. Construction through
/// [`Quality::new`] rejects anything outside the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MIN: Quality = Quality(0);
    pub const MAX: Quality = Quality(100);

    /// Validate a caller-supplied quality.
    pub fn new(value: i32) -> Result<Self> {
        if !(0..=100).contains(&value) {
            return Err(ScanError::InvalidArgument(format!(
                "quality must be in 0..=100, got {value}"
            )));
        }
        Ok(Self(value as u8))
    }

    /// Saturate any integer into `0..=100`.
    pub fn clamped(value: i32) -> Self {
        Self(value.clamp(0, 100) as u8)
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::MAX
    }
}

impl TryFrom<i32> for Quality {
    type Error = ScanError;

    fn try_from(value: i32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to an encoded image source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locator {
    /// A file on the local filesystem.
    File(PathBuf),
    /// An `http://` or `https://` URL.
    Remote(String),
}

impl Locator {
    /// Classify a path or URI string.
    ///
    /// Schemes match case-insensitively. `file://` URIs resolve to their
    /// percent-decoded path and accept an empty or `localhost` host; anything
    /// without a recognised scheme is treated as a filesystem path.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ScanError::InvalidArgument("empty locator".into()));
        }

        // Drive letters (`C:\scan.jpg`) parse as one-letter schemes and fall through.
        let Ok(url) = Url::parse(trimmed) else {
            return Ok(Self::File(PathBuf::from(trimmed)));
        };
        match url.scheme() {
            "http" | "https" => Ok(Self::Remote(url.into())),
            "file" => {
                if url.path() == "/" {
                    return Err(ScanError::InvalidArgument(format!(
                        "file URI without a path: {trimmed}"
                    )));
                }
                url.to_file_path().map(Self::File).map_err(|()| {
                    ScanError::InvalidArgument(format!("file URI names a remote host: {trimmed}"))
                })
            }
            _ => Ok(Self::File(PathBuf::from(trimmed))),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl From<&Path> for Locator {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

impl From<PathBuf> for Locator {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => f.write_str(url),
        }
    }
}

/// In-memory pixel layout of a decoded raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelLayout {
    Gray8,
    GrayAlpha8,
    Rgb8,
    Rgba8,
    Gray16,
    GrayAlpha16,
    Rgb16,
    Rgba16,
    Rgb32F,
    Rgba32F,
}

impl PixelLayout {
    /// Number of channels per pixel.
    pub const fn channels(self) -> usize {
        match self {
            Self::Gray8 | Self::Gray16 => 1,
            Self::GrayAlpha8 | Self::GrayAlpha16 => 2,
            Self::Rgb8 | Self::Rgb16 | Self::Rgb32F => 3,
            Self::Rgba8 | Self::Rgba16 | Self::Rgba32F => 4,
        }
    }

    /// Bytes occupied by one pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        let per_channel = match self {
            Self::Gray8 | Self::GrayAlpha8 | Self::Rgb8 | Self::Rgba8 => 1,
            Self::Gray16 | Self::GrayAlpha16 | Self::Rgb16 | Self::Rgba16 => 2,
            Self::Rgb32F | Self::Rgba32F => 4,
        };
        per_channel * self.channels()
    }

    pub const fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::GrayAlpha8 | Self::Rgba8 | Self::GrayAlpha16 | Self::Rgba16 | Self::Rgba32F
        )
    }
}

/// Element type of a numeric matrix cell channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    /// Unsigned 8-bit.
    U8,
    /// Unsigned 16-bit.
    U16,
    /// 32-bit float.
    F32,
}

impl ElementType {
    pub const fn byte_size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::F32 => 4,
        }
    }
}
