// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagescan: Core types, error definitions, and configuration shared by the
// imaging crate.

pub mod config;
pub mod error;
pub mod types;

pub use config::{FetchConfig, ScanConfig};
pub use error::{ErrorKind, ScanError};
pub use types::*;
