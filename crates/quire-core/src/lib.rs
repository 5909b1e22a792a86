// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quire — Core types, configuration and error definitions shared across all
// crates, plus the collaborator traits the export pipeline reads through.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::ExportConfig;
pub use error::QuireError;
pub use traits::{ChapterStore, EntityLookup};
pub use types::*;
