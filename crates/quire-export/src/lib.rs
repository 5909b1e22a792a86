// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// quire-export — Turns an export request into a downloadable DOCX or PDF.
//
// Reads stories, chapters and entity names through the collaborator traits in
// quire-core and renders with quire-document.

pub mod exporter;
pub mod prepare;

pub use exporter::{ExportedDocument, Exporter};
pub use prepare::{prepare_chapter, sanitize_filename};
