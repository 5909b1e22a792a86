// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// quire-document — Chapter markup to paginated documents.
//
// Provides the building blocks of the export pipeline: natural title
// ordering, shortcode resolution, markup parsing and style flattening, image
// resolution, and the two renderers (DOCX and PDF) that consume the same
// event stream.

pub mod docx;
pub mod image;
pub mod markup;
pub mod natural_sort;
pub mod paragraph;
pub mod pdf;
pub mod shortcode;

pub use docx::DocxWriter;
pub use image::{ImageFormat, ImageResolver, ResolvedImage};
pub use markup::{ChapterContent, MarkupNode, RenderEvent, StyleState};
pub use pdf::PdfWriter;
pub use shortcode::ShortcodeResolver;
