// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{QuireError, Result};

/// Page geometry, typography and filesystem settings shared by both renderers.
///
/// DOCX and PDF output read the same values so the two formats agree on
/// page size, printable area and type sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Paper size for every page.
    pub paper_size: crate::PaperSize,
    /// Margin on all four sides, in points.
    pub margin_pt: f32,
    /// Body text size in points.
    pub body_font_size_pt: f32,
    /// Line height as a multiple of the body size (2.0 = double spaced).
    pub line_spacing: f32,
    /// Space after each body paragraph, in points.
    pub paragraph_spacing_pt: f32,
    /// Story title size in points.
    pub title_font_size_pt: f32,
    /// Chapter title size in points.
    pub chapter_title_font_size_pt: f32,
    /// Vertical space kept free when clamping image height, in points.
    pub image_vertical_reserve_pt: f32,
    /// Directory uploaded images are served from.
    pub upload_dir: PathBuf,
    /// Title used when the request does not resolve to a story.
    pub fallback_title: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            paper_size: crate::PaperSize::A4,
            margin_pt: 72.0,
            body_font_size_pt: 12.0,
            line_spacing: 2.0,
            paragraph_spacing_pt: 12.0,
            title_font_size_pt: 24.0,
            chapter_title_font_size_pt: 18.0,
            image_vertical_reserve_pt: 40.0,
            upload_dir: PathBuf::from("uploads"),
            fallback_title: "Export".to_string(),
        }
    }
}

impl ExportConfig {
    /// Load a configuration from a JSON file. Missing keys take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject geometry that leaves no printable area.
    pub fn validate(&self) -> Result<()> {
        if self.margin_pt < 0.0 {
            return Err(QuireError::Config(format!(
                "margin must not be negative, got {}",
                self.margin_pt
            )));
        }
        if self.printable_width_pt() <= 0.0 || self.image_max_height_pt() <= 0.0 {
            return Err(QuireError::Config(format!(
                "margins of {}pt leave no printable area on {:?}",
                self.margin_pt, self.paper_size
            )));
        }
        if self.body_font_size_pt <= 0.0 || self.line_spacing <= 0.0 {
            return Err(QuireError::Config(
                "body font size and line spacing must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Page size in points (width, height).
    pub fn page_size_pt(&self) -> (f32, f32) {
        self.paper_size.dimensions_pt()
    }

    /// Width between the left and right margins.
    pub fn printable_width_pt(&self) -> f32 {
        self.page_size_pt().0 - 2.0 * self.margin_pt
    }

    /// Height between the top and bottom margins.
    pub fn printable_height_pt(&self) -> f32 {
        self.page_size_pt().1 - 2.0 * self.margin_pt
    }

    /// Tallest an image may be rendered.
    pub fn image_max_height_pt(&self) -> f32 {
        self.printable_height_pt() - self.image_vertical_reserve_pt
    }

    /// Distance between body baselines.
    pub fn body_leading_pt(&self) -> f32 {
        self.body_font_size_pt * self.line_spacing
    }
}
