// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Chapter preparation and download naming.

use quire_core::types::Chapter;
use quire_document::{ChapterContent, ShortcodeResolver};
use tracing::debug;

/// Resolve shortcodes, split on page breaks, parse and flatten one chapter.
pub fn prepare_chapter(chapter: &Chapter, shortcodes: &ShortcodeResolver<'_>) -> ChapterContent {
    let resolved = shortcodes.resolve(Some(&chapter.content));
    let content = ChapterContent::from_markup(chapter.title.as_str(), &resolved);
    debug!(
        chapter = %chapter.id,
        segments = content.segments.len(),
        "chapter prepared"
    );
    content
}

/// Make a title safe to use as a file name: every character other than ASCII
/// letters, digits, `.` and `-` becomes `_`.
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
