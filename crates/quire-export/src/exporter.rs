// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export orchestrator: turns an export request into a finished document.
//
// Steps: validate the format, pick the chapters, choose the title, order the
// chapters naturally by title, prepare each one and hand the result to the
// renderer for the requested format.

use quire_core::ExportConfig;
use quire_core::error::{QuireError, Result};
use quire_core::traits::{ChapterStore, EntityLookup};
use quire_core::types::{Chapter, ExportFormat, ExportRequest};
use quire_document::natural_sort::sort_by_title;
use quire_document::{ChapterContent, DocxWriter, ImageResolver, PdfWriter, ShortcodeResolver};
use tracing::{debug, info, instrument};

use crate::prepare::{prepare_chapter, sanitize_filename};

/// A rendered export, ready to be sent as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    pub bytes: Vec<u8>,
    pub format: ExportFormat,
    /// Sanitised title plus extension.
    pub filename: String,
    pub content_type: String,
}

impl ExportedDocument {
    /// Value for an HTTP `Content-Disposition` header.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// Runs exports against a store.
///
/// `S` is usually a reference to a long-lived store; the exporter itself holds
/// no per-request state, so one instance can serve any number of exports.
pub struct Exporter<S> {
    store: S,
    config: ExportConfig,
}

impl<S: ChapterStore + EntityLookup> Exporter<S> {
    pub fn new(store: S, config: ExportConfig) -> Self {
        Self { store, config }
    }

    /// Export the requested chapters in the format named by `format_key`
    /// (`"docx"` or `"pdf"`, case-insensitive).
    ///
    /// Unknown formats fail with `UnsupportedFormat` before the store is
    /// touched. Missing chapters are skipped; a missing story only affects
    /// the title.
    #[instrument(skip_all, fields(format = format_key))]
    pub fn export(&self, format_key: &str, request: &ExportRequest) -> Result<ExportedDocument> {
        let format = ExportFormat::from_key(format_key)
            .ok_or_else(|| QuireError::UnsupportedFormat(format_key.to_string()))?;

        let story = request.story_id.and_then(|id| self.store.story_by_id(id));
        let mut chapters = self.select_chapters(request);
        let title = story
            .map(|s| s.title)
            .unwrap_or_else(|| self.config.fallback_title.clone());

        sort_by_title(&mut chapters, |chapter| chapter.title.as_str());

        let shortcodes = ShortcodeResolver::new(&self.store);
        let prepared: Vec<ChapterContent> = chapters
            .iter()
            .map(|chapter| prepare_chapter(chapter, &shortcodes))
            .collect();

        let resolver = ImageResolver::new(self.config.upload_dir.clone());
        let bytes = match format {
            ExportFormat::Docx => DocxWriter::new(&self.config, resolver).render(&title, &prepared)?,
            ExportFormat::Pdf => PdfWriter::new(&self.config, resolver).render(&title, &prepared)?,
        };

        let filename = format!("{}.{}", sanitize_filename(&title), format.extension());
        info!(
            %format,
            chapters = prepared.len(),
            bytes = bytes.len(),
            filename = %filename,
            "export complete"
        );

        Ok(ExportedDocument {
            bytes,
            format,
            filename,
            content_type: format.mime_type().to_string(),
        })
    }

    /// Explicit chapter ids win when non-empty; otherwise the story's
    /// chapters; otherwise nothing.
    fn select_chapters(&self, request: &ExportRequest) -> Vec<Chapter> {
        match (&request.chapter_ids, request.story_id) {
            (Some(ids), _) if !ids.is_empty() => ids
                .iter()
                .filter_map(|id| {
                    let chapter = self.store.chapter_by_id(*id);
                    if chapter.is_none() {
                        debug!(chapter = %id, "requested chapter not found");
                    }
                    chapter
                })
                .collect(),
            (_, Some(story_id)) => self.store.chapters_by_story(story_id),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use quire_core::types::{ChapterId, EntityKind, Story, StoryId};

    use super::*;

    /// Store that counts how often it is consulted.
    #[derive(Default)]
    struct Counting {
        calls: Cell<usize>,
    }

    impl EntityLookup for Counting {
        fn display_name(&self, _: EntityKind, _: u64) -> Option<String> {
            self.calls.set(self.calls.get() + 1);
            None
        }
    }

    impl ChapterStore for Counting {
        fn chapters_by_story(&self, story_id: StoryId) -> Vec<Chapter> {
            self.calls.set(self.calls.get() + 1);
            vec![
                Chapter::new(10, "Chapter 10", "<p>ten</p>").in_story(story_id),
                Chapter::new(2, "Chapter 2", "<p>two</p>").in_story(story_id),
            ]
        }

        fn chapter_by_id(&self, id: ChapterId) -> Option<Chapter> {
            self.calls.set(self.calls.get() + 1);
            (id.0 < 100).then(|| Chapter::new(id.0, format!("Chapter {}", id.0), ""))
        }

        fn story_by_id(&self, id: StoryId) -> Option<Story> {
            self.calls.set(self.calls.get() + 1);
            (id.0 == 1).then(|| Story {
                id,
                title: "Tides: Book One".into(),
            })
        }
    }

    #[test]
    fn unknown_format_fails_before_store_access() {
        let store = Counting::default();
        let exporter = Exporter::new(&store, ExportConfig::default());
        let err = exporter.export("odt", &ExportRequest::story(1)).unwrap_err();
        assert!(matches!(err, QuireError::UnsupportedFormat(ref f) if f == "odt"));
        assert!(err.is_client_error());
        assert_eq!(store.calls.get(), 0);
    }

    #[test]
    fn story_title_names_the_file() {
        let store = Counting::default();
        let exporter = Exporter::new(&store, ExportConfig::default());
        let doc = exporter.export("PDF", &ExportRequest::story(1)).unwrap();
        assert_eq!(doc.filename, "Tides__Book_One.pdf");
        assert_eq!(doc.content_type, "application/pdf");
        assert_eq!(doc.format, ExportFormat::Pdf);
        assert_eq!(
            doc.content_disposition(),
            "attachment; filename=\"Tides__Book_One.pdf\""
        );
    }

    #[test]
    fn missing_story_falls_back_to_default_title() {
        let store = Counting::default();
        let exporter = Exporter::new(&store, ExportConfig::default());
        let doc = exporter.export("docx", &ExportRequest::story(7)).unwrap();
        assert_eq!(doc.filename, "Export.docx");
        assert_eq!(
            doc.content_type,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
    }

    #[test]
    fn explicit_ids_win_and_misses_are_skipped() {
        let store = Counting::default();
        let exporter = Exporter::new(&store, ExportConfig::default());
        let request = ExportRequest::chapters([3, 500, 1]).with_story(1);
        let chapters = exporter.select_chapters(&request);
        let ids: Vec<u64> = chapters.iter().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn empty_id_list_falls_back_to_story() {
        let store = Counting::default();
        let exporter = Exporter::new(&store, ExportConfig::default());
        let request = ExportRequest {
            story_id: Some(StoryId(1)),
            chapter_ids: Some(Vec::new()),
        };
        assert_eq!(exporter.select_chapters(&request).len(), 2);
        assert!(exporter.select_chapters(&ExportRequest::default()).is_empty());
    }

    #[test]
    fn resolved_story_title_is_used_even_when_blank() {
        let store = quire_store::MemoryStore::new()
            .with_story(4, "   ")
            .with_chapter(Chapter::new(1, "One", "<p>x</p>").in_story(StoryId(4)));
        let exporter = Exporter::new(&store, ExportConfig::default());
        let doc = exporter.export("docx", &ExportRequest::story(4)).unwrap();
        assert_eq!(doc.filename, "___.docx");
    }

    #[test]
    fn fallback_title_is_configurable() {
        let store = Counting::default();
        let config = ExportConfig {
            fallback_title: "Manuscript".into(),
            ..ExportConfig::default()
        };
        let exporter = Exporter::new(&store, config);
        let doc = exporter.export("pdf", &ExportRequest::default()).unwrap();
        assert_eq!(doc.filename, "Manuscript.pdf");
    }
}
