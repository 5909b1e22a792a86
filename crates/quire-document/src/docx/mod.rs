// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DOCX writer — renders laid-out chapters as a WordprocessingML package.
//
// The package is assembled directly: each part is generated as XML text and
// written into a `zip` archive. Only the handful of parts Word needs are
// produced.

mod parts;

use std::io::{Cursor, Write};

use quire_core::error::{QuireError, Result};
use quire_core::ExportConfig;
use tracing::{debug, info, instrument};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::image::ImageResolver;
use crate::markup::{ChapterContent, StyleState};
use crate::paragraph::{Block, Inline, Paragraph, layout};

use parts::{MediaRegistry, emu, half_points, twips, xml_text};

/// Spacing above the first chapter heading, in twips.
const FIRST_HEADING_SPACE_BEFORE: i64 = 400;

/// Renders chapters to `.docx` bytes.
pub struct DocxWriter {
    config: ExportConfig,
    resolver: ImageResolver,
}

impl DocxWriter {
    pub fn new(config: &ExportConfig, resolver: ImageResolver) -> Self {
        Self {
            config: config.clone(),
            resolver,
        }
    }

    /// Render a titled document. Unresolvable images are left out.
    #[instrument(skip(self, chapters), fields(chapters = chapters.len()))]
    pub fn render(&self, title: &str, chapters: &[ChapterContent]) -> Result<Vec<u8>> {
        self.config.validate()?;

        let mut body = BodyXml::default();
        let mut media = MediaRegistry::default();

        for block in layout(title, chapters) {
            match block {
                Block::Title(text) => body.heading(&text, self.config.title_font_size_pt, None),
                Block::ChapterTitle {
                    text,
                    page_break_before,
                } => body.heading(
                    &text,
                    self.config.chapter_title_font_size_pt,
                    Some(page_break_before),
                ),
                Block::Paragraph(paragraph) => body.paragraph(&paragraph),
                Block::Image {
                    source,
                    width,
                    height,
                } => {
                    let resolved = self.resolver.resolve(
                        &source,
                        width,
                        height,
                        self.config.printable_width_pt(),
                        self.config.image_max_height_pt(),
                    );
                    if let Some(image) = resolved {
                        let rel_id = media.add(&image).to_string();
                        body.image(&rel_id, image.display_width, image.display_height);
                    }
                }
                Block::PageBreak => body.page_break(),
            }
        }

        let document = body.finish(&self.config);
        let bytes = self.package(title, &document, &media)?;

        info!(
            bytes = bytes.len(),
            images = media.parts().len(),
            "DOCX rendered"
        );
        Ok(bytes)
    }

    /// Write every part into the zip container.
    fn package(&self, title: &str, document: &str, media: &MediaRegistry) -> Result<Vec<u8>> {
        let deflated =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        // Already-compressed image data is stored as is.
        let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        let xml_parts: [(&str, String); 7] = [
            ("[Content_Types].xml", parts::content_types(&media.formats())),
            ("_rels/.rels", parts::ROOT_RELS.to_string()),
            (
                "docProps/core.xml",
                parts::core_properties(title, chrono::Utc::now()),
            ),
            ("docProps/app.xml", parts::APP_XML.to_string()),
            ("word/document.xml", document.to_string()),
            ("word/styles.xml", parts::styles(&self.config)),
            ("word/settings.xml", parts::SETTINGS_XML.to_string()),
        ];
        for (name, xml) in &xml_parts {
            write_part(&mut zip, name, xml.as_bytes(), deflated)?;
        }
        write_part(
            &mut zip,
            "word/_rels/document.xml.rels",
            media.document_rels().as_bytes(),
            deflated,
        )?;
        for part in media.parts() {
            write_part(&mut zip, &part.path, &part.bytes, stored)?;
        }

        let cursor = zip
            .finish()
            .map_err(|err| QuireError::Docx(format!("failed to finish DOCX archive: {err}")))?;
        Ok(cursor.into_inner())
    }
}

fn write_part(
    zip: &mut ZipWriter<Cursor<Vec<u8>>>,
    name: &str,
    data: &[u8],
    options: SimpleFileOptions,
) -> Result<()> {
    zip.start_file(name, options)
        .map_err(|err| QuireError::Docx(format!("failed to add {name}: {err}")))?;
    zip.write_all(data)
        .map_err(|err| QuireError::Docx(format!("failed to write {name}: {err}")))?;
    debug!(part = name, bytes = data.len(), "DOCX part written");
    Ok(())
}

/// Builder for the `<w:body>` of `word/document.xml`.
#[derive(Default)]
struct BodyXml {
    xml: String,
    /// Drawing object ids must be unique within the document.
    next_drawing_id: usize,
}

impl BodyXml {
    /// Centred bold heading. `page_break_before` is `None` for the document
    /// title and set for chapter titles.
    fn heading(&mut self, text: &str, size_pt: f32, page_break_before: Option<bool>) {
        let spacing = match page_break_before {
            Some(true) => "<w:pageBreakBefore/>".to_string(),
            Some(false) => format!(r#"<w:spacing w:before="{FIRST_HEADING_SPACE_BEFORE}"/>"#),
            None => String::new(),
        };
        let size = half_points(size_pt);
        self.xml.push_str(&format!(
            concat!(
                r#"<w:p><w:pPr>{spacing}<w:jc w:val="center"/></w:pPr>"#,
                r#"<w:r><w:rPr><w:b/><w:sz w:val="{size}"/><w:szCs w:val="{size}"/></w:rPr>"#,
                r#"<w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#
            ),
            spacing = spacing,
            size = size,
            text = xml_text(text),
        ));
    }

    fn paragraph(&mut self, paragraph: &Paragraph) {
        self.xml.push_str("<w:p>");
        for inline in paragraph.inlines() {
            match inline {
                Inline::Text { text, style } => {
                    self.xml.push_str("<w:r>");
                    self.xml.push_str(&run_properties(*style));
                    self.xml.push_str(r#"<w:t xml:space="preserve">"#);
                    self.xml.push_str(&xml_text(text));
                    self.xml.push_str("</w:t></w:r>");
                }
                Inline::LineBreak => self.xml.push_str("<w:r><w:br/></w:r>"),
            }
        }
        self.xml.push_str("</w:p>");
    }

    fn page_break(&mut self) {
        self.xml
            .push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#);
    }

    /// Centred inline picture; size in points.
    fn image(&mut self, rel_id: &str, width_pt: f32, height_pt: f32) {
        self.next_drawing_id += 1;
        let id = self.next_drawing_id;
        let (cx, cy) = (emu(width_pt), emu(height_pt));
        self.xml.push_str(&format!(
            concat!(
                r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:drawing>"#,
                r#"<wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
                r#"<wp:docPr id="{id}" name="Picture {id}"/>"#,
                r#"<a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">"#,
                r#"<a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:nvPicPr><pic:cNvPr id="{id}" name="Picture {id}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
                r#"</pic:pic></a:graphicData></a:graphic></wp:inline>"#,
                r#"</w:drawing></w:r></w:p>"#
            ),
            cx = cx,
            cy = cy,
            id = id,
            rel_id = rel_id,
        ));
    }

    /// Wrap the body in the document element with page size and margins.
    fn finish(self, config: &ExportConfig) -> String {
        let (width, height) = config.page_size_pt();
        let margin = twips(config.margin_pt);
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
                r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
                r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing">"#,
                r#"<w:body>{body}"#,
                r#"<w:sectPr><w:pgSz w:w="{width}" w:h="{height}"/>"#,
                r#"<w:pgMar w:top="{margin}" w:right="{margin}" w:bottom="{margin}" w:left="{margin}" w:header="720" w:footer="720" w:gutter="0"/>"#,
                r#"</w:sectPr></w:body></w:document>"#
            ),
            body = self.xml,
            width = twips(width),
            height = twips(height),
            margin = margin,
        )
    }
}

fn run_properties(style: StyleState) -> String {
    if style == StyleState::PLAIN {
        return String::new();
    }
    let mut props = String::from("<w:rPr>");
    if style.bold {
        props.push_str("<w:b/>");
    }
    if style.italic {
        props.push_str("<w:i/>");
    }
    if style.underline {
        props.push_str(r#"<w:u w:val="single"/>"#);
    }
    props.push_str("</w:rPr>");
    props
}
