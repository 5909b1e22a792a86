// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OOXML package parts — the XML documents that make up a .docx file apart
// from the body, and the media registry.

use std::borrow::Cow;
use std::collections::HashMap;

use quick_xml::escape::escape;
use quire_core::ExportConfig;
use sha2::{Digest, Sha256};

use crate::image::{ImageFormat, ResolvedImage};

pub(crate) const XML_DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Word measures in twentieths of a point.
pub(crate) fn twips(pt: f32) -> i64 {
    (pt * 20.0).round() as i64
}

/// Run sizes are in half points.
pub(crate) fn half_points(pt: f32) -> i64 {
    (pt * 2.0).round() as i64
}

/// DrawingML extents are in English Metric Units.
pub(crate) fn emu(pt: f32) -> i64 {
    const EMU_PER_PT: f32 = 12_700.0;
    (pt * EMU_PER_PT).round() as i64
}

/// Escape text for element content, dropping characters XML 1.0 forbids.
pub(crate) fn xml_text(text: &str) -> Cow<'_, str> {
    let allowed = |c: char| !c.is_control() || matches!(c, '\t' | '\n' | '\r');
    if text.chars().all(allowed) {
        escape(text)
    } else {
        let cleaned: String = text.chars().filter(|c| allowed(*c)).collect();
        Cow::Owned(escape(&cleaned).into_owned())
    }
}

pub(crate) const ROOT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
    r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>"#,
    r#"</Relationships>"#
);

pub(crate) const APP_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">"#,
    r#"<Application>Quire</Application>"#,
    r#"</Properties>"#
);

pub(crate) const SETTINGS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:settings xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:defaultTabStop w:val="720"/>"#,
    r#"<w:compat><w:compatSetting w:name="compatibilityMode" w:uri="http://schemas.microsoft.com/office/word" w:val="15"/></w:compat>"#,
    r#"</w:settings>"#
);

/// `[Content_Types].xml`, with a default entry per embedded image format.
pub(crate) fn content_types(formats: &[ImageFormat]) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    for format in formats {
        xml.push_str(&format!(
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            format.extension(),
            format.mime_type()
        ));
    }
    xml.push_str(r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#);
    xml.push_str(r#"<Override PartName="/word/settings.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml"/>"#);
    xml.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#);
    xml.push_str(r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#);
    xml.push_str("</Types>");
    xml
}

/// `docProps/core.xml`: title and creation time (W3CDTF, UTC).
pub(crate) fn core_properties(title: &str, created: chrono::DateTime<chrono::Utc>) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            r#"<dc:title>{title}</dc:title>"#,
            r#"<dc:creator>Quire</dc:creator>"#,
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{created}</dcterms:created>"#,
            r#"</cp:coreProperties>"#
        ),
        title = xml_text(title),
        created = created.format("%Y-%m-%dT%H:%M:%SZ"),
    )
}

/// `word/styles.xml`: Times New Roman body text at the configured size and
/// line spacing.
pub(crate) fn styles(config: &ExportConfig) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<w:docDefaults>"#,
            r#"<w:rPrDefault><w:rPr>"#,
            r#"<w:rFonts w:ascii="Times New Roman" w:hAnsi="Times New Roman" w:eastAsia="Times New Roman" w:cs="Times New Roman"/>"#,
            r#"<w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#,
            r#"</w:rPr></w:rPrDefault>"#,
            r#"<w:pPrDefault><w:pPr>"#,
            r#"<w:spacing w:after="{after}" w:line="{line}" w:lineRule="auto"/>"#,
            r#"</w:pPr></w:pPrDefault>"#,
            r#"</w:docDefaults>"#,
            r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
            r#"</w:styles>"#
        ),
        size = half_points(config.body_font_size_pt),
        after = twips(config.paragraph_spacing_pt),
        line = (240.0 * config.line_spacing).round() as i64,
    )
}

/// An image stored under `word/media/`.
#[derive(Debug, Clone)]
pub(crate) struct MediaPart {
    pub rel_id: String,
    pub path: String,
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

/// Embedded images, stored once per distinct payload.
#[derive(Debug, Default)]
pub(crate) struct MediaRegistry {
    parts: Vec<MediaPart>,
    by_digest: HashMap<String, usize>,
}

impl MediaRegistry {
    /// Register an image and return its relationship id.
    pub fn add(&mut self, image: &ResolvedImage) -> &str {
        let digest = hex::encode(Sha256::digest(&image.bytes));
        let index = match self.by_digest.get(&digest) {
            Some(index) => *index,
            None => {
                let n = self.parts.len() + 1;
                self.parts.push(MediaPart {
                    rel_id: format!("rIdImage{n}"),
                    path: format!("word/media/image{n}.{}", image.format.extension()),
                    format: image.format,
                    bytes: image.bytes.clone(),
                });
                self.by_digest.insert(digest, n - 1);
                n - 1
            }
        };
        &self.parts[index].rel_id
    }

    pub fn parts(&self) -> &[MediaPart] {
        &self.parts
    }

    /// Distinct image formats, in first-use order.
    pub fn formats(&self) -> Vec<ImageFormat> {
        let mut formats: Vec<ImageFormat> = Vec::new();
        for part in &self.parts {
            if !formats.contains(&part.format) {
                formats.push(part.format);
            }
        }
        formats
    }

    /// `word/_rels/document.xml.rels`.
    pub fn document_rels(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
        xml.push_str(r#"<Relationship Id="rIdStyles" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#);
        xml.push_str(r#"<Relationship Id="rIdSettings" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings" Target="settings.xml"/>"#);
        for part in &self.parts {
            let target = part.path.trim_start_matches("word/");
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="{}"/>"#,
                part.rel_id, target
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }
}
