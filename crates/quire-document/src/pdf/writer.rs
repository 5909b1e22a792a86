// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — lays out chapters onto pages using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`. All positioning is done here; printpdf only places
// what it is told, so line breaking and page overflow are computed up front.

use printpdf::color::Color;
use printpdf::graphics::{LinePoint, PaintMode, Polygon, PolygonRing, WindingOrder};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, RawImage, RawImageData,
    RawImageFormat, Rgb, TextItem, XObjectId, XObjectTransform,
};
use quire_core::ExportConfig;
use quire_core::error::Result;
use tracing::{debug, info, instrument};

use super::metrics::{Fragment, font_for, text_width, wrap};
use crate::image::{ImageResolver, ResolvedImage};
use crate::markup::{ChapterContent, StyleState};
use crate::paragraph::{Block, Paragraph, layout};

/// Underline stroke width, in points.
const UNDERLINE_THICKNESS: f32 = 0.5;
/// Distance of the underline below the baseline, in points.
const UNDERLINE_OFFSET: f32 = 1.5;
/// Heading line height as a multiple of the heading size.
const HEADING_LEADING: f32 = 1.25;

/// Renders chapters to PDF bytes with the builtin Times faces.
pub struct PdfWriter {
    config: ExportConfig,
    resolver: ImageResolver,
}

impl PdfWriter {
    pub fn new(config: &ExportConfig, resolver: ImageResolver) -> Self {
        Self {
            config: config.clone(),
            resolver,
        }
    }

    /// Render a titled document. The title is also stored in the document
    /// metadata. Unresolvable images are left out.
    #[instrument(skip(self, chapters), fields(chapters = chapters.len()))]
    pub fn render(&self, title: &str, chapters: &[ChapterContent]) -> Result<Vec<u8>> {
        self.config.validate()?;

        let mut doc = PdfDocument::new(title);
        let mut pages = PageComposer::new(&self.config);
        let mut images = 0usize;

        for block in layout(title, chapters) {
            match block {
                Block::Title(text) => {
                    self.heading(&mut pages, &text, self.config.title_font_size_pt);
                }
                Block::ChapterTitle {
                    text,
                    page_break_before,
                } => {
                    if page_break_before {
                        pages.break_page();
                    }
                    self.heading(&mut pages, &text, self.config.chapter_title_font_size_pt);
                }
                Block::Paragraph(paragraph) => self.paragraph(&mut pages, &paragraph),
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
                        let id = doc.add_image(&raw_image(&image));
                        pages.image(id, &image);
                        images += 1;
                    }
                }
                Block::PageBreak => pages.break_page(),
            }
        }

        let pages = pages.finish();
        let page_count = pages.len();
        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(warnings = warnings.len(), "printpdf reported warnings");
        }

        info!(
            pages = page_count,
            images,
            bytes = output.len(),
            "PDF rendered"
        );
        Ok(output)
    }

    // -- Block layout ---------------------------------------------------------

    /// Centred bold heading, followed by space equal to its size.
    fn heading(&self, pages: &mut PageComposer<'_>, text: &str, size_pt: f32) {
        let mut heading = Paragraph::new();
        heading.push_text(text, StyleState::BOLD);
        let heading = heading.take();

        for line in wrap(&heading, size_pt, self.config.printable_width_pt()) {
            pages.text_line(&line, size_pt, size_pt * HEADING_LEADING, true);
        }
        pages.advance(size_pt);
    }

    /// Left-aligned body paragraph at the configured leading.
    fn paragraph(&self, pages: &mut PageComposer<'_>, paragraph: &Paragraph) {
        let size = self.config.body_font_size_pt;
        let leading = self.config.body_leading_pt();
        for line in wrap(paragraph, size, self.config.printable_width_pt()) {
            pages.text_line(&line, size, leading, false);
        }
        pages.advance(self.config.paragraph_spacing_pt);
    }
}

/// RGB8 pixels for embedding; transparency is flattened onto white.
fn raw_image(image: &ResolvedImage) -> RawImage {
    let rgb = image.to_rgb_on_white();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    RawImage {
        pixels: RawImageData::U8(rgb.into_raw()),
        width,
        height,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    }
}

/// Accumulates page operations top to bottom and starts a new page when the
/// printable area is used up.
struct PageComposer<'a> {
    config: &'a ExportConfig,
    page_size: (Mm, Mm),
    page_height_pt: f32,
    pages: Vec<PdfPage>,
    ops: Vec<Op>,
    /// Top of the free space, measured from the bottom edge.
    cursor_y: f32,
    has_content: bool,
}

impl<'a> PageComposer<'a> {
    fn new(config: &'a ExportConfig) -> Self {
        let (w_mm, h_mm) = config.paper_size.dimensions_mm();
        let page_size = (Mm(w_mm as f32), Mm(h_mm as f32));
        let page_height_pt = page_size.1.into_pt().0;
        Self {
            config,
            page_size,
            page_height_pt,
            pages: Vec::new(),
            ops: Vec::new(),
            cursor_y: page_height_pt - config.margin_pt,
            has_content: false,
        }
    }

    fn remaining(&self) -> f32 {
        self.cursor_y - self.config.margin_pt
    }

    /// Close the current page, blank or not, and start the next one.
    fn break_page(&mut self) {
        let ops = std::mem::take(&mut self.ops);
        self.pages
            .push(PdfPage::new(self.page_size.0, self.page_size.1, ops));
        self.cursor_y = self.page_height_pt - self.config.margin_pt;
        self.has_content = false;
    }

    /// Make sure `height` points fit below the cursor. A blank page is
    /// never left behind for content that would not fit anyway.
    fn reserve(&mut self, height: f32) {
        if self.has_content && height > self.remaining() {
            self.break_page();
        }
    }

    /// Vertical space; never carried over to the next page.
    fn advance(&mut self, height: f32) {
        self.cursor_y = (self.cursor_y - height).max(self.config.margin_pt);
    }

    fn text_line(&mut self, line: &[Fragment], size_pt: f32, leading: f32, centred: bool) {
        self.reserve(leading);

        let line_width: f32 = line
            .iter()
            .map(|f| text_width(&f.text, f.style, size_pt))
            .sum();
        let mut x = self.config.margin_pt;
        if centred {
            x += ((self.config.printable_width_pt() - line_width) / 2.0).max(0.0);
        }
        let baseline = self.cursor_y - size_pt;

        for fragment in line {
            let width = text_width(&fragment.text, fragment.style, size_pt);
            let font = font_for(fragment.style);

            self.ops.push(Op::StartTextSection);
            self.ops.push(Op::SetTextCursor {
                pos: Point {
                    x: Pt(x),
                    y: Pt(baseline),
                },
            });
            self.ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(size_pt),
                font,
            });
            self.ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(fragment.text.clone())],
                font,
            });
            self.ops.push(Op::EndTextSection);

            if fragment.style.underline {
                self.underline(x, baseline - UNDERLINE_OFFSET, width);
            }
            x += width;
        }

        self.cursor_y -= leading;
        self.has_content = true;
    }

    fn underline(&mut self, x: f32, y: f32, width: f32) {
        let stroke = Polygon {
            rings: vec![PolygonRing {
                points: vec![
                    LinePoint {
                        p: Point { x: Pt(x), y: Pt(y) },
                        bezier: false,
                    },
                    LinePoint {
                        p: Point {
                            x: Pt(x + width),
                            y: Pt(y),
                        },
                        bezier: false,
                    },
                ],
            }],
            mode: PaintMode::Stroke,
            winding_order: WindingOrder::NonZero,
        };
        self.ops.push(Op::SetOutlineThickness {
            pt: Pt(UNDERLINE_THICKNESS),
        });
        self.ops.push(Op::SetOutlineColor {
            col: Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)),
        });
        self.ops.push(Op::DrawPolygon { polygon: stroke });
    }

    /// Centred image with paragraph spacing above and below. Images that do
    /// not fit in the remaining space move to the next page.
    fn image(&mut self, id: XObjectId, image: &ResolvedImage) {
        let spacing = self.config.paragraph_spacing_pt;
        let (width, height) = (image.display_width, image.display_height);

        self.reserve(height + spacing);
        if self.has_content {
            self.advance(spacing);
        }

        let x = self.config.margin_pt + (self.config.printable_width_pt() - width) / 2.0;
        let y = self.cursor_y - height;
        self.ops.push(Op::UseXobject {
            id,
            transform: XObjectTransform {
                translate_x: Some(Pt(x)),
                translate_y: Some(Pt(y)),
                scale_x: Some(width / image.natural_width as f32),
                scale_y: Some(height / image.natural_height as f32),
                // One pixel is one point at 72 dpi.
                dpi: Some(72.0),
                rotate: None,
            },
        });
        debug!(x, y, width, height, "image placed");

        self.cursor_y = y;
        self.has_content = true;
        self.advance(spacing);
    }

    /// Close the last page. A document always has at least one page.
    fn finish(mut self) -> Vec<PdfPage> {
        let ops = std::mem::take(&mut self.ops);
        self.pages
            .push(PdfPage::new(self.page_size.0, self.page_size.1, ops));
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use lopdf::content::Content;
    use lopdf::{Document, Object};

    use super::*;
    use crate::image::{ImageFormat, test_image_bytes};

    fn writer() -> PdfWriter {
        PdfWriter::new(&ExportConfig::default(), ImageResolver::new("no-uploads"))
    }

    fn render(title: &str, chapters: &[ChapterContent]) -> Document {
        let bytes = writer().render(title, chapters).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        Document::load_mem(&bytes).unwrap()
    }

    fn object_text(object: &Object) -> String {
        match object {
            Object::String(bytes, _) => String::from_utf8_lossy(bytes).into_owned(),
            Object::Array(items) => items.iter().map(object_text).collect(),
            _ => String::new(),
        }
    }

    /// Content-stream operations of every page, in page order.
    fn page_operations(doc: &Document) -> Vec<Vec<lopdf::content::Operation>> {
        doc.get_pages()
            .values()
            .map(|id| {
                let data = doc.get_page_content(*id).unwrap();
                Content::decode(&data).unwrap().operations
            })
            .collect()
    }

    /// Shown text of every page.
    fn page_texts(doc: &Document) -> Vec<String> {
        page_operations(doc)
            .iter()
            .map(|ops| {
                ops.iter()
                    .filter(|op| op.operator == "Tj" || op.operator == "TJ")
                    .flat_map(|op| op.operands.iter().map(object_text))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    fn count_operator(doc: &Document, operator: &str) -> usize {
        page_operations(doc)
            .iter()
            .flatten()
            .filter(|op| op.operator == operator)
            .count()
    }

    #[test]
    fn text_is_rendered_in_order() {
        let doc = render(
            "My Story",
            &[ChapterContent::from_markup("Chapter 1", "<p>Hello <b>World</b></p>")],
        );
        let texts = page_texts(&doc);
        assert_eq!(texts.len(), 1);
        let page = &texts[0];
        let title = page.find("My Story").unwrap();
        let chapter = page.find("Chapter 1").unwrap();
        let hello = page.find("Hello").unwrap();
        let world = page.find("World").unwrap();
        assert!(title < chapter && chapter < hello && hello < world);
    }

    #[test]
    fn every_chapter_after_the_first_starts_a_page() {
        let doc = render(
            "S",
            &[
                ChapterContent::from_markup("One", "<p>a</p>"),
                ChapterContent::from_markup("Two", "<p>b</p>"),
                ChapterContent::from_markup("Three", "<p>c</p>"),
            ],
        );
        let texts = page_texts(&doc);
        assert_eq!(texts.len(), 3);
        assert!(texts[1].contains("Two"));
        assert!(texts[2].contains("Three"));
    }

    #[test]
    fn segments_are_separated_by_page_breaks() {
        let doc = render(
            "S",
            &[ChapterContent::from_markup("One", "<p>first</p>#{pagebreak}<p>second</p>")],
        );
        let texts = page_texts(&doc);
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("first"));
        assert!(texts[1].contains("second"));
    }

    #[test]
    fn every_page_break_closes_a_page() {
        let doc = render(
            "S",
            &[ChapterContent::from_markup("One", "#{pagebreak}#{pagebreak}<p>x</p>")],
        );
        let texts = page_texts(&doc);
        assert_eq!(texts.len(), 3);
        assert!(texts[1].is_empty());
        assert!(texts[2].contains("x"));

        let trailing = render("S", &[ChapterContent::from_markup("One", "<p>a</p>#{pagebreak}")]);
        let texts = page_texts(&trailing);
        assert_eq!(texts.len(), 2);
        assert!(texts[1].is_empty());
    }

    #[test]
    fn long_text_overflows_onto_new_pages() {
        let body = format!("<p>{}</p>", "lorem ipsum dolor sit amet ".repeat(400));
        let doc = render("S", &[ChapterContent::from_markup("Long", &body)]);
        assert!(doc.get_pages().len() > 2);
    }

    #[test]
    fn underline_is_stroked() {
        let plain = render("S", &[ChapterContent::from_markup("C", "<p>plain</p>")]);
        let underlined = render("S", &[ChapterContent::from_markup("C", "<p><u>under</u></p>")]);
        let strokes = |doc: &Document| count_operator(doc, "S") + count_operator(doc, "s");
        assert_eq!(strokes(&plain), 0);
        assert_eq!(strokes(&underlined), 1);
    }

    #[test]
    fn images_are_placed_and_bad_ones_skipped() {
        let png = test_image_bytes(40, 20, ImageFormat::Png);
        let uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        );
        let markup = format!(
            r#"<p>before</p><img src="{uri}"><img src="data:image/webp;base64,AAAA"><p>after</p>"#
        );
        let doc = render("S", &[ChapterContent::from_markup("C", &markup)]);
        assert_eq!(count_operator(&doc, "Do"), 1);
        let page = &page_texts(&doc)[0];
        assert!(page.find("before").unwrap() < page.find("after").unwrap());
    }

    #[test]
    fn tall_images_move_to_the_next_page() {
        let png = test_image_bytes(10, 600, ImageFormat::Png);
        let uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        );
        let markup = format!(r#"<p>intro</p><img src="{uri}">"#);
        let doc = render("S", &[ChapterContent::from_markup("C", &markup)]);
        assert_eq!(doc.get_pages().len(), 2);
        let per_page: Vec<usize> = page_operations(&doc)
            .iter()
            .map(|ops| ops.iter().filter(|op| op.operator == "Do").count())
            .collect();
        assert_eq!(per_page, vec![0, 1]);
    }

    #[test]
    fn empty_export_still_has_a_page() {
        let doc = render("Export", &[]);
        assert_eq!(doc.get_pages().len(), 1);
        assert!(page_texts(&doc)[0].contains("Export"));
    }

    #[test]
    fn title_is_stored_in_metadata() {
        let doc = render("Quiet Harbour", &[]);
        let info = doc
            .trailer
            .get(b"Info")
            .and_then(Object::as_reference)
            .and_then(|id| doc.get_dictionary(id))
            .unwrap();
        let title = match info.get(b"Title").unwrap() {
            Object::String(bytes, _) if bytes.starts_with(&[0xFE, 0xFF]) => {
                let units: Vec<u16> = bytes[2..]
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
            other => object_text(other),
        };
        assert_eq!(title, "Quiet Harbour");
    }

    #[test]
    fn invalid_geometry_is_rejected() {
        let config = ExportConfig {
            margin_pt: 400.0,
            ..ExportConfig::default()
        };
        let writer = PdfWriter::new(&config, ImageResolver::new("no-uploads"));
        assert!(writer.render("S", &[]).is_err());
    }
}
