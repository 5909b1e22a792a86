// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image resolver — turns an `<img src>` reference into decoded, page-sized
// image data.
//
// Two reference forms are understood: inline `data:image/...;base64,` URIs
// and uploaded files, named by the last path segment of a URL or path and
// looked up inside the upload directory. Anything that cannot be resolved is
// dropped with a warning; a bad image never aborts an export.

use std::fmt;
use std::path::{Path, PathBuf};

use ::image::{DynamicImage, Rgb, RgbImage};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use tracing::{debug, instrument, warn};

use super::ImageFormat;

/// Why an image reference was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSkip {
    /// `data:` URI without a `,` separating header and payload.
    MalformedDataUri,
    /// Declared media type is not PNG, JPEG or GIF.
    UnsupportedMediaType(String),
    InvalidBase64,
    /// File name would leave the upload directory.
    UnsafePath(String),
    NotFound(String),
    UnsupportedExtension(String),
    Undecodable(String),
}

impl fmt::Display for ImageSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedDataUri => write!(f, "malformed data URI"),
            Self::UnsupportedMediaType(t) => write!(f, "unsupported media type {t}"),
            Self::InvalidBase64 => write!(f, "invalid base64 payload"),
            Self::UnsafePath(name) => write!(f, "path {name:?} escapes the upload directory"),
            Self::NotFound(name) => write!(f, "upload {name:?} not found"),
            Self::UnsupportedExtension(name) => write!(f, "unsupported file type {name:?}"),
            Self::Undecodable(err) => write!(f, "cannot decode image: {err}"),
        }
    }
}

/// A decoded image with its final on-page size.
///
/// Display dimensions are in points; natural dimensions are in pixels, and
/// one pixel is rendered as one point unless resized.
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    /// Encoded bytes as found, embedded verbatim in DOCX output.
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub natural_width: u32,
    pub natural_height: u32,
    pub display_width: f32,
    pub display_height: f32,
    /// Decoded pixels, used for PDF embedding.
    pub image: DynamicImage,
}

impl ResolvedImage {
    /// Pixels as RGB8, with any transparency composited onto white paper.
    pub fn to_rgb_on_white(&self) -> RgbImage {
        if !self.image.color().has_alpha() {
            return self.image.to_rgb8();
        }
        let rgba = self.image.to_rgba8();
        RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let [r, g, b, a] = rgba.get_pixel(x, y).0;
            let blend = |channel: u8| -> u8 {
                let alpha = a as u32;
                ((channel as u32 * alpha + 255 * (255 - alpha)) / 255) as u8
            };
            Rgb([blend(r), blend(g), blend(b)])
        })
    }
}

/// Resolves image references against a fixed upload directory.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    upload_dir: PathBuf,
}

impl ImageResolver {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    /// Resolve and size an image; `None` when it has to be dropped.
    ///
    /// `max_width` / `max_height` bound the final display size (the page's
    /// printable area).
    pub fn resolve(
        &self,
        source: &str,
        width: Option<f32>,
        height: Option<f32>,
        max_width: f32,
        max_height: f32,
    ) -> Option<ResolvedImage> {
        match self.try_resolve(source, width, height, max_width, max_height) {
            Ok(image) => Some(image),
            Err(reason) => {
                warn!(source = %abbreviate(source), %reason, "dropping image");
                None
            }
        }
    }

    #[instrument(skip(self, source), fields(source = %abbreviate(source)))]
    fn try_resolve(
        &self,
        source: &str,
        width: Option<f32>,
        height: Option<f32>,
        max_width: f32,
        max_height: f32,
    ) -> Result<ResolvedImage, ImageSkip> {
        let (bytes, format) = self.load(source)?;

        let image = ::image::load_from_memory_with_format(&bytes, format.codec())
            .map_err(|err| ImageSkip::Undecodable(err.to_string()))?;
        let (natural_width, natural_height) = (image.width(), image.height());
        if natural_width == 0 || natural_height == 0 {
            return Err(ImageSkip::Undecodable("image has no pixels".into()));
        }

        let (display_width, display_height) = display_size(
            (natural_width as f32, natural_height as f32),
            width,
            height,
            (max_width, max_height),
        );

        debug!(
            natural_width,
            natural_height, display_width, display_height, "image resolved"
        );

        Ok(ResolvedImage {
            bytes,
            format,
            natural_width,
            natural_height,
            display_width,
            display_height,
            image,
        })
    }

    /// Fetch the encoded bytes behind a reference and its declared format.
    pub fn load(&self, source: &str) -> Result<(Vec<u8>, ImageFormat), ImageSkip> {
        match strip_prefix_ignore_case(source, "data:") {
            Some(rest) => decode_data_uri(rest),
            None => {
                let filename = upload_filename(source);
                let format = Path::new(filename)
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .and_then(ImageFormat::from_extension)
                    .ok_or_else(|| ImageSkip::UnsupportedExtension(filename.to_string()))?;
                Ok((self.read_upload(filename)?, format))
            }
        }
    }

    /// Read a file from the upload directory.
    ///
    /// Only plain file names are accepted, and the canonical path must stay
    /// inside the canonical upload directory, which also rules out symlinks
    /// pointing elsewhere.
    pub fn read_upload(&self, filename: &str) -> Result<Vec<u8>, ImageSkip> {
        if filename.is_empty()
            || filename == "."
            || filename == ".."
            || filename.contains(['/', '\\', '\0'])
        {
            return Err(ImageSkip::UnsafePath(filename.to_string()));
        }

        let root = self
            .upload_dir
            .canonicalize()
            .map_err(|_| ImageSkip::NotFound(filename.to_string()))?;
        let path = root
            .join(filename)
            .canonicalize()
            .map_err(|_| ImageSkip::NotFound(filename.to_string()))?;
        if !path.starts_with(&root) {
            return Err(ImageSkip::UnsafePath(filename.to_string()));
        }

        std::fs::read(&path).map_err(|_| ImageSkip::NotFound(filename.to_string()))
    }
}

/// Final display size for an image.
///
/// Both explicit dimensions are used verbatim; a width alone scales the
/// natural height proportionally; otherwise the natural size is kept. The
/// result is then shrunk, aspect preserved, until it fits `max`.
/// Non-positive explicit dimensions count as absent.
pub fn display_size(
    natural: (f32, f32),
    width: Option<f32>,
    height: Option<f32>,
    max: (f32, f32),
) -> (f32, f32) {
    let width = width.filter(|w| *w > 0.0);
    let height = height.filter(|h| *h > 0.0);
    let (natural_w, natural_h) = natural;

    let (w, h) = match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, natural_h * (w / natural_w)),
        _ => (natural_w, natural_h),
    };

    let (max_w, max_h) = max;
    if w > max_w || h > max_h {
        let scale = (max_w / w).min(max_h / h);
        (w * scale, h * scale)
    } else {
        (w, h)
    }
}

/// Decode the part of a data URI after `data:`.
fn decode_data_uri(rest: &str) -> Result<(Vec<u8>, ImageFormat), ImageSkip> {
    let (header, payload) = rest.split_once(',').ok_or(ImageSkip::MalformedDataUri)?;
    let media_type = header.split(';').next().unwrap_or_default();
    let format = ImageFormat::from_media_type(media_type)
        .ok_or_else(|| ImageSkip::UnsupportedMediaType(media_type.to_string()))?;

    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(&compact)
        .or_else(|_| STANDARD_NO_PAD.decode(&compact))
        .map_err(|_| ImageSkip::InvalidBase64)?;
    Ok((bytes, format))
}

/// Last path segment of a URL or path, without query string or fragment.
fn upload_filename(source: &str) -> &str {
    let name = source.rsplit('/').next().unwrap_or(source);
    let name = name.split(['?', '#']).next().unwrap_or(name);
    name.trim()
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

/// Data URIs can be megabytes long; log only their start.
fn abbreviate(source: &str) -> &str {
    match source.char_indices().nth(64) {
        Some((index, _)) => &source[..index],
        None => source,
    }
}
