//! PDF composition
//!
//! A rendered capture is placed as a single image on one A4 portrait page,
//! fit inside a 10 mm margin, with document metadata and a small footer.
//! The object graph is built with `lopdf`; the image and content streams are
//! zlib-compressed with `flate2`.

use super::progress::Progress;
use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::RgbImage;
use log::debug;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Write;

/// A4 portrait in points.
pub const A4_WIDTH_PT: f32 = 595.28;
pub const A4_HEIGHT_PT: f32 = 841.89;

const PT_PER_MM: f32 = 72.0 / 25.4;
const MARGIN_MM: f32 = 10.0;
const FOOTER_OFFSET_MM: f32 = 5.0;
const FOOTER_FONT_SIZE: f32 = 8.0;
const FOOTER_GRAY: f32 = 128.0 / 255.0;

/// Document information dictionary entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfMetadata {
    pub title: String,
    pub subject: String,
    pub author: String,
    pub creator: String,
    pub keywords: String,
}

impl Default for PdfMetadata {
    fn default() -> Self {
        Self {
            title: "Phantom Thief Resume".to_string(),
            subject: "Developer Resume".to_string(),
            author: "Phantom Thief System".to_string(),
            creator: "Anime Resume Generator".to_string(),
            keywords: "resume, developer, phantom thief".to_string(),
        }
    }
}

/// Where the image lands on the page, in points from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Fit an image inside the page margins: full available width unless that
/// overflows the available height, centered horizontally, top aligned.
pub fn fit_image(image_width: u32, image_height: u32) -> ImagePlacement {
    let margin = MARGIN_MM * PT_PER_MM;
    let available_width = A4_WIDTH_PT - margin * 2.0;
    let available_height = A4_HEIGHT_PT - margin * 2.0;

    let aspect = image_height.max(1) as f32 / image_width.max(1) as f32;
    let mut width = available_width;
    let mut height = width * aspect;
    if height > available_height {
        height = available_height;
        width = height / aspect;
    }
    ImagePlacement {
        x: (A4_WIDTH_PT - width) / 2.0,
        y: margin,
        width,
        height,
    }
}

/// Footer line printed under the image.
pub fn footer_text(generated_at: NaiveDateTime) -> String {
    format!(
        "Generated on {} \u{2022} Phantom Thief Resume System",
        generated_at.format("%Y-%m-%d")
    )
}

/// Build the PDF around an already encoded PNG.
///
/// Reports 70 through 98; the caller reports completion.
pub fn compose_pdf(
    png: &[u8],
    metadata: &PdfMetadata,
    generated_at: NaiveDateTime,
    progress: &mut dyn Progress,
) -> Result<Vec<u8>> {
    progress.report("Creating PDF document...", 70.0);
    let decoded = image::load_from_memory_with_format(png, image::ImageFormat::Png)
        .map_err(|e| Error::ImageLoad(e.to_string()))?;
    // The capture is rendered on white, so alpha carries nothing.
    let rgb: RgbImage = decoded.to_rgb8();

    progress.report("Formatting PDF layout...", 80.0);
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    progress.report("Processing image for PDF...", 85.0);
    let placement = fit_image(rgb.width(), rgb.height());
    let image_stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => rgb.width() as i64,
            "Height" => rgb.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        deflate(rgb.as_raw())?,
    );
    let image_id = doc.add_object(image_stream);

    progress.report("Adding image to PDF...", 90.0);
    let mut operations = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                placement.width.into(),
                0.into(),
                0.into(),
                placement.height.into(),
                placement.x.into(),
                (A4_HEIGHT_PT - placement.y - placement.height).into(),
            ],
        ),
        Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
        Operation::new("Q", vec![]),
    ];

    progress.report("Adding metadata and footer...", 95.0);
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(metadata.title.as_str()),
        "Subject" => Object::string_literal(metadata.subject.as_str()),
        "Author" => Object::string_literal(metadata.author.as_str()),
        "Creator" => Object::string_literal(metadata.creator.as_str()),
        "Keywords" => Object::string_literal(metadata.keywords.as_str()),
        "CreationDate" => Object::string_literal(
            generated_at.format("D:%Y%m%d%H%M%S").to_string()
        ),
    });
    doc.trailer.set("Info", info_id);

    let footer = footer_text(generated_at);
    let footer_width = helvetica_width(&footer, FOOTER_FONT_SIZE);
    operations.extend([
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), FOOTER_FONT_SIZE.into()]),
        Operation::new(
            "rg",
            vec![FOOTER_GRAY.into(), FOOTER_GRAY.into(), FOOTER_GRAY.into()],
        ),
        Operation::new(
            "Td",
            vec![
                ((A4_WIDTH_PT - footer_width) / 2.0).into(),
                (FOOTER_OFFSET_MM * PT_PER_MM).into(),
            ],
        ),
        Operation::new("Tj", vec![Object::string_literal(win_ansi(&footer))]),
        Operation::new("ET", vec![]),
    ]);

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(
        dictionary! {"Filter" => "FlateDecode"},
        deflate(&content.encode()?)?,
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), A4_WIDTH_PT.into(), A4_HEIGHT_PT.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
            "XObject" => dictionary! { "Im1" => image_id },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    progress.report("Finalizing PDF...", 98.0);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    debug!(
        "Composed PDF: {}x{} px image at {:.1}x{:.1} pt, {} bytes",
        rgb.width(),
        rgb.height(),
        placement.width,
        placement.height,
        bytes.len()
    );
    Ok(bytes)
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Encode for a WinAnsi simple font; unmappable characters become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{2022}' => 0x95,
            c if (c as u32) < 0x80 => c as u8,
            c if (0xA0..=0xFF).contains(&(c as u32)) => c as u8,
            _ => b'?',
        })
        .collect()
}

/// Approximate Helvetica advance width in points.
fn helvetica_width(text: &str, size: f32) -> f32 {
    let units: f32 = text
        .chars()
        .map(|c| match c {
            ' ' | '.' | ',' | ':' | ';' | '!' | 'i' | 'j' | 'l' | 'I' => 278.0,
            'f' | 't' | 'r' | '-' | '(' | ')' => 333.0,
            '\u{2022}' => 350.0,
            'm' | 'M' | 'W' => 833.0,
            'w' => 722.0,
            c if c.is_ascii_uppercase() => 667.0,
            _ => 556.0,
        })
        .sum();
    units / 1000.0 * size
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::encode::encode_png;
    use crate::export::progress::{ExportProgress, ProgressReporter};
    use chrono::NaiveDate;
    use image::{Rgba, RgbaImage};

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_fit_wide_image_uses_full_width() {
        let p = fit_image(1000, 500);
        let margin = 10.0 * PT_PER_MM;
        assert!((p.width - (A4_WIDTH_PT - 2.0 * margin)).abs() < 0.01);
        assert!((p.height - p.width / 2.0).abs() < 0.01);
        assert!((p.y - margin).abs() < 0.01);
    }

    #[test]
    fn test_fit_tall_image_is_centered() {
        let p = fit_image(100, 1000);
        let margin = 10.0 * PT_PER_MM;
        assert!((p.height - (A4_HEIGHT_PT - 2.0 * margin)).abs() < 0.01);
        assert!((p.x - (A4_WIDTH_PT - p.width) / 2.0).abs() < 0.01);
    }

    #[test]
    fn test_footer_text() {
        assert_eq!(
            footer_text(at()),
            "Generated on 2024-03-09 \u{2022} Phantom Thief Resume System"
        );
        assert_eq!(win_ansi("a \u{2022} \u{4e00}"), vec![b'a', b' ', 0x95, b' ', b'?']);
    }

    #[test]
    fn test_compose_single_page_with_metadata() {
        let png = encode_png(&RgbaImage::from_pixel(40, 20, Rgba([220, 20, 60, 255]))).unwrap();
        let mut stages = Vec::new();
        let mut sink = |p: &ExportProgress| stages.push(p.progress);
        let mut reporter = ProgressReporter::new(&mut sink);

        let bytes = compose_pdf(&png, &PdfMetadata::default(), at(), &mut reporter).unwrap();
        drop(reporter);
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(stages, vec![70.0, 80.0, 85.0, 90.0, 95.0, 98.0]);

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_object(info_id).unwrap().as_dict().unwrap();
        assert_eq!(
            info.get(b"Title").unwrap().as_str().unwrap(),
            b"Phantom Thief Resume"
        );
    }

    #[test]
    fn test_compose_rejects_non_png() {
        let mut sink = |_: &ExportProgress| {};
        let mut reporter = ProgressReporter::new(&mut sink);
        let err = compose_pdf(b"not a png", &PdfMetadata::default(), at(), &mut reporter)
            .unwrap_err();
        assert!(matches!(err, Error::ImageLoad(_)));
    }
}
