//! Shared helpers for the integration tests.
//!
//! Every input is synthesized in memory: PDFs with lopdf, images with the
//! image crate. Each generated PDF page carries a `StitchTest` marker so a
//! test can tell which source page ended up where.

#![allow(dead_code)]

use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, Rgba};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use pdfstitch::config::SessionOptions;
use pdfstitch::io::MemorySink;
use pdfstitch::merge::{CancelToken, MergeReport, MergeSession};
use pdfstitch::source::SelectedFile;

/// Marker key set on every generated PDF page.
pub const MARKER: &str = "StitchTest";

/// A PDF with `pages` pages of `width` x `height` points, marked
/// `"{tag}:1"`, `"{tag}:2"`, ...
pub fn pdf_bytes(tag: &str, pages: usize, width: i64, height: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids = Vec::new();
    for n in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 72.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("{tag} {n}"))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
            "Contents" => content_id,
            MARKER => Object::string_literal(format!("{tag}:{n}")),
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }
        .into(),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("save pdf");
    out
}

/// An RGB JPEG of the given pixel size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

/// An RGBA PNG of the given pixel size with a translucent first column.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, _| {
        Rgba([30, 160, 60, if x == 0 { 100 } else { 255 }])
    });
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).expect("encode image");
    out.into_inner()
}

pub fn pdf_file(name: &str, pages: usize) -> SelectedFile {
    let tag = name.trim_end_matches(".pdf");
    SelectedFile::from_bytes(name, "application/pdf", pdf_bytes(tag, pages, 612, 792))
}

pub fn jpeg_file(name: &str, width: u32, height: u32) -> SelectedFile {
    SelectedFile::from_bytes(name, "image/jpeg", jpeg_bytes(width, height))
}

pub fn png_file(name: &str, width: u32, height: u32) -> SelectedFile {
    SelectedFile::from_bytes(name, "image/png", png_bytes(width, height))
}

/// Merge `files` into memory, returning the report and the output bytes.
pub async fn run_merge(files: Vec<SelectedFile>, options: SessionOptions) -> (MergeReport, Vec<u8>) {
    let mut session = MergeSession::new(options);
    session.initialize();
    session.set_file_list(files);

    let mut sink = MemorySink::new();
    let report = session
        .merge_and_download(&mut sink, &CancelToken::new())
        .await
        .expect("merge failed");
    let bytes = sink.last().map(|d| d.bytes.clone()).unwrap_or_default();
    (report, bytes)
}

/// Pages of a serialized document, in order.
pub fn pages(bytes: &[u8]) -> (Document, Vec<ObjectId>) {
    let doc = Document::load_mem(bytes).expect("output should parse");
    let ids = doc.get_pages().into_values().collect();
    (doc, ids)
}

fn number(object: &Object) -> f32 {
    match object {
        Object::Integer(i) => *i as f32,
        Object::Real(r) => *r,
        other => panic!("not a number: {other:?}"),
    }
}

/// Width and height of every page.
pub fn page_sizes(bytes: &[u8]) -> Vec<(f32, f32)> {
    let (doc, ids) = pages(bytes);
    ids.iter()
        .map(|id| {
            let page = doc.get_dictionary(*id).expect("page dict");
            let media = page.get(b"MediaBox").and_then(Object::as_array).expect("media box");
            (
                number(&media[2]) - number(&media[0]),
                number(&media[3]) - number(&media[1]),
            )
        })
        .collect()
}

/// The marker of every page; `None` for pages made from images.
pub fn page_markers(bytes: &[u8]) -> Vec<Option<String>> {
    let (doc, ids) = pages(bytes);
    ids.iter()
        .map(|id| {
            doc.get_dictionary(*id)
                .ok()
                .and_then(|page| page.get(MARKER.as_bytes()).ok())
                .and_then(|marker| marker.as_str().ok())
                .map(|marker| String::from_utf8_lossy(marker).into_owned())
        })
        .collect()
}

/// The `cm` operands `[a, b, c, d, e, f]` of the first transform drawn on
/// page `index`.
pub fn first_transform(bytes: &[u8], index: usize) -> [f32; 6] {
    let (doc, ids) = pages(bytes);
    let content = doc.get_page_content(ids[index]).expect("page content");
    let ops = Content::decode(&content).expect("decode content").operations;
    let cm = ops
        .iter()
        .find(|op| op.operator == "cm")
        .expect("page draws with a transform");

    let mut values = [0.0; 6];
    for (value, operand) in values.iter_mut().zip(&cm.operands) {
        *value = number(operand);
    }
    values
}

/// Every ordering of `0..n`.
pub fn permutations(n: usize) -> Vec<Vec<usize>> {
    if n == 0 {
        return vec![Vec::new()];
    }
    let mut out = Vec::new();
    for rest in permutations(n - 1) {
        for at in 0..=rest.len() {
            let mut order = rest.clone();
            order.insert(at, n - 1);
            out.push(order);
        }
    }
    out
}
