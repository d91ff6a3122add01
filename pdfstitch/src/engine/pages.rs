//! Page copying and page geometry.
//!
//! This module moves pages between lopdf documents:
//! - Inherited attributes are pushed down onto each page first, so a page
//!   stays self-contained once it leaves its original page tree
//! - Source objects are renumbered above the output's ids and only objects
//!   reachable from the copied pages are brought over
//! - Copied pages can be fitted into a fixed frame with a `cm` transform

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use crate::error::{Result, StitchError};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Boxes that are dropped when a page is refitted, as they no longer match.
const PAGE_BOXES: [&[u8]; 4] = [b"CropBox", b"BleedBox", b"TrimBox", b"ArtBox"];

/// Media box assumed when a page has none.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Maximum page tree depth followed when looking up inherited attributes.
const MAX_TREE_DEPTH: usize = 64;

/// Parse PDF bytes into a document with at least one page.
///
/// # Errors
///
/// Returns an error if the bytes do not parse or the document has no pages.
pub fn load_pdf(bytes: &[u8]) -> Result<Document> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| StitchError::other(format!("Failed to parse PDF: {e}")))?;

    if doc.get_pages().is_empty() {
        return Err(StitchError::other("PDF has no pages"));
    }

    Ok(doc)
}

/// Copy every page of `source` into `target`, in page order.
///
/// The copied pages get `parent` as their `Parent` but are not added to any
/// `Kids` array; the caller decides where they go. Returns the ids of the
/// copied pages.
///
/// # Errors
///
/// Returns an error if a page object of `source` is not a dictionary.
pub fn copy_pages(
    target: &mut Document,
    mut source: Document,
    parent: ObjectId,
) -> Result<Vec<ObjectId>> {
    source.renumber_objects_with(target.max_id + 1);

    let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();

    for &page_id in &page_ids {
        let inherited: Vec<(&[u8], Object)> = INHERITABLE
            .iter()
            .filter_map(|key| {
                let page = source.get_dictionary(page_id).ok()?;
                if page.has(key) {
                    return None;
                }
                inherited_attribute(&source, page, key).map(|value| (*key, value))
            })
            .collect();

        let page = source.get_dictionary_mut(page_id)?;
        for (key, value) in inherited {
            page.set(key.to_vec(), value);
        }
        page.set("Parent", parent);
    }

    target.max_id = target.max_id.max(source.max_id);

    for &page_id in &page_ids {
        let page = source.get_object(page_id)?.clone();
        target.objects.insert(page_id, page);
    }
    for &page_id in &page_ids {
        copy_references(target, &source, source.get_object(page_id)?);
    }

    Ok(page_ids)
}

/// Look `key` up on the ancestors of a page.
fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut node = page;
    for _ in 0..MAX_TREE_DEPTH {
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
    }
    None
}

/// Copy every object reachable from `root` that `target` does not have yet.
fn copy_references(target: &mut Document, source: &Document, root: &Object) {
    let mut pending = Vec::new();
    collect_references(root, &mut pending);

    while let Some(id) = pending.pop() {
        if target.objects.contains_key(&id) {
            continue;
        }
        if let Ok(object) = source.get_object(id) {
            collect_references(object, &mut pending);
            target.objects.insert(id, object.clone());
        }
    }
}

fn collect_references(object: &Object, out: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => out.push(*id),
        Object::Array(items) => items.iter().for_each(|item| collect_references(item, out)),
        Object::Dictionary(dict) => dict.iter().for_each(|(_, v)| collect_references(v, out)),
        Object::Stream(stream) => stream
            .dict
            .iter()
            .for_each(|(_, v)| collect_references(v, out)),
        _ => {}
    }
}

/// Read a PDF number as `f32`.
pub(crate) fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Read a rectangle, normalized so that `[x0, y0]` is the lower-left corner.
fn rectangle(doc: &Document, object: &Object) -> Option<[f32; 4]> {
    let (_, object) = doc.dereference(object).ok()?;
    let items = object.as_array().ok()?;
    if items.len() != 4 {
        return None;
    }

    let mut values = [0.0; 4];
    for (slot, item) in values.iter_mut().zip(items) {
        let (_, item) = doc.dereference(item).ok()?;
        *slot = number(item)?;
    }

    let [a, b, c, d] = values;
    Some([a.min(c), b.min(d), a.max(c), b.max(d)])
}

fn rectangle_object(rect: [f32; 4]) -> Object {
    Object::Array(rect.iter().map(|v| Object::Real(*v)).collect())
}

/// The page's media box, normalized.
pub fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    doc.get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"MediaBox").ok())
        .and_then(|media| rectangle(doc, media))
        .unwrap_or(DEFAULT_MEDIA_BOX)
}

/// The page's `/Rotate`, normalized to 0, 90, 180 or 270.
pub fn rotation(doc: &Document, page_id: ObjectId) -> i64 {
    doc.get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Rotate").ok())
        .and_then(|r| r.as_i64().ok())
        .map(|r| r.rem_euclid(360) / 90 * 90)
        .unwrap_or(0)
}

/// Displayed size of a page in points, taking `/Rotate` into account.
pub fn page_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let [x0, y0, x1, y1] = media_box(doc, page_id);
    let (width, height) = (x1 - x0, y1 - y0);
    match rotation(doc, page_id) {
        90 | 270 => (height, width),
        _ => (width, height),
    }
}

/// Uniform transform that centers a page's content in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    /// Uniform scale factor.
    pub scale: f32,
    /// Horizontal translation, applied after scaling.
    pub tx: f32,
    /// Vertical translation, applied after scaling.
    pub ty: f32,
}

impl FitTransform {
    /// Transform fitting `media` into a `width` by `height` frame at the origin.
    pub fn new(media: [f32; 4], width: f32, height: f32) -> Self {
        let [x0, y0, x1, y1] = media;
        let (w, h) = (x1 - x0, y1 - y0);
        let scale = super::image::fit_factor((w, h), (width, height));

        Self {
            scale,
            tx: (width - w * scale) / 2.0 - x0 * scale,
            ty: (height - h * scale) / 2.0 - y0 * scale,
        }
    }

    /// Whether applying the transform changes nothing.
    pub fn is_identity(&self) -> bool {
        (self.scale - 1.0).abs() < 1e-4 && self.tx.abs() < 1e-3 && self.ty.abs() < 1e-3
    }

    fn apply(&self, rect: [f32; 4]) -> [f32; 4] {
        [
            rect[0] * self.scale + self.tx,
            rect[1] * self.scale + self.ty,
            rect[2] * self.scale + self.tx,
            rect[3] * self.scale + self.ty,
        ]
    }
}

/// Rescale a page so it displays as `frame`, keeping its aspect ratio and
/// centering the content.
///
/// The content streams are wrapped in `q <cm> ... Q`, the media box becomes
/// the frame and annotation rectangles follow the content.
///
/// # Errors
///
/// Returns an error if the page is not a dictionary or the transform
/// cannot be encoded.
pub fn fit_page(doc: &mut Document, page_id: ObjectId, frame: (f32, f32)) -> Result<()> {
    let (width, height) = match rotation(doc, page_id) {
        90 | 270 => (frame.1, frame.0),
        _ => frame,
    };
    let transform = FitTransform::new(media_box(doc, page_id), width, height);

    let page = doc.get_dictionary(page_id)?;
    let contents: Vec<Object> = match page.get(b"Contents") {
        Ok(Object::Array(items)) => items.clone(),
        Ok(contents @ Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![contents.clone()],
        },
        _ => Vec::new(),
    };
    let annotations: Vec<ObjectId> = page
        .get(b"Annots")
        .and_then(|annots| doc.dereference(annots))
        .and_then(|(_, annots)| annots.as_array())
        .map(|items| items.iter().filter_map(|a| a.as_reference().ok()).collect())
        .unwrap_or_default();

    if !transform.is_identity() {
        let prefix = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        transform.scale.into(),
                        0.into(),
                        0.into(),
                        transform.scale.into(),
                        transform.tx.into(),
                        transform.ty.into(),
                    ],
                ),
            ],
        }
        .encode()?;
        let prefix_id = doc.add_object(Stream::new(dictionary! {}, prefix));
        let suffix_id = doc.add_object(Stream::new(dictionary! {}, b"\nQ\n".to_vec()));

        let mut wrapped = Vec::with_capacity(contents.len() + 2);
        wrapped.push(Object::Reference(prefix_id));
        wrapped.extend(contents);
        wrapped.push(Object::Reference(suffix_id));

        for annot_id in annotations {
            let rect = doc
                .get_dictionary(annot_id)
                .ok()
                .and_then(|annot| annot.get(b"Rect").ok())
                .and_then(|rect| rectangle(doc, rect));
            if let (Some(rect), Ok(annot)) = (rect, doc.get_dictionary_mut(annot_id)) {
                annot.set("Rect", rectangle_object(transform.apply(rect)));
            }
        }

        let page = doc.get_dictionary_mut(page_id)?;
        page.set("Contents", Object::Array(wrapped));
    }

    let page = doc.get_dictionary_mut(page_id)?;
    page.set("MediaBox", rectangle_object([0.0, 0.0, width, height]));
    for key in PAGE_BOXES {
        page.remove(key);
    }

    Ok(())
}
