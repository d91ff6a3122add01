//! The output document.
//!
//! [`OutputDocument`] wraps the lopdf document being assembled together
//! with its [`SlotSequence`]. Pages are created or copied into the lopdf
//! object table right away, but only reach the page tree when the
//! document is saved, in slot order.

use std::ops::Range;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use tracing::debug;

use super::image::{EmbeddedImage, Placement, PreparedImage};
use super::metadata::stamp_info;
use super::pages;
use super::slots::{Slot, SlotSequence};
use crate::config::{CompressionLevel, Metadata, PageLayout};
use crate::error::{Result, StitchError};

/// PDF version written for merged documents.
const PDF_VERSION: &str = "1.7";

/// Name of the image XObject in an image page's resources.
const IMAGE_NAME: &str = "Im0";

/// A document being assembled from source files.
#[derive(Debug)]
pub struct OutputDocument {
    doc: Document,
    pages_id: ObjectId,
    slots: SlotSequence<ObjectId>,
}

impl Default for OutputDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        let mut doc = Document::with_version(PDF_VERSION);

        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Self {
            doc,
            pages_id,
            slots: SlotSequence::new(),
        }
    }

    /// Number of slots, reservations included.
    pub fn page_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of real pages.
    pub fn occupied_count(&self) -> usize {
        self.slots.page_count()
    }

    /// Displayed size of the page at `index`.
    ///
    /// Reserved slots have a zero size. Returns `None` past the end.
    pub fn page_size(&self, index: usize) -> Option<(f32, f32)> {
        match self.slots.get(index)? {
            Slot::Reserved { .. } => Some((0.0, 0.0)),
            Slot::Occupied { page, .. } => Some(pages::page_size(&self.doc, *page)),
        }
    }

    /// Whether the slot at `index` is a reservation.
    pub fn is_reserved(&self, index: usize) -> bool {
        self.slots.is_reserved(index)
    }

    /// Remove the slot at `index`.
    ///
    /// Returns the id of the removed page, if the slot held one. The page
    /// object stays in the object table until it is pruned on save.
    pub fn remove_page(&mut self, index: usize) -> Option<ObjectId> {
        self.slots.remove(index)
    }

    /// Resolve the index the next page of the file at list position
    /// `owner` goes to. See [`SlotSequence::resolve`].
    pub fn resolve_target(&mut self, owner: usize) -> usize {
        self.slots.resolve(owner)
    }

    /// Drop the reservation held for `owner`, if any.
    pub fn release(&mut self, owner: usize) -> bool {
        self.slots.release(owner)
    }

    /// Embed JPEG bytes as an image XObject.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a decodable JPEG.
    pub fn embed_jpeg(&mut self, bytes: &[u8]) -> Result<EmbeddedImage> {
        Ok(self.embed(PreparedImage::prepare_jpeg(bytes)?))
    }

    /// Embed PNG bytes as an image XObject.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a decodable PNG.
    pub fn embed_png(&mut self, bytes: &[u8]) -> Result<EmbeddedImage> {
        Ok(self.embed(PreparedImage::prepare_png(bytes)?))
    }

    /// Add a prepared image's streams to the object table.
    pub fn embed(&mut self, prepared: PreparedImage) -> EmbeddedImage {
        let PreparedImage {
            width,
            height,
            mut image,
            smask,
        } = prepared;

        if let Some(smask) = smask {
            let smask_id = self.doc.add_object(smask);
            image.dict.set("SMask", smask_id);
        }

        EmbeddedImage {
            id: self.doc.add_object(image),
            width,
            height,
        }
    }

    /// Insert a page of the given size for `owner` with `image` drawn at
    /// `placement`. Returns the index of the new page.
    ///
    /// # Errors
    ///
    /// Returns an error if the page content cannot be encoded.
    pub fn insert_image_page(
        &mut self,
        owner: usize,
        size: (f32, f32),
        image: &EmbeddedImage,
        placement: Placement,
    ) -> Result<usize> {
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        placement.width.into(),
                        0.into(),
                        0.into(),
                        placement.height.into(),
                        placement.x.into(),
                        placement.y.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(size.0), Object::Real(size.1)],
            "Resources" => dictionary! {
                "XObject" => dictionary! { IMAGE_NAME => image.id },
            },
            "Contents" => content_id,
        });

        Ok(self.slots.insert(owner, page_id))
    }

    /// Embed a prepared image and give it its own page for `owner`.
    ///
    /// The page has the layout's size, or the image's pixel size when the
    /// layout fits pages to their images. The image is scaled uniformly to
    /// fit and centered.
    pub fn add_image(
        &mut self,
        owner: usize,
        prepared: PreparedImage,
        layout: &PageLayout,
    ) -> Result<usize> {
        let image = self.embed(prepared);
        let size = layout
            .dimensions()
            .unwrap_or((image.width as f32, image.height as f32));

        let index = self.insert_image_page(owner, size, &image, image.placement(size))?;
        debug!(owner, index, width = size.0, height = size.1, "inserted image page");
        Ok(index)
    }

    /// Parse PDF bytes into a source document.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes do not parse or hold no pages.
    pub fn load_source(bytes: &[u8]) -> Result<Document> {
        pages::load_pdf(bytes)
    }

    /// Copy every page of `source` for `owner`, contiguously and in order.
    ///
    /// With `fit`, each page is rescaled to display at that size. Returns
    /// the indices the pages now occupy.
    ///
    /// # Errors
    ///
    /// Returns an error if the source page tree is malformed.
    pub fn copy_pages(
        &mut self,
        owner: usize,
        source: Document,
        fit: Option<(f32, f32)>,
    ) -> Result<Range<usize>> {
        let copied = pages::copy_pages(&mut self.doc, source, self.pages_id)?;

        if let Some(frame) = fit {
            for &page_id in &copied {
                pages::fit_page(&mut self.doc, page_id, frame)?;
            }
        }

        let range = self.slots.insert_run(owner, copied);
        debug!(owner, start = range.start, pages = range.len(), "copied pdf pages");
        Ok(range)
    }

    /// Build the page tree, stamp metadata and serialize the document.
    ///
    /// Reserved slots are dropped. `fallback_title` is used as the title
    /// when `metadata` has none.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be serialized.
    pub fn save(
        mut self,
        compression: CompressionLevel,
        metadata: &Metadata,
        fallback_title: &str,
    ) -> Result<Vec<u8>> {
        let page_ids = self.slots.into_pages();
        let count = page_ids.len();

        let pages = self.doc.get_dictionary_mut(self.pages_id)?;
        pages.set(
            "Kids",
            page_ids.into_iter().map(Object::Reference).collect::<Vec<_>>(),
        );
        pages.set("Count", count as i64);

        stamp_info(&mut self.doc, metadata, fallback_title)?;

        match compression {
            CompressionLevel::None => {}
            CompressionLevel::Standard => self.doc.compress(),
            CompressionLevel::Maximum => {
                self.doc.prune_objects();
                self.doc.compress();
            }
        }
        self.doc.renumber_objects();

        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .map_err(|e| StitchError::other(format!("Failed to serialize document: {e}")))?;

        debug!(pages = count, bytes = bytes.len(), ?compression, "saved document");
        Ok(bytes)
    }
}
