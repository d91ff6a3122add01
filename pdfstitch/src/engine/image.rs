//! Raster image preparation and placement.
//!
//! Decoding and compressing an image is independent of the output
//! document, so it happens in [`PreparedImage::prepare_jpeg`] and
//! [`PreparedImage::prepare_png`], which can run on a blocking thread.
//! The result is a pair of ready-to-add XObject streams.
//!
//! JPEG files whose original color model PDF understands natively (RGB or
//! grayscale) are embedded as-is with `DCTDecode`. Anything else is decoded
//! and stored as Flate-compressed 8-bit RGB, with the alpha channel split
//! into a soft mask when the image has one.

use std::io::Cursor;

use image::codecs::jpeg::JpegDecoder;
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageFormat};
use lopdf::{Object, ObjectId, Stream, dictionary};

use crate::error::{Result, StitchError};

/// An image turned into PDF streams, not yet part of any document.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// The image XObject. Its `SMask` entry is set when embedded.
    pub image: Stream,
    /// Soft mask holding the alpha channel.
    pub smask: Option<Stream>,
}

impl PreparedImage {
    /// Prepare JPEG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a decodable JPEG.
    pub fn prepare_jpeg(bytes: &[u8]) -> Result<Self> {
        let decoder = JpegDecoder::new(Cursor::new(bytes)).map_err(image_error)?;
        let original = decoder.original_color_type();
        let decoded = DynamicImage::from_decoder(decoder).map_err(image_error)?;
        let (width, height) = (decoded.width(), decoded.height());

        let color_space = match original {
            ExtendedColorType::Rgb8 => Some("DeviceRGB"),
            ExtendedColorType::L8 => Some("DeviceGray"),
            _ => None,
        };

        match color_space {
            Some(color_space) => {
                let dict = dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => color_space,
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                };
                Ok(Self {
                    width,
                    height,
                    image: Stream::new(dict, bytes.to_vec()).with_compression(false),
                    smask: None,
                })
            }
            None => Self::from_decoded(&decoded),
        }
    }

    /// Prepare PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a decodable PNG.
    pub fn prepare_png(bytes: &[u8]) -> Result<Self> {
        let decoded =
            image::load_from_memory_with_format(bytes, ImageFormat::Png).map_err(image_error)?;
        Self::from_decoded(&decoded)
    }

    fn from_decoded(decoded: &DynamicImage) -> Result<Self> {
        let (width, height) = (decoded.width(), decoded.height());
        let color = decoded.color();

        let (color_space, pixels, alpha) = if color.has_alpha() {
            let rgba = decoded.to_rgba8();
            let mut rgb = Vec::with_capacity((width * height * 3) as usize);
            let mut alpha = Vec::with_capacity((width * height) as usize);
            for pixel in rgba.pixels() {
                rgb.extend_from_slice(&pixel.0[..3]);
                alpha.push(pixel.0[3]);
            }
            let alpha = alpha.iter().any(|&a| a != u8::MAX).then_some(alpha);
            ("DeviceRGB", rgb, alpha)
        } else if color.has_color() {
            ("DeviceRGB", decoded.to_rgb8().into_raw(), None)
        } else {
            ("DeviceGray", decoded.to_luma8().into_raw(), None)
        };

        let image = flate_image(width, height, color_space, pixels)?;
        let smask = alpha
            .map(|alpha| flate_image(width, height, "DeviceGray", alpha))
            .transpose()?;

        Ok(Self {
            width,
            height,
            image,
            smask,
        })
    }
}

fn flate_image(width: u32, height: u32, color_space: &str, pixels: Vec<u8>) -> Result<Stream> {
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => Object::Name(color_space.as_bytes().to_vec()),
        "BitsPerComponent" => 8,
    };
    let mut stream = Stream::new(dict, pixels);
    stream.compress()?;
    Ok(stream)
}

fn image_error(err: image::ImageError) -> StitchError {
    StitchError::other(format!("Failed to decode image: {err}"))
}

/// An image that has been added to an output document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmbeddedImage {
    /// Object id of the image XObject.
    pub id: ObjectId,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl EmbeddedImage {
    /// Size after a uniform scale.
    pub fn scale(&self, factor: f32) -> (f32, f32) {
        (self.width as f32 * factor, self.height as f32 * factor)
    }

    /// Largest size with the image's aspect ratio that fits in the box.
    pub fn scale_to_fit(&self, max_width: f32, max_height: f32) -> (f32, f32) {
        self.scale(fit_factor(
            (self.width as f32, self.height as f32),
            (max_width, max_height),
        ))
    }

    /// Where the image goes on a page of the given size.
    pub fn placement(&self, page: (f32, f32)) -> Placement {
        let (width, height) = self.scale_to_fit(page.0, page.1);
        Placement {
            x: (page.0 - width) / 2.0,
            y: (page.1 - height) / 2.0,
            width,
            height,
        }
    }
}

/// Rectangle an image is drawn into, in points from the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Left edge.
    pub x: f32,
    /// Bottom edge.
    pub y: f32,
    /// Drawn width.
    pub width: f32,
    /// Drawn height.
    pub height: f32,
}

/// Uniform scale that fits `content` inside `frame`.
pub(crate) fn fit_factor(content: (f32, f32), frame: (f32, f32)) -> f32 {
    if content.0 <= 0.0 || content.1 <= 0.0 {
        return 1.0;
    }
    (frame.0 / content.0).min(frame.1 / content.1)
}
