//! Image bytes <-> pixel buffers.
//!
//! Formats split into two capabilities: every recognised format is
//! *displayable* (the viewer renders the original bytes), but only PNG is
//! *diffable* because its decode path yields the exact pixel grid.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbaImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("image is empty")]
    Empty,

    #[error("unrecognised image format")]
    UnknownFormat,

    #[error("{} images can be displayed but not diffed", format_name(.0))]
    NotDiffable(ImageFormat),

    #[error("malformed image data: {0}")]
    Malformed(#[from] image::ImageError),

    #[error("image has zero area ({width}x{height})")]
    ZeroArea { width: u32, height: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Lossless decode to an exact pixel grid.
    Diffable,
    /// Rendered as-is by the viewer, never pixel-compared.
    Displayable,
}

/// Formats the viewer can show directly.
const DISPLAYABLE: [ImageFormat; 5] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::Bmp,
    ImageFormat::WebP,
];

/// Identify a displayable format by its signature.
pub fn sniff(bytes: &[u8]) -> Result<ImageFormat, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let format = image::guess_format(bytes).map_err(|_| DecodeError::UnknownFormat)?;
    if DISPLAYABLE.contains(&format) {
        Ok(format)
    } else {
        Err(DecodeError::UnknownFormat)
    }
}

pub fn capability(format: ImageFormat) -> Capability {
    match format {
        ImageFormat::Png => Capability::Diffable,
        _ => Capability::Displayable,
    }
}

/// Decode diffable bytes into an RGBA8 buffer.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
    let format = sniff(bytes)?;
    if capability(format) != Capability::Diffable {
        return Err(DecodeError::NotDiffable(format));
    }

    let image = image::load_from_memory_with_format(bytes, format)?.to_rgba8();
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::ZeroArea { width, height });
    }
    Ok(image)
}

/// Lossless PNG encoding.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// A self-contained image payload handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    /// Wrap raw bytes for display. Fails only when the format is not
    /// displayable at all.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DecodeError> {
        let format = sniff(&bytes)?;
        Ok(Self { format, bytes })
    }

    pub fn png(image: &RgbaImage) -> Result<Self, image::ImageError> {
        Ok(Self {
            format: ImageFormat::Png,
            bytes: encode_png(image)?,
        })
    }

    pub fn mime(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("bin")
    }

    /// `data:<mime>;base64,...` URI, embeddable in a webview.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime(), STANDARD.encode(&self.bytes))
    }
}

fn format_name(format: &ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "PNG",
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::Gif => "GIF",
        ImageFormat::Bmp => "BMP",
        ImageFormat::WebP => "WebP",
        _ => "unsupported",
    }
}
