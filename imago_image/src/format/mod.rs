//! Encoders for the output formats.
//!
//! Every encoder writes into a `&mut dyn Write` sink. Formats without an encoder (`jp2`, `pdf`)
//! fail here, and the server configuration refuses to enable them.

pub mod gif;
pub mod jpeg;
pub mod png;
pub mod tiff;
pub mod webp;

use anyhow::{Context, Result, bail};
use image::DynamicImage;
use imago_core::Format;
use std::io::Write;

/// Formats this crate can produce.
pub fn is_encodable(format: Format) -> bool {
	!matches!(format, Format::Jp2 | Format::Pdf)
}

pub fn encode(image: DynamicImage, format: Format, jpeg_quality: u8, writer: &mut dyn Write) -> Result<()> {
	let (width, height, color) = (image.width(), image.height(), image.color());
	match format {
		Format::Jpg => jpeg::encode(image, jpeg_quality, writer),
		Format::Png => png::encode(&image, writer),
		Format::Gif => gif::encode(&image, writer),
		Format::Tif => tiff::encode(image, writer),
		Format::Webp => webp::encode(image, writer),
		Format::Jp2 | Format::Pdf => bail!("no encoder available for {}", format.as_mime_str()),
	}
	.with_context(|| format!("encoding {width}x{height} {color:?} image as {format}"))
}
