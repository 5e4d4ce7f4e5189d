use anyhow::Result;
use image::{DynamicImage, ImageEncoder, codecs::webp::WebPEncoder};
use std::io::Write;

/// Lossless WebP.
pub fn encode(image: DynamicImage, writer: &mut dyn Write) -> Result<()> {
	let image = if image.color().has_alpha() {
		DynamicImage::ImageRgba8(image.into_rgba8())
	} else {
		DynamicImage::ImageRgb8(image.into_rgb8())
	};

	WebPEncoder::new_lossless(writer).write_image(
		image.as_bytes(),
		image.width(),
		image.height(),
		image.color().into(),
	)?;
	Ok(())
}
