use crate::traits::DynamicImageTraitOperation;
use anyhow::{Result, bail};
use image::{DynamicImage, ImageEncoder, codecs::jpeg::JpegEncoder};
use std::io::Write;

/// Encodes as baseline JPEG. Alpha channels are dropped.
pub fn encode(image: DynamicImage, quality: u8, writer: &mut dyn Write) -> Result<()> {
	if !(1..=100).contains(&quality) {
		bail!("JPEG quality must be between 1 and 100, got {quality}");
	}

	let image = image.into_no_alpha();
	JpegEncoder::new_with_quality(writer, quality).write_image(
		image.as_bytes(),
		image.width(),
		image.height(),
		image.color().into(),
	)?;
	Ok(())
}
