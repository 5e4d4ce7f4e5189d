use anyhow::Result;
use image::{DynamicImage, ImageEncoder, codecs::png::PngEncoder};
use std::io::Write;

pub fn encode(image: &DynamicImage, writer: &mut dyn Write) -> Result<()> {
	PngEncoder::new(writer).write_image(image.as_bytes(), image.width(), image.height(), image.color().into())?;
	Ok(())
}
