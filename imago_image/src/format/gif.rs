use anyhow::Result;
use image::{DynamicImage, Frame, codecs::gif::GifEncoder};
use std::io::Write;

/// Encodes a single frame GIF. The palette is quantized from RGBA.
pub fn encode(image: &DynamicImage, writer: &mut dyn Write) -> Result<()> {
	let mut encoder = GifEncoder::new(writer);
	encoder.encode_frame(Frame::new(image.to_rgba8()))?;
	Ok(())
}
