use anyhow::Result;
use image::{DynamicImage, ImageEncoder, codecs::tiff::TiffEncoder};
use std::io::{Cursor, Write};

/// TIFF needs a seekable sink, so the file is assembled in memory first.
pub fn encode(image: DynamicImage, writer: &mut dyn Write) -> Result<()> {
	let image = match image {
		DynamicImage::ImageLumaA8(_) => DynamicImage::ImageRgba8(image.into_rgba8()),
		_ => image,
	};

	let mut cursor = Cursor::new(Vec::new());
	TiffEncoder::new(&mut cursor).write_image(image.as_bytes(), image.width(), image.height(), image.color().into())?;
	writer.write_all(cursor.get_ref())?;
	Ok(())
}
