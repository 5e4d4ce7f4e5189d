use super::{ImageDecoder, normalize};
use anyhow::{Context, Result, ensure};
use image::{DynamicImage, ImageReader};
use imago_core::PixelRect;
use std::path::{Path, PathBuf};

/// Decoder for any single resolution format the `image` crate can read.
///
/// Opening only parses the header. The pixels are decoded completely on every call to
/// [`ImageDecoder::decode`] and cropped afterwards.
pub struct RasterDecoder {
	path: PathBuf,
	levels: [(u32, u32); 1],
}

impl RasterDecoder {
	pub fn open(path: &Path) -> Result<RasterDecoder> {
		let dimensions = ImageReader::open(path)
			.with_context(|| format!("opening {path:?}"))?
			.with_guessed_format()?
			.into_dimensions()
			.with_context(|| format!("reading image header of {path:?}"))?;

		Ok(RasterDecoder {
			path: path.to_path_buf(),
			levels: [dimensions],
		})
	}
}

impl ImageDecoder for RasterDecoder {
	fn levels(&self) -> &[(u32, u32)] {
		&self.levels
	}

	fn decode(&mut self, level: usize, rect: PixelRect) -> Result<DynamicImage> {
		ensure!(level == 0, "raster images have a single resolution layer, got {level}");

		let image = ImageReader::open(&self.path)?
			.with_guessed_format()?
			.decode()
			.with_context(|| format!("decoding {:?}", self.path))?;

		let (width, height) = self.levels[0];
		ensure!(
			rect.x + rect.w <= width && rect.y + rect.h <= height,
			"rectangle {rect} exceeds {width}x{height}"
		);

		let image = if rect.is_full(width, height) {
			image
		} else {
			image.crop_imm(rect.x, rect.y, rect.w, rect.h)
		};
		Ok(normalize(image))
	}
}
