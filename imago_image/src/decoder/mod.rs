//! Decode handles.
//!
//! A decoder answers the intrinsic dimensions of a source image from its headers and decodes a
//! rectangle of one resolution layer on demand. Layer 0 is always the full resolution; further
//! layers are successively smaller copies of the same image.
//!
//! Every decoded image is normalised to one of `L8`, `La8`, `Rgb8` or `Rgba8`, so the rest of the
//! pipeline only deals with 8-bit pixels.

mod raster;
pub(crate) mod pyramid;

pub use raster::RasterDecoder;
pub use pyramid::TiffPyramidDecoder;

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat, ImageReader};
use imago_core::PixelRect;
use std::path::Path;

pub trait ImageDecoder: Send {
	/// Dimensions of all resolution layers, full resolution first. Never empty.
	fn levels(&self) -> &[(u32, u32)];

	/// Intrinsic dimensions of the image.
	fn dimensions(&self) -> (u32, u32) {
		self.levels()[0]
	}

	/// Decodes `rect`, given in pixel coordinates of layer `level`.
	fn decode(&mut self, level: usize, rect: PixelRect) -> Result<DynamicImage>;
}

/// Opens the best decoder for the file at `path`.
///
/// TIFF files are read with [`TiffPyramidDecoder`], which exposes reduced resolution IFDs as
/// layers. Anything it cannot handle, and every other format, goes through [`RasterDecoder`].
pub fn open_decoder(path: &Path) -> Result<Box<dyn ImageDecoder>> {
	let format = ImageReader::open(path)
		.with_context(|| format!("opening {path:?}"))?
		.with_guessed_format()
		.with_context(|| format!("guessing image format of {path:?}"))?
		.format();

	if format == Some(ImageFormat::Tiff) {
		match TiffPyramidDecoder::open(path) {
			Ok(decoder) => return Ok(Box::new(decoder)),
			Err(e) => log::debug!("reading {path:?} as plain raster: {e:#}"),
		}
	}

	Ok(Box::new(RasterDecoder::open(path)?))
}

/// Converts any decoded image into one of the four 8-bit layouts.
pub fn normalize(image: DynamicImage) -> DynamicImage {
	match image {
		DynamicImage::ImageLuma8(_)
		| DynamicImage::ImageLumaA8(_)
		| DynamicImage::ImageRgb8(_)
		| DynamicImage::ImageRgba8(_) => image,
		_ => {
			let color = image.color();
			match (color.has_color(), color.has_alpha()) {
				(false, false) => DynamicImage::ImageLuma8(image.into_luma8()),
				(false, true) => DynamicImage::ImageLumaA8(image.into_luma_alpha8()),
				(true, false) => DynamicImage::ImageRgb8(image.into_rgb8()),
				(true, true) => DynamicImage::ImageRgba8(image.into_rgba8()),
			}
		}
	}
}
