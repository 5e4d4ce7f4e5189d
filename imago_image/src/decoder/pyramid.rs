use super::ImageDecoder;
use anyhow::{Context, Result, bail, ensure};
use image::{DynamicImage, ImageBuffer};
use imago_core::PixelRect;
use std::{
	fs::File,
	io::BufReader,
	path::{Path, PathBuf},
};
use tiff::{
	ColorType,
	decoder::{Decoder, DecodingResult},
};

/// Decoder for TIFF files with reduced resolution images.
///
/// The first IFD is the full resolution. Each following IFD that is strictly smaller, keeps the
/// aspect ratio and has a supported color type becomes another resolution layer. Rectangles are
/// assembled from the strips or tiles they overlap, so only those chunks are decompressed.
pub struct TiffPyramidDecoder {
	path: PathBuf,
	decoder: Decoder<BufReader<File>>,
	levels: Vec<(u32, u32)>,
	ifds: Vec<usize>,
	current_ifd: usize,
}

impl TiffPyramidDecoder {
	pub fn open(path: &Path) -> Result<TiffPyramidDecoder> {
		let file = File::open(path).with_context(|| format!("opening {path:?}"))?;
		let mut decoder =
			Decoder::new(BufReader::new(file)).with_context(|| format!("reading TIFF header of {path:?}"))?;

		let full = decoder.dimensions()?;
		let color = decoder.colortype()?;
		ensure!(channel_count(color).is_some(), "unsupported TIFF color type {color:?}");

		let mut levels = vec![full];
		let mut ifds = vec![0];
		let mut index = 0;
		while decoder.more_images() {
			decoder.next_image()?;
			index += 1;

			let (w, h) = decoder.dimensions()?;
			let (lw, lh) = levels[levels.len() - 1];
			let expected_h = (f64::from(full.1) * f64::from(w) / f64::from(full.0)).round();
			let is_reduced = w < lw && h < lh && (f64::from(h) - expected_h).abs() <= 1.0;
			if is_reduced && channel_count(decoder.colortype()?).is_some() {
				levels.push((w, h));
				ifds.push(index);
			}
		}
		decoder.seek_to_image(0)?;

		log::trace!("{path:?} has {} resolution layer(s): {levels:?}", levels.len());

		Ok(TiffPyramidDecoder {
			path: path.to_path_buf(),
			decoder,
			levels,
			ifds,
			current_ifd: 0,
		})
	}

	fn read_rect(&mut self, level: usize, rect: PixelRect) -> Result<DynamicImage> {
		let Some(&ifd) = self.ifds.get(level) else {
			bail!("resolution layer {level} does not exist");
		};
		if ifd != self.current_ifd {
			self.decoder.seek_to_image(ifd)?;
			self.current_ifd = ifd;
		}

		let (width, height) = self.levels[level];
		ensure!(
			rect.w > 0 && rect.h > 0 && rect.x + rect.w <= width && rect.y + rect.h <= height,
			"rectangle {rect} is not inside {width}x{height}"
		);

		let color = self.decoder.colortype()?;
		let Some(channels) = channel_count(color) else {
			bail!("unsupported TIFF color type {color:?}");
		};

		let (chunk_w, chunk_h) = self.decoder.chunk_dimensions();
		let chunks_across = width.div_ceil(chunk_w);
		let (rect_x1, rect_y1) = (rect.x + rect.w, rect.y + rect.h);

		let mut buffer = vec![0u8; rect.w as usize * rect.h as usize * channels];
		for cy in rect.y / chunk_h..=(rect_y1 - 1) / chunk_h {
			for cx in rect.x / chunk_w..=(rect_x1 - 1) / chunk_w {
				let index = cy * chunks_across + cx;
				let data = into_u8(self.decoder.read_chunk(index)?)?;
				let (data_w, data_h) = self.decoder.chunk_data_dimensions(index);
				let (ox, oy) = (cx * chunk_w, cy * chunk_h);

				let (x0, x1) = (ox.max(rect.x), (ox + data_w).min(rect_x1));
				let (y0, y1) = (oy.max(rect.y), (oy + data_h).min(rect_y1));
				if x0 >= x1 || y0 >= y1 {
					continue;
				}

				let len = (x1 - x0) as usize * channels;
				for y in y0..y1 {
					let src = ((y - oy) as usize * data_w as usize + (x0 - ox) as usize) * channels;
					let dst = ((y - rect.y) as usize * rect.w as usize + (x0 - rect.x) as usize) * channels;
					let Some(row) = data.get(src..src + len) else {
						bail!("chunk {index} of {:?} is truncated", self.path);
					};
					buffer[dst..dst + len].copy_from_slice(row);
				}
			}
		}

		let image = match channels {
			1 => ImageBuffer::from_raw(rect.w, rect.h, buffer).map(DynamicImage::ImageLuma8),
			2 => ImageBuffer::from_raw(rect.w, rect.h, buffer).map(DynamicImage::ImageLumaA8),
			3 => ImageBuffer::from_raw(rect.w, rect.h, buffer).map(DynamicImage::ImageRgb8),
			_ => ImageBuffer::from_raw(rect.w, rect.h, buffer).map(DynamicImage::ImageRgba8),
		};
		image.context("pixel buffer does not match the rectangle")
	}
}

impl ImageDecoder for TiffPyramidDecoder {
	fn levels(&self) -> &[(u32, u32)] {
		&self.levels
	}

	fn decode(&mut self, level: usize, rect: PixelRect) -> Result<DynamicImage> {
		self
			.read_rect(level, rect)
			.with_context(|| format!("decoding {rect} of layer {level} in {:?}", self.path))
	}
}

fn channel_count(color: ColorType) -> Option<usize> {
	match color {
		ColorType::Gray(8 | 16) => Some(1),
		ColorType::GrayA(8 | 16) => Some(2),
		ColorType::RGB(8 | 16) => Some(3),
		ColorType::RGBA(8 | 16) => Some(4),
		_ => None,
	}
}

fn into_u8(data: DecodingResult) -> Result<Vec<u8>> {
	match data {
		DecodingResult::U8(data) => Ok(data),
		DecodingResult::U16(data) => Ok(data.into_iter().map(|v| (v >> 8) as u8).collect()),
		_ => bail!("unsupported TIFF sample format"),
	}
}
