//! The `{region}` segment of an IIIF image request.
//!
//! ```text
//! full              → Region::Full
//! 10,20,300,200     → Region::Pixel { x: 10, y: 20, w: 300, h: 200 }
//! pct:10,20,50,50   → Region::Percent { x: 10.0, y: 20.0, w: 50.0, h: 50.0 }
//! ```
//!
//! A region is resolved against the intrinsic image dimensions into a [`PixelRect`]. Boxes that
//! reach past the image border are clamped to the intersection; boxes that do not overlap the image
//! at all are rejected.

use crate::{IiifError, IiifResult};
use std::fmt::{Display, Formatter};

/// Axis aligned rectangle in source pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
	pub x: u32,
	pub y: u32,
	pub w: u32,
	pub h: u32,
}

impl PixelRect {
	pub fn new(x: u32, y: u32, w: u32, h: u32) -> PixelRect {
		PixelRect { x, y, w, h }
	}

	pub fn from_size(width: u32, height: u32) -> PixelRect {
		PixelRect::new(0, 0, width, height)
	}

	pub fn is_full(&self, width: u32, height: u32) -> bool {
		self.x == 0 && self.y == 0 && self.w == width && self.h == height
	}
}

impl Display for PixelRect {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{},{},{},{}", self.x, self.y, self.w, self.h)
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Region {
	Full,
	Pixel { x: u32, y: u32, w: u32, h: u32 },
	Percent { x: f64, y: f64, w: f64, h: f64 },
}

impl Region {
	pub fn parse(text: &str) -> IiifResult<Region> {
		if text == "full" {
			return Ok(Region::Full);
		}

		if let Some(values) = text.strip_prefix("pct:") {
			let [x, y, w, h] = split_four(text, values, |v| v.parse::<f64>().ok().filter(|v| v.is_finite()))?;
			if x < 0.0 || y < 0.0 || w <= 0.0 || h <= 0.0 {
				return Err(IiifError::syntax(format!("invalid region '{text}'")));
			}
			return Ok(Region::Percent { x, y, w, h });
		}

		let [x, y, w, h] = split_four(text, text, |v| v.parse::<u32>().ok())?;
		if w == 0 || h == 0 {
			return Err(IiifError::syntax(format!("region '{text}' has zero area")));
		}
		Ok(Region::Pixel { x, y, w, h })
	}

	/// Converts the region into an absolute pixel box inside a `width × height` image.
	pub fn resolve(&self, width: u32, height: u32) -> IiifResult<PixelRect> {
		let (x, y, w, h) = match *self {
			Region::Full => return Ok(PixelRect::from_size(width, height)),
			Region::Pixel { x, y, w, h } => (u64::from(x), u64::from(y), u64::from(w), u64::from(h)),
			Region::Percent { x, y, w, h } => (
				percent_of(x, width),
				percent_of(y, height),
				percent_of(w, width),
				percent_of(h, height),
			),
		};

		let (width, height) = (u64::from(width), u64::from(height));
		if x >= width || y >= height {
			return Err(IiifError::syntax(format!("region '{self}' lies outside of the image")));
		}

		let w = w.min(width - x);
		let h = h.min(height - y);
		if w == 0 || h == 0 {
			return Err(IiifError::syntax(format!("region '{self}' resolves to zero area")));
		}

		Ok(PixelRect::new(x as u32, y as u32, w as u32, h as u32))
	}
}

fn percent_of(percent: f64, total: u32) -> u64 {
	(percent * f64::from(total) / 100.0).round().max(0.0) as u64
}

fn split_four<T>(original: &str, values: &str, parse: impl Fn(&str) -> Option<T>) -> IiifResult<[T; 4]> {
	let error = || IiifError::syntax(format!("invalid region '{original}'"));
	let parsed = values.split(',').map(&parse).collect::<Option<Vec<T>>>().ok_or_else(error)?;
	<[T; 4]>::try_from(parsed).map_err(|_| error())
}

impl Display for Region {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Region::Full => f.write_str("full"),
			Region::Pixel { x, y, w, h } => write!(f, "{x},{y},{w},{h}"),
			Region::Percent { x, y, w, h } => write!(f, "pct:{x},{y},{w},{h}"),
		}
	}
}
