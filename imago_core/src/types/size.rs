//! The `{size}` segment of an IIIF image request.
//!
//! | wire form | variant                         |
//! |-----------|---------------------------------|
//! | `full`    | [`Size::Full`]                  |
//! | `w,`      | [`Size::ScaleToWidth`]          |
//! | `,h`      | [`Size::ScaleToHeight`]         |
//! | `pct:n`   | [`Size::ScalePercent`]          |
//! | `w,h`     | [`Size::Exact`]                 |
//! | `!w,h`    | [`Size::BestFit`]               |
//!
//! Parsing only checks the structure of the segment. Whether the numbers make sense is answered by
//! [`Size::is_valid`], so that `0,` still parses to `ScaleToWidth { w: 0 }` and is then refused.

use crate::{IiifError, IiifResult};
use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Size {
	Full,
	ScaleToWidth { w: u32 },
	ScaleToHeight { h: u32 },
	ScalePercent { p: f64 },
	Exact { w: u32, h: u32 },
	BestFit { w: u32, h: u32 },
}

impl Size {
	pub fn parse(text: &str) -> IiifResult<Size> {
		let error = || IiifError::syntax(format!("invalid size '{text}'"));

		if text == "full" {
			return Ok(Size::Full);
		}

		if let Some(percent) = text.strip_prefix("pct:") {
			let p = percent.parse::<f64>().ok().filter(|p| p.is_finite()).ok_or_else(error)?;
			return Ok(Size::ScalePercent { p });
		}

		let (best_fit, pair) = match text.strip_prefix('!') {
			Some(rest) => (true, rest),
			None => (false, text),
		};

		let (w, h) = pair.split_once(',').ok_or_else(error)?;
		let parse = |v: &str| -> IiifResult<Option<u32>> {
			if v.is_empty() {
				Ok(None)
			} else {
				v.parse::<u32>().map(Some).map_err(|_| error())
			}
		};

		Ok(match (best_fit, parse(w)?, parse(h)?) {
			(true, Some(w), Some(h)) => Size::BestFit { w, h },
			(true, _, _) | (false, None, None) => return Err(error()),
			(false, None, Some(h)) => Size::ScaleToHeight { h },
			(false, Some(w), None) => Size::ScaleToWidth { w },
			(false, Some(w), Some(h)) => Size::Exact { w, h },
		})
	}

	pub fn is_valid(&self) -> bool {
		match *self {
			Size::Full => true,
			Size::ScaleToWidth { w } => w > 0,
			Size::ScaleToHeight { h } => h > 0,
			Size::ScalePercent { p } => p > 0.0,
			Size::Exact { w, h } | Size::BestFit { w, h } => w > 0 && h > 0,
		}
	}

	/// Target dimensions when a `width × height` region is scaled by this size.
	///
	/// Fractional results are rounded to the nearest integer. A dimension that rounds down to zero
	/// pixels is an error, it is never bumped up to one.
	pub fn resolve(&self, width: u32, height: u32) -> IiifResult<(u32, u32)> {
		let (fw, fh) = (f64::from(width), f64::from(height));
		let (tw, th) = match *self {
			Size::Full => (fw, fh),
			Size::ScaleToWidth { w } => (f64::from(w), fh * f64::from(w) / fw),
			Size::ScaleToHeight { h } => (fw * f64::from(h) / fh, f64::from(h)),
			Size::ScalePercent { p } => (fw * p / 100.0, fh * p / 100.0),
			Size::Exact { w, h } => (f64::from(w), f64::from(h)),
			Size::BestFit { w, h } => {
				let scale = (f64::from(w) / fw).min(f64::from(h) / fh);
				(fw * scale, fh * scale)
			}
		};

		let (tw, th) = (tw.round(), th.round());
		if tw < 1.0 || th < 1.0 {
			return Err(IiifError::syntax(format!(
				"size '{self}' scales a {width}x{height} region to zero pixels"
			)));
		}
		if tw > f64::from(u32::MAX) || th > f64::from(u32::MAX) {
			return Err(IiifError::syntax(format!("size '{self}' is too large")));
		}
		Ok((tw as u32, th as u32))
	}

	/// Whether the aspect ratio of the region is kept by this size.
	pub fn preserves_aspect_ratio(&self) -> bool {
		!matches!(self, Size::Exact { .. })
	}
}

impl Display for Size {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Size::Full => f.write_str("full"),
			Size::ScaleToWidth { w } => write!(f, "{w},"),
			Size::ScaleToHeight { h } => write!(f, ",{h}"),
			Size::ScalePercent { p } => write!(f, "pct:{p}"),
			Size::Exact { w, h } => write!(f, "{w},{h}"),
			Size::BestFit { w, h } => write!(f, "!{w},{h}"),
		}
	}
}
