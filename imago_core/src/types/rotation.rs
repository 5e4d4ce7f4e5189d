//! The `{rotation}` segment: clockwise degrees in `[0, 360)`, optionally prefixed with `!` to mirror
//! the image horizontally before rotating it.

use crate::{IiifError, IiifResult};
use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
	pub mirror: bool,
	pub degrees: f64,
}

impl Rotation {
	pub const NONE: Rotation = Rotation {
		mirror: false,
		degrees: 0.0,
	};

	pub fn new(degrees: f64, mirror: bool) -> IiifResult<Rotation> {
		if !degrees.is_finite() || !(0.0..360.0).contains(&degrees) {
			return Err(IiifError::syntax(format!("rotation {degrees} is not within [0, 360)")));
		}
		Ok(Rotation { mirror, degrees })
	}

	pub fn parse(text: &str) -> IiifResult<Rotation> {
		let (mirror, value) = match text.strip_prefix('!') {
			Some(rest) => (true, rest),
			None => (false, text),
		};
		if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit() || c == '.') {
			return Err(IiifError::syntax(format!("invalid rotation '{text}'")));
		}
		let degrees = value
			.parse::<f64>()
			.map_err(|_| IiifError::syntax(format!("invalid rotation '{text}'")))?;
		Rotation::new(degrees, mirror)
	}

	/// Number of clockwise quarter turns, if the angle is a multiple of 90°.
	pub fn quarter_turns(&self) -> Option<u8> {
		if self.degrees % 90.0 == 0.0 {
			Some((self.degrees / 90.0) as u8)
		} else {
			None
		}
	}

	pub fn is_identity(&self) -> bool {
		!self.mirror && self.degrees == 0.0
	}

	/// Bounding box of a `width × height` image after rotating it, at least one pixel wide.
	pub fn bounds(&self, width: u32, height: u32) -> (f64, f64) {
		let (sin, cos) = self.degrees.to_radians().sin_cos();
		let (w, h) = (f64::from(width), f64::from(height));
		(
			(w * cos.abs() + h * sin.abs()).round().max(1.0),
			(w * sin.abs() + h * cos.abs()).round().max(1.0),
		)
	}
}

impl Display for Rotation {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		if self.mirror {
			f.write_str("!")?;
		}
		write!(f, "{}", self.degrees)
	}
}
