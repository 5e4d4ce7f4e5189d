//! Upper bounds for the output size of an image request (`maxWidth`, `maxHeight`, `maxArea`).

use crate::{IiifError, IiifResult, Rotation, Size};

/// 100 megapixels.
pub const DEFAULT_MAX_AREA: u64 = 100_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeLimits {
	pub max_width: Option<u32>,
	/// Falls back to `max_width` when unset, the way clients read `info.json`.
	pub max_height: Option<u32>,
	pub max_area: Option<u64>,
}

impl Default for SizeLimits {
	fn default() -> Self {
		SizeLimits {
			max_width: None,
			max_height: None,
			max_area: Some(DEFAULT_MAX_AREA),
		}
	}
}

impl SizeLimits {
	pub const UNLIMITED: SizeLimits = SizeLimits {
		max_width: None,
		max_height: None,
		max_area: None,
	};

	pub fn effective_max_height(&self) -> Option<u32> {
		self.max_height.or(self.max_width)
	}

	/// Checks a resolved target size against the limits.
	///
	/// Arbitrary rotations draw onto a canvas that holds both the target and its bounding box, so
	/// that canvas has to fit into `max_area` as well.
	pub fn check(&self, size: &Size, target: (u32, u32), rotation: &Rotation) -> IiifResult<()> {
		let (tw, th) = target;
		let too_large = |limit: String| IiifError::syntax(format!("size '{size}' ({tw}x{th}) exceeds {limit}"));

		if let Some(max) = self.max_width
			&& tw > max
		{
			return Err(too_large(format!("maxWidth {max}")));
		}
		if let Some(max) = self.effective_max_height()
			&& th > max
		{
			return Err(too_large(format!("maxHeight {max}")));
		}
		if let Some(max) = self.max_area {
			if u64::from(tw) * u64::from(th) > max {
				return Err(too_large(format!("maxArea {max}")));
			}
			let (rw, rh) = rotation.bounds(tw, th);
			let canvas = rw.max(f64::from(tw)) * rh.max(f64::from(th));
			if rotation.quarter_turns().is_none() && canvas > max as f64 {
				return Err(IiifError::syntax(format!(
					"rotation '{rotation}' of a {tw}x{th} image exceeds maxArea {max}"
				)));
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn check(limits: SizeLimits, target: (u32, u32), rotation: &str) -> IiifResult<()> {
		limits.check(&Size::Exact { w: target.0, h: target.1 }, target, &Rotation::parse(rotation).unwrap())
	}

	#[rstest]
	#[case::small((800, 600), "0", true)]
	#[case::at_limit((10_000, 10_000), "0", true)]
	#[case::area((10_001, 10_000), "0", false)]
	#[case::overflowing((u32::MAX, u32::MAX), "0", false)]
	#[case::wide_strip((100_000_000, 1), "90", true)]
	#[case::rotated_strip((100_000_000, 1), "45", false)]
	#[case::rotated_square((5000, 5000), "45", true)]
	fn default_limits(#[case] target: (u32, u32), #[case] rotation: &str, #[case] ok: bool) {
		assert_eq!(check(SizeLimits::default(), target, rotation).is_ok(), ok);
	}

	#[test]
	fn max_height_falls_back_to_max_width() {
		let limits = SizeLimits {
			max_width: Some(1000),
			..SizeLimits::UNLIMITED
		};
		assert!(check(limits, (1000, 1000), "0").is_ok());
		assert!(check(limits, (1000, 1001), "0").is_err());
		assert!(check(limits, (1001, 10), "0").is_err());

		let limits = SizeLimits {
			max_height: Some(2000),
			..limits
		};
		assert!(check(limits, (1000, 2000), "0").is_ok());
	}

	#[test]
	fn oversized_targets_are_bad_requests() {
		let err = check(SizeLimits::default(), (60_000, 60_000), "0").unwrap_err();
		assert!(matches!(err, IiifError::Syntax(_)));
		assert_eq!(err.status_code(), 400);
		assert!(err.client_message().contains("maxArea 100000000"));
	}

	#[test]
	fn unlimited_accepts_anything() {
		assert!(check(SizeLimits::UNLIMITED, (u32::MAX, u32::MAX), "45").is_ok());
	}
}
