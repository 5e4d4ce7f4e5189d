//! The transformation pipeline of an image request.
//!
//! 1. resolve the region against the intrinsic dimensions
//! 2. resolve the target size against the region
//! 3. pick the coarsest resolution layer that still has at least the target resolution
//! 4. decode the region from that layer
//! 5. resample to exactly the target size
//! 6. mirror and rotate
//! 7. apply the quality
//!
//! Encoding is left to the caller, see [`crate::format::encode`]. The [`CancelFlag`] is checked
//! between steps.

use crate::{CancelFlag, decoder::ImageDecoder, traits::DynamicImageTraitOperation};
use anyhow::{Result, bail};
use fast_image_resize::{FilterType, ResizeAlg};
use image::DynamicImage;
use imago_core::{Command, IiifError, IiifResult, PixelRect, SizeLimits};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Interpolation used when the region has to be scaled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleFilter {
	Nearest,
	#[default]
	Bilinear,
	CatmullRom,
	Lanczos3,
}

impl ResampleFilter {
	pub fn as_str(&self) -> &'static str {
		match self {
			ResampleFilter::Nearest => "nearest",
			ResampleFilter::Bilinear => "bilinear",
			ResampleFilter::CatmullRom => "catmullrom",
			ResampleFilter::Lanczos3 => "lanczos3",
		}
	}

	pub fn parse(name: &str) -> Result<ResampleFilter> {
		Ok(match name.trim().to_lowercase().as_str() {
			"nearest" => ResampleFilter::Nearest,
			"bilinear" => ResampleFilter::Bilinear,
			"catmullrom" => ResampleFilter::CatmullRom,
			"lanczos3" => ResampleFilter::Lanczos3,
			_ => bail!("unknown resample filter '{name}', expected nearest, bilinear, catmullrom or lanczos3"),
		})
	}
}

impl Display for ResampleFilter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl From<ResampleFilter> for ResizeAlg {
	fn from(filter: ResampleFilter) -> Self {
		match filter {
			ResampleFilter::Nearest => ResizeAlg::Nearest,
			ResampleFilter::Bilinear => ResizeAlg::Convolution(FilterType::Bilinear),
			ResampleFilter::CatmullRom => ResizeAlg::Convolution(FilterType::CatmullRom),
			ResampleFilter::Lanczos3 => ResizeAlg::Convolution(FilterType::Lanczos3),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineOptions {
	pub resample: ResampleFilter,
	/// JPEG quality, 1 to 100.
	pub jpeg_quality: u8,
	/// Checked again before any buffer of the target size is allocated.
	pub limits: SizeLimits,
}

impl Default for PipelineOptions {
	fn default() -> Self {
		PipelineOptions {
			resample: ResampleFilter::default(),
			jpeg_quality: 90,
			limits: SizeLimits::default(),
		}
	}
}

/// Geometry of one request against one decoder, computed before any pixel is touched.
#[derive(Clone, Debug, PartialEq)]
pub struct Plan {
	/// Requested region in full resolution coordinates.
	pub region: PixelRect,
	/// Output size before rotation.
	pub target: (u32, u32),
	/// Resolution layer to decode from.
	pub level: usize,
	/// Integer rectangle decoded from that layer.
	pub source: PixelRect,
	/// Exact region inside the decoded rectangle, `(x, y, w, h)`.
	pub crop: (f64, f64, f64, f64),
}

impl Plan {
	pub fn new(cmd: &Command, levels: &[(u32, u32)]) -> IiifResult<Plan> {
		let Some(&(width, height)) = levels.first() else {
			return Err(IiifError::Internal(anyhow::anyhow!("decoder reports no resolution layers")));
		};
		let region = cmd.region.resolve(width, height)?;
		let target = cmd.size.resolve(region.w, region.h)?;

		let scale = |(lw, lh): (u32, u32)| (f64::from(lw) / f64::from(width), f64::from(lh) / f64::from(height));

		let level = levels
			.iter()
			.enumerate()
			.rev()
			.find(|&(_, &dims)| {
				let (sx, sy) = scale(dims);
				f64::from(region.w) * sx >= f64::from(target.0) && f64::from(region.h) * sy >= f64::from(target.1)
			})
			.map_or(0, |(index, _)| index);

		let (lw, lh) = levels[level];
		let (sx, sy) = scale((lw, lh));

		let x0 = (f64::from(region.x) * sx).floor();
		let y0 = (f64::from(region.y) * sy).floor();
		let x1 = (f64::from(region.x + region.w) * sx).ceil().min(f64::from(lw));
		let y1 = (f64::from(region.y + region.h) * sy).ceil().min(f64::from(lh));
		let source = PixelRect::new(x0 as u32, y0 as u32, (x1 - x0).max(1.0) as u32, (y1 - y0).max(1.0) as u32);

		let crop_x = f64::from(region.x) * sx - x0;
		let crop_y = f64::from(region.y) * sy - y0;
		let crop = (
			crop_x,
			crop_y,
			(f64::from(region.w) * sx).min(f64::from(source.w) - crop_x),
			(f64::from(region.h) * sy).min(f64::from(source.h) - crop_y),
		);

		Ok(Plan {
			region,
			target,
			level,
			source,
			crop,
		})
	}

	/// Whether the decoded rectangle already is the output.
	fn is_identity(&self) -> bool {
		let (w, h) = (f64::from(self.source.w), f64::from(self.source.h));
		self.crop == (0.0, 0.0, w, h) && self.target == (self.source.w, self.source.h)
	}
}

/// Runs all pixel steps of `cmd` against `decoder`.
pub fn render(
	decoder: &mut dyn ImageDecoder,
	cmd: &Command,
	options: &PipelineOptions,
	cancel: &CancelFlag,
) -> IiifResult<DynamicImage> {
	cancel.check()?;
	let plan = Plan::new(cmd, decoder.levels())?;
	log::trace!("{cmd}: {plan:?}");
	options.limits.check(&cmd.size, plan.target, &cmd.rotation)?;

	let image = decoder.decode(plan.level, plan.source).map_err(IiifError::Decode)?;
	cancel.check()?;

	let image = if plan.is_identity() {
		image
	} else {
		let (x, y, w, h) = plan.crop;
		image
			.get_extract(x, y, w, h, plan.target.0, plan.target.1, options.resample)
			.map_err(IiifError::Internal)?
	};
	cancel.check()?;

	let image = image.into_rotated(&cmd.rotation);
	cancel.check()?;

	Ok(image.into_quality(cmd.quality))
}
