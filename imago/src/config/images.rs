use anyhow::{Result, ensure};
use imago_core::SizeLimits;
use imago_image::{PipelineOptions, ResampleFilter};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ImagesConfig {
	/// Directory that identifiers are resolved against.
	#[serde()]
	pub root: Option<PathBuf>,

	/// Tile widths advertised in `info.json`.
	#[serde()]
	pub tile_widths: Option<Vec<u32>>,

	/// Scale factors advertised for every tile width.
	#[serde()]
	pub scale_factors: Option<Vec<u32>>,

	/// Resampling filter: `nearest`, `bilinear`, `catmullrom` or `lanczos3`.
	#[serde()]
	pub resample: Option<ResampleFilter>,

	/// JPEG quality between 1 and 100.
	#[serde()]
	pub jpeg_quality: Option<u8>,

	/// Largest output width in pixels. Advertised as `maxWidth`.
	#[serde()]
	pub max_width: Option<u32>,

	/// Largest output height in pixels, defaults to `max_width`. Advertised as `maxHeight`.
	#[serde()]
	pub max_height: Option<u32>,

	/// Largest output area in pixels. Advertised as `maxArea`. Default: 100000000
	#[serde()]
	pub max_area: Option<u64>,
}

impl ImagesConfig {
	pub fn override_optional_root(&mut self, root: &Option<PathBuf>) {
		if root.is_some() {
			self.root = root.clone();
		}
	}
	pub fn override_optional_tile_widths(&mut self, tile_widths: &Option<Vec<u32>>) {
		if tile_widths.is_some() {
			self.tile_widths = tile_widths.clone();
		}
	}
	pub fn override_optional_resample(&mut self, resample: &Option<ResampleFilter>) {
		if resample.is_some() {
			self.resample = *resample;
		}
	}
	pub fn override_optional_max_area(&mut self, max_area: &Option<u64>) {
		if max_area.is_some() {
			self.max_area = *max_area;
		}
	}

	/// Makes a relative `root` relative to `base` instead of the working directory.
	pub fn resolve_paths(&mut self, base: &Path) {
		if let Some(root) = &self.root
			&& root.is_relative()
		{
			self.root = Some(base.join(root));
		}
	}

	pub fn size_limits(&self) -> Result<SizeLimits> {
		let limits = SizeLimits {
			max_width: self.max_width,
			max_height: self.max_height,
			max_area: self.max_area.or(SizeLimits::default().max_area),
		};
		ensure!(
			limits.max_height.is_none() || limits.max_width.is_some(),
			"max_height needs max_width to be set as well"
		);
		ensure!(
			limits.max_width != Some(0) && limits.max_height != Some(0) && limits.max_area != Some(0),
			"size limits must be at least 1"
		);
		Ok(limits)
	}

	pub fn pipeline_options(&self) -> Result<PipelineOptions> {
		let mut options = PipelineOptions {
			limits: self.size_limits()?,
			..PipelineOptions::default()
		};
		if let Some(resample) = self.resample {
			options.resample = resample;
		}
		if let Some(quality) = self.jpeg_quality {
			ensure!((1..=100).contains(&quality), "jpeg_quality must be between 1 and 100, got {quality}");
			options.jpeg_quality = quality;
		}
		Ok(options)
	}
}
