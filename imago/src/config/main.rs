use super::{FeaturesConfig, ImagesConfig, ServerConfig};
use anyhow::{Context, Result};
use imago_core::{DEFAULT_SCALE_FACTORS, FeatureSet};
use serde::Deserialize;
use std::{
	fs::File,
	io::{BufReader, Read},
	path::Path,
};

#[derive(Default, Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
	/// HTTP server configuration
	#[serde(default)]
	pub server: ServerConfig,

	/// Source images and how they are processed
	#[serde(default)]
	pub images: ImagesConfig,

	/// Feature overrides on top of the default feature set
	#[serde(default)]
	pub features: FeaturesConfig,
}

impl Config {
	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		Ok(serde_yaml_ng::from_reader(reader)?)
	}

	pub fn from_string(text: &str) -> Result<Self> {
		Ok(serde_yaml_ng::from_str(text)?)
	}

	/// Parse from a file path and resolve `images.root` relative to that file.
	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path).with_context(|| format!("opening config file {path:?}"))?;
		let mut cfg =
			Config::from_reader(BufReader::new(file)).with_context(|| format!("parsing config file {path:?}"))?;

		if let Some(parent) = path.parent() {
			cfg.images.resolve_paths(parent);
		}
		Ok(cfg)
	}

	/// Feature set of the server: defaults, tile layout from `images`, then `features` overrides.
	pub fn feature_set(&self) -> Result<FeatureSet> {
		let mut features = FeatureSet::default();
		let widths = self.images.tile_widths.as_deref().unwrap_or(&[512]);
		let scale_factors = self.images.scale_factors.as_deref().unwrap_or(&DEFAULT_SCALE_FACTORS);
		features.set_tiles(widths, scale_factors);
		features.limits = self.images.size_limits()?;
		self.features.apply(&mut features)?;
		Ok(features)
	}
}
