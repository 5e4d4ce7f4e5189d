use anyhow::{Context, Result, ensure};
use imago_core::{FeatureSet, Format};
use imago_image::format::is_encodable;
use serde::Deserialize;

/// Features, qualities and formats switched on or off on top of the defaults.
///
/// ```yaml
/// features:
///   enable: [rotationArbitrary, webp]
///   disable: [baseUriRedirect, gif]
/// ```
#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FeaturesConfig {
	#[serde(default)]
	pub enable: Vec<String>,

	#[serde(default)]
	pub disable: Vec<String>,
}

impl FeaturesConfig {
	/// Applies `enable` first, then `disable`.
	///
	/// Formats without an encoder cannot be enabled.
	pub fn apply(&self, features: &mut FeatureSet) -> Result<()> {
		fn enable(features: &mut FeatureSet, name: &str) -> Result<()> {
			if let Ok(format) = Format::parse(name) {
				ensure!(is_encodable(format), "no encoder available for {}", format.as_mime_str());
			}
			features.set_by_name(name, true)
		}

		for name in &self.enable {
			enable(features, name).with_context(|| format!("while enabling '{name}'"))?;
		}
		for name in &self.disable {
			features
				.set_by_name(name, false)
				.with_context(|| format!("while disabling '{name}'"))?;
		}
		Ok(())
	}
}
