//! IIIF Image API 2.x compliance levels.
//!
//! Each level is a fixed bundle of features, qualities and formats. A [`FeatureSet`] complies with
//! a level when it enables at least that bundle.
//!
//! [`FeatureSet`]: super::FeatureSet

use super::Feature;
use crate::{Format, Quality};
use enumset::{EnumSet, enum_set};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ComplianceLevel {
	Level0,
	Level1,
	Level2,
}

const LEVEL0_FEATURES: EnumSet<Feature> = enum_set!(Feature::SizeByWhListed);

const LEVEL1_FEATURES: EnumSet<Feature> = enum_set!(
	Feature::RegionByPx
		| Feature::SizeByW
		| Feature::SizeByH
		| Feature::SizeByPct
		| Feature::SizeByWhListed
		| Feature::BaseUriRedirect
		| Feature::Cors
		| Feature::JsonldMediaType
);

const LEVEL2_FEATURES: EnumSet<Feature> = enum_set!(
	Feature::RegionByPx
		| Feature::RegionByPct
		| Feature::SizeByW
		| Feature::SizeByH
		| Feature::SizeByPct
		| Feature::SizeByWhListed
		| Feature::SizeByForcedWh
		| Feature::SizeByWh
		| Feature::RotationBy90s
		| Feature::BaseUriRedirect
		| Feature::Cors
		| Feature::JsonldMediaType
);

impl ComplianceLevel {
	/// All levels, lowest first.
	pub const ALL: [ComplianceLevel; 3] = [
		ComplianceLevel::Level0,
		ComplianceLevel::Level1,
		ComplianceLevel::Level2,
	];

	pub fn uri(&self) -> &'static str {
		match self {
			ComplianceLevel::Level0 => "http://iiif.io/api/image/2/level0.json",
			ComplianceLevel::Level1 => "http://iiif.io/api/image/2/level1.json",
			ComplianceLevel::Level2 => "http://iiif.io/api/image/2/level2.json",
		}
	}

	pub fn features(&self) -> EnumSet<Feature> {
		match self {
			ComplianceLevel::Level0 => LEVEL0_FEATURES,
			ComplianceLevel::Level1 => LEVEL1_FEATURES,
			ComplianceLevel::Level2 => LEVEL2_FEATURES,
		}
	}

	pub fn qualities(&self) -> EnumSet<Quality> {
		match self {
			ComplianceLevel::Level0 | ComplianceLevel::Level1 => enum_set!(Quality::Default),
			ComplianceLevel::Level2 => enum_set!(Quality::Default | Quality::Color | Quality::Bitonal),
		}
	}

	pub fn formats(&self) -> EnumSet<Format> {
		match self {
			ComplianceLevel::Level0 | ComplianceLevel::Level1 => enum_set!(Format::Jpg),
			ComplianceLevel::Level2 => enum_set!(Format::Jpg | Format::Png),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn levels_are_nested() {
		for pair in ComplianceLevel::ALL.windows(2) {
			let (lower, higher) = (pair[0], pair[1]);
			assert!(higher.features().is_superset(lower.features()));
			assert!(higher.qualities().is_superset(lower.qualities()));
			assert!(higher.formats().is_superset(lower.formats()));
		}
	}

	#[test]
	fn uris() {
		assert_eq!(ComplianceLevel::Level1.uri(), "http://iiif.io/api/image/2/level1.json");
	}
}
