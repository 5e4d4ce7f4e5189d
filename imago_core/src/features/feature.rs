//! Individual capability flags of an IIIF server, named as they appear in the `supports` list of a
//! descriptor's profile.
//!
//! ```
//! use imago_core::Feature;
//!
//! assert_eq!(Feature::SizeByWhListed.as_str(), "sizeByWhListed");
//! assert_eq!(Feature::parse("regionByPct").unwrap(), Feature::RegionByPct);
//! ```

use anyhow::{Result, bail};
use enumset::EnumSetType;
use std::fmt::Display;

#[derive(Debug, EnumSetType, PartialOrd, Ord, Hash)]
pub enum Feature {
	RegionByPx,
	RegionByPct,

	SizeByWhListed,
	SizeByW,
	SizeByH,
	SizeByPct,
	SizeByWh,
	SizeByForcedWh,
	SizeAboveFull,

	RotationBy90s,
	RotationArbitrary,
	Mirroring,

	BaseUriRedirect,
	Cors,
	JsonldMediaType,
	ProfileLinkHeader,
	CanonicalLinkHeader,
}

impl Feature {
	pub fn as_str(&self) -> &'static str {
		use Feature::*;
		match self {
			RegionByPx => "regionByPx",
			RegionByPct => "regionByPct",
			SizeByWhListed => "sizeByWhListed",
			SizeByW => "sizeByW",
			SizeByH => "sizeByH",
			SizeByPct => "sizeByPct",
			SizeByWh => "sizeByWh",
			SizeByForcedWh => "sizeByForcedWh",
			SizeAboveFull => "sizeAboveFull",
			RotationBy90s => "rotationBy90s",
			RotationArbitrary => "rotationArbitrary",
			Mirroring => "mirroring",
			BaseUriRedirect => "baseUriRedirect",
			Cors => "cors",
			JsonldMediaType => "jsonldMediaType",
			ProfileLinkHeader => "profileLinkHeader",
			CanonicalLinkHeader => "canonicalLinkHeader",
		}
	}

	pub fn parse(name: &str) -> Result<Feature> {
		match enumset::EnumSet::<Feature>::all().iter().find(|f| f.as_str() == name) {
			Some(feature) => Ok(feature),
			None => bail!("unknown IIIF feature '{name}'"),
		}
	}
}

impl Display for Feature {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
