//! The capability matrix of a server instance.
//!
//! A [`FeatureSet`] is built once at startup and then only read. It answers two questions with the
//! same data: which requests are acceptable ([`FeatureSet::check`], [`FeatureSet::check_geometry`])
//! and what `info.json` advertises ([`FeatureSet::info`]). Because both come from the same sets, the
//! descriptor never claims less than negotiation accepts, and never more.

use super::{
	ComplianceLevel, Feature, IIIF_CONTEXT, IIIF_PROTOCOL, InfoDescriptor, ProfileDetails, SizeEntry, SizeLimits,
	TileSize,
};
use crate::{Command, Format, IiifError, IiifResult, Quality, Region, Size};
use anyhow::{Result, bail};
use enumset::{EnumSet, enum_set};

pub const DEFAULT_SCALE_FACTORS: [u32; 6] = [1, 2, 4, 8, 16, 32];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureSet {
	pub features: EnumSet<Feature>,
	pub qualities: EnumSet<Quality>,
	pub formats: EnumSet<Format>,
	pub tiles: Vec<TileSize>,
	pub limits: SizeLimits,
}

impl Default for FeatureSet {
	fn default() -> Self {
		use Feature::*;
		FeatureSet {
			features: RegionByPx
				| RegionByPct
				| SizeByWhListed
				| SizeByW
				| SizeByH
				| SizeByPct
				| SizeByWh
				| SizeByForcedWh
				| SizeAboveFull
				| RotationBy90s
				| Mirroring
				| BaseUriRedirect
				| Cors
				| JsonldMediaType,
			qualities: EnumSet::all(),
			formats: enum_set!(Format::Jpg | Format::Png | Format::Gif | Format::Tif),
			tiles: vec![TileSize {
				width: 512,
				scale_factors: DEFAULT_SCALE_FACTORS.to_vec(),
			}],
			limits: SizeLimits::default(),
		}
	}
}

impl FeatureSet {
	/// A set that enables everything.
	pub fn all() -> FeatureSet {
		FeatureSet {
			features: EnumSet::all(),
			qualities: EnumSet::all(),
			formats: EnumSet::all(),
			..FeatureSet::default()
		}
	}

	pub fn has(&self, feature: Feature) -> bool {
		self.features.contains(feature)
	}

	/// Replaces the tiling schemes with one scheme per width, all sharing the same scale factors.
	pub fn set_tiles(&mut self, widths: &[u32], scale_factors: &[u32]) {
		self.tiles = widths
			.iter()
			.map(|&width| TileSize {
				width,
				scale_factors: scale_factors.to_vec(),
			})
			.collect();
	}

	/// Enables or disables a feature, quality or format by its IIIF name.
	pub fn set_by_name(&mut self, name: &str, enabled: bool) -> Result<()> {
		fn toggle<T: enumset::EnumSetType>(set: &mut EnumSet<T>, value: T, enabled: bool) {
			if enabled {
				set.insert(value);
			} else {
				set.remove(value);
			}
		}

		if let Ok(feature) = Feature::parse(name) {
			toggle(&mut self.features, feature, enabled);
		} else if let Ok(quality) = Quality::parse(name) {
			toggle(&mut self.qualities, quality, enabled);
		} else if let Ok(format) = Format::parse(name) {
			toggle(&mut self.formats, format, enabled);
		} else {
			bail!("'{name}' is neither an IIIF feature, quality nor format");
		}
		Ok(())
	}

	fn require(&self, feature: Feature, what: impl FnOnce() -> String) -> IiifResult<()> {
		if self.has(feature) {
			Ok(())
		} else {
			Err(IiifError::unsupported(format!("{} ({feature})", what())))
		}
	}

	/// Checks that every part of the command uses an enabled kind of feature.
	///
	/// Only looks at the command itself. Restrictions that depend on the image dimensions are
	/// checked by [`FeatureSet::check_geometry`].
	pub fn check(&self, cmd: &Command) -> IiifResult<()> {
		match cmd.region {
			Region::Full => {}
			Region::Pixel { .. } => self.require(Feature::RegionByPx, || format!("region '{}'", cmd.region))?,
			Region::Percent { .. } => self.require(Feature::RegionByPct, || format!("region '{}'", cmd.region))?,
		}

		let size = || format!("size '{}'", cmd.size);
		match cmd.size {
			Size::Full => {}
			Size::ScaleToWidth { .. } => self.require(Feature::SizeByW, size)?,
			Size::ScaleToHeight { .. } => self.require(Feature::SizeByH, size)?,
			Size::ScalePercent { .. } => self.require(Feature::SizeByPct, size)?,
			Size::BestFit { .. } => self.require(Feature::SizeByWh, size)?,
			Size::Exact { .. } => {
				if !self.has(Feature::SizeByForcedWh) {
					self.require(Feature::SizeByWhListed, size)?;
				}
			}
		}

		let rotation = || format!("rotation '{}'", cmd.rotation);
		if cmd.rotation.mirror {
			self.require(Feature::Mirroring, rotation)?;
		}
		match cmd.rotation.quarter_turns() {
			Some(0) => {}
			Some(_) if self.has(Feature::RotationArbitrary) => {}
			Some(_) => self.require(Feature::RotationBy90s, rotation)?,
			None => self.require(Feature::RotationArbitrary, rotation)?,
		}

		if !self.qualities.contains(cmd.quality) {
			return Err(IiifError::unsupported(format!("quality '{}'", cmd.quality)));
		}
		if !self.formats.contains(cmd.format) {
			return Err(IiifError::unsupported(format!("format '{}'", cmd.format)));
		}
		Ok(())
	}

	pub fn supported(&self, cmd: &Command) -> bool {
		self.check(cmd).is_ok()
	}

	/// Checks the restrictions that need the intrinsic image dimensions: size limits, upscaling and
	/// listed sizes.
	///
	/// Runs after [`FeatureSet::check`] and before any pixel data is decoded.
	pub fn check_geometry(&self, cmd: &Command, width: u32, height: u32) -> IiifResult<()> {
		let rect = cmd.region.resolve(width, height)?;
		let (tw, th) = cmd.size.resolve(rect.w, rect.h)?;
		self.limits.check(&cmd.size, (tw, th), &cmd.rotation)?;

		if (tw > rect.w || th > rect.h) && !self.has(Feature::SizeAboveFull) {
			return Err(IiifError::unsupported(format!(
				"size '{}' scales a {}x{} region up ({})",
				cmd.size,
				rect.w,
				rect.h,
				Feature::SizeAboveFull
			)));
		}

		if matches!(cmd.size, Size::Exact { .. }) && !self.has(Feature::SizeByForcedWh) {
			let listed = rect.is_full(width, height)
				&& self
					.sizes(width, height)
					.is_some_and(|sizes| sizes.contains(&SizeEntry { width: tw, height: th }));
			if !listed {
				return Err(IiifError::unsupported(format!(
					"size '{}' is not one of the listed sizes ({})",
					cmd.size,
					Feature::SizeByForcedWh
				)));
			}
		}
		Ok(())
	}

	/// Full image sizes a client may request with `w,h` at level 0, smallest first.
	///
	/// `None` unless `sizeByWhListed` is enabled.
	pub fn sizes(&self, width: u32, height: u32) -> Option<Vec<SizeEntry>> {
		if !self.has(Feature::SizeByWhListed) {
			return None;
		}

		let mut factors: Vec<u32> = self.tiles.iter().flat_map(|t| t.scale_factors.iter().copied()).collect();
		if factors.is_empty() {
			factors.push(1);
		}

		let mut sizes: Vec<SizeEntry> = factors
			.into_iter()
			.filter(|&s| s > 0)
			.map(|s| SizeEntry {
				width: width.div_ceil(s),
				height: height.div_ceil(s),
			})
			.collect();
		sizes.sort();
		sizes.dedup();
		Some(sizes)
	}

	/// Highest compliance level covered by this set. Falls back to level 0.
	pub fn level(&self) -> ComplianceLevel {
		ComplianceLevel::ALL
			.into_iter()
			.rev()
			.find(|level| {
				self.features.is_superset(level.features())
					&& self.qualities.is_superset(level.qualities())
					&& self.formats.is_superset(level.formats())
			})
			.unwrap_or(ComplianceLevel::Level0)
	}

	/// Builds the descriptor of a `width × height` image reachable at `id` (a full URL).
	pub fn info(&self, id: &str, width: u32, height: u32) -> InfoDescriptor {
		InfoDescriptor {
			context: IIIF_CONTEXT.to_owned(),
			id: id.to_owned(),
			protocol: IIIF_PROTOCOL.to_owned(),
			width,
			height,
			sizes: self.sizes(width, height),
			tiles: self.tiles.clone(),
			profile: (
				self.level().uri().to_owned(),
				ProfileDetails {
					formats: self.formats.iter().map(|f| f.as_str().to_owned()).collect(),
					qualities: self.qualities.iter().map(|q| q.as_str().to_owned()).collect(),
					supports: self.features.iter().map(|f| f.as_str().to_owned()).collect(),
					max_width: self.limits.max_width,
					max_height: self.limits.max_height,
					max_area: self.limits.max_area,
				},
			),
		}
	}
}
