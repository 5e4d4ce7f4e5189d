//! The `info.json` capability descriptor.

use crate::{IiifError, IiifResult};
use serde::{Deserialize, Serialize};

pub const IIIF_CONTEXT: &str = "http://iiif.io/api/image/2/context.json";
pub const IIIF_PROTOCOL: &str = "http://iiif.io/api/image";

/// One tiling scheme: tiles of `width` pixels, available at each of the listed scale factors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSize {
	pub width: u32,
	#[serde(rename = "scaleFactors")]
	pub scale_factors: Vec<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SizeEntry {
	pub width: u32,
	pub height: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDetails {
	pub formats: Vec<String>,
	pub qualities: Vec<String>,
	pub supports: Vec<String>,
	#[serde(rename = "maxWidth", default, skip_serializing_if = "Option::is_none")]
	pub max_width: Option<u32>,
	#[serde(rename = "maxHeight", default, skip_serializing_if = "Option::is_none")]
	pub max_height: Option<u32>,
	#[serde(rename = "maxArea", default, skip_serializing_if = "Option::is_none")]
	pub max_area: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InfoDescriptor {
	#[serde(rename = "@context")]
	pub context: String,
	#[serde(rename = "@id")]
	pub id: String,
	pub protocol: String,
	pub width: u32,
	pub height: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sizes: Option<Vec<SizeEntry>>,
	pub tiles: Vec<TileSize>,
	/// Compliance level URI followed by the explicit capability listing.
	pub profile: (String, ProfileDetails),
}

impl InfoDescriptor {
	pub fn to_json(&self) -> IiifResult<String> {
		serde_json::to_string_pretty(self).map_err(|e| IiifError::Internal(e.into()))
	}
}
