//! The `{quality}` part of the final request segment.

use crate::{IiifError, IiifResult};
use enumset::EnumSetType;
use std::fmt::{Display, Formatter};

#[derive(Debug, EnumSetType, PartialOrd, Ord, Hash)]
pub enum Quality {
	Default,
	Color,
	Gray,
	Bitonal,
}

impl Quality {
	pub fn as_str(&self) -> &'static str {
		match self {
			Quality::Default => "default",
			Quality::Color => "color",
			Quality::Gray => "gray",
			Quality::Bitonal => "bitonal",
		}
	}

	pub fn parse(text: &str) -> IiifResult<Quality> {
		Ok(match text {
			"default" => Quality::Default,
			"color" => Quality::Color,
			"gray" => Quality::Gray,
			"bitonal" => Quality::Bitonal,
			_ => return Err(IiifError::syntax(format!("unknown quality '{text}'"))),
		})
	}
}

impl Display for Quality {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
