//! A complete IIIF image request: `{identifier}/{region}/{size}/{rotation}/{quality}.{format}`.

use super::{Format, Identifier, Quality, Region, Rotation, Size};
use crate::{IiifError, IiifResult};
use regex::Regex;
use std::{
	fmt::{Display, Formatter},
	sync::LazyLock,
};

static RE_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(concat!(
		r"^(?P<id>[^/]+)/(?P<region>[^/]+)/(?P<size>[^/]+)/",
		r"(?P<rotation>[^/]+)/(?P<quality>[^/.]+)\.(?P<format>[^/.]+)$"
	))
	.unwrap()
});

#[derive(Clone, Debug, PartialEq)]
pub struct Command {
	pub identifier: Identifier,
	pub region: Region,
	pub size: Size,
	pub rotation: Rotation,
	pub quality: Quality,
	pub format: Format,
	path: String,
}

impl Command {
	/// Parses the part of the request path that follows the base URL, without a leading slash.
	///
	/// The identifier segment is percent-decoded here. Every other segment has to be valid, otherwise
	/// the whole request is rejected with [`IiifError::Syntax`].
	pub fn parse(path: &str) -> IiifResult<Command> {
		let captures = RE_COMMAND.captures(path).ok_or_else(|| {
			IiifError::syntax(format!(
				"'{path}' does not match {{id}}/{{region}}/{{size}}/{{rotation}}/{{quality}}.{{format}}"
			))
		})?;

		let size = Size::parse(&captures["size"])?;
		if !size.is_valid() {
			return Err(IiifError::syntax(format!("invalid size '{size}'")));
		}

		Ok(Command {
			identifier: Identifier::from_url_segment(&captures["id"])?,
			region: Region::parse(&captures["region"])?,
			size,
			rotation: Rotation::parse(&captures["rotation"])?,
			quality: Quality::parse(&captures["quality"])?,
			format: Format::parse(&captures["format"])?,
			path: path.to_owned(),
		})
	}

	/// The raw path this command was parsed from.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Canonical form of the request for an image of the given intrinsic dimensions.
	///
	/// The region is `full` or an absolute pixel box, the size is `full` or `w,`.
	pub fn canonical_path(&self, width: u32, height: u32) -> IiifResult<String> {
		let rect = self.region.resolve(width, height)?;
		let (tw, th) = self.size.resolve(rect.w, rect.h)?;

		let region = if rect.is_full(width, height) {
			String::from("full")
		} else {
			rect.to_string()
		};
		let size = if tw == rect.w && th == rect.h {
			String::from("full")
		} else {
			format!("{tw},")
		};

		Ok(format!(
			"{}/{region}/{size}/{}/{}.{}",
			self.identifier.to_url_segment(),
			self.rotation,
			self.quality,
			self.format
		))
	}
}

impl Display for Command {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.path)
	}
}
