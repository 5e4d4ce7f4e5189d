//! The `{format}` extension of an IIIF image request and its MIME type.

use crate::{IiifError, IiifResult};
use enumset::EnumSetType;
use std::fmt::{Display, Formatter};

#[derive(Debug, EnumSetType, PartialOrd, Ord, Hash)]
pub enum Format {
	Jpg,
	Tif,
	Png,
	Gif,
	Jp2,
	Pdf,
	Webp,
}

impl Format {
	/// File extension as it appears in the request, without the dot.
	pub fn as_str(&self) -> &'static str {
		match self {
			Format::Jpg => "jpg",
			Format::Tif => "tif",
			Format::Png => "png",
			Format::Gif => "gif",
			Format::Jp2 => "jp2",
			Format::Pdf => "pdf",
			Format::Webp => "webp",
		}
	}

	pub fn as_mime_str(&self) -> &'static str {
		match self {
			Format::Jpg => "image/jpeg",
			Format::Tif => "image/tiff",
			Format::Png => "image/png",
			Format::Gif => "image/gif",
			Format::Jp2 => "image/jp2",
			Format::Pdf => "application/pdf",
			Format::Webp => "image/webp",
		}
	}

	pub fn parse(text: &str) -> IiifResult<Format> {
		Ok(match text {
			"jpg" => Format::Jpg,
			"tif" => Format::Tif,
			"png" => Format::Png,
			"gif" => Format::Gif,
			"jp2" => Format::Jp2,
			"pdf" => Format::Pdf,
			"webp" => Format::Webp,
			_ => return Err(IiifError::syntax(format!("unknown format '{text}'"))),
		})
	}
}

impl Display for Format {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
