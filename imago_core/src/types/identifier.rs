//! Image identifiers.
//!
//! An identifier is the path segment directly after the IIIF base URL. It is percent-decoded
//! exactly once, when it is taken from the URL, and maps onto a relative file path below the
//! configured source root. The mapping is the identity, so it is injective and stable: `a%2Fb.jpg`
//! is stored at `<root>/a/b.jpg`.

use crate::{IiifError, IiifResult};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::{
	fmt::{Display, Formatter},
	path::{Component, Path, PathBuf},
};

/// Characters left unescaped when an identifier is written back into a URL.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'.').remove(b'-').remove(b'_').remove(b'~');

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identifier {
	decoded: String,
}

impl Identifier {
	/// Builds an identifier from an already decoded string.
	pub fn new(decoded: &str) -> IiifResult<Identifier> {
		if decoded.is_empty() {
			return Err(IiifError::syntax("empty identifier"));
		}
		Ok(Identifier {
			decoded: decoded.to_owned(),
		})
	}

	/// Builds an identifier from a raw (still percent-encoded) URL path segment.
	pub fn from_url_segment(segment: &str) -> IiifResult<Identifier> {
		let decoded = percent_decode_str(segment)
			.decode_utf8()
			.map_err(|_| IiifError::syntax(format!("identifier '{segment}' is not valid UTF-8")))?;
		Identifier::new(&decoded)
	}

	pub fn as_str(&self) -> &str {
		&self.decoded
	}

	/// Percent-encoded form, suitable for building URLs.
	pub fn to_url_segment(&self) -> String {
		utf8_percent_encode(&self.decoded, SEGMENT).to_string()
	}

	/// Relative path of the source image, or `None` if the identifier would escape the root.
	pub fn relative_path(&self) -> Option<PathBuf> {
		let path = Path::new(&self.decoded);
		let mut result = PathBuf::new();
		for component in path.components() {
			match component {
				Component::Normal(part) => result.push(part),
				_ => return None,
			}
		}
		if result.as_os_str().is_empty() || self.decoded.split('/').any(str::is_empty) {
			return None;
		}
		Some(result)
	}

	/// Absolute path of the source image below `root`.
	pub fn resolve(&self, root: &Path) -> IiifResult<PathBuf> {
		self
			.relative_path()
			.map(|relative| root.join(relative))
			.ok_or_else(|| IiifError::not_found(format!("identifier '{self}' does not map to a source path")))
	}
}

impl Display for Identifier {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.decoded)
	}
}
