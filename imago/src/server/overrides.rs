//! Hand-written `info.json` descriptors.
//!
//! A descriptor override replaces the generated `info.json` of a single image. The first `%ID%` in
//! it is replaced with the `@id` of the image, so the same file works behind any base URL.

use anyhow::{Context, Result};
use imago_core::Identifier;
use std::{
	fs,
	io::ErrorKind,
	path::{Path, PathBuf},
};

pub trait InfoOverrides: Send + Sync {
	/// Raw override for the image at `path`, or `None` if there is none.
	fn load(&self, identifier: &Identifier, path: &Path) -> Result<Option<Vec<u8>>>;
}

/// Reads overrides from `<image path>-info.json` next to the source image.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileInfoOverrides;

impl FileInfoOverrides {
	pub fn override_path(path: &Path) -> PathBuf {
		let mut name = path.as_os_str().to_owned();
		name.push("-info.json");
		PathBuf::from(name)
	}
}

impl InfoOverrides for FileInfoOverrides {
	fn load(&self, identifier: &Identifier, path: &Path) -> Result<Option<Vec<u8>>> {
		let override_path = FileInfoOverrides::override_path(path);
		match fs::read(&override_path) {
			Ok(bytes) => {
				log::debug!("using info override {override_path:?} for '{identifier}'");
				Ok(Some(bytes))
			}
			Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
			Err(err) => Err(err).with_context(|| format!("reading info override {override_path:?}")),
		}
	}
}

/// Never overrides anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoInfoOverrides;

impl InfoOverrides for NoInfoOverrides {
	fn load(&self, _identifier: &Identifier, _path: &Path) -> Result<Option<Vec<u8>>> {
		Ok(None)
	}
}

/// Replaces the first `%ID%` in `bytes` with `id`.
pub fn substitute_id(bytes: &[u8], id: &str) -> Vec<u8> {
	const PLACEHOLDER: &[u8] = b"%ID%";
	match bytes.windows(PLACEHOLDER.len()).position(|window| window == PLACEHOLDER) {
		Some(index) => {
			let mut result = Vec::with_capacity(bytes.len() + id.len());
			result.extend_from_slice(&bytes[..index]);
			result.extend_from_slice(id.as_bytes());
			result.extend_from_slice(&bytes[index + PLACEHOLDER.len()..]);
			result
		}
		None => bytes.to_vec(),
	}
}
