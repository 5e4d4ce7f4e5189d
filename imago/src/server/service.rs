//! Everything a request needs that is shared between requests, plus the blocking work done for
//! them. The HTTP side lives in `handlers`.

use super::{
	overrides::{FileInfoOverrides, InfoOverrides, substitute_id},
	utils::{BaseUrl, not_modified_since},
};
use imago_core::{Command, Feature, FeatureSet, Identifier, IiifError, IiifResult};
use imago_image::{CancelFlag, ImageResource, PipelineOptions};
use std::{path::PathBuf, time::SystemTime};

pub struct IiifService {
	pub base: BaseUrl,
	pub root: PathBuf,
	pub features: FeatureSet,
	pub options: PipelineOptions,
	overrides: Box<dyn InfoOverrides>,
}

/// Result of an image request that passed negotiation.
#[derive(Debug)]
pub enum Rendered {
	NotModified {
		modified: SystemTime,
	},
	Image {
		bytes: Vec<u8>,
		modified: Option<SystemTime>,
		/// Canonical request path, only computed when it is advertised.
		canonical: Option<String>,
	},
}

impl IiifService {
	pub fn new(base: BaseUrl, root: PathBuf, features: FeatureSet, options: PipelineOptions) -> IiifService {
		IiifService {
			base,
			root,
			features,
			options,
			overrides: Box::new(FileInfoOverrides),
		}
	}

	pub fn with_overrides(mut self, overrides: Box<dyn InfoOverrides>) -> IiifService {
		self.overrides = overrides;
		self
	}

	/// Body of `info.json`: the override if there is one, otherwise the generated descriptor.
	pub fn info_json(&self, identifier: &Identifier, id_url: &str) -> IiifResult<Vec<u8>> {
		let path = identifier.resolve(&self.root)?;
		if let Some(bytes) = self.overrides.load(identifier, &path).map_err(IiifError::Internal)? {
			return Ok(substitute_id(&bytes, id_url));
		}

		let resource = ImageResource::open(identifier, &self.root)?;
		let (width, height) = resource.dimensions();
		Ok(self.features.info(id_url, width, height).to_json()?.into_bytes())
	}

	/// Opens the source, checks what depends on its dimensions and renders the image.
	///
	/// Nothing is decoded if `If-Modified-Since` shows the client copy is still current.
	pub fn render(&self, cmd: &Command, if_modified_since: Option<&str>, cancel: &CancelFlag) -> IiifResult<Rendered> {
		let mut resource = ImageResource::open(&cmd.identifier, &self.root)?;
		let (width, height) = resource.dimensions();
		self.features.check_geometry(cmd, width, height)?;

		let modified = resource.modified();
		if let (Some(modified), Some(since)) = (modified, if_modified_since)
			&& not_modified_since(modified, since)
		{
			return Ok(Rendered::NotModified { modified });
		}

		let canonical = if self.features.has(Feature::CanonicalLinkHeader) {
			Some(cmd.canonical_path(width, height)?)
		} else {
			None
		};

		let bytes = resource.apply(cmd, &self.options, cancel)?;
		Ok(Rendered::Image {
			bytes,
			modified,
			canonical,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::server::NoInfoOverrides;
	use crate::server::tests::write_test_image;
	use pretty_assertions::assert_eq;
	use std::fs;
	use tempfile::TempDir;

	fn service(dir: &TempDir, features: FeatureSet) -> IiifService {
		IiifService::new(
			BaseUrl::default(),
			dir.path().to_path_buf(),
			features,
			PipelineOptions::default(),
		)
	}

	#[test]
	fn info_json_is_generated() {
		let dir = tempfile::tempdir().unwrap();
		write_test_image(&dir.path().join("abc"), 800, 600);

		let id = Identifier::new("abc").unwrap();
		let json = service(&dir, FeatureSet::default())
			.info_json(&id, "http://host/iiif/abc")
			.unwrap();
		let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
		assert_eq!(value["@id"], "http://host/iiif/abc");
		assert_eq!(value["width"], 800);
		assert_eq!(value["height"], 600);
	}

	#[test]
	fn info_override_wins_without_opening_the_image() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("abc-info.json"), br#"{"@id":"%ID%"}"#).unwrap();

		let id = Identifier::new("abc").unwrap();
		let json = service(&dir, FeatureSet::default()).info_json(&id, "http://h/abc").unwrap();
		assert_eq!(json, br#"{"@id":"http://h/abc"}"#.to_vec());

		let json = service(&dir, FeatureSet::default())
			.with_overrides(Box::new(NoInfoOverrides))
			.info_json(&id, "http://h/abc");
		assert!(matches!(json, Err(IiifError::ResourceNotFound(_))));
	}

	#[test]
	fn render_returns_image_and_modification_time() {
		let dir = tempfile::tempdir().unwrap();
		write_test_image(&dir.path().join("abc"), 800, 600);

		let cmd = Command::parse("abc/full/200,/0/default.png").unwrap();
		let rendered = service(&dir, FeatureSet::default())
			.render(&cmd, None, &CancelFlag::new())
			.unwrap();
		let Rendered::Image {
			bytes,
			modified,
			canonical,
		} = rendered
		else {
			panic!("expected an image");
		};
		assert!(modified.is_some());
		assert_eq!(canonical, None);
		let image = image::load_from_memory(&bytes).unwrap();
		assert_eq!((image.width(), image.height()), (200, 150));
	}

	#[test]
	fn render_skips_decoding_for_unchanged_images() {
		let dir = tempfile::tempdir().unwrap();
		write_test_image(&dir.path().join("abc"), 100, 100);

		let cmd = Command::parse("abc/full/full/0/default.jpg").unwrap();
		let service = service(&dir, FeatureSet::default());

		let rendered = service
			.render(&cmd, Some("Fri, 31 Dec 9999 23:59:59 GMT"), &CancelFlag::new())
			.unwrap();
		assert!(matches!(rendered, Rendered::NotModified { .. }));

		let rendered = service
			.render(&cmd, Some("Thu, 01 Jan 1970 00:00:00 GMT"), &CancelFlag::new())
			.unwrap();
		assert!(matches!(rendered, Rendered::Image { .. }));
	}

	#[test]
	fn render_computes_canonical_path_when_advertised() {
		let dir = tempfile::tempdir().unwrap();
		write_test_image(&dir.path().join("abc"), 800, 600);

		let mut features = FeatureSet::default();
		features.features.insert(Feature::CanonicalLinkHeader);
		let cmd = Command::parse("abc/pct:0,0,50,50/pct:50/0/default.png").unwrap();
		let rendered = service(&dir, features).render(&cmd, None, &CancelFlag::new()).unwrap();
		let Rendered::Image { canonical, .. } = rendered else {
			panic!("expected an image");
		};
		assert_eq!(canonical.as_deref(), Some("abc/0,0,400,300/200,/0/default.png"));
	}

	#[test]
	fn cancelled_render_stops() {
		let dir = tempfile::tempdir().unwrap();
		write_test_image(&dir.path().join("abc"), 64, 64);

		let cancel = CancelFlag::new();
		cancel.cancel();
		let cmd = Command::parse("abc/full/full/0/default.png").unwrap();
		let result = service(&dir, FeatureSet::default()).render(&cmd, None, &cancel);
		assert!(matches!(result, Err(IiifError::Internal(_))));
	}

	#[test]
	fn geometry_is_checked_before_decoding() {
		let dir = tempfile::tempdir().unwrap();
		write_test_image(&dir.path().join("abc"), 100, 100);

		let mut features = FeatureSet::default();
		features.features.remove(Feature::SizeAboveFull);
		let cmd = Command::parse("abc/full/200,/0/default.png").unwrap();
		let result = service(&dir, features).render(&cmd, None, &CancelFlag::new());
		assert!(matches!(result, Err(IiifError::UnsupportedFeature(_))));
	}
}
