//! Binding of an identifier to a source file and its decoder.

use crate::{
	CancelFlag, PipelineOptions,
	decoder::{ImageDecoder, open_decoder},
	format, pipeline,
};
use image::DynamicImage;
use imago_core::{Command, Identifier, IiifError, IiifResult};
use std::{path::Path, time::SystemTime};

/// A request scoped source image.
///
/// Holds the decode handle for as long as the resource lives; dropping the resource releases it.
pub struct ImageResource {
	modified: Option<SystemTime>,
	decoder: Box<dyn ImageDecoder>,
}

impl ImageResource {
	/// Opens the source image of `identifier` below `root`.
	///
	/// Fails with [`IiifError::ResourceNotFound`] if there is no such file and with
	/// [`IiifError::Decode`] if the file cannot be read as an image.
	pub fn open(identifier: &Identifier, root: &Path) -> IiifResult<ImageResource> {
		let path = identifier.resolve(root)?;
		let metadata = std::fs::metadata(&path)
			.ok()
			.filter(|m| m.is_file())
			.ok_or_else(|| IiifError::not_found(format!("{path:?}")))?;

		let decoder = open_decoder(&path).map_err(IiifError::Decode)?;
		Ok(ImageResource {
			modified: metadata.modified().ok(),
			decoder,
		})
	}

	#[cfg(test)]
	pub(crate) fn from_decoder(decoder: Box<dyn ImageDecoder>) -> ImageResource {
		ImageResource { modified: None, decoder }
	}

	/// Modification time of the source file, if the filesystem reports one.
	pub fn modified(&self) -> Option<SystemTime> {
		self.modified
	}

	/// Intrinsic dimensions, read from the image header.
	pub fn dimensions(&self) -> (u32, u32) {
		self.decoder.dimensions()
	}

	pub fn levels(&self) -> &[(u32, u32)] {
		self.decoder.levels()
	}

	/// Runs the pixel steps of `cmd` without encoding.
	pub fn render(
		&mut self,
		cmd: &Command,
		options: &PipelineOptions,
		cancel: &CancelFlag,
	) -> IiifResult<DynamicImage> {
		pipeline::render(self.decoder.as_mut(), cmd, options, cancel)
	}

	/// Runs the whole pipeline of `cmd` and returns the encoded image.
	pub fn apply(&mut self, cmd: &Command, options: &PipelineOptions, cancel: &CancelFlag) -> IiifResult<Vec<u8>> {
		let image = self.render(cmd, options, cancel)?;

		let mut buffer = Vec::new();
		format::encode(image, cmd.format, options.jpeg_quality, &mut buffer).map_err(IiifError::Encode)?;
		cancel.check()?;
		Ok(buffer)
	}
}
