//! Extension traits for [`image::DynamicImage`].
//!
//! - [`DynamicImageTraitOperation`] implements the pixel steps of an IIIF request: extraction with
//!   resampling, mirroring and rotation, quality conversion.

mod operation;

pub use operation::*;
#[cfg(test)]
pub use test::*;
