//! Pixel side of the imago IIIF server.
//!
//! An [`ImageResource`] binds an identifier to a source file and a decoder that knows the
//! resolution layers of that file. [`ImageResource::apply`] runs a parsed
//! [`Command`](imago_core::Command) through the transformation pipeline: region extraction from the
//! cheapest resolution layer, resampling, mirroring and rotation, quality conversion and finally
//! encoding into the requested format.

mod cancel;
pub mod decoder;
pub mod format;
mod pipeline;
mod resource;
pub mod traits;

pub use cancel::*;
pub use pipeline::*;
pub use resource::*;
