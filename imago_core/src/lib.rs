//! Protocol layer of the imago IIIF image server.
//!
//! Contains the strongly typed IIIF request segments (identifier, region, size, rotation,
//! quality, format), the [`Command`] parser that composes them, the [`FeatureSet`] capability
//! matrix used for negotiation and for rendering `info.json`, and the [`IiifError`] taxonomy
//! shared by every layer above.

pub mod error;
pub mod features;
pub mod types;

pub use error::*;
pub use features::*;
pub use types::*;
