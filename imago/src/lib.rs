//! # imago
//!
//! An IIIF Image API server.
//!
//! Images below a configured root directory are served at `{base}/{identifier}/...`:
//!
//! - `{base}/{identifier}` redirects to the descriptor
//! - `{base}/{identifier}/info.json` returns the capability descriptor
//! - `{base}/{identifier}/{region}/{size}/{rotation}/{quality}.{format}` returns the transformed image
//!
//! The protocol types live in [`imago_core`], the pixel pipeline in [`imago_image`]. This crate
//! adds configuration, the HTTP server and the command line tools.

pub mod config;
pub mod server;
