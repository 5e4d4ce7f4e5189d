mod handlers;
mod iiif_server;
mod overrides;
mod routes;
mod service;
mod utils;

pub use iiif_server::*;
pub use overrides::*;
pub use service::*;
pub use utils::{BaseUrl, Url};
