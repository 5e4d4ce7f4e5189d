mod features;
mod images;
mod main;
mod server;

pub use features::*;
pub use images::*;
pub use main::*;
pub use server::*;
