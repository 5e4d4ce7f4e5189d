mod command;
mod format;
mod identifier;
mod quality;
mod region;
mod rotation;
mod size;

pub use command::*;
pub use format::*;
pub use identifier::*;
pub use quality::*;
pub use region::*;
pub use rotation::*;
pub use size::*;
