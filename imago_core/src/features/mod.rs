mod feature;
mod feature_set;
mod info;
mod level;
mod limits;

pub use feature::*;
pub use feature_set::*;
pub use info::*;
pub use level::*;
pub use limits::*;
