mod http_date;
mod url;

pub use http_date::*;
pub use url::*;
