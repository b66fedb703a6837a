pub mod json;
pub mod path;

pub use json::AppJson;
pub use path::AppPath;
