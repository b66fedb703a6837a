mod error;
mod name;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use name::{AssetName, EXT_MAX_CHARS, STEM_MAX_CHARS, TOKEN_DIGITS, TokenClock};
pub use traits::{AssetEntry, AssetStore, BoxReader};
