use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Maximum number of characters kept from the uploaded file's base name.
pub const STEM_MAX_CHARS: usize = 10;

/// Number of decimal digits in the token appended to every asset name.
pub const TOKEN_DIGITS: usize = 10;

const TOKEN_MODULUS: u64 = 10_000_000_000;

/// Longest extension kept, dot included.
pub const EXT_MAX_CHARS: usize = 16;

const MAX_NAME_LEN: usize = 255;

/// A validated asset filename.
///
/// Asset names are flat: they always resolve to a file directly inside the
/// asset directory and can never escape it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetName(String);

impl AssetName {
    /// Parse and validate an existing asset name.
    pub fn parse(name: &str) -> Result<Self, StorageError> {
        match check_flat_name(name) {
            Ok(()) => Ok(Self(name.to_string())),
            Err(reason) => Err(StorageError::InvalidName {
                name: name.to_string(),
                reason,
            }),
        }
    }

    /// Build a fresh asset name for an upload.
    ///
    /// The result is `{stem}{token}{ext}`: at most [`STEM_MAX_CHARS`] characters
    /// of the original base name with spaces replaced by hyphens, the token
    /// zero-padded to [`TOKEN_DIGITS`] digits, then the original extension
    /// when it is alphanumeric and at most [`EXT_MAX_CHARS`] long.
    pub fn generate(original_name: &str, token: u64) -> Self {
        let (stem, ext) = split_original(original_name);
        let name = format!(
            "{}{:0width$}{}",
            sanitize_stem(stem),
            token % TOKEN_MODULUS,
            sanitize_extension(ext),
            width = TOKEN_DIGITS
        );
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetName({})", self.0)
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AssetName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for AssetName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AssetName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Source of name tokens.
///
/// Tokens come from the UTC millisecond clock and are strictly increasing
/// within one `TokenClock`, so two uploads in the same millisecond still get
/// distinct names.
#[derive(Debug, Default)]
pub struct TokenClock {
    last: AtomicU64,
}

impl TokenClock {
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// A clock whose first token is `last + 1`, unless the wall clock is
    /// already past it.
    #[cfg(test)]
    pub(crate) const fn starting_after(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }

    /// Next token, already reduced to [`TOKEN_DIGITS`] digits.
    pub fn next(&self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev + 1);
            match self.last.compare_exchange_weak(
                prev,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate % TOKEN_MODULUS,
                Err(actual) => prev = actual,
            }
        }
    }
}

/// Split an uploaded filename into base name and extension (with its dot).
///
/// Browsers may send a full client path, so anything up to the last `/` or
/// `\` is discarded first.
fn split_original(original_name: &str) -> (&str, &str) {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);
    match base.rfind('.') {
        Some(pos) => (&base[..pos], &base[pos..]),
        None => (base, ""),
    }
}

fn sanitize_stem(stem: &str) -> String {
    stem.chars()
        .take(STEM_MAX_CHARS)
        .enumerate()
        .map(|(i, c)| {
            if c == ' ' || c.is_control() || (i == 0 && c == '.') {
                '-'
            } else {
                c
            }
        })
        .collect()
}

/// Extensions that are too long or not plain alphanumerics are dropped.
fn sanitize_extension(ext: &str) -> &str {
    let valid = (2..=EXT_MAX_CHARS).contains(&ext.len())
        && ext[1..].chars().all(|c| c.is_ascii_alphanumeric());
    if valid { ext } else { "" }
}

fn check_flat_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("name is empty");
    }
    if name.len() > MAX_NAME_LEN {
        return Err("name is too long");
    }
    if name.chars().any(|c| c.is_control()) {
        return Err("control characters are not allowed");
    }
    if name.contains('/') || name.contains('\\') {
        return Err("path separators are not allowed");
    }
    if name.starts_with('.') {
        return Err("hidden names and '..' are not allowed");
    }
    Ok(())
}
