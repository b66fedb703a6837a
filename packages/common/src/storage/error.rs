use std::fmt;

/// Errors that can occur during asset storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// The requested asset was not found.
    NotFound(String),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The asset name is not a safe flat filename.
    InvalidName { name: String, reason: &'static str },
    /// The asset exceeds the configured size limit.
    SizeLimitExceeded { actual: u64, limit: u64 },
    /// Every generated name for the upload was already taken.
    NameExhausted { attempts: usize },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "asset not found: {name}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::InvalidName { name, reason } => write!(f, "invalid asset name {name:?}: {reason}"),
            Self::SizeLimitExceeded { actual, limit } => {
                write!(f, "asset exceeds size limit ({actual} > {limit} bytes)")
            }
            Self::NameExhausted { attempts } => {
                write!(f, "no free asset name after {attempts} attempts")
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
