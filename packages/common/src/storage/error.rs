use std::fmt;

/// Errors that can occur during image storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// The upload carried no bytes.
    NoFileProvided,
    /// The requested image was not found.
    NotFound(String),
    /// The image name is not a valid flat file name.
    InvalidName(String),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The image exceeds the configured size limit.
    SizeLimitExceeded { actual: u64, limit: u64 },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFileProvided => write!(f, "no file provided"),
            Self::NotFound(name) => write!(f, "image not found: {name}"),
            Self::InvalidName(msg) => write!(f, "invalid image name: {msg}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::SizeLimitExceeded { actual, limit } => {
                write!(f, "image exceeds size limit ({actual} > {limit} bytes)")
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
