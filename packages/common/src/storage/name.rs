use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

use super::error::StorageError;

/// Longest extension carried over from an uploaded file name.
const MAX_EXTENSION_LEN: usize = 16;

/// A validated flat file name inside the image directory.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ImageName(String);

impl ImageName {
    /// Build the stored name for an upload: `{token}{.ext}`.
    pub fn generate(token: i64, original_filename: &str) -> Self {
        match extension_of(original_filename) {
            Some(ext) => Self(format!("{token}.{ext}")),
            None => Self(token.to_string()),
        }
    }

    /// Validate a name received from a client.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        if s.is_empty() {
            return Err(StorageError::InvalidName("name cannot be empty".into()));
        }
        // Reject ASCII control characters (covers NUL and CRLF).
        if s.chars().any(|c| c.is_ascii_control()) {
            return Err(StorageError::InvalidName(
                "control characters are not allowed".into(),
            ));
        }
        if s.contains('/') || s.contains('\\') {
            return Err(StorageError::InvalidName(
                "path separators are not allowed".into(),
            ));
        }
        if s.starts_with('.') {
            return Err(StorageError::InvalidName(
                "hidden files are not allowed".into(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Extract a safe extension from an uploaded file name.
///
/// Only 1-16 ASCII alphanumeric characters are kept; anything else yields `None`.
fn extension_of(filename: &str) -> Option<&str> {
    // Browsers may send a full client-side path; only the last component matters.
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let ext = Path::new(base).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext)
}

/// Strictly increasing millisecond tokens for collision-free file names.
///
/// Follows wall-clock time, but never hands out the same value twice within
/// one process even when several uploads land in the same millisecond.
#[derive(Debug, Default)]
pub struct NameTokens {
    last: AtomicI64,
}

impl NameTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let prev = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(prev + 1)
    }
}

impl fmt::Debug for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageName({})", self.0)
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
