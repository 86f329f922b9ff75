use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::UPLOADS_PREFIX;
use super::error::StorageError;
use super::name::ImageName;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// An image that has been written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub name: ImageName,
    /// Size in bytes.
    pub size: u64,
}

impl StoredImage {
    /// Store-relative path, e.g. `/uploads/1712345678901.png`.
    pub fn relative_path(&self) -> String {
        format!("{UPLOADS_PREFIX}/{}", self.name)
    }
}

/// Flat, write-once image storage.
///
/// Images are never deleted. Templates reference them by URL only.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store an uploaded image under a freshly generated name.
    ///
    /// The extension of `original_filename` is carried over to the stored name.
    async fn store(&self, data: &[u8], original_filename: &str)
    -> Result<StoredImage, StorageError>;

    /// Open a stored image as a streaming async reader.
    async fn open(&self, name: &str) -> Result<BoxReader, StorageError>;
}
