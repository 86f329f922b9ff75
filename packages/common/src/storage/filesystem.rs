use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::name::{ImageName, NameTokens};
use super::traits::{BoxReader, ImageStore, StoredImage};

/// Filesystem-backed image store.
///
/// Images live in one flat directory: `{base_path}/{token}{.ext}`.
/// Partial writes go to `{base_path}/.tmp` and are renamed into place.
pub struct FilesystemImageStore {
    base_path: PathBuf,
    max_size: u64,
    tokens: NameTokens,
}

impl FilesystemImageStore {
    /// Create a new filesystem image store.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
            tokens: NameTokens::new(),
        })
    }

    fn image_path(&self, name: &ImageName) -> PathBuf {
        self.base_path.join(name.as_str())
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Reserve a fresh name by creating an empty placeholder file.
    ///
    /// `create_new` fails if the name is taken (e.g. by another process
    /// sharing the directory), in which case the next token is tried.
    async fn reserve(&self, original_filename: &str) -> Result<ImageName, StorageError> {
        loop {
            let name = ImageName::generate(self.tokens.next(), original_filename);
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.image_path(&name))
                .await
            {
                Ok(_) => return Ok(name),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl ImageStore for FilesystemImageStore {
    async fn store(
        &self,
        data: &[u8],
        original_filename: &str,
    ) -> Result<StoredImage, StorageError> {
        if data.is_empty() {
            return Err(StorageError::NoFileProvided);
        }
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let temp_path = self.temp_path();
        let write = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(data).await?;
            file.flush().await?;
            Ok::<_, std::io::Error>(())
        };
        if let Err(e) = write.await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        let name = match self.reserve(original_filename).await {
            Ok(name) => name,
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                return Err(e);
            }
        };

        let image_path = self.image_path(&name);
        if let Err(e) = fs::rename(&temp_path, &image_path).await {
            let _ = fs::remove_file(&temp_path).await;
            let _ = fs::remove_file(&image_path).await;
            return Err(e.into());
        }

        tracing::debug!(name = %name, size = data.len(), "Stored image");

        Ok(StoredImage {
            name,
            size: data.len() as u64,
        })
    }

    async fn open(&self, name: &str) -> Result<BoxReader, StorageError> {
        let name = ImageName::parse(name)?;
        match fs::File::open(self.image_path(&name)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
