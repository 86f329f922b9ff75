use std::path::PathBuf;

use serde::Deserialize;

/// Image storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding uploaded images. Default: "./uploads".
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,
    /// Largest accepted image in bytes. Default: 10 MiB.
    #[serde(default = "default_max_image_size")]
    pub max_image_size: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: default_uploads_dir(),
            max_image_size: default_max_image_size(),
        }
    }
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("./uploads")
}
fn default_max_image_size() -> u64 {
    10 * 1024 * 1024
}
