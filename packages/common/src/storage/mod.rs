mod error;
mod name;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use name::{ImageName, NameTokens};
pub use traits::{BoxReader, ImageStore, StoredImage};

/// Public URL prefix under which stored images are served.
pub const UPLOADS_PREFIX: &str = "/uploads";
