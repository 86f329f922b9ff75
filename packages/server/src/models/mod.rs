pub mod image;
pub mod shared;
pub mod template;
