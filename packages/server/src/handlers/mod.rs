pub mod frontend;
pub mod image;
pub mod template;
