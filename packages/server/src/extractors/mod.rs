pub mod form;
pub mod json;
pub mod origin;
