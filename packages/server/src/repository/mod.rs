mod template;

pub use template::{NewTemplate, TemplateChanges, TemplateError, TemplateRepository};
