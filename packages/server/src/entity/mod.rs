pub mod email_template;
