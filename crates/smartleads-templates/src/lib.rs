//! Email templates with `{token}` placeholders.
//!
//! [`render`] is the substitution engine; [`EmailTemplate`] applies it to a
//! subject and body for previews and for send-time composition against a
//! [`CompanyRecord`](smartleads_core::CompanyRecord).

mod email;
mod error;
mod placeholder;

pub use email::{load_template, preview_values, record_values, EmailTemplate, RenderedEmail};
pub use error::TemplateError;
pub use placeholder::{render, tokens};
