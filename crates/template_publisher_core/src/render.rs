use std::error::Error as _;

use tera::{Context, Tera};
use thiserror::Error;

use crate::variables::TemplateVariables;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("template is not valid UTF-8: {0}")]
    NotUtf8(String),
    #[error("failed to render template: {0}")]
    Template(String),
}

/// Maps template text plus a variable mapping to rendered text.
pub trait TemplateRenderer {
    fn render(&self, template: &str, variables: &TemplateVariables)
        -> Result<String, RenderError>;
}

/// Jinja2-compatible renderer backed by tera.
///
/// Referencing a variable that is not in the mapping fails the render.
/// Output is not HTML-escaped.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeraRenderer;

impl TemplateRenderer for TeraRenderer {
    fn render(
        &self,
        template: &str,
        variables: &TemplateVariables,
    ) -> Result<String, RenderError> {
        let mut context = Context::new();
        for (name, value) in variables.iter() {
            context.insert(name.as_str(), value);
        }

        Tera::one_off(template, &context, false)
            .map_err(|error| RenderError::Template(describe_tera_error(&error)))
    }
}

pub fn decode_template(bytes: Vec<u8>) -> Result<String, RenderError> {
    String::from_utf8(bytes).map_err(|error| RenderError::NotUtf8(error.to_string()))
}

// tera keeps the useful detail (missing variable, parse location) in the
// source chain rather than the top-level message.
fn describe_tera_error(error: &tera::Error) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}
