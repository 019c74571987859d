//! DAG template rendering
//!
//! One Handlebars template per resource technology, looked up by the
//! lower-cased technology tag. Rendering runs in strict mode, so a template
//! referencing a parameter that was not supplied fails instead of silently
//! emitting an empty string.

use std::collections::{BTreeMap, HashMap};

use handlebars::Handlebars;
use tracing::error;

use crate::error::TemplateError;

/// Flat parameter mapping handed to a template
pub type TemplateParameters = BTreeMap<String, String>;

const SNOWFLAKE_TEMPLATE: &str = include_str!("../../templates/snowflake.py.hbs");

pub trait TemplateRenderer: Send + Sync {
    fn render_template(
        &self,
        technology: &str,
        parameters: &TemplateParameters,
    ) -> Result<String, TemplateError>;
}

pub struct TemplateService {
    handlebars: Handlebars<'static>,
    templates: HashMap<String, String>,
}

impl TemplateService {
    /// Service with the bundled templates registered
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        // Output is Python source, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_helper("pystr", Box::new(pystr_helper));

        let mut templates = HashMap::new();
        templates.insert("snowflake".to_string(), SNOWFLAKE_TEMPLATE.to_string());

        Self {
            handlebars,
            templates,
        }
    }

    /// Register or replace the template used for `technology`
    pub fn with_template(mut self, technology: &str, source: impl Into<String>) -> Self {
        self.templates
            .insert(technology.to_lowercase(), source.into());
        self
    }
}

impl Default for TemplateService {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for TemplateService {
    fn render_template(
        &self,
        technology: &str,
        parameters: &TemplateParameters,
    ) -> Result<String, TemplateError> {
        let Some(source) = self.templates.get(&technology.to_lowercase()) else {
            let err = TemplateError::NotFound {
                technology: technology.to_string(),
            };
            error!("{}", err);
            return Err(err);
        };

        self.handlebars
            .render_template(source, parameters)
            .map_err(|e| {
                let err = TemplateError::Render {
                    technology: technology.to_string(),
                    details: e.to_string(),
                };
                error!("{}", err);
                err
            })
    }
}

// Handlebars helpers

/// Emit the parameter as a double-quoted string literal that Python can read
fn pystr_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let param = h
        .param(0)
        .filter(|p| !p.is_value_missing())
        .and_then(|v| v.value().as_str())
        .ok_or(handlebars::RenderErrorReason::ParamNotFoundForIndex("pystr", 0))?;
    out.write(&serde_json::to_string(param).unwrap_or_default())?;
    Ok(())
}
