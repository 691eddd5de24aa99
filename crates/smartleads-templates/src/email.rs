use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use smartleads_core::CompanyRecord;

use crate::error::TemplateError;
use crate::placeholder::render;

const PREVIEW_NAME: &str = "Empresa Ejemplo";
const PREVIEW_CITY: &str = "Ciudad Ejemplo";
const PREVIEW_EMAIL: &str = "contacto@empresa-ejemplo.com";

/// An outreach email with `{token}` placeholders in subject and body.
///
/// Templates are edited in place by the user. Storing them is someone
/// else's job; this crate only reads them from YAML and renders them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub name: String,
    pub subject: String,
    pub body_html: String,
    #[serde(default)]
    pub body_text: Option<String>,
}

/// A template with all known placeholders substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body_html: String,
    pub body_text: Option<String>,
}

impl EmailTemplate {
    /// The stock introduction template offered to new users.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            name: "Presentación Estándar".to_string(),
            subject: "Propuesta de Colaboración para {nombre}".to_string(),
            body_html: "<h1>Hola {nombre}</h1><p>Hemos visto su empresa en {ciudad} y nos \
                        encantaría colaborar...</p>"
                .to_string(),
            body_text: None,
        }
    }

    /// Renders subject and bodies with an arbitrary value map.
    #[must_use]
    pub fn render_with(&self, values: &HashMap<&str, String>) -> RenderedEmail {
        RenderedEmail {
            subject: render(&self.subject, values),
            body_html: render(&self.body_html, values),
            body_text: self.body_text.as_deref().map(|t| render(t, values)),
        }
    }

    /// Renders with the sample values from [`preview_values`].
    #[must_use]
    pub fn preview(&self) -> RenderedEmail {
        self.render_with(&preview_values())
    }

    /// Renders for a concrete recipient; `city` fills `{ciudad}` when known.
    #[must_use]
    pub fn compose(&self, record: &CompanyRecord, city: Option<&str>) -> RenderedEmail {
        self.render_with(&record_values(record, city))
    }
}

/// Sample values for the default `{nombre}`, `{ciudad}` and `{email}` tokens.
#[must_use]
pub fn preview_values() -> HashMap<&'static str, String> {
    HashMap::from([
        ("nombre", PREVIEW_NAME.to_string()),
        ("ciudad", PREVIEW_CITY.to_string()),
        ("email", PREVIEW_EMAIL.to_string()),
    ])
}

/// Token values for a company record.
///
/// Optional contact fields that are missing are left out of the map so their
/// tokens survive rendering and stay visible to the user.
#[must_use]
pub fn record_values(record: &CompanyRecord, city: Option<&str>) -> HashMap<&'static str, String> {
    let mut values = HashMap::from([
        ("nombre", record.name.clone()),
        ("rubro", record.category.clone()),
        ("direccion", record.address.clone()),
    ]);
    let optional = [
        ("email", record.email.as_ref()),
        ("telefono", record.phone.as_ref()),
        ("website", record.website.as_ref()),
    ];
    for (key, value) in optional {
        if let Some(v) = value {
            values.insert(key, v.clone());
        }
    }
    if let Some(city) = city {
        values.insert("ciudad", city.to_string());
    }
    values
}

/// Reads an [`EmailTemplate`] from a YAML file.
///
/// # Errors
///
/// Returns [`TemplateError::Io`] if the file cannot be read,
/// [`TemplateError::Parse`] if it is not a valid template, or
/// [`TemplateError::EmptySubject`] if the subject is blank.
pub fn load_template(path: &Path) -> Result<EmailTemplate, TemplateError> {
    let content = std::fs::read_to_string(path).map_err(|e| TemplateError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let template: EmailTemplate =
        serde_yaml::from_str(&content).map_err(|e| TemplateError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;

    if template.subject.trim().is_empty() {
        return Err(TemplateError::EmptySubject {
            name: template.name,
        });
    }

    Ok(template)
}
