use handlebars::Handlebars;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{CertificateError, Result};
use crate::models::RecordKind;

const TEMPLATE_KINDS: [RecordKind; 2] = [RecordKind::Course, RecordKind::Diploma];

/// The declarative layout markup for each record kind, registered once from
/// the configured template directory.
pub struct CertificateTemplates {
    handlebars: Handlebars<'static>,
}

impl CertificateTemplates {
    /// Register every `<name>.svg.hbs` present in `dir`. A kind whose file is
    /// absent stays unregistered and surfaces as `TemplateNotFound` at render
    /// time rather than failing the whole service at startup.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);

        for kind in TEMPLATE_KINDS {
            let name = kind.template_name();
            let path = dir.join(format!("{name}.svg.hbs"));
            if path.is_file() {
                handlebars
                    .register_template_file(name, &path)
                    .map_err(CertificateError::TemplateError)?;
                info!(template = name, path = %path.display(), "Registered layout template");
            } else {
                debug!(template = name, path = %path.display(), "Layout template not present");
            }
        }

        Ok(Self { handlebars })
    }

    pub fn render(&self, kind: RecordKind, context: &serde_json::Value) -> Result<String> {
        let name = kind.template_name();
        if !self.handlebars.has_template(name) {
            return Err(CertificateError::TemplateNotFound(name.to_string()));
        }
        Ok(self.handlebars.render(name, context)?)
    }
}
