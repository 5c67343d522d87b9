// certificate-generation-service/src/config.rs

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub templates: TemplateConfig,
    #[serde(default)]
    pub fonts: FontConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    pub path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FontConfig {
    /// Extra font directory handed to the rasterizer on top of system fonts.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Where finished documents land; the download directory.
    pub directory: String,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            // Start with default values
            .set_default("service.name", "certificate-generation-service")?
            .set_default("service.log_level", "info")?
            .set_default("templates.path", "./templates")?
            .set_default("output.directory", "./downloads")?
            // Load from config file if it exists
            .add_source(File::with_name("config").required(false))
            // Override with environment variables (e.g., CERTGEN__OUTPUT__DIRECTORY)
            .add_source(Environment::with_prefix("CERTGEN").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
