// certificate-generation-service/src/error.rs

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CertificateError>;

#[derive(Error, Debug)]
pub enum CertificateError {
    #[error("Template error: {0}")]
    TemplateError(#[from] handlebars::TemplateError),

    #[error("Rendering error: {0}")]
    RenderError(#[from] handlebars::RenderError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Rasterization failed: {0}")]
    RasterizationError(String),

    #[error("Image decode error: {0}")]
    ImageDecodeError(#[from] image::ImageError),

    #[error("PDF packaging error: {0}")]
    PdfError(String),

    #[error("Capture already in progress for this render target")]
    CaptureInProgress,
}

impl CertificateError {
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            error_type: match self {
                CertificateError::TemplateError(_) => "template_error",
                CertificateError::RenderError(_) => "render_error",
                CertificateError::IoError(_) => "io_error",
                CertificateError::SerializationError(_) => "serialization_error",
                CertificateError::MissingField(_) => "missing_field",
                CertificateError::TemplateNotFound(_) => "template_not_found",
                CertificateError::RasterizationError(_) => "rasterization_error",
                CertificateError::ImageDecodeError(_) => "image_decode_error",
                CertificateError::PdfError(_) => "pdf_error",
                CertificateError::CaptureInProgress => "capture_in_progress",
            }
            .to_string(),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
}
