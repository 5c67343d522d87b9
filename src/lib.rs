//! Certificate generation pipeline for the academy platform.
//!
//! Turns an achievement record plus three decorative raster assets into a
//! single-page PDF: the fixed-width layout is rendered, rasterized at double
//! density against a white background, wrapped in a page sized exactly to the
//! rendered content, and saved under a name derived from the achievement
//! title.

pub mod assets;
pub mod config;
pub mod delivery;
pub mod error;
pub mod layout;
pub mod models;
pub mod pipeline;
pub mod renderers;
pub mod service;
pub mod target;
pub mod templates;

pub use error::{CertificateError, Result};
pub use models::{
    AchievementRecord, CertificateAssets, CertificateRequest, CertificateResponse, Outcome,
    RecordKind, SavedCertificate,
};
pub use pipeline::CertificatePipeline;
pub use service::CertificateService;
pub use target::{CapturePhase, RenderTarget, TargetHandle, PINNED_WIDTH_PX};
