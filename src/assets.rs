// certificate-generation-service/src/assets.rs

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use futures::future::join_all;
use image::GenericImageView;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::models::CertificateAssets;

/// Embedded images must be fully decoded before capture or they rasterize
/// blank. The wait per image is bounded; timeout and error both resolve the
/// wait so a broken asset never stalls the pipeline.
pub const ASSET_LOAD_TIMEOUT: Duration = Duration::from_millis(3000);

/// The three decorative slots on the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetSlot {
    Seal,
    Watermark,
    Badge,
}

impl AssetSlot {
    pub fn name(&self) -> &'static str {
        match self {
            AssetSlot::Seal => "seal",
            AssetSlot::Watermark => "watermark",
            AssetSlot::Badge => "badge",
        }
    }
}

/// A decoded decorative image, ready to embed into the layout.
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub slot: AssetSlot,
    pub data_uri: String,
    pub width_px: u32,
    pub height_px: u32,
}

/// Resolves opaque asset references to raw bytes. The production source reads
/// the filesystem; tests substitute slow or failing sources.
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn fetch(&self, reference: &str) -> std::io::Result<Vec<u8>>;
}

pub struct FileAssetSource;

#[async_trait]
impl AssetSource for FileAssetSource {
    async fn fetch(&self, reference: &str) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(reference).await
    }
}

pub struct AssetLoader {
    source: Arc<dyn AssetSource>,
}

impl AssetLoader {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self { source }
    }

    /// Load all three decorative assets concurrently. A slot that errors,
    /// fails to decode, or exceeds the load timeout is dropped from the
    /// result; the render proceeds with that region blank.
    pub async fn load_all(&self, assets: &CertificateAssets) -> Vec<LoadedAsset> {
        let slots = [
            (AssetSlot::Seal, assets.seal.as_str()),
            (AssetSlot::Watermark, assets.watermark.as_str()),
            (AssetSlot::Badge, assets.badge.as_str()),
        ];

        let loads = slots
            .iter()
            .map(|(slot, reference)| self.load_one(*slot, reference));

        join_all(loads).await.into_iter().flatten().collect()
    }

    async fn load_one(&self, slot: AssetSlot, reference: &str) -> Option<LoadedAsset> {
        let bytes = match timeout(ASSET_LOAD_TIMEOUT, self.source.fetch(reference)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                warn!(
                    slot = slot.name(),
                    reference,
                    error = %e,
                    "Asset failed to load, rendering without it"
                );
                return None;
            }
            Err(_) => {
                warn!(
                    slot = slot.name(),
                    reference,
                    timeout_ms = ASSET_LOAD_TIMEOUT.as_millis() as u64,
                    "Asset load timed out, rendering without it"
                );
                return None;
            }
        };

        let decoded = match image::load_from_memory(&bytes) {
            Ok(img) => img,
            Err(e) => {
                warn!(
                    slot = slot.name(),
                    reference,
                    error = %e,
                    "Asset is not a decodable image, rendering without it"
                );
                return None;
            }
        };

        let mime = image::guess_format(&bytes)
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream");
        let data_uri = format!(
            "data:{};base64,{}",
            mime,
            general_purpose::STANDARD.encode(&bytes)
        );

        let (width_px, height_px) = decoded.dimensions();
        debug!(slot = slot.name(), width_px, height_px, "Asset loaded");

        Some(LoadedAsset {
            slot,
            data_uri,
            width_px,
            height_px,
        })
    }
}
