// certificate-generation-service/src/renderers/raster.rs

use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::error::{CertificateError, Result};

/// Capture density. Doubled for print-quality sharpness.
pub const PIXEL_DENSITY: f32 = 2.0;

/// Bitmap produced from the render target. Transient; consumed by the PDF
/// packaging step within the same generation.
#[derive(Debug, Clone)]
pub struct RasterSnapshot {
    pub png_data: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
    pub density: f32,
}

pub struct Rasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl Rasterizer {
    pub fn new(font_dir: Option<&Path>) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        if let Some(dir) = font_dir {
            db.load_fonts_dir(dir);
        }
        Self {
            fontdb: Arc::new(db),
        }
    }

    fn parse(&self, svg: &str) -> Result<usvg::Tree> {
        let mut opt = usvg::Options::default();
        opt.fontdb = Arc::clone(&self.fontdb);
        usvg::Tree::from_str(svg, &opt)
            .map_err(|e| CertificateError::RasterizationError(e.to_string()))
    }

    /// Report the document's rendered height in logical pixels, as the
    /// renderer itself sees it. This live measurement, not the layout
    /// estimate, is what the snapshot and page dimensions are built from.
    pub fn measure_height(&self, svg: &str) -> Result<f32> {
        Ok(self.parse(svg)?.size().height())
    }

    /// Rasterize at the capture density against an opaque white background,
    /// so transparent regions never composite against whatever sits beneath
    /// the page in a viewer.
    pub fn rasterize(&self, svg: &str) -> Result<RasterSnapshot> {
        let tree = self.parse(svg)?;
        let size = tree.size();
        let width_px = (size.width() * PIXEL_DENSITY).round() as u32;
        let height_px = (size.height() * PIXEL_DENSITY).round() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(width_px, height_px).ok_or_else(|| {
            CertificateError::RasterizationError(format!(
                "failed to allocate {width_px}x{height_px} pixmap"
            ))
        })?;
        pixmap.fill(tiny_skia::Color::WHITE);

        resvg::render(
            &tree,
            tiny_skia::Transform::from_scale(PIXEL_DENSITY, PIXEL_DENSITY),
            &mut pixmap.as_mut(),
        );

        let png_data = pixmap
            .encode_png()
            .map_err(|e| CertificateError::RasterizationError(e.to_string()))?;

        debug!(width_px, height_px, "Raster snapshot produced");

        Ok(RasterSnapshot {
            png_data,
            width_px,
            height_px,
            density: PIXEL_DENSITY,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rasterizes_at_double_density() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="80">
            <rect x="0" y="0" width="100" height="80" fill="#336699"/>
        </svg>"##;
        let rasterizer = Rasterizer::new(None);
        let snapshot = rasterizer.rasterize(svg).unwrap();
        assert_eq!(snapshot.width_px, 200);
        assert_eq!(snapshot.height_px, 160);
        assert!(!snapshot.png_data.is_empty());
    }

    #[test]
    fn measures_declared_document_height() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="1200" height="875">
            <rect x="0" y="0" width="1200" height="875" fill="#ffffff"/>
        </svg>"##;
        let rasterizer = Rasterizer::new(None);
        assert_eq!(rasterizer.measure_height(svg).unwrap(), 875.0);
    }

    #[test]
    fn malformed_markup_is_a_rasterization_error() {
        let rasterizer = Rasterizer::new(None);
        assert!(matches!(
            rasterizer.rasterize("<not-svg"),
            Err(CertificateError::RasterizationError(_))
        ));
    }
}
