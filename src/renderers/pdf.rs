// certificate-generation-service/src/renderers/pdf.rs

use image::GenericImageView;
use printpdf::{ColorBits, ColorSpace, ImageTransform, ImageXObject, Mm, PdfDocument, Px};
use std::io::{BufWriter, Cursor};
use tracing::debug;

use super::raster::RasterSnapshot;
use crate::error::{CertificateError, Result};

/// Point units per logical pixel under the 96 DPI assumption.
pub const PT_PER_PX: f32 = 0.75;

const PT_TO_MM: f32 = 0.352_777_78;
const IMAGE_DPI: f32 = 96.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOrientation {
    Portrait,
    Landscape,
}

/// A finished single-page document, sized exactly to its snapshot.
#[derive(Debug, Clone)]
pub struct PackagedPdf {
    pub bytes: Vec<u8>,
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    pub orientation: PageOrientation,
}

pub struct PdfPackager;

impl PdfPackager {
    pub fn new() -> Self {
        Self
    }

    /// Wrap the snapshot in a one-page PDF whose page equals the snapshot's
    /// logical dimensions in points, bitmap placed at the origin scaled to
    /// fill the page edge to edge.
    pub fn package(&self, snapshot: &RasterSnapshot, title: &str) -> Result<PackagedPdf> {
        // Decode the produced bitmap; its actual dimensions, not the
        // requested ones, drive the page size.
        let decoded = image::ImageReader::new(Cursor::new(&snapshot.png_data))
            .with_guessed_format()?
            .decode()?;
        let (bitmap_w, bitmap_h) = decoded.dimensions();

        let page_width_pt = bitmap_w as f32 / snapshot.density * PT_PER_PX;
        let page_height_pt = bitmap_h as f32 / snapshot.density * PT_PER_PX;
        let orientation = if page_width_pt > page_height_pt {
            PageOrientation::Landscape
        } else {
            PageOrientation::Portrait
        };

        let (doc, page, layer) = PdfDocument::new(
            title,
            Mm(page_width_pt * PT_TO_MM),
            Mm(page_height_pt * PT_TO_MM),
            "Certificate",
        );

        let rgb = decoded.to_rgb8();
        let xobject = ImageXObject {
            width: Px(bitmap_w as usize),
            height: Px(bitmap_h as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: rgb.into_raw(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        };

        // At 96 DPI one pixel maps to 0.75pt; dividing by the capture density
        // lands the doubled bitmap exactly on the logical page.
        printpdf::Image::from(xobject).add_to_layer(
            doc.get_page(page).get_layer(layer),
            ImageTransform {
                translate_x: Some(Mm(0.0)),
                translate_y: Some(Mm(0.0)),
                scale_x: Some(1.0 / snapshot.density),
                scale_y: Some(1.0 / snapshot.density),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );

        let mut writer = BufWriter::new(Vec::<u8>::new());
        doc.save(&mut writer)
            .map_err(|e| CertificateError::PdfError(e.to_string()))?;
        let bytes = writer
            .into_inner()
            .map_err(|e| CertificateError::PdfError(e.to_string()))?;

        debug!(
            page_width_pt,
            page_height_pt,
            orientation = ?orientation,
            size_bytes = bytes.len(),
            "PDF packaged"
        );

        Ok(PackagedPdf {
            bytes,
            page_width_pt,
            page_height_pt,
            orientation,
        })
    }
}

impl Default for PdfPackager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(width_px: u32, height_px: u32, density: f32) -> RasterSnapshot {
        let img = image::RgbImage::from_pixel(width_px, height_px, image::Rgb([250, 250, 250]));
        let mut png_data = Vec::new();
        img.write_to(
            &mut Cursor::new(&mut png_data),
            image::ImageFormat::Png,
        )
        .unwrap();
        RasterSnapshot {
            png_data,
            width_px,
            height_px,
            density,
        }
    }

    #[test]
    fn page_matches_logical_dimensions_at_three_quarter_points() {
        let pdf = PdfPackager::new()
            .package(&snapshot(2400, 1750, 2.0), "Sample")
            .unwrap();
        assert!((pdf.page_width_pt - 1200.0 * 0.75).abs() < f32::EPSILON);
        assert!((pdf.page_height_pt - 875.0 * 0.75).abs() < f32::EPSILON);
        assert_eq!(pdf.orientation, PageOrientation::Landscape);
        assert!(pdf.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn taller_than_wide_snapshot_is_portrait() {
        let pdf = PdfPackager::new()
            .package(&snapshot(200, 400, 2.0), "Sample")
            .unwrap();
        assert_eq!(pdf.orientation, PageOrientation::Portrait);
    }

    #[test]
    fn decoded_bitmap_dimensions_win_over_requested_ones() {
        // The snapshot lies about its size; the decoded bitmap decides.
        let mut s = snapshot(300, 200, 2.0);
        s.width_px = 9999;
        s.height_px = 9999;
        let pdf = PdfPackager::new().package(&s, "Sample").unwrap();
        assert!((pdf.page_width_pt - 150.0 * 0.75).abs() < f32::EPSILON);
        assert!((pdf.page_height_pt - 100.0 * 0.75).abs() < f32::EPSILON);
    }
}
