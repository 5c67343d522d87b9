// certificate-generation-service/src/renderers/mod.rs

mod pdf;
mod raster;

pub use pdf::{PackagedPdf, PageOrientation, PdfPackager, PT_PER_PX};
pub use raster::{RasterSnapshot, Rasterizer, PIXEL_DENSITY};
