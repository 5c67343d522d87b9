use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use crate::assets::{AssetLoader, AssetSlot, AssetSource, LoadedAsset};
use crate::delivery::DownloadSink;
use crate::error::{CertificateError, Result};
use crate::layout::{self, LayoutPlan};
use crate::models::{AchievementRecord, CertificateAssets, Outcome, RecordKind};
use crate::renderers::{PdfPackager, Rasterizer};
use crate::target::{CaptureGuard, TargetHandle, PINNED_WIDTH_PX};
use crate::templates::CertificateTemplates;

/// Bounded layout-stability poll: capture proceeds once two consecutive
/// measurements agree. The fixed settle delay is the last resort only.
const STABILITY_MAX_POLLS: u32 = 5;
const STABILITY_POLL_INTERVAL: Duration = Duration::from_millis(100);

fn settle_delay(kind: RecordKind) -> Duration {
    match kind {
        RecordKind::Course => Duration::from_millis(300),
        RecordKind::Diploma => Duration::from_millis(1000),
    }
}

/// Orchestrates: resolve target → capture lock → assets → settle/measure →
/// rasterize → package → save → restore.
pub struct CertificatePipeline {
    templates: CertificateTemplates,
    assets: AssetLoader,
    rasterizer: Rasterizer,
    packager: PdfPackager,
    sink: DownloadSink,
}

impl CertificatePipeline {
    pub fn new(
        templates: CertificateTemplates,
        asset_source: Arc<dyn AssetSource>,
        rasterizer: Rasterizer,
        sink: DownloadSink,
    ) -> Self {
        Self {
            templates,
            assets: AssetLoader::new(asset_source),
            rasterizer,
            packager: PdfPackager::new(),
            sink,
        }
    }

    /// Produce and save exactly one document for `record`, or report why not.
    /// The save only runs once the bitmap has been fully decoded; no partial
    /// file is ever handed to the sink.
    #[instrument(skip(self, record, assets, target), fields(
        record_id = %record.id,
        kind = ?record.record_kind,
        title = %record.achievement_title
    ))]
    pub async fn generate(
        &self,
        record: &AchievementRecord,
        assets: &CertificateAssets,
        target: &TargetHandle,
    ) -> Result<Outcome> {
        let started = Instant::now();

        // 1. Resolve the handle. A detached target is a recoverable no-op.
        let Some(target) = target.resolve() else {
            warn!("Render target detached, skipping generation");
            return Ok(Outcome::TargetDetached);
        };

        // 2. Queue on the per-target capture slot; generations against one
        //    target serialize FIFO.
        let mut slot = target.capture_slot.lock().await;

        // 3. One document per record identity per mount. Failed runs do not
        //    consume the key and stay retryable.
        if slot.last_rendered == Some(record.id) {
            debug!("Record already rendered on this mount");
            return Ok(Outcome::Unchanged);
        }

        if record.achievement_title.trim().is_empty() {
            return Err(CertificateError::MissingField("achievement_title".into()));
        }

        // 4. Force visibility and pin the width for capture. The guard
        //    restores the hidden state on every exit path.
        let _guard = CaptureGuard::acquire(&target)?;
        let width = target
            .presentation()
            .width_override
            .unwrap_or(PINNED_WIDTH_PX);

        // 5. Wait for the decorative raster assets, each bounded by the load
        //    timeout. Missing slots render blank rather than blocking.
        let loaded = self.assets.load_all(assets).await;
        if loaded.len() < 3 {
            warn!(loaded = loaded.len(), "Proceeding with degraded decorative assets");
        }

        // 6. Settle the layout and take the live height measurement.
        let (svg, measured_height) = self.settle_and_measure(record, &loaded, width).await?;
        debug!(measured_height, "Layout settled");

        // 7. Rasterize at capture density against an opaque white background.
        let snapshot = self.rasterizer.rasterize(&svg)?;

        // 8. Re-measure the produced bitmap and package it as a single-page
        //    document sized to it.
        let pdf = self.packager.package(&snapshot, &record.achievement_title)?;

        // 9. Save under the derived name, then record the one-shot key. The
        //    guard restore runs after the save has been handed off.
        let file_name = record.output_file_name();
        let saved = self
            .sink
            .save(&file_name, &pdf, started.elapsed().as_millis() as i32)?;
        slot.last_rendered = Some(record.id);

        info!(
            file_name = %saved.file_name,
            page_width_pt = saved.page_width_pt,
            page_height_pt = saved.page_height_pt,
            duration_ms = saved.rendering_duration_ms,
            "Certificate generated"
        );

        Ok(Outcome::Saved(saved))
    }

    /// Render and measure until two consecutive measurements agree, falling
    /// back to the fixed per-variant delay when layout never stabilizes.
    async fn settle_and_measure(
        &self,
        record: &AchievementRecord,
        loaded: &[LoadedAsset],
        width: f32,
    ) -> Result<(String, f32)> {
        let mut svg = self.render_markup(record, loaded, width)?;
        let mut height = self.rasterizer.measure_height(&svg)?;

        for _ in 0..STABILITY_MAX_POLLS {
            tokio::time::sleep(STABILITY_POLL_INTERVAL).await;
            let next_svg = self.render_markup(record, loaded, width)?;
            let next_height = self.rasterizer.measure_height(&next_svg)?;
            if next_height == height {
                return Ok((next_svg, next_height));
            }
            svg = next_svg;
            height = next_height;
        }

        warn!(height, "Layout did not stabilize, falling back to fixed settle delay");
        tokio::time::sleep(settle_delay(record.record_kind)).await;
        svg = self.render_markup(record, loaded, width)?;
        height = self.rasterizer.measure_height(&svg)?;
        Ok((svg, height))
    }

    fn render_markup(
        &self,
        record: &AchievementRecord,
        loaded: &[LoadedAsset],
        width: f32,
    ) -> Result<String> {
        let plan = layout::plan(&record.achievement_title, width);
        let context = template_context(record, &plan, loaded);
        self.templates.render(record.record_kind, &context)
    }
}

fn template_context(
    record: &AchievementRecord,
    plan: &LayoutPlan,
    loaded: &[LoadedAsset],
) -> serde_json::Value {
    let asset = |slot: AssetSlot| {
        loaded.iter().find(|a| a.slot == slot).map(|a| {
            json!({
                "data_uri": a.data_uri,
                "width": a.width_px,
                "height": a.height_px,
            })
        })
    };

    let watermark_size = 520.0_f32;

    json!({
        "width": plan.width,
        "height": plan.height,
        "center_x": plan.width / 2.0,
        "heading": record.record_kind.heading(),
        "heading_y": plan.heading_y,
        "presented_y": plan.presented_y,
        "subject_name": record.subject_or_placeholder(),
        "subject_y": plan.subject_y,
        "completion_y": plan.completion_y,
        "title_lines": plan
            .title_lines
            .iter()
            .map(|l| json!({ "text": l.text, "y": l.y }))
            .collect::<Vec<_>>(),
        "issued_date": record.issued_at().format("%B %d, %Y").to_string(),
        "date_y": plan.date_y,
        "footer_y": plan.footer_y,
        "border": {
            "outer_w": plan.width - 48.0,
            "outer_h": plan.height - 48.0,
            "inner_w": plan.width - 80.0,
            "inner_h": plan.height - 80.0,
        },
        "watermark_x": (plan.width - watermark_size) / 2.0,
        "watermark_y": (plan.height - watermark_size) / 2.0,
        "badge_x": plan.width - 196.0,
        "seal_x": plan.width / 2.0 - 70.0,
        "watermark": asset(AssetSlot::Watermark),
        "seal": asset(AssetSlot::Seal),
        "badge": asset(AssetSlot::Badge),
    })
}
