// certificate-generation-service/src/service.rs

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{CertificateRequest, CertificateResponse, Outcome};
use crate::pipeline::CertificatePipeline;
use crate::target::RenderTarget;

pub struct CertificateService {
    pipeline: CertificatePipeline,
}

impl CertificateService {
    pub fn new(pipeline: CertificatePipeline) -> Self {
        Self { pipeline }
    }

    pub async fn handle_request(&self, request: &CertificateRequest) -> CertificateResponse {
        let request_id = Uuid::new_v4().to_string();

        info!(
            request_id = %request_id,
            records = request.records.len(),
            "Processing certificate generation request"
        );

        let mut certificates = Vec::new();
        let mut last_error = None;

        for record in &request.records {
            // One mounted target per record, the way one open modal owns one
            // layout instance.
            let target = RenderTarget::mount();
            let handle = target.handle();

            match self.pipeline.generate(record, &request.assets, &handle).await {
                Ok(Outcome::Saved(saved)) => certificates.push(saved),
                Ok(Outcome::TargetDetached) => {
                    warn!(record_id = %record.id, "Target detached before generation")
                }
                Ok(Outcome::Unchanged) => {
                    info!(record_id = %record.id, "Record already rendered, nothing to do")
                }
                Err(e) => {
                    error!(
                        record_id = %record.id,
                        error = %e,
                        error_type = %e.to_error_response().error_type,
                        "Certificate generation failed"
                    );
                    last_error = Some(e.to_string());
                    // Continue with the remaining records instead of failing
                    // the whole batch.
                }
            }
        }

        if certificates.is_empty() && !request.records.is_empty() {
            return CertificateResponse::error(
                request_id,
                last_error.unwrap_or_else(|| "No certificates could be generated".to_string()),
            );
        }

        info!(
            request_id = %request_id,
            generated = certificates.len(),
            "Certificate request completed"
        );

        CertificateResponse::success(request_id, certificates)
    }
}
