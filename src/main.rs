// certificate-generation-service/src/main.rs

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use certgen::assets::FileAssetSource;
use certgen::config::Config;
use certgen::delivery::DownloadSink;
use certgen::renderers::Rasterizer;
use certgen::templates::CertificateTemplates;
use certgen::{CertificatePipeline, CertificateRequest, CertificateService};

/// Generate certificate and diploma PDFs from an achievement request file.
#[derive(Parser, Debug)]
#[command(name = "certgen", version, about)]
struct Args {
    /// JSON file holding the certificate request (records + asset paths)
    request: PathBuf,

    /// Override the configured download directory
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Print to stderr BEFORE logging initialization to catch early failures
    eprintln!("Starting certificate-generation-service...");

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("FATAL: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.service.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!(
        service = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        "Starting Certificate Generation Service"
    );

    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.request)
        .with_context(|| format!("Failed to read request file {}", args.request.display()))?;
    let request = CertificateRequest::from_json(&raw).context("Invalid certificate request")?;

    let templates = CertificateTemplates::load(Path::new(&config.templates.path))
        .context("Failed to load certificate templates")?;
    let rasterizer = Rasterizer::new(config.fonts.path.as_deref().map(Path::new));
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| PathBuf::from(&config.output.directory));
    let sink = DownloadSink::new(output_dir);

    let pipeline =
        CertificatePipeline::new(templates, Arc::new(FileAssetSource), rasterizer, sink);
    let service = CertificateService::new(pipeline);

    let response = service.handle_request(&request).await;

    for saved in &response.certificates {
        println!("{}", saved.path);
    }

    if response.status != "success" {
        anyhow::bail!(
            "Certificate generation failed: {}",
            response.error.unwrap_or_default()
        );
    }

    info!(
        request_id = %response.request_id,
        generated = response.certificates.len(),
        "Done"
    );

    Ok(())
}
