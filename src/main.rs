use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use bandprep::audio::ChannelMicrophone;
use bandprep::content::samples;
use bandprep::examiner::{AiExaminer, Evaluator};
use bandprep::session::LoggingNarrator;
use bandprep::storage::{BlobStore, HostedBucket, MemoryBucket};
use bandprep::{create_router, AppState, Config};

#[derive(Parser)]
#[command(name = "bandprep")]
#[command(about = "Practice portal backend for band-scored language tests")]
struct Args {
    /// Config file stem (config/bandprep reads config/bandprep.toml)
    #[arg(long, default_value = "config/bandprep")]
    config: String,

    /// Override the configured HTTP port
    #[arg(long)]
    port: Option<u16>,

    /// Seed the content store with sample tests and tasks
    #[arg(long)]
    seed_samples: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    bandprep::telemetry::init_tracing();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let microphone = Arc::new(ChannelMicrophone::new());
    let narrator = Arc::new(LoggingNarrator);

    let blobs: Arc<dyn BlobStore> = match hosted_bucket(&cfg)? {
        Some(bucket) => {
            info!("Uploads go to hosted storage at {}", cfg.storage.base_url.as_deref().unwrap_or_default());
            Arc::new(bucket)
        }
        None => {
            warn!("No hosted storage configured, uploads stay in memory");
            Arc::new(MemoryBucket::new())
        }
    };

    let evaluator: Option<Arc<dyn Evaluator>> =
        match AiExaminer::from_config(&cfg.evaluator, cfg.prompts.clone()) {
            Some(examiner) => {
                info!("AI evaluation enabled with model {}", cfg.evaluator.model);
                Some(Arc::new(examiner))
            }
            None => {
                warn!(
                    "{} is not set, submissions will fail at the evaluation step",
                    cfg.evaluator.api_key_env
                );
                None
            }
        };

    let bind = cfg.service.http.bind.clone();
    let port = cfg.service.http.port;

    let state = AppState::new(cfg, microphone, narrator, blobs, evaluator);

    if args.seed_samples {
        samples::seed(&state.content).await;
        info!("Seeded sample content");
    }

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .context("invalid bind address")?;
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn hosted_bucket(cfg: &Config) -> Result<Option<HostedBucket>> {
    let Some(base_url) = cfg.storage.base_url.as_deref() else {
        return Ok(None);
    };
    match std::env::var(&cfg.storage.service_key_env) {
        Ok(service_key) => Ok(Some(HostedBucket::new(base_url, service_key)?)),
        Err(_) => {
            warn!(
                "{} is not set, ignoring configured storage at {}",
                cfg.storage.service_key_env, base_url
            );
            Ok(None)
        }
    }
}
