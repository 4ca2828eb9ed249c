use anyhow::Context;
use sentiment_ranking_service::{
    config::LogFormat, jobs::BootstrapJob, server::serve_lines, spawn_engine, Config,
    LexiconAnalyzer, RatingFunction, ScoringEngine,
};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load config
    let config = Config::from_env().context("Failed to load config")?;

    // Initialize tracing; stdout is reserved for responses
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match config.service.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }

    let rating: Arc<dyn RatingFunction> = Arc::new(LexiconAnalyzer::new());
    let bounds = config.scoring.bounds();

    info!(
        service = %config.service.service_name,
        rating_function = rating.name(),
        base = bounds.base,
        floor = bounds.floor,
        ceiling = ?bounds.ceiling,
        "Starting scoring service"
    );

    let engine = ScoringEngine::new(bounds, rating).context("Failed to build scoring engine")?;
    let (handle, engine_task) = spawn_engine(engine, config.service.dispatch_queue_capacity);

    if let Some(path) = &config.bootstrap.seed_file {
        BootstrapJob::new(path)
            .run(&handle)
            .await
            .context("Bootstrap failed")?;
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let interrupted = tokio::select! {
        result = serve_lines(handle, stdin, tokio::io::stdout()) => {
            result?;
            false
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            true
        }
    };

    // Handles are gone once serving stops; wait for the engine to drain
    if let Err(e) = engine_task.await {
        warn!(error = %e, "Scoring engine task ended abnormally");
    }

    if interrupted {
        // A pending stdin read sits on a blocking thread that runtime
        // shutdown would wait on until another line arrives
        std::process::exit(0);
    }

    Ok(())
}
