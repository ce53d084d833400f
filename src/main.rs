use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use adserver::ads::AdStore;
use adserver::config::{AdServerConfig, LoggingConfig, RateLimitSettings};
use adserver::http::{router, AppState, HttpServer};
use adserver::ratelimit::{spawn_idle_eviction, RateLimiter};

/// Ad serving backend.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "ADSERVER_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port, overriding the configured address's port
    #[arg(short, long, env = "HTTP_PORT")]
    port: Option<u16>,

    /// Use the relaxed rate limit profile (100/s, burst 200)
    #[arg(long)]
    relaxed_rate_limit: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AdServerConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.http_addr.set_port(port);
    }
    if cli.relaxed_rate_limit {
        config.rate_limit = RateLimitSettings {
            idle_eviction_secs: config.rate_limit.idle_eviction_secs,
            ..RateLimitSettings::relaxed()
        };
    }

    init_tracing(&config.logging);

    info!("Starting Adserver");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(
        http_addr = %config.server.http_addr,
        refill_rate = config.rate_limit.refill_rate,
        burst = config.rate_limit.burst,
        default_ttl_minutes = config.ads.default_ttl_minutes,
        "Configuration loaded"
    );

    let store = Arc::new(AdStore::new());
    let limiter = Arc::new(RateLimiter::new(&config.rate_limit)?);
    info!("Ad store and rate limiter initialized");

    let eviction = config.rate_limit.idle_eviction().map(|max_idle| {
        let every = (max_idle / 2).max(Duration::from_secs(1));
        spawn_idle_eviction(Arc::clone(&limiter), every, max_idle)
    });

    let state = AppState::new(store, config.ads.default_ttl_minutes);
    let app = router(state, limiter, config.server.request_timeout());

    let server = HttpServer::bind(config.server.http_addr, app).await?;
    server.serve_with_shutdown(shutdown_signal()).await?;

    if let Some(handle) = eviction {
        handle.abort();
    }

    info!("Adserver stopped");
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
