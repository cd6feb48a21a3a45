//! Stats server
//!
//! Serves running averages and social-graph rankings over HTTP.
//!
//! Usage:
//!   cargo run --release --bin feedstats_server
//!
//! Environment variables:
//!   FEEDSTATS_BIND_ADDR - Listening address (default: 0.0.0.0:8080)
//!   REMOTE_BASE_URL - Remote source root
//!   REMOTE_BEARER_TOKEN - Bearer credential for the remote source
//!   RATE_LIMIT_CAPACITY / RATE_LIMIT_WINDOW_MS - Outbound call budget
//!   See `ServiceConfig::from_env` for the full list.

use dotenv::dotenv;
use feedstats::api::{self, AppState};
use feedstats::numbers::AverageService;
use feedstats::social::FanOutAggregator;
use feedstats::{RateLimiter, RemoteFetcher, RemoteSource, ServiceConfig};
use log::info;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = ServiceConfig::from_env()?;

    info!("🚀 Starting feedstats server");
    info!("📊 Configuration:");
    info!("   ├─ Bind address: {}", config.bind_addr);
    info!("   ├─ Remote source: {}", config.base_url);
    info!(
        "   ├─ Credential: {}",
        if config.bearer_token.is_some() { "set" } else { "not set" }
    );
    info!("   ├─ Window size: {}", config.window_size);
    info!("   ├─ Averaging budget: {}ms", config.numbers_deadline_ms);
    info!(
        "   ├─ Rate limit: {} calls / {}ms",
        config.rate_limit_capacity, config.rate_limit_window_ms
    );
    info!("   ├─ Fan-out cap: {} units", config.fanout_max_in_flight);
    info!("   └─ Top-K: {}", config.top_k);

    let limiter = RateLimiter::start(config.rate_limit_capacity, config.refill_interval())?;

    let fetcher = RemoteFetcher::new(
        config.base_url.clone(),
        config.bearer_token.clone(),
        limiter.clone(),
        config.remote_timeout(),
        config.numbers_deadline(),
    )?;
    let source: Arc<dyn RemoteSource + Send + Sync> = Arc::new(fetcher);

    let state = AppState {
        averages: Arc::new(AverageService::new(
            source.clone(),
            config.window_size,
            config.numbers_deadline(),
        )),
        aggregator: Arc::new(FanOutAggregator::new(source, config.fanout_max_in_flight)),
        top_k: config.top_k,
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("✅ Server running on {}", config.bind_addr);
    info!("🔄 Press CTRL+C to shutdown gracefully");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("❌ Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("⏹️  Shutdown signal received");
        })
        .await?;

    limiter.shutdown();
    info!("✅ Server stopped");
    Ok(())
}
