//! FlowScope Cloud API Server
//!
//! REST API for transaction flow analysis and risk scoring
//!
//! Usage:
//!   cargo run --bin flowscope_api
//!
//! Environment:
//!   SOLANA_RPC_URL  - JSON-RPC endpoint for transaction history
//!   FLOWSCOPE_PORT  - Server port (default: 8080, PORT also honored)
//!   FLOWSCOPE_HOST  - Server host (default: 0.0.0.0)
//!   RUST_LOG        - Log level (default: info)

use flowscope::api::{create_router, handlers::AppState, start_cleanup_task};
use flowscope::EngineConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();

    print_banner();

    // Create app state from environment-backed config
    let config = EngineConfig::default();
    info!("🔗 RPC endpoint: {}", config.rpc_url);

    let state = Arc::new(AppState::new(config)?);
    let telemetry = state.telemetry.clone();

    // Start background cleanup task for rate limiter
    start_cleanup_task();
    info!("🧹 Background cleanup task started");

    // Create router
    let app = create_router(state);

    // Get server config from env
    // Hosted platforms inject PORT, fallback to FLOWSCOPE_PORT for local dev
    let host = std::env::var("FLOWSCOPE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("FLOWSCOPE_PORT"))
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("🚀 FlowScope API starting on http://{}", addr);
    info!("");
    info!("Endpoints:");
    info!("  POST /v1/flow/analyze   - Full flow analysis for one address");
    info!("  POST /v1/flow/batch     - Batch analysis (up to 25 addresses)");
    info!("  GET  /v1/stats          - Engine statistics");
    info!("  GET  /v1/health         - Health check");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");
    info!("");

    // Start server with graceful shutdown
    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("");
    info!("🛑 Shutdown signal received, cleaning up...");

    // Export final telemetry
    info!("📊 Exporting final telemetry...");
    let stats = telemetry.get_stats();
    info!("   Total analyses: {}", stats.total_analyses);
    info!("   Failed analyses: {}", stats.failed_analyses);
    info!("   High-risk results: {}", stats.high_risk_analyses);
    info!("   Avg latency: {:.2}ms", stats.avg_latency_ms);

    if let Err(e) = telemetry.flush_events() {
        warn!("   ⚠️ Failed to flush events: {}", e);
    }
    match telemetry.export_stats_json() {
        Ok(path) => info!("   ✅ Stats exported to: {}", path.display()),
        Err(e) => warn!("   ⚠️ Failed to export stats: {}", e),
    }

    info!("👋 FlowScope API shutdown complete");

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════════════╗
    ║                                                      ║
    ║   F L O W S C O P E   C L O U D   A P I     v0.1.0   ║
    ║   Transaction Flow Analysis Engine                   ║
    ║                                                      ║
    ╚══════════════════════════════════════════════════════╝
    "#
    );
}
