//! FlowScope - Transaction flow analysis for Solana accounts
//!
//! Fetches an address's recent transaction history over JSON-RPC and runs
//! the full analysis pipeline:
//! - Funding source tracing with confidence scoring
//! - Behavioral pattern detection
//! - Explainable 0-100 risk aggregation
//!
//! Usage: flowscope <ADDRESS> [LIMIT]

use flowscope::{EngineConfig, FlowAnalyzer, SolanaClient};
use flowscope::models::types::AnalysisFilters;
use flowscope::utils::constants::{is_valid_address, MAX_FETCH_LIMIT};

use chrono::Utc;
use eyre::Result;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    println!(
        r#"
    ╔══════════════════════════════════════════════════════╗
    ║                                                      ║
    ║   F L O W S C O P E                         v0.1.0   ║
    ║   Transaction Flow Analysis Engine                   ║
    ║                                                      ║
    ║   Funding Tracing | Pattern Detection | Risk Score   ║
    ║                                                      ║
    ╚══════════════════════════════════════════════════════╝
    "#
    );

    // Check for the RPC endpoint
    if std::env::var("SOLANA_RPC_URL").is_err() {
        eprintln!("⚠️  WARNING: SOLANA_RPC_URL not set!");
        eprintln!("   Falling back to the public mainnet endpoint (heavily rate limited).");
        eprintln!("   export SOLANA_RPC_URL=\"https://your-rpc-provider.example/YOUR_API_KEY\"");
        eprintln!();
    }

    let mut args = std::env::args().skip(1);
    let address = match args.next() {
        Some(a) => a,
        None => {
            eprintln!("Usage: flowscope <ADDRESS> [LIMIT]");
            eprintln!("  ADDRESS  base58 account address to analyze");
            eprintln!("  LIMIT    signatures to fetch (default from FETCH_LIMIT env)");
            std::process::exit(1);
        }
    };

    if !is_valid_address(&address) {
        eprintln!("❌ Not a valid base58 account address: {}", address);
        std::process::exit(1);
    }

    let config = EngineConfig::default();
    let limit = args
        .next()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(config.fetch_limit)
        .clamp(1, MAX_FETCH_LIMIT);

    info!("🔭 Target: {} | Fetching up to {} transactions", address, limit);

    let client = SolanaClient::new(&config)?;
    let start = Instant::now();

    let transactions = client.fetch_transactions(&address, limit).await?;
    info!(
        "📥 Fetched {} transactions in {:.2}s",
        transactions.len(),
        start.elapsed().as_secs_f64()
    );

    // Balance failure only loses a cosmetic graph detail
    let balance = client.get_balance(&address).await.ok();

    let analyzer = FlowAnalyzer::new();
    let result = analyzer.analyze_with_balance(
        &transactions,
        &address,
        balance,
        &AnalysisFilters::default(),
    );

    println!("{}", result.summary());

    // Persist the full report as JSON
    std::fs::create_dir_all("./reports")?;
    let prefix: String = address.chars().take(8).collect();
    let path = format!("./reports/flow_{}_{}.json", prefix, Utc::now().timestamp());
    std::fs::write(&path, serde_json::to_string_pretty(&result)?)?;
    println!("📄 Full report written to {}", path);

    Ok(())
}
