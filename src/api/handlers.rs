//! API Request Handlers

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::info;

use super::types::*;
use crate::analyzer::FlowAnalyzer;
use crate::config::EngineConfig;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{AnalysisFilters, AnalysisResult, RiskLevel};
use crate::providers::solana::SolanaClient;
use crate::telemetry::TelemetryCollector;
use crate::utils::cache::AnalysisCache;
use crate::utils::constants::{is_valid_address, MAX_BATCH_ADDRESSES, MAX_FETCH_LIMIT};

/// Max concurrent analyses per batch request
const MAX_BATCH_CONCURRENCY: usize = 10;

/// Shared application state
pub struct AppState {
    pub client: Arc<SolanaClient>,
    pub analyzer: Arc<FlowAnalyzer>,
    pub telemetry: Arc<TelemetryCollector>,
    pub cache: AnalysisCache,
    pub default_limit: usize,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: EngineConfig) -> AppResult<Self> {
        let cache = AnalysisCache::new(config.cache_ttl);

        // Background task: drop expired cache entries every 60 seconds
        let cache_clone = cache.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                interval.tick().await;
                cache_clone.cleanup_expired();
            }
        });

        Ok(Self {
            client: Arc::new(SolanaClient::new(&config)?),
            analyzer: Arc::new(FlowAnalyzer::new()),
            telemetry: Arc::new(TelemetryCollector::new()),
            cache,
            default_limit: config.fetch_limit,
            start_time: Instant::now(),
        })
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Fetch and analyze one address, serving cached results when the request
/// carries no filters. Returns the report and whether it was cached.
async fn run_analysis(
    state: &AppState,
    address: &str,
    limit: usize,
    filters: &AnalysisFilters,
) -> Result<(AnalysisResult, bool), AppError> {
    let unfiltered = *filters == AnalysisFilters::default();
    let cache_key = AnalysisCache::key(address, limit);

    if unfiltered {
        if let Some(cached) = state.cache.get(&cache_key) {
            return Ok((cached, true));
        }
    }

    let start = Instant::now();
    let transactions = state.client.fetch_transactions(address, limit).await?;
    // Balance is cosmetic on the graph; analysis proceeds without it
    let balance = state.client.get_balance(address).await.ok();

    let result = state
        .analyzer
        .analyze_with_balance(&transactions, address, balance, filters);

    state
        .telemetry
        .record_analysis(&result, start.elapsed().as_millis() as u64);

    if unfiltered {
        state.cache.set(&cache_key, result.clone());
    }

    Ok((result, false))
}

fn error_response(
    start: Instant,
    error: AppError,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let status = StatusCode::from_u16(error.code.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ApiResponse::error(
            ApiError::from_app_error(&error),
            start.elapsed().as_secs_f64() * 1000.0,
        )),
    )
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}

// ============================================
// Flow Analysis
// ============================================

pub async fn analyze_flow(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<ApiResponse<AnalyzeData>>, (StatusCode, Json<ApiResponse<()>>)> {
    let start = Instant::now();

    if !is_valid_address(&req.address) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                ApiError::bad_request("Invalid account address format"),
                start.elapsed().as_secs_f64() * 1000.0,
            )),
        ));
    }

    let limit = req
        .limit
        .unwrap_or(state.default_limit)
        .clamp(1, MAX_FETCH_LIMIT);

    info!("🔍 Analyzing {} (limit {})", req.address, limit);

    match run_analysis(&state, &req.address, limit, &req.filters).await {
        Ok((report, cached)) => Ok(Json(ApiResponse::success(
            AnalyzeData { cached, report },
            start.elapsed().as_secs_f64() * 1000.0,
        ))),
        Err(e) => {
            state.telemetry.record_failure();
            Err(error_response(start, e))
        }
    }
}

// ============================================
// Batch Analysis
// ============================================

pub async fn batch_analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchAnalyzeRequest>,
) -> Result<Json<ApiResponse<BatchAnalyzeData>>, (StatusCode, Json<ApiResponse<()>>)> {
    let start = Instant::now();

    if req.addresses.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                ApiError::bad_request("addresses array cannot be empty"),
                start.elapsed().as_secs_f64() * 1000.0,
            )),
        ));
    }

    if req.addresses.len() > MAX_BATCH_ADDRESSES {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                ApiError::bad_request(format!(
                    "Maximum {} addresses per batch request",
                    MAX_BATCH_ADDRESSES
                )),
                start.elapsed().as_secs_f64() * 1000.0,
            )),
        ));
    }

    let concurrency = req.concurrency.clamp(1, MAX_BATCH_CONCURRENCY);
    let limit = req
        .limit
        .unwrap_or(state.default_limit)
        .clamp(1, MAX_FETCH_LIMIT);

    info!(
        "📦 Batch analysis: {} addresses, concurrency {}",
        req.addresses.len(),
        concurrency
    );

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut handles = Vec::new();

    for address in req.addresses.iter() {
        let sem = semaphore.clone();
        let state = state.clone();
        let address = address.clone();

        let handle = tokio::spawn(async move {
            let _permit = sem.acquire().await.unwrap();
            let item_start = Instant::now();

            if !is_valid_address(&address) {
                return BatchAddressResult {
                    address,
                    status: "error".to_string(),
                    risk_score: None,
                    level: None,
                    pattern_count: None,
                    error: Some("Invalid address format".to_string()),
                    latency_ms: item_start.elapsed().as_secs_f64() * 1000.0,
                };
            }

            match run_analysis(&state, &address, limit, &AnalysisFilters::default()).await {
                Ok((report, _cached)) => BatchAddressResult {
                    address,
                    status: "success".to_string(),
                    risk_score: Some(report.risk_score),
                    level: Some(report.risk_level().as_str().to_string()),
                    pattern_count: Some(report.patterns.len()),
                    error: None,
                    latency_ms: item_start.elapsed().as_secs_f64() * 1000.0,
                },
                Err(e) => {
                    state.telemetry.record_failure();
                    BatchAddressResult {
                        address,
                        status: "error".to_string(),
                        risk_score: None,
                        level: None,
                        pattern_count: None,
                        error: Some(e.to_string()),
                        latency_ms: item_start.elapsed().as_secs_f64() * 1000.0,
                    }
                }
            }
        });

        handles.push(handle);
    }

    let mut results = Vec::new();
    for handle in handles {
        if let Ok(result) = handle.await {
            results.push(result);
        }
    }

    let total_high_risk = results
        .iter()
        .filter(|r| {
            r.risk_score
                .map(|s| matches!(RiskLevel::from_score(s), RiskLevel::High | RiskLevel::Critical))
                .unwrap_or(false)
        })
        .count();

    let data = BatchAnalyzeData {
        total_requested: req.addresses.len(),
        total_processed: results.len(),
        total_high_risk,
        results,
        processing_time_ms: start.elapsed().as_secs_f64() * 1000.0,
    };

    Ok(Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    )))
}

// ============================================
// Stats
// ============================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();
    let telemetry = state.telemetry.get_stats();
    let cache_stats = state.cache.stats();

    info!(
        "📊 Cache Stats: {} entries, {:.1}% hit rate ({} hits / {} misses)",
        cache_stats.entries, cache_stats.hit_rate, cache_stats.hits, cache_stats.misses
    );

    let data = StatsData {
        telemetry,
        cache_entries: cache_stats.entries,
        cache_hit_rate: cache_stats.hit_rate,
        uptime_seconds: state.uptime_seconds(),
        api_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}
