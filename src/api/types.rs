//! API Request/Response Types

use serde::{Deserialize, Serialize};

use crate::models::errors::AppError;
use crate::models::types::{AnalysisFilters, AnalysisResult};
use crate::telemetry::TelemetryStats;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            code: "RATE_LIMITED".to_string(),
            message: format!("Rate limit exceeded. Retry after {} seconds", retry_after),
            details: Some(format!("retry_after: {}", retry_after)),
        }
    }

    /// Surface an internal error with its monitoring code
    pub fn from_app_error(error: &AppError) -> Self {
        Self {
            code: error.code_str().to_string(),
            message: error.message.clone(),
            details: None,
        }
    }
}

// ============================================
// Flow Analysis
// ============================================

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Base58 account address to analyze
    pub address: String,
    /// Signatures to fetch; server default applies when omitted
    #[serde(default)]
    pub limit: Option<usize>,
    /// Pre-analysis filters; results with filters are never cached
    #[serde(default)]
    pub filters: AnalysisFilters,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeData {
    /// Whether this result came from the analysis cache
    pub cached: bool,
    pub report: AnalysisResult,
}

// ============================================
// Batch Analysis
// ============================================

#[derive(Debug, Deserialize)]
pub struct BatchAnalyzeRequest {
    pub addresses: Vec<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    /// Max concurrent analyses (default: 5, max: 10)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    5
}

#[derive(Debug, Serialize)]
pub struct BatchAnalyzeData {
    pub total_requested: usize,
    pub total_processed: usize,
    pub total_high_risk: usize,
    pub results: Vec<BatchAddressResult>,
    pub processing_time_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct BatchAddressResult {
    pub address: String,
    pub status: String, // "success" | "error"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: f64,
}

// ============================================
// Stats / Health
// ============================================

#[derive(Debug, Serialize)]
pub struct StatsData {
    #[serde(flatten)]
    pub telemetry: TelemetryStats,
    pub cache_entries: usize,
    pub cache_hit_rate: f64,
    pub uptime_seconds: u64,
    pub api_version: String,
}

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
