//! Health Check Handlers
//!
//! Liveness and readiness probes. Backends that are not configured (in-memory
//! store, in-memory analytics) are reported healthy with a note.
//!
//! # Endpoints
//! - `GET /health` - Basic health check
//! - `GET /health/live` - Liveness probe (is the server running?)
//! - `GET /health/ready` - Readiness probe (can the server accept traffic?)

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::time::Instant;

use crate::infrastructure::{cache, database, metrics};
use crate::startup::AppState;

/// Server start time for uptime calculation
static SERVER_START: Lazy<Instant> = Lazy::new(Instant::now);
static SERVER_START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Initialize the server start time (call during startup)
pub fn init_server_start() {
    Lazy::force(&SERVER_START);
    Lazy::force(&SERVER_START_TIME);
}

/// Basic health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Detailed health check response
#[derive(Debug, Serialize)]
pub struct DetailedHealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub checks: HealthChecks,
}

/// Individual service health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: ServiceHealth,
    pub redis: ServiceHealth,
}

/// Health status for individual services
#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ServiceHealth {
    fn not_configured(what: &str) -> Self {
        Self {
            status: HealthStatus::Healthy,
            latency_ms: None,
            message: Some(format!("{} not configured (in-memory backend)", what)),
        }
    }

    fn from_probe<E: std::fmt::Display>(
        result: Result<(), E>,
        start: Instant,
        degraded_after_ms: u64,
        what: &str,
    ) -> Self {
        match result {
            Ok(()) => {
                let latency = start.elapsed().as_millis() as u64;
                Self {
                    status: if latency < degraded_after_ms {
                        HealthStatus::Healthy
                    } else {
                        HealthStatus::Degraded
                    },
                    latency_ms: Some(latency),
                    message: None,
                }
            }
            Err(e) => Self {
                status: HealthStatus::Unhealthy,
                latency_ms: None,
                message: Some(format!("{} connection failed: {}", what, e)),
            },
        }
    }
}

/// Overall health status
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Simple liveness response
#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

/// Basic health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Liveness probe - checks if the server is running
/// Always 200 while the process serves requests
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "alive" })
}

/// Readiness probe - checks if the server can accept traffic
/// Returns 200 if ready, 503 if dependencies are unavailable
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = SERVER_START.elapsed().as_secs();
    let started_at = SERVER_START_TIME.to_rfc3339();

    // Check database health
    let db_health = check_database(&state).await;

    // Check Redis health
    let redis_health = check_redis(&state).await;

    // Determine overall status
    let overall_status = determine_overall_status(&db_health, &redis_health);

    let response = DetailedHealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: uptime,
        started_at,
        checks: HealthChecks {
            database: db_health,
            redis: redis_health,
        },
    };

    // Return 503 if unhealthy
    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Check database connectivity and latency
async fn check_database(state: &AppState) -> ServiceHealth {
    let Some(pool) = &state.db else {
        return ServiceHealth::not_configured("Database");
    };
    metrics::update_db_pool_stats(pool.num_idle() as u32, pool.size());

    let start = Instant::now();
    ServiceHealth::from_probe(database::ping(pool).await, start, 100, "Database")
}

/// Check Redis connectivity and latency
async fn check_redis(state: &AppState) -> ServiceHealth {
    let Some(conn) = &state.redis else {
        return ServiceHealth::not_configured("Redis");
    };

    let start = Instant::now();
    ServiceHealth::from_probe(cache::ping(conn).await, start, 50, "Redis")
}

/// Determine overall health based on individual checks
fn determine_overall_status(db: &ServiceHealth, redis: &ServiceHealth) -> HealthStatus {
    // If any critical service is unhealthy, overall is unhealthy
    if db.status == HealthStatus::Unhealthy {
        return HealthStatus::Unhealthy;
    }

    // Analytics counters are best-effort, so redis never fails readiness
    if db.status == HealthStatus::Degraded
        || redis.status == HealthStatus::Unhealthy
        || redis.status == HealthStatus::Degraded
    {
        return HealthStatus::Degraded;
    }

    HealthStatus::Healthy
}
