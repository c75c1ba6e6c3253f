//! Health probe routes for the orchestrator
//!
//! Mounted next to the public and internal API so container platforms can
//! poll `/health`, `/ready`, `/live` and `/metrics` on the same port.

use crate::error::current_timestamp;
use crate::observability::metrics::metrics;
use crate::orchestrator::{Orchestrator, QueueStats};
use serde::Serialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::Filter;

#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: Option<String>,
    pub last_check: u64,
}

impl HealthCheck {
    fn healthy(message: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            message: Some(message.into()),
            last_check: current_timestamp(),
        }
    }

    fn unhealthy(status: &str, message: impl Into<String>) -> Self {
        Self {
            status: status.to_string(),
            message: Some(message.into()),
            last_check: current_timestamp(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: u64,
    pub uptime_seconds: u64,
    pub expressions: usize,
    pub checks: HashMap<String, HealthCheck>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Serialize)]
struct ReadinessResponse {
    ready: bool,
    queued: usize,
    capacity: usize,
    timestamp: u64,
}

#[derive(Debug, Serialize)]
struct LivenessResponse {
    alive: bool,
    timestamp: u64,
}

fn check_queue(stats: QueueStats) -> HealthCheck {
    if stats.is_saturated() {
        HealthCheck::unhealthy(
            "saturated",
            format!("Task queue full ({}/{})", stats.queued, stats.capacity),
        )
    } else {
        HealthCheck::healthy(format!(
            "{}/{} tasks queued",
            stats.queued, stats.capacity
        ))
    }
}

/// Assemble the overall health report
pub fn health_status(orchestrator: &Orchestrator) -> HealthStatus {
    let mut checks = HashMap::new();
    checks.insert(
        "task_queue".to_string(),
        check_queue(orchestrator.queue_stats()),
    );

    let status = if checks.values().all(HealthCheck::is_healthy) {
        "healthy"
    } else {
        "degraded"
    };

    HealthStatus {
        status: status.to_string(),
        timestamp: current_timestamp(),
        uptime_seconds: metrics().get_metrics().uptime_seconds,
        expressions: orchestrator.expression_count(),
        checks,
    }
}

fn with_orchestrator(
    orchestrator: Arc<Orchestrator>,
) -> impl Filter<Extract = (Arc<Orchestrator>,), Error = Infallible> + Clone {
    warp::any().map(move || orchestrator.clone())
}

/// `/health`, `/ready`, `/live` and `/metrics`
pub fn health_routes(
    orchestrator: Arc<Orchestrator>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    // GET /health - 503 while degraded
    let health_route = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_orchestrator(orchestrator.clone()))
        .and_then(|orchestrator: Arc<Orchestrator>| async move {
            let status = health_status(&orchestrator);
            let code = if status.is_healthy() {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            Ok::<_, Infallible>(warp::reply::with_status(warp::reply::json(&status), code))
        });

    // GET /ready - accepting submissions
    let ready_route = warp::path("ready")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_orchestrator(orchestrator))
        .and_then(|orchestrator: Arc<Orchestrator>| async move {
            let stats = orchestrator.queue_stats();
            let response = ReadinessResponse {
                ready: !stats.is_saturated(),
                queued: stats.queued,
                capacity: stats.capacity,
                timestamp: current_timestamp(),
            };
            let code = if response.ready {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            Ok::<_, Infallible>(warp::reply::with_status(warp::reply::json(&response), code))
        });

    // GET /live
    let live_route = warp::path("live")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| {
            warp::reply::json(&LivenessResponse {
                alive: true,
                timestamp: current_timestamp(),
            })
        });

    // GET /metrics
    let metrics_route = warp::path("metrics")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::json(&metrics().get_metrics()));

    health_route.or(ready_route).or(live_route).or(metrics_route)
}
