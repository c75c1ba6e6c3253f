//! Observability: structured logging, metrics collection and health probes

pub mod health;
pub mod logging;
pub mod metrics;

pub use health::{health_routes, health_status, HealthCheck, HealthStatus};
pub use logging::{init_default_logging, init_logging, parse_level, LogFormat};
pub use metrics::{metrics, MetricsCollector, MetricsSnapshot};

pub use logging::{expression_span, task_span};
