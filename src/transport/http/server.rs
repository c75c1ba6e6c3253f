//! warp server exposing the orchestrator
//!
//! Public API under `/api/v1`, the agent-facing `/internal` endpoints and the
//! health probes, all served from one port.

use crate::config::{ConfigError, OrchestratorSection};
use crate::error::{current_timestamp, OrchestratorError};
use crate::observability::health::health_routes;
use crate::orchestrator::Orchestrator;
use crate::protocol::{
    CalculateRequest, CalculateResponse, ErrorResponse, ExpressionList, TaskResult,
};
use crate::expression_span;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

/// Largest request body accepted on any route
const MAX_BODY_BYTES: u64 = 16 * 1024;

fn with_orchestrator(
    orchestrator: Arc<Orchestrator>,
) -> impl Filter<Extract = (Arc<Orchestrator>,), Error = Infallible> + Clone {
    warp::any().map(move || orchestrator.clone())
}

fn error_reply(err: &OrchestratorError) -> Response {
    warp::reply::with_status(warp::reply::json(&err.to_error_response()), err.status_code())
        .into_response()
}

async fn handle_calculate(
    request: CalculateRequest,
    orchestrator: Arc<Orchestrator>,
) -> Result<Response, Infallible> {
    match orchestrator.submit(&request.expression) {
        Ok(id) => {
            let _span = expression_span!(expression_id = %id).entered();
            debug!("Submission accepted");
            Ok(warp::reply::with_status(
                warp::reply::json(&CalculateResponse { id }),
                StatusCode::CREATED,
            )
            .into_response())
        }
        Err(e) => Ok(error_reply(&e)),
    }
}

async fn handle_list(orchestrator: Arc<Orchestrator>) -> Result<Response, Infallible> {
    let list = ExpressionList {
        expressions: orchestrator.list_expressions(),
    };
    Ok(warp::reply::json(&list).into_response())
}

async fn handle_get(id: String, orchestrator: Arc<Orchestrator>) -> Result<Response, Infallible> {
    // An identifier that does not parse cannot name a stored expression
    let lookup = Uuid::parse_str(&id)
        .map_err(|_| OrchestratorError::not_found(id.clone()))
        .and_then(|id| orchestrator.get_expression(&id));

    match lookup {
        Ok(expression) => Ok(warp::reply::json(&expression).into_response()),
        Err(e) => Ok(error_reply(&e)),
    }
}

async fn handle_fetch_task(orchestrator: Arc<Orchestrator>) -> Result<Response, Infallible> {
    match orchestrator.fetch_task() {
        Some(task) => Ok(warp::reply::json(&task).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

async fn handle_result(
    result: TaskResult,
    orchestrator: Arc<Orchestrator>,
) -> Result<Response, Infallible> {
    let _span = expression_span!(expression_id = %result.id).entered();
    let outcome = orchestrator.report_result(result);
    debug!(?outcome, "Result acknowledged");
    Ok(StatusCode::OK.into_response())
}

/// Public and internal API routes, without rejection handling
pub fn api_routes(
    orchestrator: Arc<Orchestrator>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let calculate = warp::path!("api" / "v1" / "calculate")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_orchestrator(orchestrator.clone()))
        .and_then(handle_calculate);

    let list = warp::path!("api" / "v1" / "expressions")
        .and(warp::get())
        .and(with_orchestrator(orchestrator.clone()))
        .and_then(handle_list);

    let get = warp::path!("api" / "v1" / "expressions" / String)
        .and(warp::get())
        .and(with_orchestrator(orchestrator.clone()))
        .and_then(handle_get);

    let fetch_task = warp::path!("internal" / "task")
        .and(warp::get())
        .and(with_orchestrator(orchestrator.clone()))
        .and_then(handle_fetch_task);

    let result = warp::path!("internal" / "result")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_orchestrator(orchestrator))
        .and_then(handle_result);

    calculate
        .or(list)
        .unify()
        .or(get)
        .unify()
        .or(fetch_task)
        .unify()
        .or(result)
        .unify()
}

/// Map unmatched requests onto the JSON error body
async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, code, message) = if let Some(e) = err.find::<warp::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, "invalid_body", e.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            "Request body too large".to_string(),
        )
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (
            StatusCode::LENGTH_REQUIRED,
            "length_required",
            "Content-Length header required".to_string(),
        )
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::BAD_REQUEST,
            "invalid_body",
            "Expected a JSON body".to_string(),
        )
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not_found", "Not found".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "method_not_allowed",
            "Method not allowed".to_string(),
        )
    } else {
        error!(rejection = ?err, "Unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error".to_string(),
        )
    };

    let body = ErrorResponse {
        error: message,
        code: code.to_string(),
        timestamp: current_timestamp(),
    };
    Ok(warp::reply::with_status(warp::reply::json(&body), status).into_response())
}

/// Every route the orchestrator serves
pub fn routes(
    orchestrator: Arc<Orchestrator>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    api_routes(orchestrator.clone())
        .or(health_routes(orchestrator))
        .recover(handle_rejection)
        .with(warp::trace::request())
}

/// HTTP front end of an [`Orchestrator`]
pub struct OrchestratorServer {
    orchestrator: Arc<Orchestrator>,
    addr: SocketAddr,
}

impl OrchestratorServer {
    pub fn new(orchestrator: Arc<Orchestrator>, addr: SocketAddr) -> Self {
        Self { orchestrator, addr }
    }

    pub fn from_config(
        config: &OrchestratorSection,
        orchestrator: Arc<Orchestrator>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(orchestrator, config.socket_addr()?))
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    /// Bind and return the bound address plus the future that drives the
    /// server until `shutdown` resolves.
    pub fn bind<S>(
        self,
        shutdown: S,
    ) -> Result<(SocketAddr, impl Future<Output = ()>), OrchestratorError>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let (addr, server) = warp::serve(routes(self.orchestrator))
            .try_bind_with_graceful_shutdown(self.addr, shutdown)
            .map_err(|e| OrchestratorError::internal(format!("failed to bind {}: {e}", self.addr)))?;

        info!(%addr, "Orchestrator listening");
        Ok((addr, server))
    }

    /// Serve until `shutdown` resolves
    pub async fn run<S>(self, shutdown: S) -> Result<(), OrchestratorError>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let (_, server) = self.bind(shutdown)?;
        server.await;
        info!("Orchestrator stopped");
        Ok(())
    }
}
