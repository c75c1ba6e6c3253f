//! HTTP route paths shared by the orchestrator server and the agent client

use url::Url;

pub const CALCULATE_PATH: &str = "/api/v1/calculate";
pub const EXPRESSIONS_PATH: &str = "/api/v1/expressions";
pub const INTERNAL_TASK_PATH: &str = "/internal/task";
pub const INTERNAL_RESULT_PATH: &str = "/internal/result";

/// Join a route path onto the orchestrator base URL.
///
/// Any path already present on the base is kept as a prefix, with or without
/// a trailing slash.
pub fn endpoint_url(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let prefix = base.path().trim_end_matches('/');
    url.set_path(&format!("{prefix}/{}", path.trim_start_matches('/')));
    url
}

/// URL of a single expression snapshot
pub fn expression_url(base: &Url, id: &str) -> Url {
    endpoint_url(base, &format!("{EXPRESSIONS_PATH}/{id}"))
}
