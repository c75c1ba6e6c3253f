//! reqwest client for the orchestrator's internal endpoints

use crate::config::AgentSection;
use crate::error::{AgentError, AgentResult};
use crate::protocol::routes::{endpoint_url, INTERNAL_RESULT_PATH, INTERNAL_TASK_PATH};
use crate::protocol::{Task, TaskResult};
use crate::transport::OrchestratorClient;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpOrchestratorClient {
    client: Client,
    task_url: Url,
    result_url: Url,
}

impl HttpOrchestratorClient {
    pub fn new(base_url: Url, timeout: Duration) -> AgentResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            task_url: endpoint_url(&base_url, INTERNAL_TASK_PATH),
            result_url: endpoint_url(&base_url, INTERNAL_RESULT_PATH),
        })
    }

    pub fn from_config(config: &AgentSection) -> AgentResult<Self> {
        Self::new(config.orchestrator_url()?, config.request_timeout())
    }

    pub fn task_url(&self) -> &Url {
        &self.task_url
    }

    pub fn result_url(&self) -> &Url {
        &self.result_url
    }
}

#[async_trait]
impl OrchestratorClient for HttpOrchestratorClient {
    async fn fetch_task(&self) -> AgentResult<Option<Task>> {
        let response = self
            .client
            .get(self.task_url.clone())
            .send()
            .await
            .map_err(|e| {
                debug!(
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "Task fetch failed"
                );
                AgentError::from(e)
            })?;

        match response.status() {
            StatusCode::OK => Ok(Some(response.json::<Task>().await?)),
            StatusCode::NOT_FOUND => Ok(None),
            status => {
                warn!(status = status.as_u16(), "Unexpected status fetching task");
                Err(AgentError::unexpected_status(status.as_u16()))
            }
        }
    }

    async fn send_result(&self, result: &TaskResult) -> AgentResult<()> {
        let response = self
            .client
            .post(self.result_url.clone())
            .json(result)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(
                expression_id = %result.id,
                status = status.as_u16(),
                "Orchestrator did not accept result"
            );
            return Err(AgentError::unexpected_status(status.as_u16()));
        }

        Ok(())
    }
}
