use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

use super::dto::GenerationRequest;

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("generator unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generator answered {status}: {body}")]
    Status { status: u16, body: String },
}

/// External service that builds a full meal plan and posts it back later.
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    async fn request_plan(&self, req: &GenerationRequest) -> Result<(), GeneratorError>;
}

#[derive(Clone)]
pub struct HttpPlanGenerator {
    client: Client,
    endpoint: String,
}

impl HttpPlanGenerator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl PlanGenerator for HttpPlanGenerator {
    async fn request_plan(&self, req: &GenerationRequest) -> Result<(), GeneratorError> {
        let res = self.client.post(&self.endpoint).json(req).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            error!(%status, endpoint = %self.endpoint, "generator rejected request");
            return Err(GeneratorError::Status {
                status: status.as_u16(),
                body,
            });
        }
        debug!(user_diet = req.user_diet, %status, "generator accepted request");
        Ok(())
    }
}

/// Records requests instead of sending them.
#[cfg(test)]
#[derive(Default)]
pub struct FakeGenerator {
    pub sent: tokio::sync::Mutex<Vec<GenerationRequest>>,
    fail_status: Option<u16>,
}

#[cfg(test)]
impl FakeGenerator {
    pub fn failing(status: u16) -> Self {
        Self {
            sent: Default::default(),
            fail_status: Some(status),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl PlanGenerator for FakeGenerator {
    async fn request_plan(&self, req: &GenerationRequest) -> Result<(), GeneratorError> {
        if let Some(status) = self.fail_status {
            return Err(GeneratorError::Status {
                status,
                body: "fake failure".into(),
            });
        }
        self.sent.lock().await.push(req.clone());
        Ok(())
    }
}
