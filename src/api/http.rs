//! Implements the `BudgetApi` trait against the REST backend.

use crate::api::{BudgetApi, SaveError};
use crate::budget::EnvelopePayload;
use crate::model::{BudgetPlan, Envelope, NewEnvelope, PlanId, PlanStatus};
use crate::{utils, Config, Result};
use anyhow::{bail, Context};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

/// Talks to the backend at the configured `api_url`, authenticating with a bearer token when a
/// token file is present.
pub struct HttpBudgetApi {
    base: Url,
    client: reqwest::Client,
    token: Option<String>,
}

impl HttpBudgetApi {
    pub async fn new(config: &Config) -> Result<Self> {
        let token_path = config.token_path();
        let token = if token_path.is_file() {
            let token = utils::read(&token_path).await?;
            Some(token.trim().to_string())
        } else {
            debug!(
                "No token file at {}, sending unauthenticated requests",
                token_path.display()
            );
            None
        };
        Ok(Self::with_base(config.api_url().clone(), token))
    }

    /// Creates a client for `base`, which should end with a `/` so that endpoint paths are appended
    /// to it.
    pub fn with_base(base: Url, token: Option<String>) -> Self {
        Self {
            base,
            client: reqwest::Client::new(),
            token,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("Unable to build a URL for '{path}' from {}", self.base))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        trace!("{method} {url}");
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait::async_trait]
impl BudgetApi for HttpBudgetApi {
    async fn get_plan(&self, plan_id: &PlanId) -> Result<BudgetPlan> {
        let url = self.endpoint(&format!("budget-plans/{plan_id}/"))?;
        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch budget plan {plan_id}"))?;
        read_json(response, "fetching the budget plan").await
    }

    async fn list_envelopes(&self, plan_id: &PlanId) -> Result<Vec<Envelope>> {
        let url = self.endpoint(&format!("budget-plans/{plan_id}/envelopes/"))?;
        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch the envelopes of budget plan {plan_id}"))?;
        read_json(response, "fetching envelopes").await
    }

    async fn create_envelope(&self, plan_id: &PlanId, envelope: &NewEnvelope) -> Result<Envelope> {
        let url = self.endpoint(&format!("budget-plans/{plan_id}/envelopes/"))?;
        let response = self
            .request(Method::POST, url)
            .json(envelope)
            .send()
            .await
            .with_context(|| format!("Failed to create an envelope in budget plan {plan_id}"))?;
        read_json(response, "creating the envelope").await
    }

    async fn replace_envelope_months(
        &self,
        payload: &EnvelopePayload,
    ) -> std::result::Result<(), SaveError> {
        let envelope_id = payload.envelope_id();
        let url = self
            .endpoint(&format!("budget-envelopes/{envelope_id}/months/"))
            .map_err(|e| SaveError::transport(format!("{e:#}")))?;
        let response = self
            .request(Method::PUT, url)
            .json(payload)
            .send()
            .await
            .map_err(SaveError::transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        Err(classify(status, &body))
    }

    async fn set_plan_status(&self, plan_id: &PlanId, status: PlanStatus) -> Result<BudgetPlan> {
        let action = match status {
            PlanStatus::Approved => "approve",
            PlanStatus::Locked => "lock",
            PlanStatus::Draft => bail!("A budget plan cannot be moved back to draft"),
        };
        let url = self.endpoint(&format!("budget-plans/{plan_id}/{action}/"))?;
        let response = self
            .request(Method::POST, url)
            .send()
            .await
            .with_context(|| format!("Failed to {action} budget plan {plan_id}"))?;
        read_json(response, "changing the plan status").await
    }
}

/// Parses a successful JSON response or turns a failed one into an error naming `what` was
/// being done.
async fn read_json<T>(response: Response, what: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        bail!("The backend failed {what} with status {status}: {}", detail(&body));
    }
    response
        .json()
        .await
        .with_context(|| format!("Failed to parse the backend response when {what}"))
}

/// Maps a refused save to the `SaveError` the user sees.
fn classify(status: StatusCode, body: &str) -> SaveError {
    let message = detail(body);
    match status {
        StatusCode::CONFLICT => SaveError::Conflict(message),
        StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => SaveError::Forbidden(message),
        other => SaveError::Rejected {
            status: other.as_u16(),
            message,
        },
    }
}

/// Error bodies usually look like `{"detail": "..."}`; otherwise the raw body is used.
fn detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
