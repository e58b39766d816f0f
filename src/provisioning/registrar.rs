//! Remote registration against the MoMo gateway
//!
//! Two sequential calls, each sent exactly once:
//!
//! 1. `POST /v1_0/apiuser` with `X-Reference-Id: <uuid>` creates the API user
//! 2. `POST /v1_0/apiuser/{uuid}/apikey` returns `{"apiKey": "..."}`
//!
//! Both must answer `201 Created`. Anything else is a [`RemoteFailure`].

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use super::error::RemoteFailure;

/// Header carrying the caller's subscription key
pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Header carrying the reference id of the API user being created
pub const REFERENCE_ID_HEADER: &str = "X-Reference-Id";

/// Gateway operations needed to provision a credential pair
#[async_trait::async_trait]
pub trait CredentialRegistrar: Send + Sync {
    /// Create an API user and return its identifier
    async fn register_identity(
        &self,
        subscription_key: &str,
        callback_host: &str,
    ) -> Result<String, RemoteFailure>;

    /// Create an API key for a previously registered identifier
    async fn register_key(
        &self,
        subscription_key: &str,
        identifier: &str,
    ) -> Result<String, RemoteFailure>;
}

/// Configuration for the remote registrar
#[derive(Debug, Clone)]
pub struct RegistrarConfig {
    /// Gateway base URL, no trailing slash
    pub base_url: String,
    /// Timeout applied to every gateway call
    pub request_timeout: Duration,
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            base_url: crate::config::DEFAULT_GATEWAY_URL.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Body of the API user creation call
#[derive(Debug, Serialize)]
struct CreateUserBody<'a> {
    #[serde(rename = "providerCallbackHost")]
    provider_callback_host: &'a str,
}

/// Body returned by the API key creation call
#[derive(Debug, Deserialize)]
struct CreateKeyResponse {
    #[serde(rename = "apiKey")]
    api_key: Option<String>,
}

/// reqwest-backed [`CredentialRegistrar`]
pub struct RemoteRegistrar {
    config: RegistrarConfig,
    http_client: reqwest::Client,
}

impl RemoteRegistrar {
    /// Build a registrar; fails only if the TLS backend cannot initialise
    pub fn new(config: RegistrarConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("momo-keygen/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &RegistrarConfig {
        &self.config
    }

    fn user_url(&self) -> String {
        format!("{}/v1_0/apiuser", self.config.base_url)
    }

    fn key_url(&self, identifier: &str) -> String {
        format!("{}/v1_0/apiuser/{}/apikey", self.config.base_url, identifier)
    }
}

/// Read whatever body came back for diagnostics
async fn unexpected_status(response: reqwest::Response) -> RemoteFailure {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    RemoteFailure::UnexpectedStatus { status, body }
}

#[async_trait::async_trait]
impl CredentialRegistrar for RemoteRegistrar {
    async fn register_identity(
        &self,
        subscription_key: &str,
        callback_host: &str,
    ) -> Result<String, RemoteFailure> {
        let identifier = Uuid::new_v4().to_string();
        let url = self.user_url();
        debug!(reference_id = %identifier, url = %url, callback_host = %callback_host, "Creating API user");

        let response = self
            .http_client
            .post(&url)
            .header(SUBSCRIPTION_KEY_HEADER, subscription_key)
            .header(REFERENCE_ID_HEADER, &identifier)
            .json(&CreateUserBody {
                provider_callback_host: callback_host,
            })
            .send()
            .await
            .map_err(RemoteFailure::from_reqwest)?;

        debug!(status = %response.status(), "API user response received");
        if response.status() != StatusCode::CREATED {
            return Err(unexpected_status(response).await);
        }

        Ok(identifier)
    }

    async fn register_key(
        &self,
        subscription_key: &str,
        identifier: &str,
    ) -> Result<String, RemoteFailure> {
        let url = self.key_url(identifier);
        debug!(reference_id = %identifier, url = %url, "Creating API key");

        let response = self
            .http_client
            .post(&url)
            .header(SUBSCRIPTION_KEY_HEADER, subscription_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(RemoteFailure::from_reqwest)?;

        debug!(status = %response.status(), "API key response received");
        if response.status() != StatusCode::CREATED {
            return Err(unexpected_status(response).await);
        }

        let body: CreateKeyResponse = response
            .json()
            .await
            .map_err(|e| RemoteFailure::MalformedBody(e.to_string()))?;

        match body.api_key {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(RemoteFailure::MalformedBody(
                "missing apiKey field".to_string(),
            )),
        }
    }
}
