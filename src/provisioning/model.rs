//! Request, outcome and response types for credential provisioning

use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Target environment reported for every bundle
pub const TARGET_ENVIRONMENT: &str = "sandbox";

/// Incoming body of `POST /api/generate`
///
/// The subscription key travels as `primaryKey` (Ocp-Apim-Subscription-Key
/// in gateway terms); `subscriptionKey` is accepted as an alias.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialRequest {
    #[serde(default, rename = "primaryKey", alias = "subscriptionKey")]
    pub subscription_key: Option<String>,

    #[serde(default, rename = "secondaryKey")]
    pub secondary_key: Option<String>,

    #[serde(default, rename = "callbackHost")]
    pub callback_host: Option<String>,
}

impl CredentialRequest {
    /// Check required fields and apply the callback host default
    pub fn validate(self, default_callback_host: &str) -> Result<ProvisioningRequest, ValidationError> {
        let subscription_key = match self.subscription_key {
            Some(key) if !key.is_empty() => key,
            _ => return Err(ValidationError::MissingSubscriptionKey),
        };

        let callback_host = match self.callback_host {
            Some(host) if !host.is_empty() => host,
            _ => default_callback_host.to_string(),
        };

        Ok(ProvisioningRequest {
            subscription_key,
            callback_host,
            secondary_key: self.secondary_key,
        })
    }
}

/// A validated request, ready for provisioning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningRequest {
    pub subscription_key: String,
    pub callback_host: String,
    /// Accepted for compatibility; provisioning does not read it
    pub secondary_key: Option<String>,
}

/// Result of one provisioning run. The variant decides the status message
/// and whether a test command is emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningOutcome {
    /// Both gateway steps returned 201
    Registered { identifier: String, key: String },
    /// Gateway path abandoned; both values generated here
    LocallyGenerated { identifier: String, key: String },
}

impl ProvisioningOutcome {
    pub fn identifier(&self) -> &str {
        match self {
            ProvisioningOutcome::Registered { identifier, .. }
            | ProvisioningOutcome::LocallyGenerated { identifier, .. } => identifier,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            ProvisioningOutcome::Registered { key, .. }
            | ProvisioningOutcome::LocallyGenerated { key, .. } => key,
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, ProvisioningOutcome::Registered { .. })
    }

    /// Caller-facing status message
    pub fn message(&self) -> &'static str {
        match self {
            ProvisioningOutcome::Registered { .. } => {
                "API User and API Key successfully created and registered with MTN MoMo"
            }
            ProvisioningOutcome::LocallyGenerated { .. } => {
                "API User and API Key generated locally (not registered with MTN MoMo)"
            }
        }
    }
}

/// Credential bundle returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialBundle {
    pub api_key: String,
    pub api_user: String,
    /// Same value as `api_user` (the X-Reference-Id)
    pub user_id: String,
    pub callback_host: String,
    pub date_time: String,
    pub target_environment: String,
    pub base64_auth: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_command: Option<String>,
}

/// Standard response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}
