//! Builds the caller-facing credential bundle from an outcome

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};

use super::model::{CredentialBundle, ProvisioningOutcome, ProvisioningRequest, TARGET_ENVIRONMENT};

/// Value of a Basic Authorization header for `user:key`
pub fn basic_auth(identifier: &str, key: &str) -> String {
    STANDARD.encode(format!("{}:{}", identifier, key))
}

#[derive(Debug, Clone)]
pub struct CredentialAssembler {
    /// Gateway base URL, no trailing slash
    gateway_base: String,
}

impl CredentialAssembler {
    pub fn new(gateway_base: impl Into<String>) -> Self {
        Self {
            gateway_base: gateway_base.into(),
        }
    }

    /// Collection token endpoint used in the test command
    pub fn token_url(&self) -> String {
        format!("{}/collection/token/", self.gateway_base)
    }

    pub fn assemble(
        &self,
        outcome: &ProvisioningOutcome,
        request: &ProvisioningRequest,
    ) -> CredentialBundle {
        self.assemble_at(outcome, request, Utc::now())
    }

    pub fn assemble_at(
        &self,
        outcome: &ProvisioningOutcome,
        request: &ProvisioningRequest,
        now: DateTime<Utc>,
    ) -> CredentialBundle {
        let identifier = outcome.identifier();
        let key = outcome.key();
        let base64_auth = basic_auth(identifier, key);

        // Locally generated pairs would be rejected by the gateway
        let test_command = match outcome {
            ProvisioningOutcome::Registered { .. } => {
                Some(self.test_command(&base64_auth, &request.subscription_key))
            }
            ProvisioningOutcome::LocallyGenerated { .. } => None,
        };

        CredentialBundle {
            api_key: key.to_string(),
            api_user: identifier.to_string(),
            user_id: identifier.to_string(),
            callback_host: request.callback_host.clone(),
            date_time: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            target_environment: TARGET_ENVIRONMENT.to_string(),
            base64_auth,
            test_command,
        }
    }

    fn test_command(&self, base64_auth: &str, subscription_key: &str) -> String {
        format!(
            "\nTest your credentials with this curl command:\n\n\
             curl --location --request POST '{}' \\\n\
             --header 'Authorization: Basic {}' \\\n\
             --header 'Ocp-Apim-Subscription-Key: {}' \\\n\
             --header 'Content-Type: application/json'\n",
            self.token_url(),
            base64_auth,
            subscription_key
        )
    }
}
