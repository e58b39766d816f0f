//! `generate_credentials`: validation, orchestration and assembly in one call

use std::sync::Arc;

use super::assembler::CredentialAssembler;
use super::error::ValidationError;
use super::model::{CredentialBundle, CredentialRequest};
use super::observer::ProvisioningObserver;
use super::orchestrator::ProvisioningOrchestrator;
use super::registrar::CredentialRegistrar;

/// Bundle plus the status message chosen by the outcome
#[derive(Debug, Clone)]
pub struct ProvisionedCredentials {
    pub message: &'static str,
    pub registered: bool,
    pub bundle: CredentialBundle,
}

pub struct ProvisioningService {
    orchestrator: ProvisioningOrchestrator,
    assembler: CredentialAssembler,
    default_callback_host: String,
}

impl ProvisioningService {
    pub fn new(
        registrar: Arc<dyn CredentialRegistrar>,
        observer: Arc<dyn ProvisioningObserver>,
        assembler: CredentialAssembler,
        default_callback_host: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator: ProvisioningOrchestrator::new(registrar, observer),
            assembler,
            default_callback_host: default_callback_host.into(),
        }
    }

    /// Validate the request and provision a credential pair.
    ///
    /// Only validation can fail; gateway problems turn into a locally
    /// generated pair.
    pub async fn generate_credentials(
        &self,
        request: CredentialRequest,
    ) -> Result<ProvisionedCredentials, ValidationError> {
        let request = request.validate(&self.default_callback_host)?;
        let outcome = self.orchestrator.provision(&request).await;
        let bundle = self.assembler.assemble(&outcome, &request);

        Ok(ProvisionedCredentials {
            message: outcome.message(),
            registered: outcome.is_registered(),
            bundle,
        })
    }
}
