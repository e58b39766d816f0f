//! Remote-first provisioning with local fallback
//!
//! ```text
//! Start --identity ok--> HaveIdentity --key ok--> Registered
//! Start --identity fails------------------------> LocallyGenerated
//! HaveIdentity --key fails----------------------> LocallyGenerated
//! ```
//!
//! One attempt per step. A failure at either step discards everything the
//! gateway returned and generates both identifier and key locally.

use std::sync::Arc;

use super::error::{RemoteFailure, RemoteStep};
use super::fallback::LocalFallbackGenerator;
use super::model::{ProvisioningOutcome, ProvisioningRequest};
use super::observer::{ProvisioningEvent, ProvisioningObserver};
use super::registrar::CredentialRegistrar;

pub struct ProvisioningOrchestrator {
    registrar: Arc<dyn CredentialRegistrar>,
    fallback: LocalFallbackGenerator,
    observer: Arc<dyn ProvisioningObserver>,
}

impl ProvisioningOrchestrator {
    pub fn new(
        registrar: Arc<dyn CredentialRegistrar>,
        observer: Arc<dyn ProvisioningObserver>,
    ) -> Self {
        Self {
            registrar,
            fallback: LocalFallbackGenerator::new(),
            observer,
        }
    }

    /// Run the workflow for one request. Always yields a credential pair.
    pub async fn provision(&self, request: &ProvisioningRequest) -> ProvisioningOutcome {
        match self.try_remote(request).await {
            Ok((identifier, key)) => ProvisioningOutcome::Registered { identifier, key },
            Err((step, failure)) => {
                self.observer.on_event(&ProvisioningEvent::RemoteStepFailed {
                    step,
                    cause: failure.to_string(),
                });
                self.generate_locally()
            }
        }
    }

    async fn try_remote(
        &self,
        request: &ProvisioningRequest,
    ) -> Result<(String, String), (RemoteStep, RemoteFailure)> {
        self.observer.on_event(&ProvisioningEvent::RemoteAttemptStarted {
            callback_host: request.callback_host.clone(),
        });

        let identifier = self
            .registrar
            .register_identity(&request.subscription_key, &request.callback_host)
            .await
            .map_err(|e| (RemoteStep::RegisterIdentity, e))?;

        self.observer.on_event(&ProvisioningEvent::IdentityRegistered {
            identifier: identifier.clone(),
        });

        let key = self
            .registrar
            .register_key(&request.subscription_key, &identifier)
            .await
            .map_err(|e| (RemoteStep::RegisterKey, e))?;

        self.observer.on_event(&ProvisioningEvent::KeyRegistered {
            identifier: identifier.clone(),
        });

        Ok((identifier, key))
    }

    fn generate_locally(&self) -> ProvisioningOutcome {
        let (identifier, key) = self.fallback.generate();
        self.observer.on_event(&ProvisioningEvent::FallbackGenerated {
            identifier: identifier.clone(),
        });
        ProvisioningOutcome::LocallyGenerated { identifier, key }
    }
}
