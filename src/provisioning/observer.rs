//! Progress reporting for the provisioning workflow
//!
//! The orchestrator never logs directly; it emits [`ProvisioningEvent`]s to
//! an injected [`ProvisioningObserver`]. Production wiring uses
//! [`TracingObserver`], tests can record events instead.

use tracing::{info, warn};

use super::error::RemoteStep;

/// A step in one provisioning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningEvent {
    RemoteAttemptStarted { callback_host: String },
    IdentityRegistered { identifier: String },
    KeyRegistered { identifier: String },
    RemoteStepFailed { step: RemoteStep, cause: String },
    FallbackGenerated { identifier: String },
}

/// Receives provisioning progress
pub trait ProvisioningObserver: Send + Sync {
    fn on_event(&self, event: &ProvisioningEvent);
}

/// Writes events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ProvisioningObserver for TracingObserver {
    fn on_event(&self, event: &ProvisioningEvent) {
        match event {
            ProvisioningEvent::RemoteAttemptStarted { callback_host } => {
                info!(callback_host = %callback_host, "Step 1/2: creating API user through MoMo gateway");
            }
            ProvisioningEvent::IdentityRegistered { identifier } => {
                info!(api_user = %identifier, "API user registered; step 2/2: creating API key");
            }
            ProvisioningEvent::KeyRegistered { identifier } => {
                info!(api_user = %identifier, "API key registered with MoMo gateway");
            }
            ProvisioningEvent::RemoteStepFailed { step, cause } => {
                warn!(step = %step, cause = %cause, "Gateway registration failed, falling back to local generation");
            }
            ProvisioningEvent::FallbackGenerated { identifier } => {
                warn!(
                    api_user = %identifier,
                    "Credentials generated locally; they are NOT registered with MoMo and cannot be used for API calls"
                );
            }
        }
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ProvisioningObserver for NoopObserver {
    fn on_event(&self, _event: &ProvisioningEvent) {}
}
