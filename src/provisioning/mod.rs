//! Credential provisioning workflow
//!
//! - **Registrar**: two-step API user / API key registration with the gateway
//! - **Fallback**: local UUID + hex key generation when the gateway path fails
//! - **Orchestrator**: remote-first state machine, one attempt per step
//! - **Assembler**: credential bundle, Basic auth value and test command
//! - **Service**: validation plus the above behind `generate_credentials`

pub mod assembler;
pub mod error;
pub mod fallback;
pub mod model;
pub mod observer;
pub mod orchestrator;
pub mod registrar;
pub mod service;

pub use assembler::{basic_auth, CredentialAssembler};
pub use error::{EntropyError, RemoteFailure, RemoteStep, ValidationError};
pub use fallback::LocalFallbackGenerator;
pub use model::{
    ApiResponse, CredentialBundle, CredentialRequest, ProvisioningOutcome, ProvisioningRequest,
    TARGET_ENVIRONMENT,
};
pub use observer::{NoopObserver, ProvisioningEvent, ProvisioningObserver, TracingObserver};
pub use orchestrator::ProvisioningOrchestrator;
pub use registrar::{CredentialRegistrar, RegistrarConfig, RemoteRegistrar};
pub use service::{ProvisionedCredentials, ProvisioningService};
