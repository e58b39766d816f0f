//! Local credential generation used when the gateway path fails
//!
//! Produces values shaped like real MoMo credentials: a UUID v4 API user
//! and a 32-character lowercase hex API key (16 bytes from the OS CSPRNG).
//! These are NOT registered anywhere and will be rejected by the gateway.

use rand::rngs::OsRng;
use rand::RngCore;
use tracing::error;
use uuid::Uuid;

use super::error::EntropyError;

/// Number of random bytes in a generated key
pub const KEY_BYTES: usize = 16;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFallbackGenerator;

impl LocalFallbackGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Fresh UUID v4 API user
    pub fn generate_identifier(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Fresh API key, or the entropy failure
    pub fn try_generate_key(&self) -> Result<String, EntropyError> {
        let mut bytes = [0u8; KEY_BYTES];
        OsRng.try_fill_bytes(&mut bytes)?;
        Ok(hex::encode(bytes))
    }

    /// Fresh API key. Aborts the process if the OS random source is
    /// unavailable; there is no weaker source to fall back to.
    pub fn generate_key(&self) -> String {
        match self.try_generate_key() {
            Ok(key) => key,
            Err(e) => {
                error!(error = %e, "Cannot generate API key, aborting");
                std::process::abort();
            }
        }
    }

    /// Fresh identifier and key pair
    pub fn generate(&self) -> (String, String) {
        (self.generate_identifier(), self.generate_key())
    }
}
