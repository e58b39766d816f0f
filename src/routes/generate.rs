//! `POST /api/generate`
//!
//! Body: `{"primaryKey": "...", "secondaryKey": "...", "callbackHost": "..."}`
//!
//! - 400 with `success: false, data: null` when the body is not JSON or the
//!   subscription key is missing
//! - 201 with the credential bundle otherwise, whether the gateway
//!   registered the pair or it was generated locally

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use tracing::{info, warn};

use super::json_response;
use crate::provisioning::{
    ApiResponse, CredentialBundle, CredentialRequest, ProvisioningService, ValidationError,
};

pub async fn handle_generate(service: &ProvisioningService, body: &[u8]) -> Response<Full<Bytes>> {
    let request: CredentialRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => {
            let err = ValidationError::MalformedBody(e.to_string());
            warn!(error = %e, "Rejecting credential request: {}", err);
            return validation_failure(&err);
        }
    };

    match service.generate_credentials(request).await {
        Ok(provisioned) => {
            info!(
                api_user = %provisioned.bundle.api_user,
                registered = provisioned.registered,
                "Credential request completed"
            );
            json_response(
                StatusCode::CREATED,
                &ApiResponse::ok(provisioned.message, provisioned.bundle),
            )
        }
        Err(err) => {
            warn!("Rejecting credential request: {}", err);
            validation_failure(&err)
        }
    }
}

pub(crate) fn validation_failure(err: &ValidationError) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::BAD_REQUEST,
        &ApiResponse::<CredentialBundle>::failure(err.to_string()),
    )
}
