//! HTTP server implementation
//!
//! hyper http1 with TokioIo; one task per connection, no state shared
//! between requests apart from the read-only `AppState`.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN, VARY,
};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::Args;
use crate::provisioning::{
    CredentialAssembler, CredentialRegistrar, ProvisioningObserver, ProvisioningService,
    RegistrarConfig, RemoteRegistrar, TracingObserver, ValidationError,
};
use crate::routes;
use crate::types::Result;

/// Largest request body accepted on /api/generate
pub const MAX_BODY_BYTES: usize = 64 * 1024;

const CORS_METHODS: &str = "GET, POST, OPTIONS";
const CORS_HEADERS: &str = "Content-Type, Authorization";

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub provisioning: ProvisioningService,
    /// Allowed CORS origins, parsed once from `args`
    pub allowed_origins: Vec<String>,
    pub started_at: Instant,
}

impl AppState {
    /// Create AppState talking to the configured gateway
    pub fn new(args: Args) -> Result<Self> {
        let registrar = RemoteRegistrar::new(RegistrarConfig {
            base_url: args.gateway_base().to_string(),
            request_timeout: args.request_timeout(),
        })?;
        Ok(Self::with_registrar(args, Arc::new(registrar)))
    }

    /// Create AppState with a caller-supplied registrar
    pub fn with_registrar(args: Args, registrar: Arc<dyn CredentialRegistrar>) -> Self {
        let observer: Arc<dyn ProvisioningObserver> = Arc::new(TracingObserver);
        let provisioning = ProvisioningService::new(
            registrar,
            observer,
            CredentialAssembler::new(args.gateway_base()),
            args.default_callback_host.clone(),
        );
        let allowed_origins = args.allowed_origin_list();

        Self {
            args,
            provisioning,
            allowed_origins,
            started_at: Instant::now(),
        }
    }

    /// The request's Origin if it is allowed
    fn allowed_origin(&self, req: &Request<Incoming>) -> Option<HeaderValue> {
        let origin = req.headers().get(ORIGIN)?;
        let origin_str = origin.to_str().ok()?;
        self.allowed_origins
            .iter()
            .any(|allowed| allowed == "*" || allowed == origin_str)
            .then(|| origin.clone())
    }
}

/// Bind the configured address and serve forever
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen_addr()).await?;
    serve(listener, state).await
}

/// Serve connections from an already bound listener
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    info!(
        "momo-keygen listening on {} (gateway: {})",
        listener.local_addr()?,
        state.args.gateway_base()
    );
    info!("API route registered: POST /api/generate");
    info!("CORS allowed origins: {:?}", state.allowed_origins);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let cors_origin = state.allowed_origin(&req);

    info!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        (Method::OPTIONS, _) => preflight_response(cors_origin.is_some()),

        (Method::POST, "/api/generate") => {
            debug!("=== New API key generation request ===");
            match Limited::new(req.into_body(), MAX_BODY_BYTES).collect().await {
                Ok(collected) => {
                    routes::handle_generate(&state.provisioning, &collected.to_bytes()).await
                }
                Err(e) => {
                    warn!("Credential request body error: {}", e);
                    routes::generate::validation_failure(&ValidationError::MalformedBody(
                        e.to_string(),
                    ))
                }
            }
        }
        (_, "/api/generate") => routes::method_not_allowed_response("POST, OPTIONS"),

        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(&state),

        (Method::GET, "/version") => routes::version_info(),

        _ => routes::not_found_response(&path),
    };

    Ok(with_cors(response, cors_origin))
}

/// Attach CORS headers when the request came from an allowed origin
fn with_cors(mut response: Response<Full<Bytes>>, origin: Option<HeaderValue>) -> Response<Full<Bytes>> {
    if let Some(origin) = origin {
        let headers = response.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(CORS_METHODS));
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(CORS_HEADERS));
        headers.insert(VARY, HeaderValue::from_static("Origin"));
    }
    response
}

/// CORS preflight response
fn preflight_response(origin_allowed: bool) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = if origin_allowed {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::FORBIDDEN
    };
    response
}
