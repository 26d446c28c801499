use crate::agent::RecipeAgent;
use crate::cli::Args;
use crate::models::recipe::{ EmailRequest, MessageResponse, RecipeRequest, RecipeResponse };
use super::error::ApiError;
use std::error::Error;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use axum::{
    routing::{ get, post },
    Router,
    Json,
    extract::{ Request, State },
    http::HeaderMap,
    middleware::{ self, Next },
    response::{ IntoResponse, Response },
};
use governor::{ RateLimiter, Quota, state::{ InMemoryState, NotKeyed }, clock::DefaultClock };
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, warn, error };

pub const SESSION_HEADER: &str = "x-session-id";
pub const EMAIL_SENT: &str = "All recipes sent successfully!";

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Clone)]
pub struct AppState {
    agent: Arc<RecipeAgent>,
    limiter: Arc<Limiter>,
}

impl AppState {
    pub fn new(agent: Arc<RecipeAgent>, requests_per_second: u32) -> Self {
        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            agent,
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/generate_recipe", post(generate_recipe_handler))
        .route("/send_recipes", post(send_recipes_handler))
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        )
        .with_state(state)
}

pub async fn start_http_server(
    addr: &str,
    agent: Arc<RecipeAgent>,
    args: &Args,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = addr.parse::<SocketAddr>()?;
    let app = router(AppState::new(agent, args.rate_limit_per_second));

    if args.enable_tls {
        let (cert_path, key_path) = match (&args.tls_cert_path, &args.tls_key_path) {
            (Some(cert), Some(key)) => (cert, key),
            _ => {
                error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                return Err("TLS enabled without cert/key".into());
            }
        };
        info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);
        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            cert_path,
            key_path
        ).await?;

        info!("Starting HTTPS API server on: https://{}", addr);
        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await?;
    } else {
        info!("Starting HTTP API server on: http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
            e
        })?;
        axum::serve(listener, app.into_make_service()).await?;
    }

    Ok(())
}

async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if state.limiter.check().is_err() {
        warn!("Global rate limit exceeded for {} {}", req.method(), req.uri().path());
        return ApiError::TooManyRequests.into_response();
    }
    next.run(req).await
}

async fn generate_recipe_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RecipeRequest>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let header_session = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok());
    let response = state.agent.generate_recipe(&req, header_session).await?;
    Ok(Json(response))
}

async fn send_recipes_handler(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.agent.send_recipes(&req).await?;
    Ok(Json(MessageResponse { message: EMAIL_SENT.to_string() }))
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
