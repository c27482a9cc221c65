//! JSON HTTP surface over the server actions.

pub mod error;
pub mod routes;

#[cfg(test)]
mod tests;

use std::{sync::Arc, time::Duration};

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal::ctrl_c};
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::TalkBotix;
use routes::{
    home_handler, interview_handler, me_handler, reset_password_handler, sign_in_handler,
    sign_out_handler, sign_up_handler,
};

/// Builds the API router. Cross-origin callers are refused unless
/// `allowed_origin` is set; that one origin may then send the session cookie.
pub fn router(app: Arc<TalkBotix>, allowed_origin: Option<HeaderValue>) -> Router {
    let routes = Router::new()
        .route("/api/sign-up", post(sign_up_handler))
        .route("/api/sign-in", post(sign_in_handler))
        .route("/api/sign-out", post(sign_out_handler))
        .route("/api/reset-password", post(reset_password_handler))
        .route("/api/me", get(me_handler))
        .route("/api/home", get(home_handler))
        .route("/api/interviews/{id}", get(interview_handler));

    let routes = match allowed_origin {
        Some(origin) => {
            info!(origin = ?origin, "CORS enabled");
            routes.layer(
                CorsLayer::new()
                    .allow_origin(origin)
                    .allow_credentials(true)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([CONTENT_TYPE])
                    .max_age(Duration::from_secs(60 * 60)),
            )
        }
        None => routes,
    };

    routes.with_state(app)
}

pub async fn start_server(config: Config) -> anyhow::Result<()> {
    info!("Initializing Firebase clients...");
    let app = Arc::new(TalkBotix::new(&config));

    let address = format!("0.0.0.0:{}", config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, router(app, config.allowed_origin.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
