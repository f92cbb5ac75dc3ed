use crate::handlers::{self, AppState};
use axum::{routing::get, Router};
use oi_alert_core::HealthState;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    #[must_use]
    pub const fn new(health: Arc<HealthState>, interval_secs: u64) -> Self {
        Self {
            state: AppState {
                health,
                interval_secs,
            },
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(handlers::root))
            .route("/health", get(handlers::health))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Serves the liveness routes on `addr` until `shutdown` turns true.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or serve requests.
    pub async fn serve(self, addr: &str, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Liveness API listening on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                while !*shutdown.borrow_and_update() {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                }
            })
            .await?;

        tracing::info!("Liveness API stopped");
        Ok(())
    }
}
