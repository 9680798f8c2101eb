mod cors;
mod health;
mod root;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use cinder_config::Config;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tts::store::Sweeper;

/// Assembled server with all routes, middleware and the artifact sweeper
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
    sweeper: JoinHandle<()>,
    sweeper_shutdown: CancellationToken,
}

impl Server {
    /// Build the server from configuration
    ///
    /// Opens the artifact store and starts its background sweep.
    ///
    /// # Errors
    ///
    /// Returns an error if the TTS subsystem (HTTP clients, artifact store)
    /// fails to initialize
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 5000)));

        let tts_state = tts::build_server(config).await?;

        let sweeper_shutdown = CancellationToken::new();
        let sweeper = Sweeper::spawn(
            Arc::clone(tts_state.store()),
            config.store.sweep_interval,
            sweeper_shutdown.clone(),
        );

        let mut app = Router::new().route("/", axum::routing::get(root::root_handler));

        // Health check
        if config.server.health.enabled {
            app = app.route(
                &config.server.health.path,
                axum::routing::get(health::health_handler).with_state(Arc::clone(&tts_state)),
            );
        }

        // TTS routes
        app = app.merge(tts::endpoint_router().with_state(tts_state));

        // Tracing
        app = app.layer(TraceLayer::new_for_http());

        // CORS
        if let Some(ref cors_config) = config.server.cors {
            app = app.layer(cors::cors_layer(cors_config));
        }

        Ok(Self {
            router: app,
            listen_address,
            sweeper,
            sweeper_shutdown,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener. The sweeper
    /// keeps running until the runtime shuts down.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered, then stops the
    /// sweeper.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await;

        self.sweeper_shutdown.cancel();
        if let Err(e) = self.sweeper.await {
            tracing::warn!(error = %e, "artifact sweeper did not stop cleanly");
        }

        served?;
        Ok(())
    }
}
