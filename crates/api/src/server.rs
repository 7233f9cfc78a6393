// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server implementation module
//!
//! This module provides the main server struct and implementation for the Ordinals API
//! server, including server lifecycle management, router configuration, and coordinated
//! graceful shutdown using `CancellationToken`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Router, http::HeaderName};
use external_apis::ProviderRegistry;
use hyper::Request;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, warn};

use crate::{
    config::ServerConfig,
    error::{ServerError, ServerResult},
    routes::create_routes,
    state::ServerState,
};

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS: u64 = 30;

/// Configuration for server shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Maximum time in-flight requests get to finish once shutdown begins
    pub graceful_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            graceful_timeout: Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS),
        }
    }
}

/// Main server struct
#[derive(Debug)]
pub struct Server {
    /// Server configuration
    config: ServerConfig,
    /// Application router
    router: Router,
    /// Server state
    state: ServerState,
    /// Cancellation token for coordinated shutdown
    cancellation_token: CancellationToken,
    /// Configuration for coordinated shutdown
    shutdown_config: ShutdownConfig,
}

impl Server {
    /// Create new server instance, building the provider registry from `config`
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if a provider client or limiter cannot
    /// be built from the configuration.
    pub fn new(config: ServerConfig, shutdown_config: ShutdownConfig) -> ServerResult<Self> {
        let registry = ProviderRegistry::new(&config.registry_settings()).map_err(|e| {
            ServerError::Config {
                message: e.to_string(),
            }
        })?;
        Ok(Self::with_registry(
            config,
            shutdown_config,
            Arc::new(registry),
        ))
    }

    /// Create server around an existing provider registry
    pub fn with_registry(
        config: ServerConfig,
        shutdown_config: ShutdownConfig,
        registry: Arc<ProviderRegistry>,
    ) -> Self {
        let cancellation_token = CancellationToken::new();
        let state = ServerState::new(config.clone(), registry, cancellation_token.child_token());
        let router = Self::create_router(state.clone());

        Self {
            config,
            router,
            state,
            cancellation_token,
            shutdown_config,
        }
    }

    /// Create application router with middleware
    fn create_router(state: ServerState) -> Router {
        let timeout_duration = state.config().timeout_seconds.value();

        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                    let method = req.method();
                    let uri = req.uri();
                    if let Some(request_id) = req.headers().get(REQUEST_ID_HEADER) {
                        info_span!("http_request", %method, %uri, ?request_id)
                    } else {
                        error!("failed to extract id from request");
                        info_span!("http_request", %method, %uri, request_id = "unknown")
                    }
                }),
            )
            .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
            .layer(CorsLayer::permissive())
            .layer(TimeoutLayer::new(timeout_duration));

        create_routes().layer(middleware).with_state(state)
    }

    async fn bind(&self) -> ServerResult<(TcpListener, SocketAddr)> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                address: addr,
                source,
            })?;
        let actual_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Startup { source })?;
        Ok((listener, actual_addr))
    }

    fn spawn_serve(
        listener: TcpListener,
        router: Router,
        shutdown: CancellationToken,
    ) -> JoinHandle<std::io::Result<()>> {
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
        })
    }

    /// Run the server with coordinated graceful shutdown
    ///
    /// Once shutdown begins, in-flight requests get
    /// [`ShutdownConfig::graceful_timeout`] to finish before the server task
    /// is aborted.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address,
    /// `ServerError::Startup` if the server fails to start, or
    /// `ServerError::Timeout` if draining exceeds the graceful timeout.
    pub async fn run(self) -> ServerResult<()> {
        let (listener, actual_addr) = self.bind().await?;

        info!(
            address = %actual_addr,
            environment = %self.config.environment,
            "Ordinals API server starting",
        );

        let cancellation_token = self.cancellation_token.clone();
        tokio::spawn(Self::shutdown_signal_handler(cancellation_token.clone()));

        let mut serve = Self::spawn_serve(listener, self.router, cancellation_token.clone());

        tokio::select! {
            joined = &mut serve => return Self::finish(joined),
            () = cancellation_token.cancelled() => {}
        }

        let graceful_timeout = self.shutdown_config.graceful_timeout;
        if let Ok(joined) = tokio::time::timeout(graceful_timeout, &mut serve).await {
            let result = Self::finish(joined);
            info!("Ordinals API server shut down gracefully");
            result
        } else {
            serve.abort();
            error!(
                timeout_secs = graceful_timeout.as_secs(),
                "graceful shutdown timed out, aborting in-flight requests"
            );
            Err(ServerError::Timeout {
                timeout_seconds: graceful_timeout.as_secs(),
            })
        }
    }

    fn finish(joined: Result<std::io::Result<()>, tokio::task::JoinError>) -> ServerResult<()> {
        joined?.map_err(|source| {
            error!(error = ?source, "server error");
            ServerError::Shutdown { source }
        })
    }

    /// Handle shutdown signals and trigger coordinated cancellation
    ///
    /// Listens for SIGINT (Ctrl+C) and SIGTERM and cancels the token when
    /// either arrives.
    async fn shutdown_signal_handler(cancellation_token: CancellationToken) {
        let signal_received = async {
            #[cfg(unix)]
            #[allow(clippy::expect_used)]
            {
                use tokio::signal::unix::{SignalKind, signal};

                let mut sigterm =
                    signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
                let mut sigint =
                    signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");

                tokio::select! {
                    _ = sigterm.recv() => "SIGTERM",
                    _ = sigint.recv() => "SIGINT",
                }
            }

            #[cfg(not(unix))]
            #[allow(clippy::expect_used)]
            {
                tokio::signal::ctrl_c()
                    .await
                    .expect("Failed to install CTRL+C signal handler");
                "CTRL+C"
            }
        };

        tokio::select! {
            signal_name = signal_received => {
                warn!(signal = signal_name, "shutdown signal received, cancelling all operations");
                cancellation_token.cancel();
            },
            () = cancellation_token.cancelled() => {}
        }
    }

    /// Returns a clone of the cancellation token for coordinated shutdown
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Initiates graceful shutdown by cancelling the server's cancellation token
    pub fn shutdown(&self) {
        info!("programmatic shutdown requested");
        self.cancellation_token.cancel();
    }

    /// Run server for testing, returns the bound address
    ///
    /// Cancelling the returned token stops the server.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address.
    pub async fn run_for_testing(self) -> ServerResult<(SocketAddr, CancellationToken)> {
        let (listener, actual_addr) = self.bind().await?;
        let token = self.cancellation_token.clone();
        drop(Self::spawn_serve(listener, self.router, token.clone()));
        Ok((actual_addr, token))
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get server state
    pub fn state(&self) -> &ServerState {
        &self.state
    }
}
