//! HTTP server setup and the connection accept loop.
//!
//! # Responsibilities
//! - Build the axum Router (single catch-all route, tracing, request ids)
//! - Accept connections, run the TLS handshake, authorize the peer
//! - Serve HTTP/1.1 and HTTP/2 per connection with hyper
//! - Stop accepting and drain connections on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::routing::any;
use axum::Router;
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tower::Service;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthorizationError, PeerAuthorization};
use crate::config::ResponderConfig;
use crate::http::handler::{responder_handler, AppState};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::lifecycle::Shutdown;
use crate::net::{ConnectionGuard, ConnectionPermit, ConnectionTracker, Listener, ListenerError, TlsSetup};
use crate::observability::metrics;

/// Upper bound on a TLS handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause after a failed accept, e.g. when out of file descriptors.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// HTTPS (or plain HTTP) server answering every request with the
/// configured payload or a 401.
pub struct ResponderServer {
    router: Router,
    config: Arc<ResponderConfig>,
    tls: Option<TlsSetup>,
    tracker: ConnectionTracker,
}

impl ResponderServer {
    /// Create a server. `tls` must be present when `config.tls.enabled`.
    pub fn new(config: Arc<ResponderConfig>, tls: Option<TlsSetup>) -> Self {
        let state = AppState {
            response: Arc::new(config.response.clone()),
        };
        let router = Self::build_router(state);
        Self {
            router,
            config,
            tls,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Build the axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(responder_handler))
            .route("/{*path}", any(responder_handler))
            .with_state(state)
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id(request),
                )
            }))
            .layer(set_request_id_layer())
    }

    /// Accept connections until `shutdown` triggers, then wait for open
    /// connections to finish.
    pub async fn run(self, listener: Listener, shutdown: Shutdown) -> Result<(), ListenerError> {
        let addr = listener.local_addr().map_err(ListenerError::Accept)?;
        tracing::info!(
            address = %addr,
            tls = self.tls.is_some(),
            "Server is listening on {}",
            addr.port()
        );

        let mut shutdown_rx = shutdown.subscribe();
        while !shutdown.is_triggered() {
            let (stream, peer_addr, permit) = tokio::select! {
                result = listener.accept() => match result {
                    Ok(accepted) => accepted,
                    Err(ListenerError::Accept(e)) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                        continue;
                    }
                    Err(e) => return Err(e),
                },
                _ = shutdown_rx.recv() => break,
            };

            let connection = Connection {
                stream,
                peer_addr,
                tls: self.tls.clone(),
                router: self.router.clone(),
                shutdown: shutdown.clone(),
                guard: self.tracker.track(),
                _permit: permit,
            };
            tokio::spawn(connection.serve());
        }

        tracing::info!("Not accepting new connections");
        drop(listener);

        let active = self.tracker.active_count();
        if active > 0 {
            tracing::info!(active, "Waiting for connections to finish");
        }
        match self.config.shutdown.drain_timeout_secs {
            0 => self.tracker.wait_for_drain().await,
            secs => {
                if !self
                    .tracker
                    .wait_for_drain_timeout(Duration::from_secs(secs))
                    .await
                {
                    tracing::warn!(
                        remaining = self.tracker.active_count(),
                        "Drain timeout elapsed with connections still open"
                    );
                }
            }
        }

        tracing::info!("Server closed");
        Ok(())
    }
}

/// One accepted TCP connection and what it needs to be served.
struct Connection {
    stream: TcpStream,
    peer_addr: SocketAddr,
    tls: Option<TlsSetup>,
    router: Router,
    shutdown: Shutdown,
    guard: ConnectionGuard,
    _permit: ConnectionPermit,
}

impl Connection {
    async fn serve(self) {
        let Connection {
            stream,
            peer_addr,
            tls,
            router,
            shutdown,
            guard,
            _permit,
        } = self;
        let connection_id = guard.id();
        // Subscribe before the handshake so a shutdown during it is seen.
        let shutdown_rx = shutdown.subscribe();

        match tls {
            Some(tls) => {
                let accepted = tokio::time::timeout(HANDSHAKE_TIMEOUT, tls.acceptor.accept(stream)).await;
                let tls_stream = match accepted {
                    Ok(Ok(tls_stream)) => tls_stream,
                    Ok(Err(e)) => {
                        tracing::debug!(%connection_id, peer_addr = %peer_addr, error = %e, "TLS handshake failed");
                        metrics::record_handshake_failure();
                        return;
                    }
                    Err(_) => {
                        tracing::debug!(%connection_id, peer_addr = %peer_addr, "TLS handshake timed out");
                        metrics::record_handshake_failure();
                        return;
                    }
                };

                let authorization = {
                    let (_, session) = tls_stream.get_ref();
                    tls.authorizer.authorize(session.peer_certificates())
                };
                tracing::debug!(
                    %connection_id,
                    peer_addr = %peer_addr,
                    authorized = authorization.is_authorized(),
                    reason = ?authorization.error(),
                    "TLS connection established"
                );

                serve_http(TokioIo::new(tls_stream), peer_addr, authorization, router, shutdown, shutdown_rx).await;
            }
            None => {
                let authorization = PeerAuthorization::Unauthorized(AuthorizationError::NoPeerCertificate);
                serve_http(TokioIo::new(stream), peer_addr, authorization, router, shutdown, shutdown_rx).await;
            }
        }

        tracing::debug!(%connection_id, peer_addr = %peer_addr, "Connection finished");
    }
}

/// Serve HTTP on an established connection until the peer hangs up or a
/// graceful shutdown completes.
async fn serve_http<I>(
    io: I,
    peer_addr: SocketAddr,
    authorization: PeerAuthorization,
    router: Router,
    shutdown: Shutdown,
    mut shutdown_rx: broadcast::Receiver<()>,
) where
    I: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
{
    let service = hyper::service::service_fn(move |mut request: Request<Incoming>| {
        request.extensions_mut().insert(authorization.clone());
        request.extensions_mut().insert(ConnectInfo(peer_addr));
        router.clone().call(request)
    });

    let builder = auto::Builder::new(TokioExecutor::new());
    let conn = builder.serve_connection(io, service);
    let mut conn = std::pin::pin!(conn);

    let mut draining = shutdown.is_triggered();
    if draining {
        conn.as_mut().graceful_shutdown();
    }

    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(e) = result {
                    tracing::debug!(peer_addr = %peer_addr, error = %e, "Connection error");
                }
                break;
            }
            _ = shutdown_rx.recv(), if !draining => {
                draining = true;
                conn.as_mut().graceful_shutdown();
            }
        }
    }
}
