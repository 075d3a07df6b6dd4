use crate::server::config::ServerConfig;
use crate::server::error::{ErrorEvent, ErrorSender, ServerError};
use crate::server::registry::{SessionEntry, SessionRegistry};
use crate::server::session::Session;
use crate::server::types::{CommandHandler, SessionId};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, info};

/// Global session ID counter
static SESSION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// The connection acceptor.
///
/// Owns the listening socket, gates admission against the registry cap and
/// launches every accepted connection as its own session task. Faults inside
/// the accept loop are reported on the error channel and the loop continues;
/// only a bind failure is fatal.
pub struct Pop3Server {
    config: Arc<ServerConfig>,
    registry: Arc<SessionRegistry>,
    handler: Arc<dyn CommandHandler>,
    errors: ErrorSender,
    stopped: AtomicBool,
}

impl Pop3Server {
    /// Build a server and hand back the consumer side of its error channel.
    pub fn new(
        config: ServerConfig,
        handler: Arc<dyn CommandHandler>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<ErrorEvent>) {
        let (errors, error_rx) = ErrorSender::channel();
        let registry = Arc::new(SessionRegistry::new(config.max_sessions, errors.clone()));
        let server = Arc::new(Self {
            config: Arc::new(config),
            registry,
            handler,
            errors,
            stopped: AtomicBool::new(false),
        });
        (server, error_rx)
    }

    pub fn registry(&self) -> Arc<SessionRegistry> {
        self.registry.clone()
    }

    /// Bind the listener and start the accept loop on its own task.
    ///
    /// Returns the bound local address; a bind failure is fatal and is
    /// returned immediately instead of going through the error channel.
    /// Does not block on session completion.
    pub async fn start(self: &Arc<Self>) -> Result<SocketAddr, ServerError> {
        let addr = self.config.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        self.stopped.store(false, Ordering::SeqCst);
        info!(%local_addr, max_sessions = self.config.max_sessions, "pop3 server listening");

        let server = self.clone();
        tokio::spawn(async move {
            server.accept_loop(listener).await;
        });

        Ok(local_addr)
    }

    /// Stop accepting new connections. Idempotent; safe if the server was
    /// never started. Running sessions are unaffected.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    async fn accept_loop(self: Arc<Self>, listener: TcpListener) {
        loop {
            if self.stopped.load(Ordering::SeqCst) {
                break;
            }

            // At capacity: do not accept, let the backlog apply
            // backpressure, re-check after one poll interval.
            if !self.registry.has_capacity().await {
                time::sleep(self.config.poll_interval()).await;
                continue;
            }

            // The accept wait is bounded so the stop flag and the capacity
            // check stay live.
            match time::timeout(self.config.poll_interval(), listener.accept()).await {
                Err(_elapsed) => continue,
                Ok(Ok((stream, peer_addr))) => {
                    let id = SessionId::new(SESSION_ID_COUNTER.fetch_add(1, Ordering::SeqCst));
                    debug!(session = %id, peer = %peer_addr, "connection accepted");

                    if !self.registry.try_add(id, SessionEntry::new(peer_addr)).await {
                        // Should not happen with counter-derived ids; drop
                        // the connection and keep accepting.
                        self.errors.report_for_session(
                            Some(id),
                            "acceptor",
                            io::Error::new(
                                io::ErrorKind::AlreadyExists,
                                format!("duplicate session id {id}"),
                            ),
                        );
                        continue;
                    }

                    let session = Session::new(
                        id,
                        stream,
                        peer_addr,
                        self.config.clone(),
                        self.registry.clone(),
                        self.handler.clone(),
                        self.errors.clone(),
                    );
                    tokio::spawn(session.run());
                }
                Ok(Err(e)) => {
                    self.errors.report("acceptor", e);
                }
            }
        }

        debug!("accept loop stopped");
    }
}
