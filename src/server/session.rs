use crate::server::command::Command;
use crate::server::config::ServerConfig;
use crate::server::error::{ErrorSender, ReadError, ServerError};
use crate::server::framer;
use crate::server::registry::SessionRegistry;
use crate::server::reply::{self, Reply};
use crate::server::types::{CommandHandler, SessionId};
use chrono::{DateTime, Utc};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncWriteExt, Interest};
use tokio::net::TcpStream;
use tokio::time;
use tracing::debug;

/// Session lifecycle states. `Terminated` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connection accepted, greeting not yet sent
    Greeting,
    /// Waiting for the next command line
    AwaitingCommand,
    /// A command has been read and is being dispatched
    Processing,
    /// Session is over; cleanup is the only thing left
    Terminated,
}

/// One client connection from greeting to termination.
///
/// Owns the connection exclusively: no other component reads, writes or
/// closes it. Runs on its own task; commands within a session are strictly
/// sequential, the next line is not read until the previous command
/// completes.
pub struct Session {
    id: SessionId,
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: SessionState,
    started_at: DateTime<Utc>,
    last_activity: Instant,
    current_command: Option<Command>,
    config: Arc<ServerConfig>,
    registry: Arc<SessionRegistry>,
    handler: Arc<dyn CommandHandler>,
    errors: ErrorSender,
}

impl Session {
    pub fn new(
        id: SessionId,
        stream: TcpStream,
        peer_addr: SocketAddr,
        config: Arc<ServerConfig>,
        registry: Arc<SessionRegistry>,
        handler: Arc<dyn CommandHandler>,
        errors: ErrorSender,
    ) -> Self {
        Self {
            id,
            stream,
            peer_addr,
            state: SessionState::Greeting,
            started_at: Utc::now(),
            last_activity: Instant::now(),
            current_command: None,
            config,
            registry,
            handler,
            errors,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Run the session to completion.
    ///
    /// Whatever way the command loop exits, the session deregisters itself
    /// and closes the connection exactly once. A fault escaping the loop is
    /// reported on the error channel before cleanup.
    pub async fn run(mut self) {
        debug!(session = %self.id, peer = %self.peer_addr, "session started");

        if let Err(e) = self.process().await {
            self.errors
                .report_for_session(Some(self.id), format!("session {}", self.id), e);
        }

        self.registry.remove(self.id).await;
        let _ = self.stream.shutdown().await;

        debug!(session = %self.id, "session closed");
    }

    async fn process(&mut self) -> Result<(), ServerError> {
        loop {
            match self.state {
                SessionState::Greeting => {
                    let greeting = Reply::greeting(&self.config.banner);
                    self.send(&greeting).await?;
                    self.last_activity = Instant::now();
                    self.state = SessionState::AwaitingCommand;
                }
                SessionState::AwaitingCommand => self.await_command().await?,
                SessionState::Processing => self.dispatch().await,
                SessionState::Terminated => return Ok(()),
            }
        }
    }

    /// One `AwaitingCommand` step: read a line if data is pending,
    /// otherwise check the session idle timeout.
    async fn await_command(&mut self) -> Result<(), ServerError> {
        if self.has_data().await? {
            match framer::read_line(
                &self.stream,
                self.config.max_line_length,
                self.config.command_idle_timeout(),
                self.config.poll_interval(),
            )
            .await
            {
                Ok(line) => {
                    self.current_command = Some(Command::parse(&line));
                    self.last_activity = Instant::now();
                    self.state = SessionState::Processing;
                }
                Err(ReadError::ConnectionLost) => {
                    // Peer is gone; no reply attempt.
                    self.state = SessionState::Terminated;
                }
                Err(e) => {
                    // Transient read fault: tell the client and keep the
                    // loop alive, unless the connection turns out closed.
                    self.errors.report_for_session(
                        Some(self.id),
                        format!("session {}", self.id),
                        e,
                    );
                    if self.send(&Reply::err(reply::TEMPORARY_FAILURE)).await.is_err() {
                        self.state = SessionState::Terminated;
                    }
                }
            }
        } else if self.last_activity.elapsed() > self.config.session_idle_timeout() {
            let _ = self.send(&Reply::err(reply::SESSION_TIMEOUT_NOTICE)).await;
            self.state = SessionState::Terminated;
        }
        Ok(())
    }

    /// Hand the current command to the dispatch collaborator.
    async fn dispatch(&mut self) {
        let command = match &self.current_command {
            Some(command) => command.clone(),
            None => {
                self.state = SessionState::AwaitingCommand;
                return;
            }
        };

        match self.handler.handle(self.id, &command).await {
            Ok(outcome) => {
                if let Some(reply) = outcome.reply {
                    if self.send(&reply).await.is_err() {
                        self.state = SessionState::Terminated;
                        return;
                    }
                }
                self.last_activity = Instant::now();
                self.state = if outcome.close {
                    SessionState::Terminated
                } else {
                    SessionState::AwaitingCommand
                };
            }
            Err(e) => {
                self.errors
                    .report_for_session(Some(self.id), format!("session {}", self.id), e);
                if self.send(&Reply::err(reply::TEMPORARY_FAILURE)).await.is_err() {
                    self.state = SessionState::Terminated;
                } else {
                    self.state = SessionState::AwaitingCommand;
                }
            }
        }
    }

    /// Check for pending input, waiting at most one poll interval so the
    /// session idle timeout stays live.
    async fn has_data(&self) -> io::Result<bool> {
        match time::timeout(
            self.config.poll_interval(),
            self.stream.ready(Interest::READABLE),
        )
        .await
        {
            Ok(Ok(ready)) => Ok(ready.is_readable() || ready.is_read_closed()),
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => Ok(false),
        }
    }

    async fn send(&mut self, reply: &Reply) -> io::Result<()> {
        self.stream.write_all(&reply.to_bytes()).await
    }
}
