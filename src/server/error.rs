use crate::server::types::SessionId;
use chrono::{DateTime, Utc};
use std::io;
use tokio::sync::mpsc;

/// Failure modes of a single line read.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// No data arrived within the idle window.
    #[error("read timed out after {0} ms with no data")]
    Timeout(u64),
    /// The line exceeded the maximum allowed length before CRLF was seen.
    #[error("maximum line length of {0} bytes exceeded")]
    LineTooLong(usize),
    /// The peer closed the connection or the transport failed.
    #[error("connection lost")]
    ConnectionLost,
    /// Unanticipated I/O fault.
    #[error("read failed: {0}")]
    Unknown(#[source] io::Error),
}

/// Server-level errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// One internal fault, emitted on the error channel and forgotten.
#[derive(Debug)]
pub struct ErrorEvent {
    /// Underlying failure.
    pub cause: Box<dyn std::error::Error + Send + Sync>,
    /// Where the fault was captured (acceptor, registry, session N, ...).
    pub context: String,
    /// Capture time.
    pub at: DateTime<Utc>,
    /// Session the fault belongs to, when there is one.
    pub session_id: Option<SessionId>,
}

/// Cloneable producer side of the error-reporting channel.
///
/// Reporting never fails: if the consumer is gone the event is dropped.
#[derive(Clone)]
pub struct ErrorSender {
    tx: mpsc::UnboundedSender<ErrorEvent>,
}

impl ErrorSender {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ErrorEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn report(
        &self,
        context: impl Into<String>,
        cause: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) {
        self.report_for_session(None, context, cause);
    }

    pub fn report_for_session(
        &self,
        session_id: Option<SessionId>,
        context: impl Into<String>,
        cause: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) {
        let _ = self.tx.send(ErrorEvent {
            cause: cause.into(),
            context: context.into(),
            at: Utc::now(),
            session_id,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_delivers_event() {
        let (sender, mut rx) = ErrorSender::channel();
        sender.report("acceptor", io::Error::new(io::ErrorKind::Other, "boom"));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.context, "acceptor");
        assert!(event.session_id.is_none());
        assert_eq!(event.cause.to_string(), "boom");
    }

    #[test]
    fn test_report_after_receiver_dropped_is_silent() {
        let (sender, rx) = ErrorSender::channel();
        drop(rx);
        sender.report("session 1", io::Error::new(io::ErrorKind::Other, "late"));
    }

    #[test]
    fn test_read_error_messages() {
        assert_eq!(
            ReadError::Timeout(60_000).to_string(),
            "read timed out after 60000 ms with no data"
        );
        assert_eq!(
            ReadError::LineTooLong(512).to_string(),
            "maximum line length of 512 bytes exceeded"
        );
    }
}
