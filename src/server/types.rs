use crate::server::command::Command;
use crate::server::reply::Reply;
use async_trait::async_trait;
use std::fmt;

/// Boundary error type for command handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Identifies one session for the duration of its connection.
///
/// Unique within the registry at any instant; derived from a process-wide
/// counter by the acceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the session should do after a command has been handled.
pub struct CommandOutcome {
    /// Reply to send back, if any.
    pub reply: Option<Reply>,
    /// Whether the connection should close after the reply.
    pub close: bool,
}

impl CommandOutcome {
    pub fn reply(reply: Reply) -> Self {
        Self {
            reply: Some(reply),
            close: false,
        }
    }

    pub fn close(reply: Reply) -> Self {
        Self {
            reply: Some(reply),
            close: true,
        }
    }

    /// Continue the command loop without sending anything.
    pub fn silent() -> Self {
        Self {
            reply: None,
            close: false,
        }
    }
}

/// Command dispatch extension point.
///
/// The session core reads and parses lines; what each verb means is the
/// collaborator's concern. A handler error makes the session send a generic
/// `-ERR` reply and continue the loop.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(
        &self,
        session_id: SessionId,
        command: &Command,
    ) -> Result<CommandOutcome, HandlerError>;
}
