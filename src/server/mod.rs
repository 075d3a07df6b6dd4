pub mod command;
pub mod config;
pub mod error;
pub mod framer;
pub mod registry;
pub mod reply;
pub mod session;
pub mod tcp;
pub mod types;

pub use command::Command;
pub use config::ServerConfig;
pub use error::{ErrorEvent, ErrorSender, ReadError, ServerError};
pub use registry::{SessionEntry, SessionRegistry};
pub use reply::{Reply, ReplyStatus};
pub use session::{Session, SessionState};
pub use tcp::Pop3Server;
pub use types::{CommandHandler, CommandOutcome, HandlerError, SessionId};
