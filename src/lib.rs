//! Connection/session lifecycle engine for a line-based POP3 server:
//! admission-controlled accept loop, per-connection session state machine,
//! bounded CRLF line framing and a concurrency-safe session registry.
//! Command semantics are supplied by a [`server::CommandHandler`]
//! collaborator.

pub mod server;
