use async_trait::async_trait;
use pop3d::server::{
    Command, CommandHandler, CommandOutcome, HandlerError, Pop3Server, Reply, ServerConfig,
    SessionId,
};
use std::sync::Arc;
use tracing::{error, info};

/// Placeholder dispatch: the lifecycle engine is the product here, real
/// POP3 verb semantics come from a collaborator. QUIT ends the session,
/// NOOP succeeds, everything else is politely refused.
struct UnimplementedHandler;

#[async_trait]
impl CommandHandler for UnimplementedHandler {
    async fn handle(
        &self,
        _session_id: SessionId,
        command: &Command,
    ) -> Result<CommandOutcome, HandlerError> {
        match command.verb.as_str() {
            "QUIT" => Ok(CommandOutcome::close(Reply::ok("pop3 server signing off"))),
            "NOOP" => Ok(CommandOutcome::reply(Reply::ok(""))),
            _ => Ok(CommandOutcome::reply(Reply::err("command not implemented"))),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "pop3d.toml".to_string());
    let config = ServerConfig::load(&config_path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load {config_path}: {e}"))?;

    let (server, mut error_rx) = Pop3Server::new(config, Arc::new(UnimplementedHandler));

    // Every internal fault, whatever the layer, surfaces here.
    tokio::spawn(async move {
        while let Some(event) = error_rx.recv().await {
            error!(
                context = %event.context,
                session = ?event.session_id,
                at = %event.at,
                "{}", event.cause
            );
        }
    });

    let addr = server.start().await?;
    info!(%addr, "serving");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    server.stop();

    Ok(())
}
