use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum concurrently active sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Maximum accepted command line length in bytes, delimiter included
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    /// Idle window for a single line read, in milliseconds
    #[serde(default = "default_command_idle_timeout_ms")]
    pub command_idle_timeout_ms: u64,
    /// Idle window since the last completed command, in milliseconds
    #[serde(default = "default_session_idle_timeout_ms")]
    pub session_idle_timeout_ms: u64,
    /// Polling backoff shared by the accept loop and all line reads, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Greeting banner text, sent before the unique token
    #[serde(default = "default_banner")]
    pub banner: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            max_sessions: default_max_sessions(),
            max_line_length: default_max_line_length(),
            command_idle_timeout_ms: default_command_idle_timeout_ms(),
            session_idle_timeout_ms: default_session_idle_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            banner: default_banner(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    110
}

fn default_max_sessions() -> usize {
    10
}

fn default_max_line_length() -> usize {
    512
}

fn default_command_idle_timeout_ms() -> u64 {
    60_000
}

fn default_session_idle_timeout_ms() -> u64 {
    86_400
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_banner() -> String {
    "pop3 server ready".to_string()
}

impl ServerConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).await?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Address string suitable for `TcpListener::bind`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn command_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.command_idle_timeout_ms)
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.session_idle_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
