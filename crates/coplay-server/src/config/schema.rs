use serde::Deserialize;
use coplay_core::error::{CoplayError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(CoplayError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.server.validate()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// When set, every login must carry this password.
    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    /// Per-session outbound queue capacity (envelopes).
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,

    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    #[serde(default = "default_login_timeout_ms")]
    pub login_timeout_ms: u64,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            password: None,
            max_sessions: default_max_sessions(),
            max_frame_bytes: default_max_frame_bytes(),
            outbound_queue: default_outbound_queue(),
            write_timeout_ms: default_write_timeout_ms(),
            login_timeout_ms: default_login_timeout_ms(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=1024).contains(&self.max_sessions) {
            return Err(CoplayError::Config(
                "server.max_sessions must be between 1 and 1024".into(),
            ));
        }
        if !(1024..=16 * 1024 * 1024).contains(&self.max_frame_bytes) {
            return Err(CoplayError::Config(
                "server.max_frame_bytes must be between 1 KiB and 16 MiB".into(),
            ));
        }
        if self.outbound_queue == 0 {
            return Err(CoplayError::Config(
                "server.outbound_queue must be at least 1".into(),
            ));
        }
        if !(100..=30000).contains(&self.write_timeout_ms) {
            return Err(CoplayError::Config(
                "server.write_timeout_ms must be between 100 and 30000".into(),
            ));
        }
        if !(500..=60000).contains(&self.login_timeout_ms) {
            return Err(CoplayError::Config(
                "server.login_timeout_ms must be between 500 and 60000".into(),
            ));
        }
        if !(1000..=120000).contains(&self.ping_interval_ms) {
            return Err(CoplayError::Config(
                "server.ping_interval_ms must be between 1000 and 120000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(CoplayError::Config(
                "server.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:7777".into()
}
fn default_max_sessions() -> usize {
    16
}
fn default_max_frame_bytes() -> usize {
    1024 * 1024
}
fn default_outbound_queue() -> usize {
    256
}
fn default_write_timeout_ms() -> u64 {
    2000
}
fn default_login_timeout_ms() -> u64 {
    5000
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
