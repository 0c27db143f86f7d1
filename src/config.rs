//! Server configuration.
//!
//! Settings come from an optional YAML file named by `GZSERVE_CONFIG`, with a
//! handful of environment variables layered on top:
//!
//! ```yaml
//! listen_addr: "0.0.0.0:8080"
//! backlog: 5
//! content_root: "./public"
//! read_timeout_secs: 30
//! write_timeout_secs: 30
//! max_connections: 256
//! routes:
//!   - path: /ping
//!     body: "pong\n"
//!     content_type: text/plain
//! ```

use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

use crate::http::lines::DEFAULT_MAX_LINE_LEN;
use crate::http::mime::TEXT_PLAIN;
use crate::http::parser::DEFAULT_MAX_HEADERS;

/// Names the YAML config file.
pub const CONFIG_ENV: &str = "GZSERVE_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    /// Pending-connection queue length passed to listen(2).
    pub backlog: u32,
    /// Directory served by the file store; no store when unset.
    pub content_root: Option<String>,
    /// How long a connection may sit idle while we wait for request bytes.
    pub read_timeout_secs: u64,
    /// How long a peer may take to accept the response before it is dropped.
    pub write_timeout_secs: u64,
    /// Upper bound on connections handled at once.
    pub max_connections: usize,
    pub max_line_len: usize,
    pub max_headers: usize,
    /// Fixed in-memory replies, matched before the content store.
    pub routes: Vec<RouteConfig>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RouteConfig {
    pub path: String,
    pub body: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_content_type() -> String {
    TEXT_PLAIN.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            backlog: 5,
            content_root: None,
            read_timeout_secs: 30,
            write_timeout_secs: 30,
            max_connections: 256,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            max_headers: DEFAULT_MAX_HEADERS,
            routes: vec![RouteConfig {
                path: "/ping".to_string(),
                body: "pong\n".to_string(),
                content_type: default_content_type(),
            }],
        }
    }
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Like [`Config::load`], reading variables through `lookup`.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut cfg = match lookup(CONFIG_ENV) {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file {path}"))?;
                Self::from_yaml(&text).with_context(|| format!("invalid config file {path}"))?
            }
            None => Self::default(),
        };

        if let Some(addr) = lookup("LISTEN") {
            cfg.listen_addr = addr;
        }
        if let Some(root) = lookup("CONTENT_ROOT") {
            cfg.content_root = Some(root);
        }
        if let Some(secs) = lookup("READ_TIMEOUT_SECS") {
            cfg.read_timeout_secs = secs
                .parse()
                .with_context(|| format!("invalid READ_TIMEOUT_SECS {secs:?}"))?;
        }
        if let Some(secs) = lookup("WRITE_TIMEOUT_SECS") {
            cfg.write_timeout_secs = secs
                .parse()
                .with_context(|| format!("invalid WRITE_TIMEOUT_SECS {secs:?}"))?;
        }
        if let Some(max) = lookup("MAX_CONNECTIONS") {
            cfg.max_connections = max
                .parse()
                .with_context(|| format!("invalid MAX_CONNECTIONS {max:?}"))?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_connections == 0 {
            bail!("max_connections must be >= 1");
        }
        if self.read_timeout_secs == 0 {
            bail!("read_timeout_secs must be > 0");
        }
        if self.write_timeout_secs == 0 {
            bail!("write_timeout_secs must be > 0");
        }
        if self.max_line_len == 0 {
            bail!("max_line_len must be > 0");
        }
        if let Some(route) = self.routes.iter().find(|r| !r.path.starts_with('/')) {
            bail!("route path {:?} must start with '/'", route.path);
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}
