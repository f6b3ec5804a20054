//! # zk-config
//!
//! Connection parameters for resolving a ZooKeeper path into a key-value map.
//!
//! Parameters are an explicit value handed to whoever opens a resource handle.
//! They can be built directly, read from the `ZOOKEEPER_*` environment
//! variables, or decoded from a YAML/JSON file.
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    non_snake_case,
    non_upper_case_globals
)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::{env, fmt, path::Path, time::Duration};

use anyhow::Result;
use thiserror::Error;

pub mod wire;

/// env var holding the ZooKeeper host
pub const HOST_VAR: &str = "ZOOKEEPER_HOST";
/// env var holding the ZooKeeper client port
pub const PORT_VAR: &str = "ZOOKEEPER_PORT";
/// env var holding the root node every URL path is resolved under
pub const ROOT_VAR: &str = "ZOOKEEPER_NODE_ROOT";

/// Default ZooKeeper session timeout.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(60);
/// Default timeout for establishing a connection.
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(15);
/// Initial backoff of the retry policy.
pub const DEFAULT_BASE_SLEEP: Duration = Duration::from_millis(1000);
/// Retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Upper bound on a single backoff sleep.
pub const DEFAULT_MAX_SLEEP: Duration = Duration::from_secs(30);

/// Errors produced while assembling [`ConnectionParams`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamsError {
    /// One or more required parameters are absent or empty.
    #[error("host - port - zookeeper root node are needed, missing: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    /// The port value could not be parsed.
    #[error("invalid zookeeper port '{0}'")]
    InvalidPort(String),
}

/// Exponential backoff settings for connecting and reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    pub base_sleep: Duration,
    pub max_retries: u32,
    pub max_sleep: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            base_sleep: DEFAULT_BASE_SLEEP,
            max_retries: DEFAULT_MAX_RETRIES,
            max_sleep: DEFAULT_MAX_SLEEP,
        }
    }
}

/// Session tuning; everything here has a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub session_timeout: Duration,
    pub connection_timeout: Duration,
    pub retry: RetrySettings,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            session_timeout: DEFAULT_SESSION_TIMEOUT,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            retry: RetrySettings::default(),
        }
    }
}

impl From<wire::Session> for SessionOptions {
    fn from(session: wire::Session) -> Self {
        let defaults = RetrySettings::default();
        Self {
            session_timeout: session.session_timeout.unwrap_or(DEFAULT_SESSION_TIMEOUT),
            connection_timeout: session
                .connection_timeout
                .unwrap_or(DEFAULT_CONNECTION_TIMEOUT),
            retry: RetrySettings {
                base_sleep: session.retry.base_sleep.unwrap_or(defaults.base_sleep),
                max_retries: session.retry.max_retries.unwrap_or(defaults.max_retries),
                max_sleep: session.retry.max_sleep.unwrap_or(defaults.max_sleep),
            },
        }
    }
}

/// Where to find ZooKeeper and which node URL paths are resolved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub root_path: String,
    pub session: SessionOptions,
}

impl ConnectionParams {
    /// Build parameters with default session options.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        root_path: impl Into<String>,
    ) -> Result<Self, ParamsError> {
        let params = Self {
            host: host.into(),
            port,
            root_path: root_path.into(),
            session: SessionOptions::default(),
        };
        params.validate()?;
        Ok(params)
    }

    /// Replace the session options.
    pub fn with_session(mut self, session: SessionOptions) -> Self {
        self.session = session;
        self
    }

    /// Check that host, port and root path are all present.
    ///
    /// Fields are public, so callers holding a hand-built value should run
    /// this before use.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let mut missing = Vec::new();
        if self.host.trim().is_empty() {
            missing.push("host");
        }
        if self.port == 0 {
            missing.push("port");
        }
        if self.root_path.trim().is_empty() {
            missing.push("root_path");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ParamsError::Missing(missing))
        }
    }

    /// `host:port` connect string; IPv6 literals are bracketed.
    pub fn endpoint(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Read `ZOOKEEPER_HOST`, `ZOOKEEPER_PORT` and `ZOOKEEPER_NODE_ROOT`.
    pub fn from_env() -> Result<Self, ParamsError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Resolve parameters through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ParamsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup(PORT_VAR) {
            Some(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse::<u16>()
                    .map_err(|_| ParamsError::InvalidPort(raw.clone()))?,
            ),
            _ => None,
        };
        Self::try_from(wire::Params {
            host: lookup(HOST_VAR),
            port,
            root_path: lookup(ROOT_VAR),
            session: wire::Session::default(),
        })
    }

    /// Decode parameters from a file, as JSON first, then YAML.
    pub fn parse<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::try_from(wire::Params::parse(path)?)?)
    }

    /// Decode parameters from a string, as JSON first, then YAML.
    pub fn parse_str<S: AsRef<str>>(s: S) -> Result<Self> {
        Ok(Self::try_from(wire::Params::parse_str(s)?)?)
    }

    /// Fill any field missing from `raw` with the one from `fallback`.
    ///
    /// Used to layer CLI flags over a config file.
    pub fn overlay(raw: wire::Params, fallback: wire::Params) -> wire::Params {
        let session = if raw.session == wire::Session::default() {
            fallback.session
        } else {
            raw.session
        };
        wire::Params {
            host: raw.host.or(fallback.host),
            port: raw.port.or(fallback.port),
            root_path: raw.root_path.or(fallback.root_path),
            session,
        }
    }
}

impl TryFrom<wire::Params> for ConnectionParams {
    type Error = ParamsError;

    fn try_from(raw: wire::Params) -> Result<Self, Self::Error> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let host = non_empty(raw.host);
        let root_path = non_empty(raw.root_path);
        let port = raw.port.filter(|p| *p != 0);

        match (host, port, root_path) {
            (Some(host), Some(port), Some(root_path)) => Ok(Self {
                host,
                port,
                root_path,
                session: raw.session.into(),
            }),
            (host, port, root_path) => {
                let mut missing = Vec::new();
                if host.is_none() {
                    missing.push("host");
                }
                if port.is_none() {
                    missing.push("port");
                }
                if root_path.is_none() {
                    missing.push("root_path");
                }
                Err(ParamsError::Missing(missing))
            }
        }
    }
}

impl fmt::Display for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.endpoint(), self.root_path)
    }
}
