//! Session management over a pluggable coordination backend.
//!
//! [`Connector`] opens connections and [`Coordinator`] is the read surface of
//! an open connection. [`ZooKeeper`] implements both on top of
//! `zookeeper-client`; [`MemoryTree`](crate::memory::MemoryTree) implements
//! them in memory.
//!
//! A [`Session`] owns at most one connection and moves through
//! `Unstarted -> Started -> Closed`. Every operation checks the current state.

use std::fmt;

use async_trait::async_trait;
use tracing::{debug, info};
use zk_config::{ConnectionParams, SessionOptions};
use zookeeper_client as zk;

use crate::error::{ZkError, ZkResult};
use crate::retry::RetryPolicy;

/// Opens connections to a coordination service.
#[async_trait]
pub trait Connector: Send + Sync + fmt::Debug + 'static {
    /// Connection type produced by this connector.
    type Conn: Coordinator;

    /// Establish a connection to `endpoint` (`host:port`).
    async fn connect(&self, endpoint: &str, options: &SessionOptions) -> ZkResult<Self::Conn>;
}

/// Read operations on an open connection.
///
/// Dropping the connection releases it.
#[async_trait]
pub trait Coordinator: Send + Sync + 'static {
    /// Names of the immediate children of `path`.
    async fn list_children(&self, path: &str) -> ZkResult<Vec<String>>;

    /// Raw bytes stored at `path`.
    async fn get_data(&self, path: &str) -> ZkResult<Vec<u8>>;
}

/// Connector for a real ZooKeeper ensemble.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZooKeeper;

#[async_trait]
impl Connector for ZooKeeper {
    type Conn = zk::Client;

    async fn connect(&self, endpoint: &str, options: &SessionOptions) -> ZkResult<zk::Client> {
        let mut connector = zk::Client::connector();
        connector.session_timeout(options.session_timeout);
        connector.connection_timeout(options.connection_timeout);
        connector.connect(endpoint).await.map_err(|e| {
            ZkError::Connection(format!("failed to connect to '{endpoint}': {e}"))
        })
    }
}

#[async_trait]
impl Coordinator for zk::Client {
    async fn list_children(&self, path: &str) -> ZkResult<Vec<String>> {
        zk::Client::list_children(self, path)
            .await
            .map_err(|e| map_client_error("list_children", path, e))
    }

    async fn get_data(&self, path: &str) -> ZkResult<Vec<u8>> {
        let (data, _stat) = zk::Client::get_data(self, path)
            .await
            .map_err(|e| map_client_error("get_data", path, e))?;
        Ok(data)
    }
}

fn map_client_error(op: &str, path: &str, err: zk::Error) -> ZkError {
    match err {
        zk::Error::NoNode => ZkError::resolution(path, "node does not exist"),
        // transport and session failures; all retryable
        zk::Error::ConnectionLoss
        | zk::Error::SessionExpired
        | zk::Error::SessionMoved
        | zk::Error::Timeout
        | zk::Error::NoHosts
        | zk::Error::ClientClosed => ZkError::Connection(format!("{op} '{path}' failed: {err}")),
        other => ZkError::resolution(path, other),
    }
}

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// Created, no connection attempted yet.
    Unstarted,
    /// Connected.
    Started,
    /// Closed; terminal.
    Closed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Unstarted => write!(f, "unstarted"),
            SessionStatus::Started => write!(f, "started"),
            SessionStatus::Closed => write!(f, "closed"),
        }
    }
}

enum State<T> {
    Unstarted,
    Started(T),
    Closed,
}

impl<T> State<T> {
    fn status(&self) -> SessionStatus {
        match self {
            State::Unstarted => SessionStatus::Unstarted,
            State::Started(_) => SessionStatus::Started,
            State::Closed => SessionStatus::Closed,
        }
    }
}

/// A single client session, exclusively owned by one resource handle.
pub struct Session<C: Connector = ZooKeeper> {
    endpoint: String,
    options: SessionOptions,
    retry: RetryPolicy,
    connector: C,
    state: State<C::Conn>,
}

impl<C: Connector> Session<C> {
    /// Create an unstarted session bound to `params.endpoint()`.
    ///
    /// No network activity happens until [`start`](Self::start).
    pub fn new(params: &ConnectionParams, connector: C) -> Self {
        Self {
            endpoint: params.endpoint(),
            options: params.session,
            retry: params.session.retry.into(),
            connector,
            state: State::Unstarted,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Connect, retrying connection failures under the retry policy.
    ///
    /// Starting a started session does nothing. Starting a closed session
    /// fails with [`ZkError::Lifecycle`].
    pub async fn start(&mut self) -> ZkResult<()> {
        match self.state.status() {
            SessionStatus::Started => {
                debug!(endpoint = %self.endpoint, "session already started, skipping start");
                return Ok(());
            }
            SessionStatus::Closed => {
                return Err(ZkError::Lifecycle {
                    op: "start",
                    state: SessionStatus::Closed,
                });
            }
            SessionStatus::Unstarted => {}
        }

        info!(
            endpoint = %self.endpoint,
            session_timeout_ms = self.options.session_timeout.as_millis(),
            max_retries = self.retry.max_retries,
            "starting zookeeper session"
        );

        let connector = &self.connector;
        let endpoint = self.endpoint.as_str();
        let options = &self.options;
        let conn = self
            .retry
            .run("connect", || connector.connect(endpoint, options))
            .await?;

        self.state = State::Started(conn);
        info!(endpoint = %self.endpoint, "zookeeper session established");
        Ok(())
    }

    /// Release the connection. Closing an unstarted or closed session is fine.
    pub fn close(&mut self) {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Started(conn) => {
                drop(conn);
                info!(endpoint = %self.endpoint, "zookeeper session closed");
            }
            State::Unstarted => {
                debug!(endpoint = %self.endpoint, "closing session that was never started");
            }
            State::Closed => {
                debug!(endpoint = %self.endpoint, "session already closed");
            }
        }
    }

    fn conn(&self, op: &'static str) -> ZkResult<&C::Conn> {
        match &self.state {
            State::Started(conn) => Ok(conn),
            other => Err(ZkError::Lifecycle {
                op,
                state: other.status(),
            }),
        }
    }

    /// Immediate child names of `path`.
    pub async fn list_children(&self, path: &str) -> ZkResult<Vec<String>> {
        let conn = self.conn("list_children")?;
        self.retry
            .run("list_children", || conn.list_children(path))
            .await
    }

    /// Raw bytes stored at `path`.
    pub async fn get_data(&self, path: &str) -> ZkResult<Vec<u8>> {
        let conn = self.conn("get_data")?;
        self.retry.run("get_data", || conn.get_data(path)).await
    }
}

impl<C: Connector> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("status", &self.status())
            .field("retry", &self.retry)
            .field("connector", &self.connector)
            .finish_non_exhaustive()
    }
}
