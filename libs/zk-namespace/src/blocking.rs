//! Synchronous facade for callers without an async runtime.
//!
//! Each [`BlockingHandle`] owns a current-thread tokio runtime and blocks the
//! calling thread on it. Must not be used from inside an async context.
//! The runtime only runs while a call is in progress, so an idle handle does
//! not send keepalives; keep the session timeout above the expected idle gap.
//! [`BlockingHandle::close`] keeps the runtime running until the client's
//! background tasks finish, so the server sees the session end.

use std::time::Duration;

use tokio::runtime::{Builder, Handle, Runtime};
use tracing::debug;
use zk_config::ConnectionParams;

use crate::client::{Connector, SessionStatus, ZooKeeper};
use crate::error::{ZkError, ZkResult};
use crate::handle::ResourceHandle;
use crate::namespace::Pairs;

/// Upper bound on how long `close` waits for background tasks.
const CLOSE_DRAIN: Duration = Duration::from_secs(1);

/// Blocking counterpart of [`ResourceHandle`].
#[derive(Debug)]
pub struct BlockingHandle<C: Connector = ZooKeeper> {
    rt: Runtime,
    inner: ResourceHandle<C>,
}

impl BlockingHandle<ZooKeeper> {
    pub fn open(url: &str, params: &ConnectionParams) -> ZkResult<Self> {
        Self::from_handle(ResourceHandle::open(url, params)?)
    }
}

impl<C: Connector> BlockingHandle<C> {
    pub fn open_with(url: &str, params: &ConnectionParams, connector: C) -> ZkResult<Self> {
        Self::from_handle(ResourceHandle::open_with(url, params, connector)?)
    }

    pub fn from_handle(inner: ResourceHandle<C>) -> ZkResult<Self> {
        let rt = Builder::new_current_thread()
            .thread_name("zk-namespace-blocking")
            .enable_all()
            .build()
            .map_err(|e| ZkError::Connection(format!("failed to build runtime: {e}")))?;
        Ok(Self { rt, inner })
    }

    pub fn path(&self) -> &str {
        self.inner.path()
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.status()
    }

    pub fn connect(&mut self) -> ZkResult<()> {
        self.rt.block_on(self.inner.connect())
    }

    pub fn resolve(&mut self) -> ZkResult<Pairs> {
        self.rt.block_on(self.inner.resolve())
    }

    pub fn resolve_with_deadline(&mut self, deadline: Duration) -> ZkResult<Pairs> {
        self.rt.block_on(self.inner.resolve_with_deadline(deadline))
    }

    pub fn close(&mut self) {
        let Self { rt, inner } = self;
        rt.block_on(async {
            inner.close();
            // the session task only runs while the runtime is driven
            let drained = tokio::time::timeout(CLOSE_DRAIN, async {
                while Handle::current().metrics().num_alive_tasks() > 0 {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
            .await;
            if drained.is_err() {
                debug!(
                    path = inner.path(),
                    tasks = Handle::current().metrics().num_alive_tasks(),
                    "background tasks still running after close"
                );
            }
        });
    }

    pub fn into_inner(self) -> ResourceHandle<C> {
        self.inner
    }
}
