//! Caller-facing resource handle: one URL, one resolved path, one session.

use std::time::Duration;

use tracing::{debug, info};
use url::Url;
use zk_config::ConnectionParams;

use crate::client::{Connector, Session, SessionStatus, ZooKeeper};
use crate::error::{ZkError, ZkResult};
use crate::namespace::{Pairs, list_children_with_values};
use crate::path::{build_path, validate_path};
use crate::stream::ZkStream;

/// An open resolution context for a single URL.
///
/// Created unstarted; [`resolve`](Self::resolve) connects on first use. The
/// caller must [`close`](Self::close) it on both success and failure paths.
#[derive(Debug)]
pub struct ResourceHandle<C: Connector = ZooKeeper> {
    url: Url,
    path: String,
    session: Session<C>,
}

impl ResourceHandle<ZooKeeper> {
    /// Open a handle against a real ZooKeeper ensemble.
    pub fn open(url: &str, params: &ConnectionParams) -> ZkResult<Self> {
        Self::open_with(url, params, ZooKeeper)
    }
}

impl<C: Connector> ResourceHandle<C> {
    /// Open a handle using `connector` to reach the coordination service.
    ///
    /// Validates `params`, derives the node path from the URL's path and
    /// creates an unstarted session. Nothing touches the network here.
    pub fn open_with(url: &str, params: &ConnectionParams, connector: C) -> ZkResult<Self> {
        params.validate()?;

        let url = Url::parse(url)
            .map_err(|e| ZkError::Config(format!("malformed url '{url}': {e}")))?;
        let url_path = urlencoding::decode(url.path())
            .map_err(|e| ZkError::Config(format!("url path of '{url}' is not UTF-8: {e}")))?;
        let path = build_path(&params.root_path, &url_path);
        validate_path(&path)?;

        let session = Session::new(params, connector);
        debug!(%url, path, endpoint = session.endpoint(), "opened resource handle");

        Ok(Self { url, path, session })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Absolute node path this handle resolves.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    /// Start the session.
    pub async fn connect(&mut self) -> ZkResult<()> {
        self.session.start().await
    }

    /// Read the children of the handle's path, connecting first if needed.
    ///
    /// Every call reads the tree again.
    pub async fn resolve(&mut self) -> ZkResult<Pairs> {
        match self.session.status() {
            SessionStatus::Unstarted => self.connect().await?,
            SessionStatus::Closed => {
                return Err(ZkError::Lifecycle {
                    op: "resolve",
                    state: SessionStatus::Closed,
                });
            }
            SessionStatus::Started => {}
        }
        let pairs = list_children_with_values(&self.session, &self.path).await?;
        info!(path = %self.path, pairs = pairs.len(), "resolved namespace");
        Ok(pairs)
    }

    /// [`resolve`](Self::resolve) bounded by `deadline`, connecting included.
    pub async fn resolve_with_deadline(&mut self, deadline: Duration) -> ZkResult<Pairs> {
        match tokio::time::timeout(deadline, self.resolve()).await {
            Ok(res) => res,
            Err(_) => Err(ZkError::Timeout(format!(
                "resolving '{}' did not finish within {deadline:?}",
                self.path
            ))),
        }
    }

    /// Close the session. Safe whether or not it was ever started.
    pub fn close(&mut self) {
        self.session.close();
    }

    /// Wrap the handle for callers that expect a byte stream.
    pub fn into_stream(self) -> ZkStream<C> {
        ZkStream::new(self)
    }
}
