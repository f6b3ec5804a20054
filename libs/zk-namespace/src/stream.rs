//! Byte-stream shaped adapter over a [`ResourceHandle`].
//!
//! Some callers only know how to hold a stream. [`ZkStream`] satisfies
//! `std::io::Read` and `tokio::io::AsyncRead` so it can be passed around, but
//! every byte-level primitive fails with [`io::ErrorKind::Unsupported`]
//! wrapping [`ZkError::Unsupported`]. The content is only reachable through
//! [`ZkStream::pairs`].

use std::io::{self, Read};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

use crate::client::{Connector, ZooKeeper};
use crate::error::{ZkError, ZkResult};
use crate::handle::ResourceHandle;
use crate::namespace::Pairs;

fn unsupported(op: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, ZkError::Unsupported(op))
}

/// A resource handle posing as a stream. See the module docs.
#[derive(Debug)]
pub struct ZkStream<C: Connector = ZooKeeper> {
    handle: ResourceHandle<C>,
}

impl<C: Connector> ZkStream<C> {
    pub fn new(handle: ResourceHandle<C>) -> Self {
        Self { handle }
    }

    /// Resolve the underlying handle.
    pub async fn pairs(&mut self) -> ZkResult<Pairs> {
        self.handle.resolve().await
    }

    /// Close the underlying handle.
    pub fn close(&mut self) {
        self.handle.close();
    }

    /// Always fails.
    pub fn skip(&mut self, _n: u64) -> io::Result<u64> {
        Err(unsupported("skip"))
    }

    /// Always fails.
    pub fn available(&self) -> io::Result<usize> {
        Err(unsupported("available"))
    }

    pub fn handle(&self) -> &ResourceHandle<C> {
        &self.handle
    }

    pub fn into_inner(self) -> ResourceHandle<C> {
        self.handle
    }
}

impl<C: Connector> Read for ZkStream<C> {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(unsupported("read"))
    }
}

impl<C: Connector> AsyncRead for ZkStream<C> {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(unsupported("read")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SessionStatus;
    use crate::memory::MemoryTree;
    use tokio::io::AsyncReadExt;
    use zk_config::ConnectionParams;

    fn stream(tree: &MemoryTree) -> ZkStream<MemoryTree> {
        let params = ConnectionParams::new("localhost", 2181, "/config").unwrap();
        ResourceHandle::open_with("zk://localhost/app", &params, tree.clone())
            .unwrap()
            .into_stream()
    }

    fn assert_unsupported(err: io::Error, op: &str) {
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        let inner = err
            .get_ref()
            .and_then(|e| e.downcast_ref::<ZkError>())
            .expect("wrapped ZkError");
        assert!(matches!(inner, ZkError::Unsupported(o) if *o == op));
    }

    fn assert_all_reads_fail(s: &mut ZkStream<MemoryTree>) {
        let mut byte = [0u8; 1];
        assert_unsupported(Read::read(s, &mut byte).unwrap_err(), "read");
        let mut buf = [0u8; 64];
        assert_unsupported(Read::read(s, &mut buf[8..32]).unwrap_err(), "read");
        let mut all = Vec::new();
        assert_unsupported(Read::read_to_end(s, &mut all).unwrap_err(), "read");
        assert!(all.is_empty());
        assert_unsupported(s.skip(10).unwrap_err(), "skip");
        assert_unsupported(s.available().unwrap_err(), "available");
    }

    #[tokio::test]
    async fn test_reads_fail_in_every_state() {
        let tree = MemoryTree::new();
        tree.create("/config/app/a", "1");
        let mut s = stream(&tree);

        assert_eq!(s.handle().status(), SessionStatus::Unstarted);
        assert_all_reads_fail(&mut s);

        assert_eq!(s.pairs().await.unwrap()["a"], "1");
        assert_eq!(s.handle().status(), SessionStatus::Started);
        assert_all_reads_fail(&mut s);

        s.close();
        assert_eq!(s.handle().status(), SessionStatus::Closed);
        assert_all_reads_fail(&mut s);
        assert_eq!(tree.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_async_read_fails() {
        let tree = MemoryTree::new();
        let mut s = stream(&tree);
        let mut buf = [0u8; 16];
        let err = AsyncReadExt::read(&mut s, &mut buf).await.unwrap_err();
        assert_unsupported(err, "read");
        let mut all = Vec::new();
        assert_unsupported(
            AsyncReadExt::read_to_end(&mut s, &mut all).await.unwrap_err(),
            "read",
        );
        assert_eq!(tree.reads(), 0);
    }

    #[test]
    fn test_into_inner_round_trip() {
        let tree = MemoryTree::new();
        let handle = stream(&tree).into_inner();
        assert_eq!(handle.path(), "/config/app");
    }
}
