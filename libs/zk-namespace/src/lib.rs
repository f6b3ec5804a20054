//! # zk-namespace
//!
//! Resolve a URL into the immediate children of a ZooKeeper node, each
//! child's name and value forming one entry of a key-value map.
//!
//! This library provides:
//! - **Path builder** joining a configured root node with a URL's path.
//! - **Session manager** with an explicit `Unstarted -> Started -> Closed`
//!   lifecycle and exponential-backoff retries.
//! - **Namespace resolver** reading every child value in one all-or-nothing
//!   operation.
//! - **Resource handle** binding a URL, its node path and a session, plus a
//!   stream-shaped adapter and a blocking facade for legacy callers.
//! - **In-memory tree** implementing the backend traits without ZooKeeper.
//!
//! ```no_run
//! # async fn run() -> zk_namespace::ZkResult<()> {
//! use zk_config::ConnectionParams;
//! use zk_namespace::ResourceHandle;
//!
//! let params = ConnectionParams::new("localhost", 2181, "/config")?;
//! let mut handle = ResourceHandle::open("zk://localhost/app/db", &params)?;
//! let pairs = handle.resolve().await;
//! handle.close();
//! println!("{:?}", pairs?);
//! # Ok(())
//! # }
//! ```
//!
//! The library is read-only: no writes, no watches, no recursive traversal.

pub mod blocking;
pub mod client;
pub mod error;
pub mod handle;
pub mod memory;
pub mod namespace;
pub mod path;
pub mod retry;
pub mod stream;

pub use blocking::BlockingHandle;
pub use client::{Connector, Coordinator, Session, SessionStatus, ZooKeeper};
pub use error::{ZkError, ZkResult};
pub use handle::ResourceHandle;
pub use memory::MemoryTree;
pub use namespace::{Pairs, list_children_with_values};
pub use path::{build_path, validate_path};
pub use retry::RetryPolicy;
pub use stream::ZkStream;
