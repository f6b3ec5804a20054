//! Read the immediate children of a node as a key-value map.
//!
//! The whole read succeeds or fails as one unit: if listing or any single
//! value fetch fails, the partial map is discarded.

use std::collections::HashMap;

use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::client::{Connector, Session};
use crate::error::{ZkError, ZkResult};
use crate::path::build_path;

/// Child node name to its value decoded as text.
pub type Pairs = HashMap<String, String>;

/// List the children of `path` and fetch each child's value.
///
/// Values are decoded as UTF-8, replacing invalid sequences. Fetches run
/// concurrently on the session; the first failure aborts the rest.
pub async fn list_children_with_values<C: Connector>(
    session: &Session<C>,
    path: &str,
) -> ZkResult<Pairs> {
    let children = session.list_children(path).await?;
    debug!(path, children = children.len(), "listed children");

    let fetches = children.into_iter().map(|child| async move {
        let child_path = build_path(path, &child);
        let data = session.get_data(&child_path).await?;
        Ok::<_, ZkError>((child, String::from_utf8_lossy(&data).into_owned()))
    });

    match try_join_all(fetches).await {
        Ok(pairs) => Ok(pairs.into_iter().collect()),
        Err(err) => {
            warn!(path, error = %err, "failed to read child values");
            Err(err)
        }
    }
}
