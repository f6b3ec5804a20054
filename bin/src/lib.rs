//! zk-url: resolve a URL against ZooKeeper and render the pairs as JSON.
use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::{debug, info};
use zk_namespace::{Connector, ResourceHandle};

pub mod config;

use config::cli;

/// Resolve `config.url` through `connector` and return the JSON document.
///
/// The handle is closed whether or not resolution succeeded.
pub async fn run_with<C: Connector>(config: &cli::Config, connector: C) -> Result<String> {
    let params = config.connection_params()?;
    info!(endpoint = %params.endpoint(), root = %params.root_path, "using zookeeper");

    let mut handle = ResourceHandle::open_with(&config.url, &params, connector)
        .with_context(|| format!("failed to open '{}'", config.url))?;
    debug!(path = handle.path(), "resolving");

    let res = match config.timeout() {
        Some(deadline) => handle.resolve_with_deadline(deadline).await,
        None => handle.resolve().await,
    };
    handle.close();
    let pairs = res.with_context(|| format!("failed to resolve '{}'", handle.path()))?;

    // sorted so output is stable across runs
    let sorted: BTreeMap<_, _> = pairs.into_iter().collect();
    let out = if config.pretty {
        serde_json::to_string_pretty(&sorted)?
    } else {
        serde_json::to_string(&sorted)?
    };
    Ok(out)
}
