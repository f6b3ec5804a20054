#![allow(clippy::cognitive_complexity)]
use anyhow::Result;
use tokio::runtime::Builder;
use tracing::{debug, error};

use zk_namespace::ZooKeeper;
use zk_url::config::{
    cli::{self, Parser},
    trace,
};

fn main() -> Result<()> {
    // .env first so its values reach the env fallbacks below
    let dotenv_res = dotenv::dotenv();
    // parses from cli or environment var
    let config = cli::Config::parse();
    let trace_config = trace::Config::parse(&config.zk_log, &config.log_format)?;
    debug!(?config, ?trace_config);
    if let Err(err) = dotenv_res {
        debug!(?err, ".env file not loaded");
    }

    let rt = Builder::new_current_thread().enable_all().build()?;
    match rt.block_on(zk_url::run_with(&config, ZooKeeper)) {
        Ok(out) => {
            println!("{out}");
            Ok(())
        }
        Err(err) => {
            error!(?err, "failed to resolve url");
            Err(err)
        }
    }
}
