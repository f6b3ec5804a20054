//! zk-url configs

pub mod cli {
    //! Parse from either cli or env var

    /// default log level. Can use this argument or ZK_LOG env var
    pub const DEFAULT_ZK_LOG: &str = "info";
    /// log as "json", "pretty" or "standard" (unstructured)
    pub const DEFAULT_LOG_FORMAT: &str = "standard";

    use std::{path::PathBuf, time::Duration};

    use anyhow::{Context, Result};
    pub use clap::Parser;
    use zk_config::{ConnectionParams, wire};

    #[derive(Parser, Debug, Clone, PartialEq, Eq)]
    #[clap(author, name = "zk-url", bin_name = "zk-url", about, long_about = None)]
    /// resolves a URL into the children of a ZooKeeper node and prints them as JSON.
    /// zk-url will load `.env` from the working directory as well
    pub struct Config {
        /// URL to resolve; only its path is used, appended to the root node
        #[clap(value_parser)]
        pub url: String,
        /// ZooKeeper host
        #[clap(long, env = zk_config::HOST_VAR, value_parser)]
        pub host: Option<String>,
        /// ZooKeeper client port
        #[clap(long, env = zk_config::PORT_VAR, value_parser)]
        pub port: Option<u16>,
        /// root node every URL path is resolved under
        #[clap(long, env = zk_config::ROOT_VAR, value_parser)]
        pub root_path: Option<String>,
        /// optional YAML/JSON file with connection parameters; flags take precedence
        #[clap(short, long, env = "ZK_URL_CONFIG", value_parser)]
        pub config_path: Option<PathBuf>,
        /// give up resolving after this many seconds, connecting included
        #[clap(long, env = "ZK_URL_TIMEOUT", value_parser)]
        pub timeout: Option<u64>,
        /// pretty-print the JSON output
        #[clap(long)]
        pub pretty: bool,
        /// set the log level. All valid RUST_LOG arguments are accepted
        #[clap(long, env, value_parser, default_value = DEFAULT_ZK_LOG)]
        pub zk_log: String,
        /// log output format: json, pretty or standard
        #[clap(long, env, value_parser, default_value = DEFAULT_LOG_FORMAT)]
        pub log_format: String,
    }

    impl Config {
        /// Create the optional deadline as `Duration`
        pub fn timeout(&self) -> Option<Duration> {
            self.timeout.map(Duration::from_secs)
        }

        /// Connection parameters from flags/env, falling back to the config file
        pub fn connection_params(&self) -> Result<ConnectionParams> {
            let flags = wire::Params {
                host: self.host.clone(),
                port: self.port,
                root_path: self.root_path.clone(),
                session: wire::Session::default(),
            };
            let file = match &self.config_path {
                Some(path) => wire::Params::parse(path)?,
                None => wire::Params::default(),
            };
            ConnectionParams::try_from(ConnectionParams::overlay(flags, file))
                .context("incomplete zookeeper connection parameters")
        }
    }
}

pub mod trace {
    //! tracing configuration
    use anyhow::Result;
    use tracing_subscriber::{
        Layer, Registry,
        filter::EnvFilter,
        fmt::{
            self, MakeWriter,
            format::{Format, PrettyFields},
        },
        prelude::__tracing_subscriber_SubscriberExt,
        util::SubscriberInitExt,
    };

    /// Logging setup; output always goes to stderr so stdout stays JSON
    #[derive(Debug)]
    pub struct Config {
        /// formatting to apply to logs
        pub log_frmt: String,
    }

    impl Config {
        /// Install the global subscriber
        pub fn parse(zk_log: &str, log_frmt: &str) -> Result<Self> {
            let filter = EnvFilter::try_new(zk_log).or_else(|_| EnvFilter::try_new("info"))?;
            tracing_subscriber::registry()
                .with(layer(log_frmt, std::io::stderr))
                .with(filter)
                .try_init()?;

            Ok(Self {
                log_frmt: log_frmt.to_owned(),
            })
        }
    }

    /// Formatting layer for `log_frmt`; unknown formats fall back to standard
    pub fn layer<W>(log_frmt: &str, writer: W) -> Box<dyn Layer<Registry> + Send + Sync>
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        match log_frmt {
            "json" => fmt::layer().json().with_writer(writer).boxed(),
            "pretty" => fmt::layer()
                .event_format(Format::default().pretty().with_source_location(false))
                .fmt_fields(PrettyFields::new())
                .with_writer(writer)
                .boxed(),
            _ => fmt::layer().with_writer(writer).boxed(),
        }
    }

}
