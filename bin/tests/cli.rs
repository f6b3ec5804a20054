use std::io::Write;

use clap::Parser;
use tracing_test::traced_test;

use zk_namespace::MemoryTree;
use zk_url::{config::cli::Config, run_with};

fn tree() -> MemoryTree {
    let tree = MemoryTree::new();
    tree.create("/config/app/db/user", "alice")
        .create("/config/app/db/pass", "secret");
    tree
}

#[tokio::test]
#[traced_test]
async fn resolves_with_flags() {
    let config = Config::try_parse_from([
        "zk-url",
        "--host",
        "localhost",
        "--port",
        "2181",
        "--root-path",
        "/config",
        "zk://localhost/app/db",
    ])
    .expect("cli parse");

    let tree = tree();
    let out = run_with(&config, tree.clone()).await.expect("resolve");
    assert_eq!(out, r#"{"pass":"secret","user":"alice"}"#);
    assert_eq!(tree.open_sessions(), 0);
    assert!(logs_contain("using zookeeper"));
    assert!(logs_contain("localhost:2181"));
}

#[tokio::test]
async fn config_file_fills_missing_flags() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "host: zk.internal\nport: 2181\nroot_path: /other").unwrap();

    let path = file.path().to_str().unwrap().to_owned();
    let config = Config::try_parse_from([
        "zk-url",
        "--root-path",
        "/config",
        "--config-path",
        &path,
        "--pretty",
        "zk:///app/db",
    ])
    .expect("cli parse");

    let params = config.connection_params().unwrap();
    assert_eq!(params.host, "zk.internal");
    assert_eq!(params.root_path, "/config");

    let out = run_with(&config, tree()).await.expect("resolve");
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["user"], "alice");
    assert!(out.contains('\n'));
}

#[tokio::test]
async fn missing_node_closes_session_and_fails() {
    let config = Config::try_parse_from([
        "zk-url",
        "--host",
        "localhost",
        "--port",
        "2181",
        "--root-path",
        "/config",
        "--timeout",
        "5",
        "zk:///nope",
    ])
    .expect("cli parse");

    let tree = tree();
    let err = run_with(&config, tree.clone()).await.unwrap_err();
    assert!(format!("{err:#}").contains("/config/nope"));
    assert_eq!(tree.open_sessions(), 0);
}
