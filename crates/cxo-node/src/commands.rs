use std::sync::Arc;

use anyhow::Context;

use cxo_server::CxoServer;
use cxo_store::FileNodeStore;
use cxo_sync::SyncEngine;
use cxo_tracker::HttpTrackerClient;

use crate::cli::{Command, StartArgs};
use crate::config::NodeConfig;

pub async fn run_command(command: Command, config: NodeConfig) -> anyhow::Result<()> {
    match command {
        Command::Start(args) => cmd_start(config, args).await,
        Command::Config => cmd_config(&config),
    }
}

async fn cmd_start(config: NodeConfig, args: StartArgs) -> anyhow::Result<()> {
    let config = config.with_overrides(&args);
    let server_config = config.server_config()?;

    std::fs::create_dir_all(&config.storage.root).with_context(|| {
        format!(
            "cannot create storage root {}",
            config.storage.root.display()
        )
    })?;
    let index_path = config.index_path();
    let store = FileNodeStore::open(&index_path)
        .with_context(|| format!("cannot open index {}", index_path.display()))?;
    let tracker =
        HttpTrackerClient::new(config.tracker_config()).context("invalid tracker configuration")?;

    tracing::info!(
        storage = %config.storage.root.display(),
        tracker = %tracker.base_url(),
        gc_policy = ?config.sync.gc_policy,
        "starting CXO node"
    );

    let engine = Arc::new(SyncEngine::new(
        Arc::new(store),
        Arc::new(tracker),
        config.sync_config(),
    ));
    CxoServer::new(server_config, engine)
        .serve()
        .await
        .context("server failed")
}

fn cmd_config(config: &NodeConfig) -> anyhow::Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
