//! CLI module for jobmgr
//!
//! Provides read-only operator tooling over a directory-backed store:
//! - inspect: list persisted job IDs and the checkpoint watermark
//!
//! Nothing here replays eventlogs or writes to the store.

mod args;
mod errors;

use std::path::Path;

use serde::Serialize;

use crate::checkpoint::CheckpointStore;
use crate::config::RestartConfig;
use crate::jobid::{IdEncoding, JobId};
use crate::kvs::{DirKvs, Kvs};
use crate::restart::NamespaceWalker;

pub use args::{Cli, Command};
pub use errors::{CliError, CliErrorCode, CliResult};

/// What `inspect` reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectReport {
    /// Namespace root that was walked
    pub namespace_root: String,
    /// Persisted jobs in walk order, dotted-hex encoded
    pub jobs: Vec<String>,
    /// Checkpointed watermark, absent if no checkpoint exists
    pub checkpoint_max_jobid: Option<JobId>,
}

/// Main CLI entry point
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Inspect { config } => inspect(&config),
    }
}

/// Print an [`InspectReport`] for the configured store as JSON
pub fn inspect(config_path: &Path) -> CliResult<()> {
    let config = RestartConfig::load(config_path)?;
    let store_dir = config
        .store_dir
        .clone()
        .ok_or_else(|| CliError::config_error("store_dir is required for inspect"))?;
    let kvs = DirKvs::open(&store_dir)?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::runtime_error(format!("Failed to create tokio runtime: {}", e)))?;
    let report = rt.block_on(inspect_store(&kvs, &config))?;

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| CliError::store_error(format!("JSON error: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// Collects the report from any store
pub async fn inspect_store<K: Kvs + ?Sized>(
    kvs: &K,
    config: &RestartConfig,
) -> CliResult<InspectReport> {
    let ids = NamespaceWalker::new(kvs, &config.namespace_root)
        .collect_ids()
        .await?;

    let checkpoint = CheckpointStore::new(config.checkpoint_key.clone());
    let checkpoint_max_jobid = match checkpoint.restore(kvs).await {
        Ok(record) => Some(record.max_jobid),
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(e.into()),
    };

    Ok(InspectReport {
        namespace_root: config.namespace_root.clone(),
        jobs: ids.iter().map(|id| id.encode(IdEncoding::DotHex)).collect(),
        checkpoint_max_jobid,
    })
}
