//! mooring - 保存パスを手元で試すためのデモ CLI
//!
//! 1. 指定されたファイルを登録して handle を得る
//! 2. handle を埋め込んだ本文で保存（upload -> 置換 -> 孤児削除 -> 解放）
//! 3. `--remove` があれば、その参照を消した本文でもう一度保存して削除を確認する

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use mooring_core::domain::{CommittedAssetRecord, RemoteId};
use mooring_core::impls::InMemoryAssetGateway;
use mooring_core::ports::Notifier;
use mooring_core::{FileData, LocalHandle, SaveReport, SessionBuilder, SessionConfig};

/// Run a save pass against an in-memory asset store.
#[derive(Parser, Debug)]
#[command(name = "mooring", version, about)]
struct Cli {
    /// Files to insert into the document.
    #[arg(long = "file", required = true)]
    files: Vec<PathBuf>,

    /// Document id the assets are uploaded under.
    #[arg(long, default_value = "demo-doc")]
    owner: String,

    /// Session config (TOML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Make the store reject uploads of this file name (repeatable).
    #[arg(long = "fail-on")]
    fail_on: Vec<String>,

    /// Drop the reference to this file name and save again.
    #[arg(long)]
    remove: Option<String>,
}

/// Sends author-facing warnings to the log.
struct LogNotifier;

impl Notifier for LogNotifier {
    fn upload_failures(&self, file_names: &[String]) {
        warn!(files = ?file_names, "some files could not be uploaded");
    }

    fn deletion_failures(&self, remote_ids: &[RemoteId]) {
        warn!(remote_ids = ?remote_ids, "some remote assets could not be deleted");
    }
}

#[derive(Serialize)]
struct DemoOutput {
    saves: Vec<SaveReport>,
    records: Vec<CommittedAssetRecord>,
    stored: Vec<RemoteId>,
}

async fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading config {}", path.display()))?;
    SessionConfig::from_toml_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

async fn load_file(path: &Path) -> Result<FileData> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(FileData::new(name, Bytes::from(bytes)))
}

fn render(inserted: &[(String, LocalHandle)]) -> String {
    inserted
        .iter()
        .map(|(name, handle)| format!("<img alt='{name}' src='{handle}'>"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).await?;

    let mut gateway = InMemoryAssetGateway::new();
    for name in &cli.fail_on {
        gateway = gateway.fail_upload_of(name.clone());
    }
    let gateway = Arc::new(gateway);

    let session = SessionBuilder::new(gateway.clone())
        .config(config)
        .notifier(Arc::new(LogNotifier))
        .build()?;
    info!(session = %session.id(), owner = %cli.owner, "session opened");

    let mut inserted = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let file = load_file(path).await?;
        let name = file.name.clone();
        let handle = session.register(file)?;
        inserted.push((name, handle));
    }

    let mut saves = Vec::new();
    let first = session.finalize_save(&render(&inserted), &cli.owner).await;
    println!("{}", first.content);
    saves.push(first);

    if let Some(removed) = &cli.remove {
        // 2 回目の保存では handle ではなく 1 回目の本文（置換済み）を編集する
        let kept: Vec<&str> = saves[0]
            .content
            .lines()
            .filter(|line| !line.contains(&format!("alt='{removed}'")))
            .collect();
        let second = session.finalize_save(&kept.join("\n"), &cli.owner).await;
        println!("{}", second.content);
        saves.push(second);
    }

    let output = DemoOutput {
        saves,
        records: session.committed_records(),
        stored: gateway.stored_ids(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    session.close();
    Ok(())
}
