use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::storage::file_present_nonempty;

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Makes sure a copy of `url` exists at `dest`, downloading it unless one is already there.
pub async fn ensure_file(
    url: &str,
    dest: &Path,
    offline: bool,
    force: bool,
) -> anyhow::Result<()> {
    if !force && file_present_nonempty(dest) {
        tracing::info!("Reusing downloaded seed at {}", dest.display());
        return Ok(());
    }

    if offline {
        return Err(anyhow!(
            "Missing seed file at {} (run without --offline to download it from {}).",
            dest.display(),
            url
        ));
    }
    fetch_to(url, dest).await
}

/// Streams the response body into a staging file beside `dest`, renaming it into place
/// only after the whole body has arrived. A failed transfer removes the staging file.
async fn fetch_to(url: &str, dest: &Path) -> anyhow::Result<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create {}", parent.display()))?;
    }
    tracing::info!("Fetching seed {} -> {}", url, dest.display());

    let resp = reqwest::get(url)
        .await
        .and_then(reqwest::Response::error_for_status)
        .with_context(|| format!("fetch seed from {url}"))?;

    let staging = staging_path(dest);
    let written = match write_body(resp, &staging).await {
        Ok(n) => n,
        Err(err) => {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(err.context(format!("download {url}")));
        }
    };
    tokio::fs::rename(&staging, dest)
        .await
        .with_context(|| format!("move {} into place", staging.display()))?;

    tracing::info!("Fetched {} bytes into {}", written, dest.display());
    Ok(())
}

async fn write_body(resp: reqwest::Response, path: &Path) -> anyhow::Result<u64> {
    let mut out = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("create {}", path.display()))?;
    let mut body = resp.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        out.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    out.sync_all().await?;
    Ok(written)
}

fn staging_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(OsString::from).unwrap_or_else(|| "seed".into());
    name.push(".part");
    dest.with_file_name(name)
}
