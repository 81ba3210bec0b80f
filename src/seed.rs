use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};

use crate::cli::SeedArgs;
use crate::codes::ProcedureCode;
use crate::download;
use crate::store::DuckDbCodeRepository;
use crate::storage::StoragePaths;

const BUILTIN_SEED: &str = include_str!("../seeds/procedure_codes.json");
const BUILTIN_SOURCE: &str = "builtin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedMeta {
    pub seeded_at_unix: u64,
    pub source: String,
    pub duckdb_path: String,
    pub code_count: u64,
}

/// The codes bundled with the binary.
pub fn builtin_records() -> Result<Vec<ProcedureCode>, serde_json::Error> {
    serde_json::from_str(BUILTIN_SEED)
}

/// Parses a JSON array of procedure code records.
pub fn parse_records(json: &str) -> anyhow::Result<Vec<ProcedureCode>> {
    let records: Vec<ProcedureCode> =
        serde_json::from_str(json).context("parse seed JSON (expected an array of codes)")?;
    for r in &records {
        r.validate()?;
    }
    Ok(records)
}

pub async fn run(opts: SeedArgs) -> anyhow::Result<()> {
    tracing::info!("reimbursement-backend seed");
    tracing::info!("data_dir={}", opts.data_dir);

    let paths = StoragePaths::new(&opts.data_dir);
    paths
        .ensure_dirs()
        .context("create backend data directories")?;

    tracing::info!("Step 1/3: load seed records");
    let (source, records) = load_source(&paths, &opts).await?;
    tracing::info!("Loaded {} records from {}", records.len(), source);

    tracing::info!("Step 2/3: replace procedure_codes in DuckDB");
    let repo = DuckDbCodeRepository::open(&paths.duckdb_path)
        .with_context(|| format!("open duckdb at {}", paths.duckdb_path.display()))?;
    let inserted = repo.replace_all(&records).context("replace procedure codes")?;
    let code_count = repo.count()?;
    tracing::info!("Inserted {} codes ({} stored)", inserted, code_count);

    tracing::info!("Step 3/3: write meta.json");
    let meta = SeedMeta {
        seeded_at_unix: now_unix_secs(),
        source,
        duckdb_path: paths.duckdb_path.display().to_string(),
        code_count,
    };
    write_json(&paths.meta_path, &meta).context("write meta.json")?;

    tracing::info!("Seed complete.");
    tracing::info!("DuckDB: {}", paths.duckdb_path.display());
    Ok(())
}

async fn load_source(
    paths: &StoragePaths,
    opts: &SeedArgs,
) -> anyhow::Result<(String, Vec<ProcedureCode>)> {
    let Some(source) = opts.source.as_deref() else {
        let records = builtin_records().context("parse built-in seed")?;
        return Ok((BUILTIN_SOURCE.to_string(), records));
    };

    let local: PathBuf = if download::is_remote(source) {
        let dest = paths.downloaded_seed(source);
        download::ensure_file(source, &dest, opts.offline, opts.force_download).await?;
        dest
    } else {
        PathBuf::from(source)
    };

    if !local.is_file() {
        return Err(anyhow!("Seed file not found at {}", local.display()));
    }
    let json = std::fs::read_to_string(&local)
        .with_context(|| format!("read {}", local.display()))?;
    let records = parse_records(&json).with_context(|| format!("load {}", local.display()))?;
    Ok((source.to_string(), records))
}

pub fn read_meta(path: &Path) -> Option<serde_json::Value> {
    let s = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&s).ok()
}

fn write_json(path: &Path, v: &impl Serialize) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let s = serde_json::to_string_pretty(v)?;
    std::fs::write(path, s)?;
    Ok(())
}

fn now_unix_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
