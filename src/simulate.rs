use anyhow::{Context, anyhow};

use crate::cli::ScenarioArgs;
use crate::error::LookupError;
use crate::format::format_currency;
use crate::scenario::{ScenarioRequest, ScenarioResponse, run_scenario};
use crate::seed::builtin_records;
use crate::storage::{StoragePaths, file_present_nonempty};
use crate::store::{CodeRepository, DuckDbCodeRepository, InMemoryCodeRepository};

pub fn run(opts: ScenarioArgs) -> anyhow::Result<()> {
    let request = ScenarioRequest::new(
        opts.code.clone(),
        opts.site,
        opts.device_cost,
        opts.ntap_add_on,
    )
    .map_err(|e| {
        let fields: Vec<String> = e
            .details
            .iter()
            .map(|i| format!("{}: {}", i.path, i.message))
            .collect();
        anyhow!("{} ({})", e.message, fields.join("; "))
    })?;

    let repo = open_repo(&opts)?;
    let result = match run_scenario(repo.as_ref(), &request) {
        Ok(r) => r,
        Err(LookupError::NotFound(code)) => {
            return Err(anyhow!("Procedure code {code} not found"));
        }
        Err(LookupError::Store(e)) => return Err(e).context("calculate scenario"),
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    println!("{}", summary_line(&request, &result));
    Ok(())
}

fn open_repo(opts: &ScenarioArgs) -> anyhow::Result<Box<dyn CodeRepository>> {
    if opts.in_memory {
        let records = builtin_records().context("parse built-in seed")?;
        return Ok(Box::new(InMemoryCodeRepository::new(records)?));
    }
    let paths = StoragePaths::new(&opts.data_dir);
    if !file_present_nonempty(&paths.duckdb_path) {
        return Err(anyhow!(
            "DuckDB not found at {}. Run: reimbursement-backend seed (or pass --in-memory)",
            paths.duckdb_path.display()
        ));
    }
    let repo = DuckDbCodeRepository::open(&paths.duckdb_path)
        .with_context(|| format!("open duckdb at {}", paths.duckdb_path.display()))?;
    Ok(Box::new(repo))
}

fn summary_line(request: &ScenarioRequest, result: &ScenarioResponse) -> String {
    format!(
        "{} @ {}: total {} - device {} = margin {} ({})",
        request.code(),
        request.site_of_service(),
        format_currency(result.total_payment),
        format_currency(request.device_cost()),
        format_currency(result.margin),
        result.classification.as_str(),
    )
}
