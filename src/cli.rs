use clap::{Parser, Subcommand};

use crate::codes::SiteOfService;

const DEFAULT_DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data");

#[derive(Parser, Debug)]
#[command(name = "reimbursement-backend")]
#[command(about = "Procedure code reimbursement explorer backend (DuckDB + axum)", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replace the stored procedure codes with a seed set (built-in, local file, or URL).
    Seed(SeedArgs),
    /// Serve the HTTP API (requires a completed seed unless --in-memory).
    Serve(ServeArgs),
    /// Calculate one reimbursement scenario and print the result.
    Scenario(ScenarioArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct SeedArgs {
    /// Backend data directory (DuckDB DB, downloads, meta.json).
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: String,

    /// JSON seed file: a local path or an http(s) URL. Defaults to the built-in codes.
    #[arg(long)]
    pub source: Option<String>,

    /// Do not download a URL source; error instead.
    #[arg(long)]
    pub offline: bool,

    /// Re-download a URL source even if a copy already exists.
    #[arg(long)]
    pub force_download: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Backend data directory (DuckDB DB and meta.json).
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: String,

    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, default_value_t = 3001)]
    pub port: u16,

    /// Serve the built-in seed codes from memory instead of the DuckDB store.
    #[arg(long)]
    pub in_memory: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ScenarioArgs {
    /// Backend data directory (DuckDB DB).
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: String,

    /// Use the built-in seed codes instead of the DuckDB store.
    #[arg(long)]
    pub in_memory: bool,

    /// Procedure code, e.g. 36903.
    #[arg(long)]
    pub code: String,

    /// Site of service: IPPS, HOPD, ASC or OBL.
    #[arg(long)]
    pub site: SiteOfService,

    /// Device acquisition cost. Negative values parse and are then rejected by validation.
    #[arg(long, allow_negative_numbers = true)]
    pub device_cost: f64,

    /// Optional NTAP add-on payment.
    #[arg(long, allow_negative_numbers = true)]
    pub ntap_add_on: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioRequest;

    fn scenario_args(extra: &[&str]) -> ScenarioArgs {
        let mut argv = vec!["reimbursement-backend", "scenario", "--code", "36903", "--site", "HOPD"];
        argv.extend_from_slice(extra);
        match Args::try_parse_from(argv).unwrap().cmd {
            Command::Scenario(cmd) => cmd,
            _ => panic!("expected scenario subcommand"),
        }
    }

    #[test]
    fn negative_amounts_reach_validation() {
        let cmd = scenario_args(&["--device-cost", "-5", "--ntap-add-on", "-1.5"]);
        assert_eq!(cmd.device_cost, -5.0);
        assert_eq!(cmd.ntap_add_on, Some(-1.5));

        let err = ScenarioRequest::new(cmd.code, cmd.site, cmd.device_cost, cmd.ntap_add_on)
            .unwrap_err();
        let paths: Vec<&str> = err.details.iter().map(|d| d.path.as_str()).collect();
        assert!(paths.contains(&"deviceCost"), "{paths:?}");
    }

    #[test]
    fn positive_amounts_parse() {
        let cmd = scenario_args(&["--device-cost", "5800"]);
        assert_eq!(cmd.site, SiteOfService::Hopd);
        assert_eq!(cmd.device_cost, 5800.0);
        assert_eq!(cmd.ntap_add_on, None);
    }
}
