use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use equipment_portal::config::{self, Config};
use equipment_portal::hris::{self, HrisClient};

#[derive(Parser, Debug)]
struct Args {
    /// Path to YAML config; without it, configuration is read from
    /// environment variables
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let cfg = match args.config.as_deref() {
        Some(path) => config::load(Some(path))?,
        None => Config::from_env(),
    };
    let client = HrisClient::from_config(&cfg);

    let json = client.fetch_employees().await?;
    let records = hris::employee_records(&json)
        .ok_or_else(|| anyhow!("unexpected employees payload shape"))?;
    let employees = hris::normalize_employees(records);

    println!("Employees: {}", employees.len());
    for emp in &employees {
        println!(
            "  {} -> {{ id: {}, branch: {}, department: {} }}",
            emp.name, emp.id, emp.branch, emp.department
        );
    }
    Ok(())
}
