use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::warn;

use equipment_portal::config::{self, Config};
use equipment_portal::form::{FormController, FormField, SubmitOutcome};
use equipment_portal::hris::HrisClient;
use equipment_portal::payment::PaymentClient;

/// Submit an equipment payment request from the command line, going through
/// the same form pipeline the web form uses.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config; without it, configuration is read from
    /// environment variables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Employee full name; branch and department fill themselves when the
    /// directory finds exactly one match
    #[arg(long)]
    full_name: String,

    #[arg(long)]
    branch: Option<String>,

    #[arg(long)]
    department: Option<String>,

    #[arg(long)]
    equipment_name: String,

    /// Link to the online store listing
    #[arg(long)]
    link: String,

    #[arg(long)]
    bank_name: String,

    #[arg(long)]
    bank_branch: String,

    #[arg(long)]
    account_number: String,

    #[arg(long)]
    account_name: String,

    /// Price in rupiah; non-digits are stripped
    #[arg(long)]
    price: String,

    /// Date needed, YYYY-MM-DD
    #[arg(long)]
    date: String,

    /// Details / specifications
    #[arg(long)]
    details: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = match args.config.as_deref() {
        Some(path) => config::load(Some(path))?,
        None => Config::from_env(),
    };

    let directory = HrisClient::from_config(&cfg);
    let payments = PaymentClient::from_config(&cfg);

    let mut form = FormController::new();
    form.load_directory(&directory).await;
    if form.employees().is_empty() {
        warn!("employee directory unavailable, autocomplete disabled");
    }

    form.input_full_name(&args.full_name);
    if args.branch.is_none() && args.department.is_none() && form.name_suggestions().len() == 1 {
        let employee = form.name_suggestions()[0].clone();
        println!(
            "Matched employee {} ({} / {})",
            employee.name, employee.branch, employee.department
        );
        form.pick_employee(&employee);
    }
    if let Some(branch) = &args.branch {
        form.input_branch(branch);
    }
    if let Some(department) = &args.department {
        form.input_department(department);
    }
    form.set_field(FormField::EquipmentName, &args.equipment_name);
    form.set_field(FormField::OnlineStoreLink, &args.link);
    form.set_field(FormField::BankName, &args.bank_name);
    form.set_field(FormField::BankBranch, &args.bank_branch);
    form.set_field(FormField::BankAccountNumber, &args.account_number);
    form.set_field(FormField::BankAccountName, &args.account_name);
    form.input_price(&args.price);
    form.set_field(FormField::DateNeeded, &args.date);
    form.set_field(FormField::Details, &args.details);

    match form.submit(&payments).await {
        SubmitOutcome::Submitted => {
            let notif = form.notification();
            println!("{}: {}", notif.title, notif.message);
            Ok(())
        }
        SubmitOutcome::Failed => {
            let notif = form.notification();
            Err(anyhow!("{}: {}", notif.title, notif.message))
        }
        SubmitOutcome::Rejected(field) => Err(anyhow!("required field missing: {}", field.label())),
    }
}
