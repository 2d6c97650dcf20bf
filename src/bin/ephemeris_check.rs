use std::process::ExitCode;

use chrono::Local;

use code_history::check::run_check;
use code_history::config::Config;
use code_history::db::Repository;
use code_history::error::Result;
use code_history::logging;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init(tracing::Level::INFO);

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Connectivity check failed: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<()> {
    let config = Config::load()?;
    println!("Checking store at {}", config.db_path);

    let repository = Repository::new(&config.db_path).await?;
    println!("Connection: OK");

    let report = run_check(&repository, Local::now().date_naive()).await?;
    println!("Facts stored: {}", report.fact_count);
    println!("Insert: OK (probe #{})", report.probe_id);
    if report.probe_deleted {
        println!("Delete: OK");
    } else {
        println!("Delete: FAILED, remove probe #{} by hand", report.probe_id);
    }

    Ok(())
}
