use std::process::ExitCode;

use chrono::Local;

use code_history::ai::{ClaudeClient, GenerationParams};
use code_history::config::Config;
use code_history::db::Repository;
use code_history::error::Result;
use code_history::generator::{resolve_target_date, Generator};
use code_history::logging;
use code_history::models::Fact;

const USAGE: &str = "Usage: generate-ephemeris [YYYY-MM-DD]\n\n\
Generates and stores the programming history fact for the given date,\n\
or for tomorrow when no date is given.";

#[tokio::main]
async fn main() -> ExitCode {
    logging::init(tracing::Level::INFO);

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    match run(&args).await {
        Ok(fact) => {
            println!("Saved fact #{} for {}", fact.id, fact.display_date);
            ExitCode::SUCCESS
        }
        Err(e) => {
            if e.is_duplicate() {
                tracing::warn!("{}", e);
            } else {
                tracing::error!("{}", e);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: &[String]) -> Result<Fact> {
    let target = resolve_target_date(args, Local::now().date_naive())?;

    let config = Config::load()?;
    let repository = Repository::new(&config.db_path).await?;
    let claude = ClaudeClient::from_config(&config)?;

    let params = GenerationParams {
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    };
    let generator = Generator::new(&repository, &claude, params, config.retry_policy());

    generator.run(target).await
}
