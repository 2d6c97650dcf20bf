use std::path::{Path, PathBuf};
use std::process::ExitCode;

use code_history::config::Config;
use code_history::cron::{self, CronCommand, InstallOutcome, RemoveOutcome, SystemCrontab};
use code_history::error::{AppError, Result};
use code_history::logging;

const GENERATOR_BIN: &str = "generate-ephemeris";

const USAGE: &str = "Usage: ephemeris-cron [install|remove|show]\n\n\
Commands:\n  \
  install  Run generate-ephemeris every day at 00:01\n  \
  remove   Remove the scheduled run\n  \
  show     Show the current crontab";

fn main() -> ExitCode {
    logging::init(tracing::Level::INFO);

    let Some(command) = std::env::args().nth(1) else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    let command = match command.parse::<CronCommand>() {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            return ExitCode::from(e.exit_code());
        }
    };

    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// The generator binary installed next to this one.
fn generator_path() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let generator = exe.with_file_name(format!("{GENERATOR_BIN}{}", std::env::consts::EXE_SUFFIX));
    if !generator.exists() {
        return Err(AppError::Cron(format!(
            "{} not found next to {}",
            generator.display(),
            exe.display()
        )));
    }
    Ok(generator)
}

fn run(command: CronCommand) -> Result<()> {
    let crontab = SystemCrontab;

    match command {
        CronCommand::Install => {
            let config = Config::load()?;
            let generator = generator_path()?;
            match cron::install(&crontab, &generator, Path::new(&config.log_file))? {
                InstallOutcome::Installed(line) => {
                    println!("Cron job installed: {line}");
                    println!("Runs every day at 00:01, output goes to {}", config.log_file);
                }
                InstallOutcome::AlreadyInstalled => println!("Cron job is already installed"),
            }
        }
        CronCommand::Remove => {
            let generator = generator_path()?;
            match cron::remove(&crontab, &generator)? {
                RemoveOutcome::Removed => println!("Cron job removed"),
                RemoveOutcome::NotFound => println!("No cron job found to remove"),
            }
        }
        CronCommand::Show => {
            let current = cron::Crontab::read(&crontab)?;
            if current.trim().is_empty() {
                println!("No cron jobs configured");
            } else {
                print!("{current}");
            }
        }
    }

    Ok(())
}
