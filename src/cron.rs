//! Registers the daily generator run with the user's crontab.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::str::FromStr;

use crate::error::{AppError, Result};

/// Every day at 00:01 local time.
pub const SCHEDULE: &str = "1 0 * * *";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CronCommand {
    Install,
    Remove,
    Show,
}

impl FromStr for CronCommand {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "install" => Ok(Self::Install),
            "remove" => Ok(Self::Remove),
            "show" => Ok(Self::Show),
            other => Err(AppError::InvalidArgument(format!(
                "unknown command {other:?}, expected install, remove or show"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed(String),
    AlreadyInstalled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
}

/// Read and replace the current user's crontab.
pub trait Crontab {
    fn read(&self) -> Result<String>;
    fn write(&self, content: &str) -> Result<()>;
}

/// The system `crontab` binary.
pub struct SystemCrontab;

impl SystemCrontab {
    fn command() -> Command {
        Command::new("crontab")
    }

    fn unavailable(e: std::io::Error) -> AppError {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::Cron(
                "crontab is not available on this system; use a systemd timer or another \
                 scheduler to run generate-ephemeris daily"
                    .into(),
            )
        } else {
            AppError::Io(e)
        }
    }
}

impl Crontab for SystemCrontab {
    fn read(&self) -> Result<String> {
        let output = Self::command()
            .arg("-l")
            .output()
            .map_err(Self::unavailable)?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("no crontab") {
            Ok(String::new())
        } else {
            Err(AppError::Cron(stderr.trim().to_string()))
        }
    }

    fn write(&self, content: &str) -> Result<()> {
        let mut child = Self::command()
            .arg("-")
            .stdin(Stdio::piped())
            .spawn()
            .map_err(Self::unavailable)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(content.as_bytes())?;
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(anyhow::anyhow!("crontab exited with {status}").into());
        }
        Ok(())
    }
}

fn shell_quote(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

pub fn cron_line(generator: &Path, log_file: &Path) -> String {
    format!(
        "{SCHEDULE} {} >> {} 2>&1",
        shell_quote(generator),
        shell_quote(log_file)
    )
}

/// `current` with `line` appended, or None when an entry containing
/// `marker` is already there.
pub fn add_entry(current: &str, line: &str, marker: &str) -> Option<String> {
    if current.lines().any(|l| l.contains(marker)) {
        return None;
    }

    let mut updated = current.to_string();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(line);
    updated.push('\n');
    Some(updated)
}

/// `current` without the lines containing `marker`, or None when there
/// are none.
pub fn remove_entry(current: &str, marker: &str) -> Option<String> {
    let kept: Vec<&str> = current.lines().filter(|l| !l.contains(marker)).collect();
    if kept.len() == current.lines().count() {
        return None;
    }

    let mut updated = kept.join("\n");
    if !updated.is_empty() {
        updated.push('\n');
    }
    Some(updated)
}

pub fn install(crontab: &impl Crontab, generator: &Path, log_file: &Path) -> Result<InstallOutcome> {
    let marker = generator.to_string_lossy();
    let line = cron_line(generator, log_file);

    let current = crontab.read()?;
    let Some(updated) = add_entry(&current, &line, &marker) else {
        return Ok(InstallOutcome::AlreadyInstalled);
    };

    if let Some(dir) = log_file.parent() {
        std::fs::create_dir_all(dir)?;
    }

    crontab.write(&updated)?;
    tracing::info!("Installed cron entry: {}", line);
    Ok(InstallOutcome::Installed(line))
}

pub fn remove(crontab: &impl Crontab, generator: &Path) -> Result<RemoveOutcome> {
    let marker = generator.to_string_lossy();
    let current = crontab.read()?;
    let Some(updated) = remove_entry(&current, &marker) else {
        return Ok(RemoveOutcome::NotFound);
    };

    crontab.write(&updated)?;
    tracing::info!("Removed cron entry for {}", marker);
    Ok(RemoveOutcome::Removed)
}
