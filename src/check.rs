//! Store connectivity check: count, insert a probe row, delete it.

use chrono::NaiveDate;

use crate::db::Repository;
use crate::error::Result;
use crate::models::FactDraft;

/// Day, month and year of the probe row. Nothing real lives at 99/99/9999.
pub const PROBE_DAY: u32 = 99;
pub const PROBE_MONTH: u32 = 99;
pub const PROBE_YEAR: i32 = 9999;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub fact_count: i64,
    pub probe_id: i64,
    pub probe_deleted: bool,
}

fn probe_draft(today: NaiveDate) -> FactDraft {
    FactDraft {
        day: PROBE_DAY,
        month: PROBE_MONTH,
        year: PROBE_YEAR,
        event: "TEST - connectivity check record, safe to delete".to_string(),
        display_date: today.format("%Y-%m-%d").to_string(),
        historical_day: PROBE_DAY,
        historical_month: PROBE_MONTH,
        historical_year: Some(PROBE_YEAR),
    }
}

/// Exercise every storage operation the generator depends on.
///
/// A probe left behind by an earlier interrupted check is removed first.
/// Failing to delete the probe is reported, not raised.
pub async fn run_check(repository: &Repository, today: NaiveDate) -> Result<CheckReport> {
    if let Some(stale) = repository
        .find_by_date(PROBE_DAY, PROBE_MONTH, PROBE_YEAR)
        .await?
    {
        tracing::warn!("Removing probe #{} left by an earlier check", stale.id);
        repository.delete_fact(stale.id).await?;
    }

    let fact_count = repository.count_facts().await?;
    tracing::info!("Facts in store: {}", fact_count);

    let probe = repository.insert_fact(probe_draft(today)).await?;
    tracing::info!("Inserted probe #{}", probe.id);

    let fetched = repository.get_fact(probe.id).await?;
    if fetched.as_ref() != Some(&probe) {
        return Err(anyhow::anyhow!("probe #{} did not read back as written", probe.id).into());
    }

    let probe_deleted = match repository.delete_fact(probe.id).await {
        Ok(deleted) => deleted,
        Err(e) => {
            tracing::warn!("Could not delete probe #{}: {}", probe.id, e);
            false
        }
    };

    Ok(CheckReport {
        fact_count,
        probe_id: probe.id,
        probe_deleted,
    })
}
