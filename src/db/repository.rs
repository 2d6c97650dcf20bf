use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::{is_unique_violation, AppError, Result};
use crate::models::{Fact, FactDraft};

use super::schema::SCHEMA;

const FACT_COLUMNS: &str = "id, day, month, year, event, display_date, historical_day, \
     historical_month, historical_year, created_at, updated_at";

/// How long a statement waits on another connection's lock before failing
/// with `SQLITE_BUSY`.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    /// Insert a new fact and return the stored row.
    ///
    /// A second fact for the same (day, month, year) is rejected by the
    /// unique index and reported as [`AppError::DuplicateFact`].
    pub async fn insert_fact(&self, draft: FactDraft) -> Result<Fact> {
        let (day, month, year) = (draft.day, draft.month, draft.year);

        let fact = self
            .conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO ephemerides
                           (day, month, year, event, display_date,
                            historical_day, historical_month, historical_year)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
                    params![
                        draft.day,
                        draft.month,
                        draft.year,
                        draft.event,
                        draft.display_date,
                        draft.historical_day,
                        draft.historical_month,
                        draft.historical_year,
                    ],
                )?;
                let id = conn.last_insert_rowid();
                let fact = conn.query_row(
                    &format!("SELECT {FACT_COLUMNS} FROM ephemerides WHERE id = ?1"),
                    params![id],
                    fact_from_row,
                )?;
                Ok(fact)
            })
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::DuplicateFact { day, month, year }
                } else {
                    AppError::from(e)
                }
            })?;
        Ok(fact)
    }

    pub async fn get_fact(&self, id: i64) -> Result<Option<Fact>> {
        let fact = self
            .conn
            .call(move |conn| {
                let fact = conn
                    .query_row(
                        &format!("SELECT {FACT_COLUMNS} FROM ephemerides WHERE id = ?1"),
                        params![id],
                        fact_from_row,
                    )
                    .optional()?;
                Ok(fact)
            })
            .await?;
        Ok(fact)
    }

    /// The newest facts first, by insertion time.
    pub async fn latest_facts(&self, limit: usize) -> Result<Vec<Fact>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let facts = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {FACT_COLUMNS} FROM ephemerides ORDER BY created_at DESC, id DESC LIMIT ?1"
                ))?;
                let facts = stmt
                    .query_map(params![limit], fact_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(facts)
            })
            .await?;
        Ok(facts)
    }

    /// The fact to show today: whichever was inserted last.
    pub async fn latest_fact(&self) -> Result<Option<Fact>> {
        Ok(self.latest_facts(1).await?.into_iter().next())
    }

    pub async fn find_by_date(&self, day: u32, month: u32, year: i32) -> Result<Option<Fact>> {
        let fact = self
            .conn
            .call(move |conn| {
                let fact = conn
                    .query_row(
                        &format!(
                            "SELECT {FACT_COLUMNS} FROM ephemerides WHERE day = ?1 AND month = ?2 AND year = ?3"
                        ),
                        params![day, month, year],
                        fact_from_row,
                    )
                    .optional()?;
                Ok(fact)
            })
            .await?;
        Ok(fact)
    }

    pub async fn count_facts(&self) -> Result<i64> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM ephemerides", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }

    /// Returns whether a row was removed. Only the connectivity check deletes.
    pub async fn delete_fact(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .call(move |conn| {
                let rows = conn.execute("DELETE FROM ephemerides WHERE id = ?1", params![id])?;
                Ok(rows > 0)
            })
            .await?;
        Ok(deleted)
    }

    #[cfg(test)]
    pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute_batch(sql)?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // SQLite datetime('now') format
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_datetime(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unrecognised timestamp {raw:?}").into(),
        )
    })
}

fn fact_from_row(row: &Row) -> rusqlite::Result<Fact> {
    let day: u32 = row.get(1)?;
    let month: u32 = row.get(2)?;
    Ok(Fact {
        id: row.get(0)?,
        day,
        month,
        year: row.get(3)?,
        event: row.get(4)?,
        display_date: row.get(5)?,
        historical_day: row.get::<_, Option<u32>>(6)?.unwrap_or(day),
        historical_month: row.get::<_, Option<u32>>(7)?.unwrap_or(month),
        historical_year: row.get(8)?,
        created_at: timestamp(row, 9)?,
        updated_at: timestamp(row, 10)?,
    })
}
