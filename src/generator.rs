use std::sync::OnceLock;

use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;

use crate::ai::{GenerationParams, TextGenerator};
use crate::db::{Repository, BUSY_TIMEOUT};
use crate::error::{AppError, ErrorRetryStrategy, Result};
use crate::locale;
use crate::models::{Fact, FactDraft};
use crate::retry::{with_retry, with_retry_when, RetryPolicy};

const DATE_FORMAT: &str = "%Y-%m-%d";

static YEAR_PATTERN: OnceLock<Regex> = OnceLock::new();

/// The date to generate a fact for.
///
/// No argument means tomorrow, so the scheduled run just after midnight
/// prepares the next day's fact ahead of time.
pub fn resolve_target_date(args: &[String], today: NaiveDate) -> Result<NaiveDate> {
    match args {
        [] => today
            .checked_add_days(Days::new(1))
            .ok_or_else(|| AppError::InvalidArgument(format!("no day after {today}"))),
        [date] => NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).map_err(|_| {
            AppError::InvalidArgument(format!("invalid date {date:?}, expected YYYY-MM-DD"))
        }),
        _ => Err(AppError::InvalidArgument(format!(
            "expected at most one date argument, got {}",
            args.len()
        ))),
    }
}

/// First run of four ASCII digits in `text`, read as a year.
pub fn extract_year(text: &str) -> Option<i32> {
    let pattern = YEAR_PATTERN.get_or_init(|| Regex::new(r"[0-9]{4}").expect("valid regex"));
    pattern
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

pub fn build_prompt(date: NaiveDate) -> String {
    format!(
        r#"Genera una efeméride histórica relacionada con la programación, la tecnología o la computación para el {date}.

Requisitos:
- Debe ser un evento real y verificable
- Relacionado con programación, software, hardware, internet o tecnología
- Cualquier año es válido, pero debe incluir el año del evento
- Descripción clara y concisa (máximo 200 palabras)
- Formato: "El [fecha], [descripción del evento]"

Ejemplo de formato:
"El 22 de agosto de 2007, Google lanza oficialmente la versión 1.0 de Google Web Toolkit (GWT), un framework que permite escribir aplicaciones web complejas en Java y compilarlas a JavaScript."

Genera solo la efeméride, sin explicaciones adicionales."#,
        date = locale::day_month(date.day(), date.month())
    )
}

/// Produces and stores the fact for one target date.
pub struct Generator<'a, G> {
    repository: &'a Repository,
    text: &'a G,
    params: GenerationParams,
    retry: RetryPolicy,
}

impl<'a, G: TextGenerator> Generator<'a, G> {
    pub fn new(
        repository: &'a Repository,
        text: &'a G,
        params: GenerationParams,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            repository,
            text,
            params,
            retry,
        }
    }

    /// Generate and persist the fact for `date`.
    ///
    /// Fails with [`AppError::DuplicateFact`] when the date already has a
    /// fact, before any text is requested.
    pub async fn run(&self, date: NaiveDate) -> Result<Fact> {
        tracing::info!("Generating fact for {}", date.format(DATE_FORMAT));

        let existing = with_retry(&self.retry, "looking up existing fact", || {
            self.repository
                .find_by_date(date.day(), date.month(), date.year())
        })
        .await?;

        if let Some(existing) = existing {
            tracing::warn!(
                "Fact #{} already covers {}, not generating another",
                existing.id,
                existing.display_date
            );
            return Err(AppError::DuplicateFact {
                day: existing.day,
                month: existing.month,
                year: existing.year,
            });
        }

        let draft = self.generate_fact(date).await?;
        tracing::info!(
            "Generated text ({} chars, historical year {:?})",
            draft.event.chars().count(),
            draft.historical_year
        );

        let fact = self.save_fact(draft).await?;
        tracing::info!("Saved fact #{} for {}", fact.id, fact.display_date);
        Ok(fact)
    }

    pub async fn generate_fact(&self, date: NaiveDate) -> Result<FactDraft> {
        let prompt = build_prompt(date);
        tracing::debug!("Requesting text from {}", self.text.model_version());

        let text = with_retry(&self.retry, "text generation", || {
            self.text.complete(&prompt, self.params)
        })
        .await
        .map_err(|e| match e {
            AppError::Generation(_) => e,
            other => AppError::Generation(other.to_string()),
        })?;

        let event = text.trim().to_string();
        if event.is_empty() {
            return Err(AppError::Generation("the model returned no text".into()));
        }

        let historical_year = extract_year(&event);
        if historical_year.is_none() {
            tracing::warn!("No four-digit year found in generated text");
        }

        Ok(FactDraft::for_date(date, event, historical_year))
    }

    /// Insert `draft`, retrying while the database is busy.
    ///
    /// An insert that outlives its deadline may still commit on the
    /// connection's worker thread, so a timeout is not retried. The
    /// deadline is never shorter than SQLite's own busy wait.
    pub async fn save_fact(&self, draft: FactDraft) -> Result<Fact> {
        let policy = RetryPolicy {
            attempt_timeout: self.retry.attempt_timeout.max(BUSY_TIMEOUT * 2),
            ..self.retry
        };

        with_retry_when(
            &policy,
            "saving fact",
            |err| match err {
                AppError::Timeout { .. } => ErrorRetryStrategy::Fail,
                other => other.retry_strategy(),
            },
            || self.repository.insert_fact(draft.clone()),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_argument_means_tomorrow() {
        assert_eq!(
            resolve_target_date(&[], date(2026, 10, 19)).unwrap(),
            date(2026, 10, 20)
        );
        assert_eq!(
            resolve_target_date(&[], date(2024, 12, 31)).unwrap(),
            date(2025, 1, 1)
        );
        assert_eq!(
            resolve_target_date(&[], date(2024, 2, 28)).unwrap(),
            date(2024, 2, 29)
        );
    }

    #[test]
    fn explicit_date_is_used_as_is() {
        assert_eq!(
            resolve_target_date(&args(&["2030-05-17"]), date(2026, 10, 19)).unwrap(),
            date(2030, 5, 17)
        );
    }

    #[test]
    fn bad_arguments_are_rejected() {
        let today = date(2026, 10, 19);
        let bad_dates: [&[&str]; 4] = [&["not-a-date"], &["2023-02-29"], &["17/05/2030"], &[""]];
        for bad in bad_dates {
            let err = resolve_target_date(&args(bad), today).unwrap_err();
            assert!(matches!(err, AppError::InvalidArgument(_)), "{bad:?}");
        }

        let err = resolve_target_date(&args(&["2030-05-17", "2030-05-18"]), today).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn year_is_the_first_four_digit_run() {
        assert_eq!(
            extract_year("El 29 de febrero de 1504, Colón usa un eclipse"),
            Some(1504)
        );
        assert_eq!(extract_year("En 1969 y luego en 1983"), Some(1969));
        assert_eq!(extract_year("El 3 de abril, versión 12345"), Some(1234));
        assert_eq!(extract_year("Sin año conocido"), None);
        assert_eq!(extract_year("El día 12 de 99"), None);
    }

    #[test]
    fn prompt_names_the_day_and_month() {
        let prompt = build_prompt(date(2024, 2, 29));
        assert!(prompt.contains("para el 29 de febrero."));
        assert!(prompt.contains("máximo 200 palabras"));
        assert!(!prompt.contains("2024"));
    }
}
