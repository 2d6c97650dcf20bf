use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// A stored programming history fact.
#[derive(Debug, Clone, PartialEq)]
pub struct Fact {
    pub id: i64,
    pub day: u32,
    pub month: u32,
    pub year: i32,
    pub event: String,
    pub display_date: String,
    pub historical_day: u32,
    pub historical_month: u32,
    pub historical_year: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A fact that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct FactDraft {
    pub day: u32,
    pub month: u32,
    pub year: i32,
    pub event: String,
    pub display_date: String,
    pub historical_day: u32,
    pub historical_month: u32,
    pub historical_year: Option<i32>,
}

impl FactDraft {
    /// Build a draft for the date a fact is generated for. `day`, `month`
    /// and `year` describe that target date, `historical_year` is whatever
    /// year was found in the event text.
    pub fn for_date(date: NaiveDate, event: String, historical_year: Option<i32>) -> Self {
        Self {
            day: date.day(),
            month: date.month(),
            year: date.year(),
            event,
            display_date: date.format("%Y-%m-%d").to_string(),
            historical_day: date.day(),
            historical_month: date.month(),
            historical_year,
        }
    }
}

impl Fact {
    /// The persisted fields of this fact, without id and timestamps.
    pub fn to_draft(&self) -> FactDraft {
        FactDraft {
            day: self.day,
            month: self.month,
            year: self.year,
            event: self.event.clone(),
            display_date: self.display_date.clone(),
            historical_day: self.historical_day,
            historical_month: self.historical_month,
            historical_year: self.historical_year,
        }
    }
}

/// What the display surface has to show for one load.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FactView {
    #[default]
    Loading,
    Loaded(Fact),
    Empty,
    Failed(String),
}

impl FactView {
    pub fn from_result<E: std::fmt::Display>(result: Result<Option<Fact>, E>) -> Self {
        match result {
            Ok(Some(fact)) => FactView::Loaded(fact),
            Ok(None) => FactView::Empty,
            Err(e) => FactView::Failed(e.to_string()),
        }
    }

    pub fn fact(&self) -> Option<&Fact> {
        match self {
            FactView::Loaded(fact) => Some(fact),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_for_leap_day() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let draft = FactDraft::for_date(date, "El 29 de febrero de 1504, ...".into(), Some(1504));

        assert_eq!(draft.day, 29);
        assert_eq!(draft.month, 2);
        assert_eq!(draft.year, 2024);
        assert_eq!(draft.historical_day, 29);
        assert_eq!(draft.historical_month, 2);
        assert_eq!(draft.historical_year, Some(1504));
        assert_eq!(draft.display_date, "2024-02-29");
    }

    #[test]
    fn display_date_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        let draft = FactDraft::for_date(date, String::new(), None);
        assert_eq!(draft.display_date, "2025-01-05");
    }

    #[test]
    fn view_from_result() {
        let empty: Result<Option<Fact>, String> = Ok(None);
        assert_eq!(FactView::from_result(empty), FactView::Empty);

        let failed: Result<Option<Fact>, String> = Err("disk on fire".into());
        assert_eq!(
            FactView::from_result(failed),
            FactView::Failed("disk on fire".into())
        );
    }
}
