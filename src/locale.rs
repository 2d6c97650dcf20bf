//! Date formatting for the single display locale (es-ES).

use chrono::{Datelike, NaiveDate, Weekday};

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

pub fn month_name(month: u32) -> Option<&'static str> {
    let idx = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTHS.get(idx).copied()
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "lunes",
        Weekday::Tue => "martes",
        Weekday::Wed => "miércoles",
        Weekday::Thu => "jueves",
        Weekday::Fri => "viernes",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    }
}

/// "29 de febrero". Out of range months are shown as numbers.
pub fn day_month(day: u32, month: u32) -> String {
    match month_name(month) {
        Some(name) => format!("{day} de {name}"),
        None => format!("{day}/{month}"),
    }
}

/// "29 de febrero de 1504", or just the day and month without a year.
pub fn day_month_year(day: u32, month: u32, year: Option<i32>) -> String {
    match year {
        Some(year) => format!("{} de {}", day_month(day, month), year),
        None => day_month(day, month),
    }
}

/// "jueves, 29 de febrero de 2024"
pub fn long_date(date: NaiveDate) -> String {
    format!(
        "{}, {}",
        weekday_name(date.weekday()),
        day_month_year(date.day(), date.month(), Some(date.year()))
    )
}
