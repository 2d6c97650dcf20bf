//! A programming history fact of the day.
//!
//! Facts are generated ahead of time by `generate-ephemeris`, which asks
//! Claude for one technology-history event per calendar day and stores it
//! in SQLite. `code-history` shows the newest stored fact.

pub mod ai;
pub mod app;
pub mod check;
pub mod config;
pub mod cron;
pub mod db;
pub mod error;
pub mod generator;
pub mod locale;
pub mod logging;
pub mod models;
pub mod retry;
pub mod tui;
