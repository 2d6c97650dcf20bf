pub const SCHEMA: &str = r#"
-- ephemerides table
CREATE TABLE IF NOT EXISTS ephemerides (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    day INTEGER NOT NULL,
    month INTEGER NOT NULL,
    year INTEGER NOT NULL,
    event TEXT NOT NULL,
    display_date TEXT NOT NULL,
    historical_day INTEGER,
    historical_month INTEGER,
    historical_year INTEGER,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- one fact per target date
CREATE UNIQUE INDEX IF NOT EXISTS ephemerides_date_unique ON ephemerides(day, month, year);

CREATE INDEX IF NOT EXISTS idx_ephemerides_created_at ON ephemerides(created_at DESC);
"#;
