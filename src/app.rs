use chrono::{DateTime, Local};

use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::models::FactView;
use crate::tui::AppAction;

pub struct App {
    // Data
    pub view: FactView,

    // UI State
    pub now: DateTime<Local>,
    pub show_help: bool,

    // Services
    repository: Option<Repository>,
}

impl App {
    /// Opens the fact store. A config or store that cannot be used is shown
    /// as an error on screen rather than aborting the program.
    pub async fn from_config(config: Result<Config>) -> Self {
        match config {
            Ok(config) => Self::new(&config).await,
            Err(e) => {
                tracing::error!("Failed to load config: {}", e);
                Self::unavailable(e)
            }
        }
    }

    pub async fn new(config: &Config) -> Self {
        match Repository::new(&config.db_path).await {
            Ok(repository) => {
                let mut app = Self::with_repository(repository);
                app.reload().await;
                app
            }
            Err(e) => {
                tracing::error!("Failed to open {}: {}", config.db_path, e);
                Self::unavailable(e)
            }
        }
    }

    fn unavailable(reason: impl std::fmt::Display) -> Self {
        Self {
            view: FactView::Failed(reason.to_string()),
            now: Local::now(),
            show_help: false,
            repository: None,
        }
    }

    pub fn with_repository(repository: Repository) -> Self {
        Self {
            view: FactView::Loading,
            now: Local::now(),
            show_help: false,
            repository: Some(repository),
        }
    }

    /// Fetch the fact to show. The newest stored fact wins, whatever day it
    /// was generated for.
    pub async fn reload(&mut self) {
        let Some(repository) = &self.repository else {
            return;
        };

        let result = repository.latest_fact().await;
        if let Err(e) = &result {
            tracing::error!("Failed to load today's fact: {}", e);
        }
        self.view = FactView::from_result(result);
    }

    /// Advance the clock shown in the header
    pub fn tick(&mut self) {
        self.now = Local::now();
    }

    /// Returns true when the app should quit.
    pub async fn handle_action(&mut self, action: AppAction) -> bool {
        match action {
            AppAction::Quit => return true,

            AppAction::Reload => {
                self.reload().await;
            }

            AppAction::ShowHelp => {
                self.show_help = true;
            }

            AppAction::HideHelp => {
                self.show_help = false;
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::FactDraft;

    async fn app() -> App {
        App::with_repository(Repository::new(":memory:").await.unwrap())
    }

    #[tokio::test]
    async fn empty_store_gives_empty_view() {
        let mut app = app().await;
        app.reload().await;
        assert_eq!(app.view, FactView::Empty);
    }

    #[tokio::test]
    async fn reload_picks_up_new_facts() {
        let mut app = app().await;
        app.reload().await;
        assert_eq!(app.view, FactView::Empty);

        let date = NaiveDate::from_ymd_opt(2025, 6, 23).unwrap();
        let saved = app
            .repository
            .as_ref()
            .unwrap()
            .insert_fact(FactDraft::for_date(date, "Nace Alan Turing en 1912".into(), Some(1912)))
            .await
            .unwrap();

        assert!(!app.handle_action(AppAction::Reload).await);
        assert_eq!(app.view.fact().map(|f| f.id), Some(saved.id));
    }

    #[tokio::test]
    async fn storage_errors_become_a_failed_view() {
        let mut app = app().await;
        app.repository
            .as_ref()
            .unwrap()
            .execute_raw("DROP TABLE ephemerides")
            .await
            .unwrap();

        app.reload().await;
        match &app.view {
            FactView::Failed(message) => assert!(message.contains("ephemerides"), "{message}"),
            other => panic!("expected a failed view, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unopenable_store_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            db_path: dir
                .path()
                .join("missing")
                .join("facts.db")
                .to_string_lossy()
                .to_string(),
            ..Config::default()
        };

        let app = App::new(&config).await;
        assert!(matches!(app.view, FactView::Failed(_)));
    }

    #[tokio::test]
    async fn invalid_config_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "temperature = 1.5\n").unwrap();

        let mut app = App::from_config(Config::load_checked(&path)).await;
        match &app.view {
            FactView::Failed(message) => assert!(message.contains("temperature"), "{message}"),
            other => panic!("expected a failed view, got {other:?}"),
        }

        // Nothing to reload from, the error stays on screen
        assert!(!app.handle_action(AppAction::Reload).await);
        assert!(matches!(app.view, FactView::Failed(_)));
    }

    #[tokio::test]
    async fn unparseable_config_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_tokens = \"lots\"").unwrap();

        let app = App::from_config(Config::load_checked(&path)).await;
        assert!(matches!(app.view, FactView::Failed(_)));
    }

    #[tokio::test]
    async fn help_and_quit_actions() {
        let mut app = app().await;
        assert!(!app.handle_action(AppAction::ShowHelp).await);
        assert!(app.show_help);
        assert!(!app.handle_action(AppAction::HideHelp).await);
        assert!(!app.show_help);
        assert!(app.handle_action(AppAction::Quit).await);
    }
}
