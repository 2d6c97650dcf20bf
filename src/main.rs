use std::io;
use std::time::Duration;

use crossterm::event::KeyEventKind;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

use code_history::app::App;
use code_history::config::Config;
use code_history::error::Result;
use code_history::logging;
use code_history::tui::{draw, handle_key_event, plain_text};

const PLAIN_WIDTH: usize = 80;

#[tokio::main]
async fn main() -> Result<()> {
    // Only warnings and errors, the terminal belongs to the UI
    logging::init(tracing::Level::WARN);

    let args: Vec<String> = std::env::args().collect();
    let print_only = args.iter().skip(1).any(|a| a == "--print");

    let mut app = App::from_config(Config::load()).await;

    // Headless: render once to stdout and exit
    if print_only {
        print!(
            "{}",
            plain_text(&app.view, app.now.date_naive(), PLAIN_WIDTH)
        );
        return Ok(());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        app.tick();
        terminal.draw(|frame| draw(frame, app))?;

        // Poll with a timeout so the clock keeps ticking
        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = handle_key_event(key, app.show_help) {
                        if app.handle_action(action).await {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
