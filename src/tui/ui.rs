use chrono::NaiveDate;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::locale;
use crate::models::FactView;

const APP_TITLE: &str = concat!("code-history v", env!("CARGO_PKG_VERSION"));
pub const NO_DATA_TEXT: &str = "No data available.";
const LOADING_TEXT: &str = "Loading...";

/// Heading and body for whatever the view holds.
fn fact_text(view: &FactView) -> (Option<String>, String) {
    match view {
        FactView::Loading => (None, LOADING_TEXT.to_string()),
        FactView::Loaded(fact) => (
            Some(format!(
                "{}:",
                locale::day_month_year(
                    fact.historical_day,
                    fact.historical_month,
                    fact.historical_year
                )
            )),
            fact.event.clone(),
        ),
        FactView::Empty => (None, NO_DATA_TEXT.to_string()),
        FactView::Failed(message) => (None, format!("Error loading fact: {message}")),
    }
}

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Current date
            Constraint::Min(0),    // Fact
            Constraint::Length(1), // Status line
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_today(frame, app, chunks[1]);
    render_fact(frame, app, chunks[2]);
    render_status(frame, app, chunks[3]);

    if app.show_help {
        render_help(frame);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let clock = format!(" {} ", app.now.format("%H:%M:%S"));

    let block = Block::default()
        .title(format!(" ▸ {APP_TITLE} "))
        .title(Line::from(clock).right_aligned())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let prompt = Line::from(vec![
        Span::styled("user@code-history", Style::default().fg(Color::Green)),
        Span::raw(":"),
        Span::styled("~", Style::default().fg(Color::LightGreen)),
        Span::raw("$ ./code-history --day"),
    ]);

    let paragraph = Paragraph::new(prompt).block(block);
    frame.render_widget(paragraph, area);
}

fn render_today(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let line = Line::from(vec![
        Span::raw("⏱ Today: "),
        Span::styled(
            locale::long_date(app.now.date_naive()),
            Style::default().fg(Color::LightGreen),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_fact(frame: &mut Frame, app: &App, area: Rect) {
    let (heading, body) = fact_text(&app.view);

    let body_style = match app.view {
        FactView::Failed(_) => Style::default().fg(Color::Red),
        FactView::Loaded(_) => Style::default().fg(Color::Green),
        _ => Style::default().fg(Color::DarkGray),
    };

    let mut lines = Vec::new();
    if let Some(heading) = heading {
        lines.push(Line::styled(
            heading,
            Style::default()
                .fg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
        ));
        lines.push(Line::raw(""));
    }
    lines.extend(body.lines().map(|l| Line::styled(l.to_string(), body_style)));

    let block = Block::default()
        .title(" FACT OF THE DAY ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let keys = "r:reload  ?:help  q:quit";
    let text = match app.view.fact() {
        Some(fact) => format!("{keys} | #{} for {}", fact.id, fact.display_date),
        None => keys.to_string(),
    };

    let paragraph = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(50, 50, frame.area());

    let help_text = [
        "",
        " Actions:",
        "   r / F5   Reload the fact",
        "",
        " General:",
        "   ?        Toggle this help",
        "   q / Esc  Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// The same view as the terminal UI, as plain text wrapped to `width`.
pub fn plain_text(view: &FactView, today: NaiveDate, width: usize) -> String {
    let (heading, body) = fact_text(view);

    let mut out = format!("{APP_TITLE}\nToday: {}\n\n", locale::long_date(today));
    out.push_str("FACT OF THE DAY\n");
    if let Some(heading) = heading {
        out.push_str(&heading);
        out.push('\n');
    }
    for line in textwrap::wrap(&body, width) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use ratatui::{backend::TestBackend, Terminal};

    use super::*;
    use crate::db::Repository;
    use crate::models::Fact;

    fn sample_fact() -> Fact {
        let ts = Utc.with_ymd_and_hms(2024, 2, 28, 0, 1, 0).unwrap();
        Fact {
            id: 7,
            day: 29,
            month: 2,
            year: 2024,
            event: "El 29 de febrero de 1504, un eclipse lunar predicho con tablas astronómicas salva a la expedición de Colón.".into(),
            display_date: "2024-02-29".into(),
            historical_day: 29,
            historical_month: 2,
            historical_year: Some(1504),
            created_at: ts,
            updated_at: ts,
        }
    }

    async fn render(view: FactView) -> String {
        let mut app = App::with_repository(Repository::new(":memory:").await.unwrap());
        app.view = view;

        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|frame| draw(frame, &app)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[tokio::test]
    async fn renders_the_loaded_fact() {
        let screen = render(FactView::Loaded(sample_fact())).await;
        assert!(screen.contains("FACT OF THE DAY"));
        assert!(screen.contains("29 de febrero de 1504:"));
        assert!(screen.contains("#7 for 2024-02-29"));
    }

    #[tokio::test]
    async fn renders_no_data_for_an_empty_store() {
        let screen = render(FactView::Empty).await;
        assert!(screen.contains(NO_DATA_TEXT));
    }

    #[tokio::test]
    async fn renders_storage_errors_inline() {
        let screen = render(FactView::Failed("database is locked".into())).await;
        assert!(screen.contains("Error loading fact: database is locked"));
    }

    #[test]
    fn plain_text_wraps_the_event() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let text = plain_text(&FactView::Loaded(sample_fact()), today, 40);

        assert!(text.contains("Today: jueves, 29 de febrero de 2024"));
        assert!(text.contains("29 de febrero de 1504:"));
        assert!(text.lines().all(|line| line.chars().count() <= 40));
    }

    #[test]
    fn plain_text_without_year_omits_it() {
        let mut fact = sample_fact();
        fact.historical_year = None;
        let today = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();

        let text = plain_text(&FactView::Loaded(fact), today, 200);
        assert!(text.contains("\n29 de febrero:\n"));
    }

    #[test]
    fn plain_text_for_empty_and_failed() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(plain_text(&FactView::Empty, today, 80).contains(NO_DATA_TEXT));
        assert!(plain_text(&FactView::Failed("boom".into()), today, 80)
            .contains("Error loading fact: boom"));
    }
}
