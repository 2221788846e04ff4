use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, List, ListItem, ListState, Padding, Paragraph, StatefulWidget, Widget, Wrap,
    },
};
use webbrowser::Browser;

use super::{
    bold_style, dim_style, legend, truncate_to_width, CodeView, HORIZONTAL_MARGIN,
    VERTICAL_MARGIN,
};
use crate::{
    app::{App, AppState},
    github::FetchError,
};

/// A UI Screen boundary: renders one application state
pub trait Screen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

/// Sample and language picker
pub struct SelectScreen;

impl Screen for SelectScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let AppState::Select { selected } = app.state() else {
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);

        let items: Vec<ListItem> = app
            .menu()
            .iter()
            .map(|entry| ListItem::new(entry.label()))
            .collect();

        let list = List::new(items)
            .block(Block::bordered().title(Span::styled(" codetype ", bold_style())))
            .highlight_style(bold_style().fg(Color::Cyan))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(*selected));
        StatefulWidget::render(list, chunks[0], buf, &mut state);

        legend(["(enter) start", "(↑/↓) move", "(esc) quit"]).render(chunks[1], buf);
    }
}

/// Waiting for a fetch to come back
pub struct LoadingScreen;

impl Screen for LoadingScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let AppState::Loading { language, .. } = app.state() else {
            return;
        };

        let lines = vec![
            Line::from(Span::styled(
                format!("Fetching a random {} file from GitHub...", language.name),
                bold_style(),
            )),
            Line::default(),
            legend(["(esc) cancel"]),
        ];

        centered(lines).render(area, buf);
    }
}

/// A fetch failed
pub struct FetchFailedScreen;

impl Screen for FetchFailedScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let AppState::FetchFailed { language, error } = app.state() else {
            return;
        };

        let mut lines = vec![
            Line::from(Span::styled(
                format!("Could not fetch a {} file", language.name),
                bold_style(),
            )),
            Line::from(Span::styled(error.to_string(), Style::default().fg(Color::Red))),
        ];
        if let FetchError::RateLimited {
            retry_after: Some(secs),
        } = error
        {
            lines.push(Line::from(format!("Try again in {secs}s.")));
        }
        lines.push(Line::default());
        lines.push(legend(["(r)etry", "(b)ack"]));

        centered(lines).render(area, buf);
    }
}

/// The typing view
pub struct GameScreen;

impl Screen for GameScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let AppState::Game { sample, session } = app.state() else {
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);

        let header = format!("{} | {}", sample.language, sample.title);
        Paragraph::new(Span::styled(
            truncate_to_width(&header, usize::from(chunks[0].width)),
            bold_style().fg(Color::Cyan),
        ))
        .render(chunks[0], buf);

        let view = CodeView::build(session.target(), session.position(), session.error_input());
        let offset = view.scroll_offset(chunks[1].height);
        Paragraph::new(view.lines)
            .scroll((offset, 0))
            .render(chunks[1], buf);

        let elapsed = session
            .elapsed()
            .map_or(0.0, |elapsed| elapsed.as_secs_f64());
        let footer = format!(
            "{} / {} characters   {}   {:.1}s   (esc) back",
            session.position(),
            session.len(),
            session.phase(),
            elapsed
        );
        Paragraph::new(Span::styled(footer, dim_style())).render(chunks[2], buf);
    }
}

/// Metrics of a finished session
pub struct ResultScreen;

impl Screen for ResultScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let AppState::Result { sample, result } = app.state() else {
            return;
        };

        let stat = |label: &str, value: String| {
            Line::from(vec![
                Span::styled(format!("{label}: "), bold_style()),
                Span::raw(value),
            ])
        };

        let mut hints = vec!["(r)etry", "(b)ack"];
        if sample.source_url.is_some() && Browser::is_available() {
            hints.push("(o)pen");
        }
        hints.push("(esc) quit");

        let lines = vec![
            Line::from(Span::styled(
                sample.title.clone(),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            stat("Time", format!("{:.1}s", result.elapsed_secs)),
            stat("Keystrokes", result.total_keystrokes.to_string()),
            stat("Speed", format!("{:.1} keys/s", result.keystrokes_per_second)),
            stat("Backspaces", result.backspace_count.to_string()),
            Line::default(),
            legend(hints),
        ];

        centered(lines).render(area, buf);
    }
}

fn centered(lines: Vec<Line<'static>>) -> Paragraph<'static> {
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().padding(Padding::vertical(VERTICAL_MARGIN)))
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Select { .. } => Box::new(SelectScreen),
        AppState::Loading { .. } => Box::new(LoadingScreen),
        AppState::FetchFailed { .. } => Box::new(FetchFailedScreen),
        AppState::Game { .. } => Box::new(GameScreen),
        AppState::Result { .. } => Box::new(ResultScreen),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::find_language_by_id;

    fn rendered(app: &App) -> String {
        let area = Rect::new(0, 0, 80, 20);
        let mut buffer = Buffer::empty(area);
        current_screen(app.state()).render(app, area, &mut buffer);
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_current_screen_matches_state() {
        let mut app = App::new(Vec::new());
        assert!(rendered(&app).contains("codetype"));

        let go = find_language_by_id("go").unwrap();
        app.start_fetch(go);
        let screen = rendered(&app);
        assert!(screen.contains("Fetching a random Go file from GitHub..."));
        assert!(screen.contains("(esc) cancel"));
    }

    #[test]
    fn test_fetch_failed_shows_retry_after() {
        let mut app = App::new(Vec::new());
        app.start_fetch(find_language_by_id("python").unwrap());
        app.on_fetched(
            1,
            Err(FetchError::RateLimited {
                retry_after: Some(42),
            }),
        );

        let screen = rendered(&app);
        assert!(screen.contains("GitHub rate limit exceeded."));
        assert!(screen.contains("Try again in 42s."));
        assert!(screen.contains("(r)etry / (b)ack"));
    }

    #[test]
    fn test_screen_ignores_mismatched_state() {
        let app = App::new(Vec::new());
        let area = Rect::new(0, 0, 40, 10);
        let mut buffer = Buffer::empty(area);
        GameScreen.render(&app, area, &mut buffer);
        assert_eq!(buffer, Buffer::empty(area));
    }
}
