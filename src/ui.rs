pub mod screen;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::{app::App, ui::screen::current_screen};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        current_screen(self.state()).render(self, area, buf);
    }
}

/// Draw the whole app into a frame.
pub fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

fn bold_style() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_style() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn italic_style() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn error_style() -> Style {
    bold_style().fg(Color::Red)
}

fn cursor_style() -> Style {
    bold_style().add_modifier(Modifier::UNDERLINED)
}

/// Glyph used to make whitespace visible inside the error run.
fn visible_char(c: char) -> char {
    match c {
        ' ' => '·',
        '\n' => '⏎',
        '\t' => '→',
        c => c,
    }
}

/// Key hints joined the way every screen shows them.
fn legend<'a, I: IntoIterator<Item = &'a str>>(hints: I) -> Line<'static> {
    Line::from(Span::styled(hints.into_iter().join(" / "), italic_style()))
}

/// Cut `text` to at most `max_width` terminal columns.
fn truncate_to_width(text: &str, max_width: usize) -> String {
    let mut width = 0;
    text.chars()
        .take_while(|c| {
            width += c.width().unwrap_or(0);
            width <= max_width
        })
        .collect()
}

/// Styled lines of a session's target text with the cursor line index.
///
/// The typed prefix, the error run, the cursor and the remainder are laid
/// out in that order. The error run never breaks a line since its newlines
/// are shown as glyphs.
struct CodeView {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    cursor_line: usize,
}

impl CodeView {
    fn build(target: &[char], position: usize, error_input: &str) -> Self {
        let mut view = Self {
            lines: Vec::new(),
            current: Vec::new(),
            cursor_line: 0,
        };

        let typed: String = target[..position].iter().collect();
        view.push(&typed, Style::default());

        let errors: String = error_input.chars().map(visible_char).collect();
        if !errors.is_empty() {
            view.current.push(Span::styled(errors, error_style()));
        }

        view.cursor_line = view.lines.len();
        match target.get(position) {
            Some('\n') => {
                view.current.push(Span::styled("⏎", cursor_style().add_modifier(Modifier::DIM)));
                view.break_line();
            }
            Some(c) => view.current.push(Span::styled(c.to_string(), cursor_style())),
            None => {}
        }

        let rest: String = target.get(position + 1..).unwrap_or_default().iter().collect();
        view.push(&rest, dim_style());

        view.break_line();
        view
    }

    fn push(&mut self, text: &str, style: Style) {
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                self.break_line();
            }
            if !part.is_empty() {
                self.current.push(Span::styled(part.to_string(), style));
            }
        }
    }

    fn break_line(&mut self) {
        let spans = std::mem::take(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    /// First line to show so the cursor stays roughly centred in `height` rows.
    fn scroll_offset(&self, height: u16) -> u16 {
        let half = usize::from(height) / 2;
        let max_offset = self.lines.len().saturating_sub(usize::from(height));
        let offset = self.cursor_line.saturating_sub(half).min(max_offset);
        u16::try_from(offset).unwrap_or(u16::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{App, MenuEntry};
    use crate::samples::CodeSample;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};

    fn rendered(app: &App, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn game_app(code: &str) -> App {
        let sample = CodeSample::from_text("snippet", code, None, 2000);
        let mut app = App::new(vec![MenuEntry::Sample(sample.clone())]);
        app.start_game(sample);
        app
    }

    #[test]
    fn test_visible_char() {
        assert_eq!(visible_char(' '), '·');
        assert_eq!(visible_char('\n'), '⏎');
        assert_eq!(visible_char('\t'), '→');
        assert_eq!(visible_char('x'), 'x');
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("hello", 3), "hel");
        assert_eq!(truncate_to_width("hello", 10), "hello");
        assert_eq!(truncate_to_width("日本語", 4), "日本");
    }

    #[test]
    fn test_legend_joins_hints() {
        assert_eq!(line_text(&legend(["(r)etry", "(b)ack"])), "(r)etry / (b)ack");
    }

    #[test]
    fn test_code_view_splits_lines_around_cursor() {
        let target: Vec<char> = "ab\ncd\nef".chars().collect();
        let view = CodeView::build(&target, 4, "");

        let texts: Vec<String> = view.lines.iter().map(line_text).collect();
        assert_eq!(texts, ["ab", "cd", "ef"]);
        assert_eq!(view.cursor_line, 1);
    }

    #[test]
    fn test_code_view_shows_error_run_inline() {
        let target: Vec<char> = "ab\ncd".chars().collect();
        let view = CodeView::build(&target, 1, " \n");

        let texts: Vec<String> = view.lines.iter().map(line_text).collect();
        assert_eq!(texts, ["a·⏎b", "cd"]);
        let error_span = &view.lines[0].spans[1];
        assert_eq!(error_span.content, "·⏎");
        assert_eq!(error_span.style.fg, Some(Color::Red));
    }

    #[test]
    fn test_code_view_cursor_on_newline() {
        let target: Vec<char> = "ab\ncd".chars().collect();
        let view = CodeView::build(&target, 2, "");

        let texts: Vec<String> = view.lines.iter().map(line_text).collect();
        assert_eq!(texts, ["ab⏎", "cd"]);
        assert_eq!(view.cursor_line, 0);
    }

    #[test]
    fn test_code_view_complete() {
        let target: Vec<char> = "ab".chars().collect();
        let view = CodeView::build(&target, 2, "");
        assert_eq!(view.lines.len(), 1);
        assert_eq!(line_text(&view.lines[0]), "ab");
    }

    #[test]
    fn test_scroll_offset_keeps_cursor_visible() {
        let text: String = (0..40).map(|i| format!("line{i}\n")).collect();
        let target: Vec<char> = text.chars().collect();

        let top = CodeView::build(&target, 0, "");
        assert_eq!(top.scroll_offset(10), 0);

        let position = text.find("line20").unwrap();
        let middle = CodeView::build(&target, position, "");
        assert_eq!(middle.cursor_line, 20);
        assert_eq!(middle.scroll_offset(10), 15);

        let end = CodeView::build(&target, target.len() - 1, "");
        assert_eq!(end.scroll_offset(10), end.lines.len() as u16 - 10);
    }

    #[test]
    fn test_select_screen_lists_entries() {
        let app = App::new(crate::app::default_menu());
        let screen = rendered(&app, 80, 30);
        assert!(screen.contains("Random Rust file from GitHub"));
        assert!(screen.contains("Hello World"));
    }

    #[test]
    fn test_game_screen_shows_progress() {
        let mut app = game_app("let x = 1;");
        press(&mut app, KeyCode::Char('l'));
        let screen = rendered(&app, 60, 12);
        assert!(screen.contains("let x = 1;"));
        assert!(screen.contains("1 / 10"));
        assert!(screen.contains("Typing"));
    }

    #[test]
    fn test_game_screen_shows_errors() {
        let mut app = game_app("ab");
        press(&mut app, KeyCode::Char(' '));
        let screen = rendered(&app, 60, 12);
        assert!(screen.contains("·"));
        assert!(screen.contains("Erroring"));
    }

    #[test]
    fn test_result_screen_shows_metrics() {
        let mut app = game_app("ab");
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Char('b'));
        let screen = rendered(&app, 80, 20);
        assert!(screen.contains("Keystrokes: 2"));
        assert!(screen.contains("Backspaces: 0"));
        assert!(screen.contains("keys/s"));
        assert!(screen.contains("(r)etry"));
        assert!(!screen.contains("(o)pen"));
    }

    #[test]
    fn test_tiny_terminal_does_not_panic() {
        let mut app = game_app("fn main() {}\n");
        press(&mut app, KeyCode::Char('f'));
        let area = Rect::new(0, 0, 4, 2);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        assert_eq!(*buffer.area(), area);
    }

    #[test]
    fn test_draw_into_terminal() {
        let app = App::new(crate::app::default_menu());
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw(&app, f)).unwrap();
        let content: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(content.contains("codetype"));
    }
}
