//! Screen navigation.
//!
//! [`App`] owns the current [`AppState`] and turns terminal events into state
//! changes. Anything with side effects (network, browser, quitting) is handed
//! back to the caller as an [`AppCommand`].

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, info};

use crate::github::FetchError;
use crate::keys::typable_key;
use crate::language::{all_languages, Language};
use crate::runtime::AppEvent;
use crate::samples::{all_samples, CodeSample};
use crate::session::{TypingResult, TypingSession};

/// One line of the selection menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    Sample(CodeSample),
    Remote(&'static Language),
}

impl MenuEntry {
    pub fn label(&self) -> String {
        match self {
            MenuEntry::Sample(sample) => format!("{} ({})", sample.title, sample.language),
            MenuEntry::Remote(language) => format!("Random {} file from GitHub", language.name),
        }
    }
}

/// Remote entries for every known language followed by the bundled samples.
pub fn default_menu() -> Vec<MenuEntry> {
    all_languages()
        .iter()
        .map(MenuEntry::Remote)
        .chain(all_samples().iter().cloned().map(MenuEntry::Sample))
        .collect()
}

#[derive(Debug)]
pub enum AppState {
    Select {
        selected: usize,
    },
    Loading {
        language: &'static Language,
        request: u64,
    },
    FetchFailed {
        language: &'static Language,
        error: FetchError,
    },
    Game {
        sample: CodeSample,
        session: TypingSession,
    },
    Result {
        sample: CodeSample,
        result: TypingResult,
    },
}

/// Side effect requested by the app
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    None,
    Quit,
    Fetch {
        request: u64,
        language: &'static Language,
    },
    OpenUrl(String),
}

#[derive(Debug)]
pub struct App {
    state: AppState,
    menu: Vec<MenuEntry>,
    last_selected: usize,
    next_request: u64,
}

impl App {
    pub fn new(menu: Vec<MenuEntry>) -> Self {
        Self {
            state: AppState::Select { selected: 0 },
            menu,
            last_selected: 0,
            next_request: 1,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn menu(&self) -> &[MenuEntry] {
        &self.menu
    }

    /// Start typing `sample` with a fresh session.
    pub fn start_game(&mut self, sample: CodeSample) {
        info!(id = %sample.id, "starting session");
        let session = TypingSession::new(&sample.code, sample.comment_config());
        self.state = AppState::Game { sample, session };
    }

    /// Move to the loading screen and ask the caller to fetch a sample.
    pub fn start_fetch(&mut self, language: &'static Language) -> AppCommand {
        let request = self.next_request;
        self.next_request += 1;
        info!(language = %language.id, request, "fetching sample");

        self.state = AppState::Loading { language, request };
        AppCommand::Fetch { request, language }
    }

    pub fn handle_event(&mut self, event: AppEvent) -> AppCommand {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Fetched { request, result } => {
                self.on_fetched(request, result);
                AppCommand::None
            }
            AppEvent::Resize | AppEvent::Tick => AppCommand::None,
        }
    }

    /// Apply a fetch outcome. Results for anything but the pending request
    /// are dropped.
    pub fn on_fetched(&mut self, request: u64, result: Result<CodeSample, FetchError>) {
        let AppState::Loading {
            language,
            request: pending,
        } = self.state
        else {
            debug!(request, "fetch result arrived after leaving the loading screen");
            return;
        };

        if request != pending {
            debug!(request, pending, "ignoring stale fetch result");
            return;
        }

        match result {
            Ok(sample) => self.start_game(sample),
            Err(error) => {
                info!(language = %language.id, %error, "fetch failed");
                self.state = AppState::FetchFailed { language, error };
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> AppCommand {
        if key.kind == KeyEventKind::Release {
            return AppCommand::None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return AppCommand::Quit;
        }

        match &self.state {
            AppState::Select { selected } => {
                let selected = *selected;
                self.on_select_key(selected, key.code)
            }
            AppState::Loading { .. } => {
                if key.code == KeyCode::Esc {
                    info!("fetch cancelled");
                    self.back_to_select();
                }
                AppCommand::None
            }
            AppState::FetchFailed { language, .. } => {
                let language = *language;
                match key.code {
                    KeyCode::Char('r') => self.start_fetch(language),
                    KeyCode::Char('b') | KeyCode::Esc => {
                        self.back_to_select();
                        AppCommand::None
                    }
                    _ => AppCommand::None,
                }
            }
            AppState::Game { .. } => {
                self.on_game_key(key);
                AppCommand::None
            }
            AppState::Result { sample, .. } => match key.code {
                KeyCode::Char('r') => {
                    let sample = sample.clone();
                    self.start_game(sample);
                    AppCommand::None
                }
                KeyCode::Char('b') | KeyCode::Char('n') => {
                    self.back_to_select();
                    AppCommand::None
                }
                KeyCode::Char('o') => sample
                    .source_url
                    .clone()
                    .map_or(AppCommand::None, AppCommand::OpenUrl),
                KeyCode::Esc | KeyCode::Char('q') => AppCommand::Quit,
                _ => AppCommand::None,
            },
        }
    }

    fn on_select_key(&mut self, selected: usize, code: KeyCode) -> AppCommand {
        let last = self.menu.len().saturating_sub(1);
        let selected = match code {
            KeyCode::Up | KeyCode::Char('k') => selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => (selected + 1).min(last),
            KeyCode::Home => 0,
            KeyCode::End => last,
            KeyCode::Enter => {
                self.last_selected = selected;
                return match self.menu.get(selected) {
                    Some(MenuEntry::Sample(sample)) => {
                        let sample = sample.clone();
                        self.start_game(sample);
                        AppCommand::None
                    }
                    Some(MenuEntry::Remote(language)) => {
                        let language = *language;
                        self.start_fetch(language)
                    }
                    None => AppCommand::None,
                };
            }
            KeyCode::Esc | KeyCode::Char('q') => return AppCommand::Quit,
            _ => selected,
        };

        self.state = AppState::Select { selected };
        AppCommand::None
    }

    fn on_game_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            info!("session abandoned");
            self.back_to_select();
            return;
        }

        let AppState::Game { sample, session } = &mut self.state else {
            return;
        };
        let Some(typing_key) = typable_key(&key) else {
            return;
        };

        session.handle_key(typing_key);
        if let Some(result) = session.result() {
            info!(
                id = %sample.id,
                elapsed_secs = result.elapsed_secs,
                keystrokes = result.total_keystrokes,
                backspaces = result.backspace_count,
                "session complete"
            );
            let sample = sample.clone();
            self.state = AppState::Result { sample, result };
        }
    }

    fn back_to_select(&mut self) {
        self.state = AppState::Select {
            selected: self.last_selected,
        };
    }
}
