use clap::{error::ErrorKind, CommandFactory, Parser};
use codetype::{
    app::{default_menu, App, AppCommand},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    github::{fetch_random_code, FetchLimits, GitHubClient},
    language::{all_languages, find_language_by_id, Language},
    logging::{init_logging, logging_requested},
    runtime::{AppEvent, CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    samples::{all_samples, find_sample, CodeSample},
    ui,
};
use crossterm::{
    cursor::Show,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs,
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::mpsc::Sender,
    thread,
    time::Duration,
};
use tracing::{info, warn};
use webbrowser::Browser;

const TICK_RATE_MS: u64 = 100;

/// typing practice with real source code
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type real source code in your terminal. Indentation and comments are skipped for you; pick a bundled sample, your own file, or a random file from a popular GitHub repository."
)]
pub struct Cli {
    /// custom text to type
    #[clap(short = 'p', long, conflicts_with_all = ["file", "sample"])]
    prompt: Option<String>,

    /// type the contents of a file
    #[clap(short = 'f', long, conflicts_with = "sample")]
    file: Option<PathBuf>,

    /// start with a bundled sample (see --list-samples)
    #[clap(short = 's', long)]
    sample: Option<String>,

    /// language id used for comment skipping and GitHub fetches
    #[clap(short = 'l', long)]
    language: Option<String>,

    /// start with a random file from GitHub
    #[clap(long, conflicts_with_all = ["prompt", "file", "sample"])]
    github: bool,

    /// maximum sample length in characters
    #[clap(long)]
    max_chars: Option<usize>,

    /// GitHub API token, raises the rate limit
    #[clap(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// print the bundled samples and exit
    #[clap(long)]
    list_samples: bool,

    /// write a log file (filter with CODETYPE_LOG)
    #[clap(long)]
    log: bool,
}

/// Effective settings after merging the config file and the command line
#[derive(Debug, Clone)]
struct Settings {
    language: &'static Language,
    max_chars: usize,
    token: Option<String>,
}

/// What the app shows first
#[derive(Debug)]
enum Start {
    Menu,
    Game(CodeSample),
    Fetch,
}

impl Cli {
    fn settings(&self, config: &Config) -> Result<Settings, String> {
        let language_id = self.language.as_deref().unwrap_or(&config.language);
        let language = find_language_by_id(language_id).ok_or_else(|| {
            let known: Vec<&str> = all_languages().iter().map(|l| l.id.as_str()).collect();
            format!(
                "unknown language '{language_id}', expected one of: {}",
                known.join(", ")
            )
        })?;

        Ok(Settings {
            language,
            max_chars: self.max_chars.unwrap_or(config.max_sample_chars),
            token: self.token.clone().or_else(|| config.github_token.clone()),
        })
    }

    fn start(&self, settings: &Settings) -> Result<Start, String> {
        let sample = if let Some(prompt) = &self.prompt {
            let language = self.language.as_ref().map(|_| settings.language);
            CodeSample::from_text("prompt", prompt, language, settings.max_chars)
        } else if let Some(path) = &self.file {
            let raw = fs::read_to_string(path)
                .map_err(|err| format!("could not read {}: {err}", path.display()))?;
            let language = match &self.language {
                Some(_) => Some(settings.language),
                None => language_for_path(path),
            };
            let title = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
            CodeSample::from_text(&title, &raw, language, settings.max_chars)
        } else if let Some(id) = &self.sample {
            find_sample(id)
                .cloned()
                .ok_or_else(|| format!("unknown sample '{id}', see --list-samples"))?
        } else if self.github {
            return Ok(Start::Fetch);
        } else {
            return Ok(Start::Menu);
        };

        if !sample.has_typable_content() {
            return Err(format!("nothing to type in '{}'", sample.title));
        }
        Ok(Start::Game(sample))
    }
}

fn language_for_path(path: &Path) -> Option<&'static Language> {
    let path = path.to_string_lossy();
    all_languages()
        .iter()
        .find(|language| language.matches_path(&path))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.list_samples {
        for sample in all_samples() {
            println!("{:<22}{:<12}{}", sample.id, sample.language, sample.title);
        }
        return Ok(());
    }

    if logging_requested(cli.log) {
        if let Some(path) = AppDirs::log_path() {
            init_logging(&path)?;
        }
    }

    let store = FileConfigStore::new();
    let mut config = store.load();
    let settings = cli
        .settings(&config)
        .unwrap_or_else(|msg| Cli::command().error(ErrorKind::InvalidValue, msg).exit());
    let start = cli
        .start(&settings)
        .unwrap_or_else(|msg| Cli::command().error(ErrorKind::ValueValidation, msg).exit());

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(default_menu());
    let first_command = match start {
        Start::Menu => AppCommand::None,
        Start::Game(sample) => {
            app.start_game(sample);
            AppCommand::None
        }
        Start::Fetch => app.start_fetch(settings.language),
    };

    let guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let event_source = CrosstermEventSource::new();
    let fetch_tx = event_source.sender();
    let runner = Runner::new(
        event_source,
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    info!("starting codetype");
    start_tui(
        &mut terminal,
        &mut app,
        &runner,
        &fetch_tx,
        &settings,
        (&store, &mut config),
        first_command,
    )?;

    drop(guard);
    terminal.show_cursor()?;

    Ok(())
}

/// Raw mode and the alternate screen, restored on drop
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = Self;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(err) = disable_raw_mode() {
            warn!(error = %err, "could not leave raw mode");
        }
        if let Err(err) = execute!(io::stdout(), LeaveAlternateScreen, Show) {
            warn!(error = %err, "could not leave the alternate screen");
        }
    }
}

fn start_tui<B: Backend, E: EventSource, T: Ticker, S: ConfigStore>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
    fetch_tx: &Sender<AppEvent>,
    settings: &Settings,
    (store, config): (&S, &mut Config),
    first_command: AppCommand,
) -> Result<(), Box<dyn Error>> {
    let mut command = first_command;

    loop {
        match command {
            AppCommand::Quit => break,
            AppCommand::Fetch { request, language } => {
                if let Err(err) = config.remember_language(store, &language.id) {
                    warn!(error = %err, "could not save the last language");
                }
                spawn_fetch(fetch_tx.clone(), request, language, settings)
            }
            AppCommand::OpenUrl(url) => open_url(&url),
            AppCommand::None => {}
        }

        terminal.draw(|f| ui::draw(app, f))?;
        command = app.handle_event(runner.step());
    }

    Ok(())
}

/// Fetch on a worker thread; the outcome comes back as an event.
fn spawn_fetch(
    tx: Sender<AppEvent>,
    request: u64,
    language: &'static Language,
    settings: &Settings,
) {
    let token = settings.token.clone();
    let limits = FetchLimits {
        max_chars: settings.max_chars,
        ..FetchLimits::default()
    };

    thread::spawn(move || {
        let result = GitHubClient::new(token).and_then(|client| {
            fetch_random_code(&client, language, &mut rand::thread_rng(), &limits)
        });
        if tx.send(AppEvent::Fetched { request, result }).is_err() {
            warn!(request, "fetch finished after the app exited");
        }
    });
}

fn open_url(url: &str) {
    if !Browser::is_available() {
        warn!(url, "no browser available");
        return;
    }
    if let Err(err) = webbrowser::open(url) {
        warn!(url, error = %err, "could not open browser");
    }
}
