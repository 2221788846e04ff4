use std::sync::mpsc;
use std::time::Duration;

use codetype::app::{App, AppCommand, AppState, MenuEntry};
use codetype::github::FetchError;
use codetype::language::find_language_by_id;
use codetype::runtime::{AppEvent, FixedTicker, Runner, TestEventSource};
use codetype::samples::{find_sample, CodeSample};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

fn key(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn type_text(tx: &mpsc::Sender<AppEvent>, text: &str) {
    for c in text.chars() {
        let code = match c {
            '\n' => KeyCode::Enter,
            c => KeyCode::Char(c),
        };
        tx.send(key(code)).unwrap();
    }
}

/// Drive the app until it asks to quit or the step budget runs out.
fn run(app: &mut App, runner: &Runner<TestEventSource, FixedTicker>, steps: usize) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for _ in 0..steps {
        let command = app.handle_event(runner.step());
        if command == AppCommand::Quit {
            commands.push(command);
            break;
        }
        if command != AppCommand::None {
            commands.push(command);
        }
    }
    commands
}

fn runner(rx: mpsc::Receiver<AppEvent>) -> Runner<TestEventSource, FixedTicker> {
    Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    )
}

// Headless integration using the runtime and App without a TTY
#[test]
fn headless_typing_flow_completes() {
    let sample = CodeSample::from_text("hi", "hi", None, 2000);
    let mut app = App::new(vec![MenuEntry::Sample(sample)]);

    let (tx, rx) = mpsc::channel();
    let runner = runner(rx);

    tx.send(key(KeyCode::Enter)).unwrap();
    type_text(&tx, "hi");

    run(&mut app, &runner, 10);

    match app.state() {
        AppState::Result { result, .. } => {
            assert_eq!(result.total_keystrokes, 2);
            assert_eq!(result.backspace_count, 0);
            assert!(result.keystrokes_per_second >= 0.0);
        }
        other => panic!("expected result screen, got {other:?}"),
    }
}

#[test]
fn headless_bundled_sample_with_mistakes() {
    let sample = find_sample("go-hello").unwrap().clone();
    let code = sample.code.clone();
    let mut app = App::new(vec![MenuEntry::Sample(sample)]);

    let (tx, rx) = mpsc::channel();
    let runner = runner(rx);

    tx.send(key(KeyCode::Enter)).unwrap();
    tx.send(key(KeyCode::Char('#'))).unwrap();
    tx.send(key(KeyCode::Backspace)).unwrap();
    run(&mut app, &runner, 3);

    // type what the session expects until it is done
    for _ in 0..code.chars().count() {
        let AppState::Game { session, .. } = app.state() else {
            break;
        };
        let next = match session.expected_char() {
            Some('\n') => KeyCode::Enter,
            Some(c) => KeyCode::Char(c),
            None => break,
        };
        tx.send(key(next)).unwrap();
        run(&mut app, &runner, 1);
    }

    match app.state() {
        AppState::Result { result, .. } => {
            assert_eq!(result.backspace_count, 1);
            assert!(result.total_keystrokes < code.chars().count());
        }
        other => panic!("expected result screen, got {other:?}"),
    }
}

#[test]
fn headless_fetch_result_is_delivered_as_event() {
    let rust = find_language_by_id("rust").unwrap();
    let mut app = App::new(vec![MenuEntry::Remote(rust)]);

    let (tx, rx) = mpsc::channel();
    let runner = runner(rx);

    tx.send(key(KeyCode::Enter)).unwrap();
    let commands = run(&mut app, &runner, 1);
    assert_eq!(
        commands,
        [AppCommand::Fetch {
            request: 1,
            language: rust
        }]
    );

    // a worker thread posts the outcome later
    let worker_tx = tx.clone();
    std::thread::spawn(move || {
        let sample = CodeSample::from_text("src/lib.rs", "fn x() {}", Some(rust), 2000);
        worker_tx
            .send(AppEvent::Fetched {
                request: 1,
                result: Ok(sample),
            })
            .unwrap();
    })
    .join()
    .unwrap();

    run(&mut app, &runner, 1);
    assert!(matches!(app.state(), AppState::Game { sample, .. } if sample.code == "fn x() {}"));
}

#[test]
fn headless_fetch_failure_then_quit() {
    let python = find_language_by_id("python").unwrap();
    let mut app = App::new(vec![MenuEntry::Remote(python)]);

    let (tx, rx) = mpsc::channel();
    let runner = runner(rx);

    tx.send(key(KeyCode::Enter)).unwrap();
    tx.send(AppEvent::Fetched {
        request: 1,
        result: Err(FetchError::NoSuitableFiles),
    })
    .unwrap();
    tx.send(key(KeyCode::Char('b'))).unwrap();
    tx.send(key(KeyCode::Char('q'))).unwrap();

    let commands = run(&mut app, &runner, 20);
    assert_eq!(commands.last(), Some(&AppCommand::Quit));
    assert!(matches!(app.state(), AppState::Select { selected: 0 }));
}

#[test]
fn headless_ticks_keep_game_running() {
    let sample = CodeSample::from_text("t", "abc", None, 2000);
    let mut app = App::new(vec![MenuEntry::Sample(sample)]);

    let (tx, rx) = mpsc::channel();
    let runner = runner(rx);
    tx.send(key(KeyCode::Enter)).unwrap();
    tx.send(key(KeyCode::Char('a'))).unwrap();

    // two real events followed by timeouts
    run(&mut app, &runner, 5);
    assert!(matches!(
        app.state(),
        AppState::Game { session, .. } if session.position() == 1
    ));
}
