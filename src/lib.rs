// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod github;
pub mod keys;
pub mod language;
pub mod logging;
pub mod runtime;
pub mod samples;
pub mod scanner;
pub mod session;
pub mod ui;
