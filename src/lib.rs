// Library surface for the binary, headless runs and integration tests.
pub mod app;
pub mod app_dirs;
pub mod clipboard;
pub mod config;
pub mod grid;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod summary;
pub mod ui;
