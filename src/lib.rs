//! Bakaru: finds anime folders on disk, streams them to a WebView UI and keeps
//! them in a persistent cache.

// Declare all modules as public so they can be used by the binary and tests.
pub mod app;
pub mod config;
pub mod core;
pub mod utils;
