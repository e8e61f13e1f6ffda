//! Core application functionality
//!
//! This module contains the core application logic, including:
//! - Typed errors and built-in defaults
//! - The user settings file
//! - CLI parsing and dispatch

pub mod cli;
pub mod config_file;
pub mod errors;
pub mod platform;
pub mod runner;
pub mod settings;

// Re-export commonly used items
pub use cli::CliArgs;
pub use config_file::ConfigFile;
pub use errors::{GlyphError, GlyphResult};
pub use runner::run_app;
