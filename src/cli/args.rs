//! CLI argument definitions using Clap

use clap::{ArgAction, Parser, Subcommand};

/// clipkeep - clipboard text that outlives the writer
#[derive(Parser, Debug)]
#[command(name = "clipkeep")]
#[command(version)]
#[command(about = "Read and write clipboard text that stays available after the writer exits")]
#[command(long_about = None)]
pub struct Cli {
    /// X display to use (defaults to $DISPLAY)
    #[arg(long, global = true, value_name = "DISPLAY")]
    pub display: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the current clipboard text
    Read {
        /// Also report the exact byte length on stderr
        #[arg(short = 'l', long)]
        length: bool,
    },
    /// Put text on the clipboard (reads stdin when TEXT is omitted)
    Write {
        /// Text to copy
        text: Option<String>,

        /// Leave the background worker running and return immediately
        #[arg(short = 'd', long)]
        detach: bool,
    },
    /// Print the library version
    Version,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Parsed read options
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    pub show_length: bool,
}

/// Parsed write options
#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub text: Option<String>,
    pub detach: bool,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "log_level",
    "x11.display",
    "x11.max_spawn_retries",
    "x11.conversion_chunk",
];

/// Valid log levels
pub const VALID_LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

/// Log level selected by repeated `-v` flags, if any
pub fn verbosity_level(count: u8) -> Option<&'static str> {
    match count {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}
