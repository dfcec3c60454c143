//! Terminal output for the clipkeep CLI
//!
//! Clipboard text is the only thing written to stdout by `read`, so scripts
//! can capture it unchanged. Everything else goes to stderr.

use std::io::{self, Write};

use colored::*;

use crate::application::ports::Delivery;

pub struct Presenter;

impl Presenter {
    pub fn new() -> Self {
        Self
    }

    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// One line of plain output on stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Clipboard text, byte for byte, with no trailing newline
    pub fn clipboard_text(&self, text: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    pub fn byte_count(&self, len: usize) {
        let unit = if len == 1 { "byte" } else { "bytes" };
        eprintln!("{} {} {}", "ℹ".cyan(), len.to_string().bold(), unit);
    }

    /// Report where a write ended up
    pub fn delivery(&self, delivery: Delivery, detached: bool) {
        match delivery {
            Delivery::ClipboardManager => self.success("Handed to the clipboard manager"),
            Delivery::System => self.success("Copied to clipboard"),
            Delivery::BackgroundWorker if detached => {
                self.success("Copied; a background worker serves the clipboard")
            }
            Delivery::BackgroundWorker => self.info(
                "Serving the clipboard until another application takes it (Ctrl+C to stop)",
            ),
        }
    }

    /// Report why a held worker went away
    pub fn worker_released(&self, interrupted: bool) {
        if interrupted {
            self.warn("Stopped serving the clipboard");
        } else {
            self.success("Clipboard taken over by another application");
        }
    }

    /// Config entry, `(not set)` when absent
    pub fn key_value(&self, key: &str, value: Option<&str>) {
        match value {
            Some(value) => println!("{}: {}", key.cyan(), value),
            None => println!("{}: {}", key.cyan(), "(not set)".dimmed()),
        }
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}
