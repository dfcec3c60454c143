//! Main app runners for the read and write commands

use std::env;
use std::io::{self, Read};
use std::process::ExitCode;

use crate::application::ports::{Clipboard, ConfigStore, Delivery};
use crate::application::{ReadClipboardUseCase, WriteClipboardUseCase};
use crate::domain::config::{AppConfig, ClipboardSettings, X11Config};
use crate::infrastructure::{create_clipboard, XdgConfigStore};

use super::args::{ReadOptions, WriteOptions};
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment variable overriding the configured display
pub const DISPLAY_ENV: &str = "CLIPKEEP_DISPLAY";

/// Print the current clipboard text
pub fn run_read(options: ReadOptions, settings: ClipboardSettings) -> ExitCode {
    let presenter = Presenter::new();
    let use_case = ReadClipboardUseCase::new(create_clipboard(settings));

    let output = match use_case.execute() {
        Ok(output) => output,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    match output.text() {
        Ok(text) => presenter.clipboard_text(text),
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    }

    if options.show_length {
        presenter.byte_count(output.len());
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Put text on the clipboard and, if needed, keep serving it
pub fn run_write(options: WriteOptions, settings: ClipboardSettings) -> ExitCode {
    let presenter = Presenter::new();

    let bytes = match options.text {
        Some(text) => text.into_bytes(),
        None => match read_stdin() {
            Ok(bytes) => bytes,
            Err(e) => {
                presenter.error(&format!("Failed to read stdin: {}", e));
                return ExitCode::from(EXIT_ERROR);
            }
        },
    };

    let use_case = WriteClipboardUseCase::new(create_clipboard(settings));
    let delivery = match use_case.execute(&bytes) {
        Ok(delivery) => delivery,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if delivery != Delivery::BackgroundWorker {
        presenter.delivery(delivery, options.detach);
        return ExitCode::from(EXIT_SUCCESS);
    }

    if options.detach {
        if let Err(e) = use_case.clipboard().detach() {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
        presenter.delivery(delivery, true);
        return ExitCode::from(EXIT_SUCCESS);
    }

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.setup() {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    presenter.delivery(delivery, false);
    if let Err(e) = use_case.clipboard().hold() {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }
    presenter.worker_released(shutdown.is_shutdown());

    ExitCode::from(EXIT_SUCCESS)
}

fn read_stdin() -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    io::stdin().lock().read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Config built from the environment
pub fn env_config() -> AppConfig {
    let display = env::var(DISPLAY_ENV).ok().filter(|s| !s.is_empty());
    AppConfig {
        x11: display.map(|display| X11Config {
            display: Some(display),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Load and merge configuration from file, env, and CLI
pub fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    // Logging is not set up yet, so report straight to the terminal
    let file_config = store.load().unwrap_or_else(|e| {
        Presenter::new().warn(&format!("Ignoring config file: {}", e));
        AppConfig::empty()
    });

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config())
        .merge(cli_config)
}
