//! clipkeep CLI entry point

use std::process::ExitCode;

use clap::Parser;

use clipkeep::cli::{
    app::{load_merged_config, run_read, run_write, EXIT_ERROR},
    args::{verbosity_level, Cli, Commands},
    config_cmd::handle_config_command,
    logging::init_logging,
    presenter::Presenter,
    ReadOptions, WriteOptions,
};
use clipkeep::domain::config::{AppConfig, X11Config};
use clipkeep::infrastructure::XdgConfigStore;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();

    // Build CLI config from args
    let cli_config = AppConfig {
        log_level: verbosity_level(cli.verbose).map(str::to_string),
        x11: cli.display.clone().map(|display| X11Config {
            display: Some(display),
            ..Default::default()
        }),
    };

    // Merge config
    let config = load_merged_config(cli_config);
    init_logging(config.log_level_or_default());
    let settings = config.clipboard_settings();

    match cli.command {
        Commands::Read { length } => run_read(ReadOptions { show_length: length }, settings),
        Commands::Write { text, detach } => run_write(WriteOptions { text, detach }, settings),
        Commands::Version => {
            presenter.output(&clipkeep::version());
            ExitCode::SUCCESS
        }
        Commands::Config { action } => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter) {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
    }
}
