//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::{AppConfig, X11Config};
use crate::domain::error::ConfigError;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS, VALID_LOG_LEVELS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter),
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value),
        ConfigAction::Get { key } => handle_get(store, presenter, &key),
        ConfigAction::List => handle_list(store, presenter),
        ConfigAction::Path => handle_path(store, presenter),
    }
}

fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init()?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let mut config = store.load()?;
    apply_value(&mut config, key, value)?;

    store.save(&config)?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let config = store.load()?;
    match lookup_value(&config, key) {
        Some(v) => presenter.output(&v),
        None => presenter.output(NOT_SET),
    }

    Ok(())
}

fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load()?;

    for key in VALID_CONFIG_KEYS {
        presenter.key_value(key, lookup_value(&config, key).as_deref());
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if !is_valid_config_key(key) {
        return Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        });
    }
    Ok(())
}

/// Validate `value` for `key` and store it in `config`
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "log_level" => {
            let level = value.to_lowercase();
            if !VALID_LOG_LEVELS.contains(&level.as_str()) {
                return Err(ConfigError::ValidationError {
                    key: key.to_string(),
                    message: format!(
                        "Invalid value '{}'. Valid options: {}",
                        value,
                        VALID_LOG_LEVELS.join(", ")
                    ),
                });
            }
            config.log_level = Some(level);
        }
        "x11.display" => {
            x11_section(config).display = Some(value.to_string());
        }
        "x11.max_spawn_retries" => {
            let retries = value.parse::<u32>().map_err(|e| ConfigError::ValidationError {
                key: key.to_string(),
                message: e.to_string(),
            })?;
            x11_section(config).max_spawn_retries = Some(retries);
        }
        "x11.conversion_chunk" => {
            let chunk = parse_positive(value).ok_or_else(|| ConfigError::ValidationError {
                key: key.to_string(),
                message: "Value must be a positive number of bytes".to_string(),
            })?;
            x11_section(config).conversion_chunk = Some(chunk);
        }
        _ => unreachable!(), // Already validated
    }
    Ok(())
}

fn lookup_value(config: &AppConfig, key: &str) -> Option<String> {
    let x11 = config.x11.as_ref();
    match key {
        "log_level" => config.log_level.clone(),
        "x11.display" => x11.and_then(|x| x.display.clone()),
        "x11.max_spawn_retries" => x11.and_then(|x| x.max_spawn_retries).map(|n| n.to_string()),
        "x11.conversion_chunk" => x11.and_then(|x| x.conversion_chunk).map(|n| n.to_string()),
        _ => None,
    }
}

fn x11_section(config: &mut AppConfig) -> &mut X11Config {
    config.x11.get_or_insert_with(X11Config::default)
}

fn parse_positive(value: &str) -> Option<usize> {
    value.parse::<usize>().ok().filter(|n| *n > 0)
}
