//! Configuration value objects

mod app_config;
mod settings;

pub use app_config::{AppConfig, X11Config};
pub use settings::ClipboardSettings;
