// Configuration loading

pub mod settings;

pub use settings::{config_dir, ConfigError, Settings, DEFAULT_API_BASE};
