pub mod channel_map;
pub mod toml_config;

pub use toml_config::TomlConfig;
