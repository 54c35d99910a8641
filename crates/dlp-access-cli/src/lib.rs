//! DLP Access CLI — browse the digital-library collections and CMS pages
//! from a terminal.

pub mod commands;
pub mod config;
pub mod portal;
pub mod render;
pub mod repl;

pub use config::{load_config, resolve_config_path, AccessConfig, ConfigError};
pub use portal::Portal;
