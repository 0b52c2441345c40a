pub mod cli;
pub mod config;

pub use cli::{build_cli_command, Cli, Commands, OverrideArgs};
pub use config::{load_config, LumenConfig};
