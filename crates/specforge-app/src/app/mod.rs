pub mod commands;
pub mod setup;

pub use commands::{run_complete, run_models, run_propose};
pub use setup::{setup_from_cli, AppConfig};
