//! specforge application library
//!
//! Command-line front end over `specforge-llm-api`.

pub mod app;
pub mod cli;

pub use app::{run_complete, run_models, run_propose, setup_from_cli, AppConfig};
pub use cli::{Cli, Commands};
