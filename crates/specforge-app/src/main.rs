use anyhow::Result;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use specforge::{run_complete, run_models, run_propose, setup_from_cli, Cli, Commands};
use specforge_llm_api::CancellationToken;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "specforge=debug,specforge_llm_api=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Cancel `token` on the first Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Some(shell) = cli.generate {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "specforge", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(cli.verbose);

    let Some(command) = cli.command.as_ref() else {
        println!("{}", "No subcommand provided. Try `specforge --help`.".yellow());
        return Ok(());
    };

    let client = setup_from_cli(&cli)?.into_client();
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let result = match command {
        Commands::Models => run_models(&client).await,
        Commands::Complete { prompt, system } => run_complete(&client, system, prompt, cancel).await,
        Commands::Propose { prompt, system, pretty } => {
            run_propose(&client, system, prompt, *pretty, cancel).await
        }
    };

    if let Err(e) = &result {
        eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}
