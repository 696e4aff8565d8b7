use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// CLI arguments for specforge
#[derive(Parser, Debug)]
#[command(name = "specforge")]
#[command(about = "Stream completions and propose file changes from the configured LLM backend")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Generate shell completions
    #[arg(long, value_enum)]
    pub generate: Option<Shell>,

    /// API key for the direct backend (an `sk-ant-` key selects Anthropic)
    #[arg(long, value_name = "KEY", env = "SPECFORGE_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Base URL of the direct backend (e.g., http://localhost:8080/v1)
    #[arg(long, value_name = "URL", env = "SPECFORGE_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Model id to request
    #[arg(long, value_name = "MODEL", env = "SPECFORGE_MODEL", global = true)]
    pub model: Option<String>,

    /// Pin a backend instead of auto-detecting it (openai, anthropic)
    #[arg(long, value_name = "BACKEND", env = "SPECFORGE_BACKEND", global = true)]
    pub backend: Option<String>,

    /// Enable verbose debug output (every SSE frame is traced)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Write request and error response dumps to ~/.specforge/logs
    #[arg(long, global = true)]
    pub log_requests: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// List the models that can serve requests right now
    Models,
    /// Stream a completion to stdout
    Complete {
        /// User prompt
        prompt: String,
        /// System prompt
        #[arg(short = 's', long, default_value = "")]
        system: String,
    },
    /// Ask the model for file writes, edits and commands, printed as JSON
    Propose {
        /// Description of the change
        prompt: String,
        /// System prompt
        #[arg(short = 's', long, default_value = "")]
        system: String,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_complete() {
        let cli = Cli::try_parse_from(["specforge", "complete", "hello", "--system", "be brief"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Complete {
                prompt: "hello".to_string(),
                system: "be brief".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_propose_pretty() {
        let cli = Cli::try_parse_from(["specforge", "propose", "add a README", "--pretty"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Propose {
                prompt: "add a README".to_string(),
                system: String::new(),
                pretty: true,
            })
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "specforge",
            "models",
            "--backend",
            "anthropic",
            "--base-url",
            "http://localhost:8080/v1",
            "--verbose",
        ])
        .unwrap();

        assert_eq!(cli.command, Some(Commands::Models));
        assert_eq!(cli.backend.as_deref(), Some("anthropic"));
        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:8080/v1"));
        assert!(cli.verbose);
        assert!(!cli.log_requests);
    }

    #[test]
    fn test_generate_flag() {
        let cli = Cli::try_parse_from(["specforge", "--generate", "bash"]).unwrap();
        assert!(matches!(cli.generate, Some(Shell::Bash)));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_complete_requires_prompt() {
        assert!(Cli::try_parse_from(["specforge", "complete"]).is_err());
    }
}
