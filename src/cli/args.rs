//! CLI argument definitions using clap

use clap::Parser;

/// Heroku client: runs COMMAND (`namespace`, `namespace:action` or a bare app action)
#[derive(Parser, Debug)]
#[command(name = "heroku")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-d, -dd, -ddd)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Generate shell completions and exit
    #[arg(long = "generate", value_enum)]
    pub generator: Option<clap_complete::Shell>,

    /// Command string, e.g. `list`, `help` or `app:restart`
    pub command: Option<String>,

    /// Arguments handed to the command handler
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// Command string to dispatch; no command means `help`.
    pub fn command_or_help(&self) -> &str {
        self.command.as_deref().unwrap_or("help")
    }
}
