//! CLI surface for gitchat.
//!
//! - `serve`: clone the remote and accept comments over HTTP
//! - `add`: store a single comment and print it
//! - `config`: show the effective configuration

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::Result;
use crate::config::Config;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "gitchat",
    version,
    about = "Comment store backed by a git remote",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Config file (default: $GITCHAT_CONFIG, then the user config dir).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log more (repeat for more).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clone the remote and serve `POST /` until interrupted.
    Serve,

    /// Store one comment and print it as JSON.
    Add(AddArgs),

    /// Print the effective configuration (password masked).
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    #[arg(long)]
    pub author: String,

    #[arg(long)]
    pub text: String,

    /// `#rrggbb`.
    #[arg(long, default_value = "")]
    pub color: String,

    /// Id of the comment being answered.
    #[arg(long, default_value = "")]
    pub reply: String,
}

pub fn parse_from<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::parse_from(args)
}

/// Run the CLI (used by bin).
pub fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Serve => commands::serve::handle(&config),
        Commands::Add(args) => commands::add::handle(&config, args),
        Commands::Config => commands::config::handle(&config),
    }
}
