//! CLI command definitions and subcommands

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Lorewright - tabletop RPG content generator
#[derive(Parser)]
#[command(
    name = "lorewright",
    about = "Generate tabletop RPG content from toolkit blocks",
    version,
    after_help = "Logs are written to: ~/.local/share/lorewright/logs/lorewright.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the available blocks
    Blocks,

    /// Print the prompt a block would send, without calling the model
    Prompt(BlockArgs),

    /// Run a block against the model
    Generate {
        #[command(flatten)]
        args: BlockArgs,

        /// Save the result to the library
        #[arg(long)]
        save: bool,

        /// Expand an anchored entry (e.g. a book title); repeatable
        #[arg(long, value_name = "ANCHOR")]
        expand: Vec<String>,
    },
}

#[derive(Args)]
pub struct BlockArgs {
    /// Block id (see `lorewright blocks`)
    pub block: String,

    /// Free-text refinement
    #[arg(short, long, default_value = "")]
    pub refine: String,

    /// Set an option, as id=value
    #[arg(short, long = "option", value_name = "ID=VALUE", value_parser = parse_key_value)]
    pub options: Vec<(String, String)>,

    /// Set a custom option value, as id=text
    #[arg(long = "custom", value_name = "ID=TEXT", value_parser = parse_key_value)]
    pub custom: Vec<(String, String)>,

    /// Campaign JSON file to use as the active campaign
    #[arg(long, value_name = "FILE")]
    pub campaign: Option<PathBuf>,

    /// Do not inject campaign context
    #[arg(long)]
    pub no_campaign_context: bool,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got '{}'", s))?;
    if key.trim().is_empty() {
        return Err(format!("missing option id in '{}'", s));
    }
    Ok((key.trim().to_string(), value.to_string()))
}
