use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::model::config::DateFormat;

#[derive(Parser)]
#[command(name = "mdb", about = concat!("mdboard v", env!("CARGO_PKG_VERSION"), " - edit a kanban board as markdown"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: <config dir>/mdboard/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Board store file (overrides the config's `store`)
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Board to operate on (overrides the config's `board`)
    #[arg(short = 'b', long, global = true, value_name = "ID")]
    pub board: Option<String>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a board in the store and select it
    Init(InitArgs),
    /// List boards in the store
    Boards,
    /// Print the selected board as a markdown document
    Render(RenderArgs),
    /// Show the changes an edited document would make, without applying
    Plan(DocumentArgs),
    /// Apply the changes in an edited document
    Apply(DocumentArgs),
    /// Open the board in $VISUAL / $EDITOR and apply the edits
    Edit,
    /// View or change settings
    Config(ConfigCmd),
}

#[derive(Args)]
pub struct InitArgs {
    /// Board name
    pub name: String,
}

#[derive(Args)]
pub struct RenderArgs {
    /// Write to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct DocumentArgs {
    /// Edited board document
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective settings
    Show,
    /// Select the board that commands operate on
    Board {
        /// Board ID
        id: String,
    },
    /// Set how dates are written (iso, us, eu)
    DateFormat {
        format: DateFormat,
    },
    /// Set the board store file
    Store {
        path: PathBuf,
    },
}
