use clap::{Args, Parser, Subcommand, ValueEnum};
use launchdeck_core::BackendKind;
use std::path::PathBuf;

/// Launchdeck: keep file shortcuts in categories and open them quickly.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the configuration and stored registry.
    #[arg(long, global = true, env = "LAUNCHDECK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Override the configured storage backend.
    #[arg(long, global = true, value_enum)]
    pub backend: Option<BackendArg>,

    /// Category (id or name) to work in instead of the first one.
    #[arg(long, short, global = true)]
    pub category: Option<String>,

    /// Increase verbosity (use multiple times for more).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the files of the active category.
    List(ListArgs),
    /// Add files to the active category.
    Add(AddArgs),
    /// Hand paths to the launcher as if they were dropped onto its window.
    Drop(AddArgs),
    /// Remove a file from the active category.
    Remove(FileArgs),
    /// Open a file with the system's default application.
    Open(FileArgs),
    /// Open the folder containing a file.
    Reveal(FileArgs),
    /// Change the name a file is shown under.
    Rename(RenameFileArgs),
    /// Manage categories.
    Category(CategoryArgs),
    /// Inspect the launcher configuration.
    Config(ConfigArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Sqlite,
    Flat,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Sqlite => BackendKind::Sqlite,
            BackendArg::Flat => BackendKind::Flat,
        }
    }
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// List every category instead of only the active one.
    #[arg(long, short)]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Path(s) of the file(s) to add.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct FileArgs {
    /// ID of the file, as shown by `list`.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct RenameFileArgs {
    /// ID of the file, as shown by `list`.
    pub id: String,
    /// New display name.
    pub name: String,
}

#[derive(Args, Debug)]
pub struct CategoryArgs {
    #[command(subcommand)]
    pub command: CategoryCommands,
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// List categories in display order.
    List {},
    /// Create a new, empty category.
    Add {
        name: String,
    },
    /// Rename a category. Its files stay with it.
    Rename {
        /// ID or name of the category.
        target: String,
        name: String,
    },
    /// Delete a category together with its files.
    Delete {
        /// ID or name of the category.
        target: String,
        /// Skip confirmation.
        #[arg(long, short)]
        force: bool,
    },
    /// Put categories in the given order. Unlisted categories follow.
    Reorder {
        /// IDs or names, first to last.
        #[arg(required = true)]
        targets: Vec<String>,
    },
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration.
    Show {},
    /// Show the location of the configuration file.
    Locate {},
    /// Write the effective configuration to the data directory.
    Init {},
}
