//! # Command Line
//!
//! Argument parsing with clap. Usage errors exit with status 2 from clap
//! itself; everything else is decided by the command handlers.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Alfred - convert, organize, rename and summarize files from the terminal
#[derive(Parser, Debug)]
#[command(name = "alfred", version, about)]
pub struct Cli {
    /// Output style: human-readable lines or one JSON event per line
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Configuration file (defaults to config.yaml in the app support directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a file to another format, or describe the change in words
    Convert {
        input_file: PathBuf,
        /// Target extension (`png`, `.mp3`) or an instruction ("half the size")
        target_format: String,
    },
    /// Sort the files of a folder into subfolders
    Organize {
        folder: PathBuf,
        /// What to do, in plain words; without it files are grouped by type
        #[arg(short, long)]
        instructions: Option<String>,
        #[command(flatten)]
        confirm: ConfirmArgs,
    },
    /// Give files clearer names
    Rename {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        confirm: ConfirmArgs,
    },
    /// Summarize files in three bullet points
    Summarize {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Turn an instruction into a command and run it
    Ask {
        instruction: String,
        files: Vec<PathBuf>,
    },
    /// Download a converter into Alfred's bin directory
    Install { tool_name: String },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ConfirmArgs {
    /// Apply the plan instead of only showing it
    #[arg(long)]
    pub confirm: bool,

    /// Refuse to apply unless the plan still matches this Plan-Id
    #[arg(long, value_name = "ID", requires = "confirm")]
    pub plan_id: Option<String>,
}
