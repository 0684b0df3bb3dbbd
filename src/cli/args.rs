//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;
use url::Url;

/// Markdown CMS admin toolkit
#[derive(Parser, Debug, Clone)]
#[command(name = "mdcms", version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: mdcms.toml, searched upward)
    #[arg(short = 'C', long, global = true, default_value = "mdcms.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Override the CMS base url from the config file
    #[arg(short = 'U', long = "base-url", global = true, value_hint = clap::ValueHint::Url)]
    pub base_url: Option<Url>,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the slug for a title
    Slug {
        /// Free text (multiple words are joined with spaces)
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Check an editor form before submitting it
    #[command(visible_alias = "v")]
    Validate {
        #[command(flatten)]
        args: ValidateArgs,
    },

    /// Sign in and store the access token
    Login {
        username: String,

        /// Password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Forget the stored access token
    Logout,

    /// Send an authenticated request and print the response body
    #[command(visible_alias = "r")]
    Request {
        #[command(flatten)]
        args: RequestArgs,
    },

    /// Manage Markdown files
    #[command(subcommand)]
    Files(FilesCommand),

    /// Manage folders
    #[command(subcommand)]
    Folders(FoldersCommand),

    /// Watch a local Markdown file and auto-save it to the CMS
    #[command(visible_alias = "e")]
    Edit {
        #[command(flatten)]
        args: EditArgs,
    },
}

/// Validate command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(short, long)]
    pub title: Option<String>,

    #[arg(short, long)]
    pub slug: Option<String>,

    #[arg(short, long, conflicts_with = "file")]
    pub content: Option<String>,

    /// Read the content from a file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    /// Print errors as a JSON array
    #[arg(long)]
    pub json: bool,
}

/// Request command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct RequestArgs {
    /// Absolute url or path relative to the base url
    pub url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request body
    #[arg(short, long)]
    pub data: Option<String>,

    /// Extra header as `Name: value` (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum FilesCommand {
    /// List every file
    #[command(visible_alias = "ls")]
    List,

    /// Toggle the archived state of a file
    Archive { id: i64 },

    /// Delete a file
    #[command(visible_alias = "rm")]
    Delete { id: i64 },

    /// Save a file's Markdown locally
    #[command(visible_alias = "dl")]
    Download {
        id: i64,

        /// Output path (default: the server's file name in the current directory)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum FoldersCommand {
    /// List folders
    #[command(visible_alias = "ls")]
    List {
        /// Include archived folders
        #[arg(short, long)]
        archived: bool,

        /// Only folders without a parent
        #[arg(short, long)]
        root: bool,
    },

    /// Create a folder
    Create {
        name: String,

        /// Slug (default: generated from the name)
        #[arg(short, long)]
        slug: Option<String>,

        /// Parent folder id
        #[arg(short, long)]
        parent: Option<i64>,
    },

    /// Toggle the archived state of a folder and its contents
    Archive { id: i64 },

    /// Delete a folder
    #[command(visible_alias = "rm")]
    Delete { id: i64 },
}

/// Edit command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct EditArgs {
    /// Markdown file to watch
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Id of the CMS file to update (a new file is created when omitted)
    #[arg(short, long)]
    pub id: Option<i64>,

    /// Title (default: first `# ` heading, else the file name)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Slug (default: generated from the title)
    #[arg(short, long)]
    pub slug: Option<String>,

    /// Folder id to save the file in
    #[arg(short, long)]
    pub folder: Option<i64>,

    /// Auto-save delay in milliseconds (overrides the config file)
    #[arg(short, long)]
    pub delay: Option<u64>,
}
