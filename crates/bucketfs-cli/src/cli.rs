use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bucketfs",
    about = "Browse and edit a flat object bucket as a directory tree",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML file with [store] and [fs] sections
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding local buckets (overrides the config file)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Bucket name (overrides the config file)
    #[arg(short, long, global = true)]
    pub bucket: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a file from a local path or stdin
    Put(PutArgs),
    /// Stream a file to stdout
    Cat(CatArgs),
    /// Delete a file
    Rm(PathArgs),
    /// List a directory
    Ls(LsArgs),
    /// Create a directory marker
    Mkdir(PathArgs),
    /// Move or rename a file or directory
    Mv(MvArgs),
    /// Delete a directory and everything under it
    Rmtree(PathArgs),
    /// Show size, type and modification time
    Stat(PathArgs),
    /// Print the public URL of a path
    Url(PathArgs),
    /// Report whether a path is a file, a directory, or missing
    Exists(PathArgs),
}

#[derive(Args)]
pub struct PathArgs {
    pub path: String,
}

#[derive(Args)]
pub struct PutArgs {
    pub path: String,
    /// Local file to upload; stdin when omitted
    #[arg(long)]
    pub from: Option<PathBuf>,
}

#[derive(Args)]
pub struct CatArgs {
    pub path: String,
    /// Read size per pull
    #[arg(long, default_value = "8192")]
    pub chunk: usize,
}

#[derive(Args)]
pub struct LsArgs {
    #[arg(default_value = "")]
    pub path: String,
}

#[derive(Args)]
pub struct MvArgs {
    pub from: String,
    pub to: String,
    /// Replace the destination if it exists
    #[arg(short, long)]
    pub force: bool,
}
