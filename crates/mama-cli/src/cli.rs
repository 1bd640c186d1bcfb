use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mama",
    about = "mama -- snapshot version control for a single working directory",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Run as if started in <DIR>
    #[arg(short = 'C', long = "workdir", global = true, value_name = "DIR", default_value = ".")]
    pub workdir: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a repository in the working directory
    Init,
    /// Stage files (everything if no path or `.` is given)
    Add(AddArgs),
    /// Commit the staged files
    Commit(CommitArgs),
    /// Show staged, modified, deleted, and untracked files
    Status,
    /// Show commit history
    Log(LogArgs),
    /// Show one commit
    Show(ShowArgs),
    /// Compare commits, or a commit with the working tree
    Diff(DiffArgs),
    /// Restore the working tree to an earlier commit
    Rollback(RollbackArgs),
}

#[derive(Args)]
pub struct AddArgs {
    pub paths: Vec<PathBuf>,
}

#[derive(Args)]
pub struct CommitArgs {
    #[arg(short, long)]
    pub message: String,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    pub commit: String,
}

/// No ids: newest against previous. One id: that commit against the
/// working tree. Two ids: old against new.
#[derive(Args)]
pub struct DiffArgs {
    pub old: Option<String>,
    pub new: Option<String>,
}

#[derive(Args)]
pub struct RollbackArgs {
    /// Target commit; defaults to the one before the newest
    pub commit: Option<String>,
}
