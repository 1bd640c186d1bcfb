use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use mama_sdk::{
    AddReport, CommitId, CommitOutcome, Comparison, DiffTarget, FileStatus, InitOutcome,
    RepoConfig, Repository,
};
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let workdir = std::path::absolute(&cli.workdir)
        .with_context(|| format!("cannot resolve {}", cli.workdir.display()))?;
    debug!(workdir = %workdir.display(), "resolved working directory");
    let config = RepoConfig::new(workdir);
    match cli.command {
        Command::Init => cmd_init(config),
        Command::Add(args) => cmd_add(&open(config)?, args),
        Command::Commit(args) => cmd_commit(&open(config)?, args),
        Command::Status => cmd_status(&open(config)?),
        Command::Log(args) => cmd_log(&open(config)?, args),
        Command::Show(args) => cmd_show(&open(config)?, args),
        Command::Diff(args) => cmd_diff(&open(config)?, args),
        Command::Rollback(args) => cmd_rollback(&open(config)?, args),
    }
}

fn open(config: RepoConfig) -> anyhow::Result<Repository> {
    Ok(Repository::open(config)?)
}

fn parse_id(s: &str) -> anyhow::Result<CommitId> {
    CommitId::parse(s).with_context(|| format!("not a commit id: {s}"))
}

fn cmd_init(config: RepoConfig) -> anyhow::Result<()> {
    let (repo, outcome) = Repository::init(config)?;
    let root = repo.layout().root().display().to_string();
    match outcome {
        InitOutcome::Created => {
            println!("{} Initialized mama repository in {}", "✓".green().bold(), root.bold())
        }
        InitOutcome::AlreadyInitialized => {
            println!("Repository already initialized in {}", root.bold())
        }
    }
    Ok(())
}

fn cmd_add(repo: &Repository, args: AddArgs) -> anyhow::Result<()> {
    if args.paths.is_empty() || args.paths.iter().all(|p| p == Path::new(".")) {
        return print_add_report(&repo.add_all()?);
    }

    // Relative paths are keyed against the repository, not the process cwd.
    print_add_report(&repo.add_paths(&args.paths)?)
}

fn print_add_report(report: &AddReport) -> anyhow::Result<()> {
    for path in &report.staged {
        println!("  {} {}", "staged:".green(), path);
    }
    for path in &report.excluded {
        println!("  {} {}", "excluded:".dimmed(), path);
    }
    for failure in &report.failures {
        println!("  {} {} ({})", "failed:".red(), failure.path, failure.reason);
    }
    if report.staged.is_empty() && report.failures.is_empty() {
        println!("Nothing new to stage.");
    }
    Ok(())
}

fn cmd_commit(repo: &Repository, args: CommitArgs) -> anyhow::Result<()> {
    match repo.commit(&args.message)? {
        CommitOutcome::Committed(summary) => {
            println!(
                "{} Committed {}",
                "✓".green().bold(),
                summary.commit.commit_id.to_string().yellow()
            );
            println!("  Message: {}", summary.commit.message);
            for path in &summary.new_files {
                println!("  {} {}", "new:".green(), path);
            }
            for path in &summary.modified_files {
                println!("  {} {}", "modified:".yellow(), path);
            }
        }
        CommitOutcome::NothingToCommit => println!("Nothing to commit."),
    }
    Ok(())
}

fn cmd_status(repo: &Repository) -> anyhow::Result<()> {
    let status = repo.status()?;
    if status.is_clean() {
        println!("Nothing to commit, working directory clean.");
        return Ok(());
    }

    if !status.staged.is_empty() {
        println!("Changes to be committed:");
        for entry in &status.staged {
            let label = match entry.status {
                FileStatus::New => "new file:",
                FileStatus::Modified => "modified:",
            };
            println!("  {} {}", label.green(), entry.path);
        }
    }
    if !status.modified.is_empty() || !status.deleted.is_empty() {
        println!("Changes not staged:");
        for path in &status.modified {
            println!("  {} {}", "modified:".red(), path);
        }
        for path in &status.deleted {
            println!("  {} {}", "deleted:".red(), path);
        }
    }
    if !status.untracked.is_empty() {
        println!("Untracked files:");
        for path in &status.untracked {
            println!("  {}", path.red());
        }
    }
    Ok(())
}

fn cmd_log(repo: &Repository, args: LogArgs) -> anyhow::Result<()> {
    let commits = repo.log()?;
    if commits.is_empty() {
        println!("No commits yet.");
        return Ok(());
    }
    for commit in commits.iter().rev() {
        if args.oneline {
            println!("{} {}", commit.commit_id.to_string().yellow(), commit.message);
        } else {
            println!(
                "{}  {}",
                commit.commit_id.to_string().yellow().bold(),
                commit.timestamp.dimmed()
            );
            println!("  {}", commit.message);
            println!("  {} file(s)", commit.files.len());
        }
    }
    Ok(())
}

fn cmd_show(repo: &Repository, args: ShowArgs) -> anyhow::Result<()> {
    let commit = repo.commit_details(&parse_id(&args.commit)?)?;
    println!("Commit {}", commit.commit_id.to_string().yellow().bold());
    println!("Date:    {}", commit.timestamp);
    println!("Message: {}", commit.message);
    for file in &commit.files {
        println!("  {}  {}", file.hash.short_hex().dimmed(), file.file_name);
    }
    Ok(())
}

fn cmd_diff(repo: &Repository, args: DiffArgs) -> anyhow::Result<()> {
    let target = match (args.old.as_deref(), args.new.as_deref()) {
        (None, _) => DiffTarget::LatestWithPrevious,
        (Some(id), None) => DiffTarget::WorkingTree(parse_id(id)?),
        (Some(old), Some(new)) => DiffTarget::Commits(parse_id(old)?, parse_id(new)?),
    };
    print_comparison(&repo.diff(&target)?);
    Ok(())
}

fn print_comparison(cmp: &Comparison) {
    if cmp.is_empty() {
        println!("No changes.");
        return;
    }
    for line in cmp.render().lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            println!("{}", line.bold());
        } else if line.starts_with("@@") {
            println!("{}", line.cyan());
        } else if line.starts_with('+') || line.starts_with("added:") {
            println!("{}", line.green());
        } else if line.starts_with('-') || line.starts_with("deleted:") {
            println!("{}", line.red());
        } else {
            println!("{line}");
        }
    }
}

fn cmd_rollback(repo: &Repository, args: RollbackArgs) -> anyhow::Result<()> {
    let target = args.commit.as_deref().map(parse_id).transpose()?;
    let report = repo.rollback(target.as_ref())?;
    println!(
        "{} Rolled back to {}",
        "✓".green().bold(),
        report.target.to_string().yellow()
    );
    for path in &report.deleted {
        println!("  {} {}", "deleted:".red(), path);
    }
    for path in &report.restored {
        println!("  {} {}", "restored:".green(), path);
    }
    for path in &report.unstaged {
        println!("  {} {}", "unstaged:".dimmed(), path);
    }
    if !report.pruned.is_empty() {
        println!("  Dropped {} later commit(s)", report.pruned.len());
    }
    for path in &report.mismatches {
        println!("  {} {}", "mismatch:".red().bold(), path);
    }
    for failure in &report.failures {
        println!("  {} {} ({})", "failed:".red(), failure.path, failure.reason);
    }
    Ok(())
}
