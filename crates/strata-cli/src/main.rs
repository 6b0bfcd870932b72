//! strata CLI — argument parsing and the exit-status reporting shim.
//!
//! The library reports typed errors; this binary maps each outcome to
//! a message and a documented process status code.

use std::io;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use strata_core::{Repository, StrataError, StrataResult};

#[derive(Parser)]
#[command(name = "strata", about = "strata — linear snapshot version tracking", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a repository in the current directory.
    Init,

    /// Start tracking a file in a new version.
    Add {
        file: PathBuf,

        /// Message to record in history.
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Stop tracking a file in a new version.
    Detach {
        file: PathBuf,

        /// Message to record in history.
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Record a tracked file's current contents in a new version.
    Commit {
        file: PathBuf,

        /// Message to record in history.
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Restore the working directory to a stored version.
    Checkout {
        /// Target version number.
        version: String,
    },

    /// Show a version's recorded message (defaults to the current version).
    Version {
        version: Option<String>,

        /// Output format: "human" (default) or "json".
        #[arg(long, default_value = "human")]
        format: String,
    },

    /// Show history, newest first.
    History {
        /// Maximum number of entries to show (non-positive means all).
        #[arg(long)]
        last: Option<i64>,

        /// Output format: "human" (default) or "json".
        #[arg(long, default_value = "human")]
        format: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let cwd = std::env::current_dir().unwrap_or_else(|e| {
        eprintln!("error: cannot determine current directory: {e}");
        process::exit(1);
    });

    if let Err(e) = run(&cli.command, &cwd) {
        eprintln!("error: {e}");
        process::exit(status_for(&e, &cli.command));
    }
}

fn run(command: &Commands, cwd: &Path) -> StrataResult<()> {
    match command {
        Commands::Init => cmd_init(cwd),
        Commands::Add { file, message } => cmd_add(cwd, file, message.as_deref()),
        Commands::Detach { file, message } => cmd_detach(cwd, file, message.as_deref()),
        Commands::Commit { file, message } => cmd_commit(cwd, file, message.as_deref()),
        Commands::Checkout { version } => cmd_checkout(cwd, version),
        Commands::Version { version, format } => {
            cmd_version(cwd, version.as_deref(), format)
        }
        Commands::History { last, format } => cmd_history(cwd, *last, format),
    }
}

/// Map an error to the documented process status code.
///
/// The values come from the tool's original exit-code contract; note
/// that already-tracked/not-tracked report a message but exit 0, and
/// a missing file maps to a different code for add (21) and commit
/// (51).
fn status_for(err: &StrataError, command: &Commands) -> i32 {
    match err {
        StrataError::NotInitialized => -2,
        StrataError::AlreadyInitialized => 10,
        StrataError::FileNotFound(_) => {
            if matches!(command, Commands::Commit { .. }) {
                51
            } else {
                21
            }
        }
        StrataError::AlreadyTracked(_) | StrataError::NotTracked(_) => 0,
        StrataError::InvalidVersion(_) => 60,
        StrataError::Corrupt(_) | StrataError::Io(_) => -3,
    }
}

fn json_error(e: serde_json::Error) -> StrataError {
    StrataError::Io(io::Error::new(io::ErrorKind::Other, e))
}

fn cmd_init(cwd: &Path) -> StrataResult<()> {
    Repository::init(cwd)?;
    println!("initialized strata repository in .strata/");
    Ok(())
}

fn cmd_add(cwd: &Path, file: &Path, message: Option<&str>) -> StrataResult<()> {
    let repo = Repository::open(cwd)?;
    let version = repo.add_file(file, message)?;
    println!("added '{}' (version {version})", file.display());
    Ok(())
}

fn cmd_detach(cwd: &Path, file: &Path, message: Option<&str>) -> StrataResult<()> {
    let repo = Repository::open(cwd)?;
    let version = repo.detach_file(file, message)?;
    println!("detached '{}' (version {version})", file.display());
    Ok(())
}

fn cmd_commit(cwd: &Path, file: &Path, message: Option<&str>) -> StrataResult<()> {
    let repo = Repository::open(cwd)?;
    let version = repo.commit_file(file, message)?;
    println!("committed '{}' (version {version})", file.display());
    Ok(())
}

fn cmd_checkout(cwd: &Path, version: &str) -> StrataResult<()> {
    let repo = Repository::open(cwd)?;
    let result = repo.checkout(version)?;
    println!(
        "checked out version {} ({} file(s) restored)",
        result.version, result.files_restored
    );
    Ok(())
}

fn cmd_version(cwd: &Path, version: Option<&str>, format: &str) -> StrataResult<()> {
    let repo = Repository::open(cwd)?;
    let entry = repo.version_info(version)?;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&entry).map_err(json_error)?;
            println!("{json}");
        }
        _ => {
            println!("Version: {}", entry.version);
            println!("{}", entry.message);
        }
    }
    Ok(())
}

fn cmd_history(cwd: &Path, last: Option<i64>, format: &str) -> StrataResult<()> {
    let repo = Repository::open(cwd)?;

    // Non-positive limits mean "all entries".
    let limit = match last {
        Some(n) if n > 0 => Some(n as usize),
        _ => None,
    };
    let entries = repo.history(limit)?;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&entries).map_err(json_error)?;
            println!("{json}");
        }
        _ => {
            if entries.is_empty() {
                println!("No history available.");
            } else {
                for entry in &entries {
                    println!("{}", entry.summary());
                }
            }
        }
    }
    Ok(())
}
