mod cmd_archive;
mod cmd_capture;
mod cmd_context;
mod cmd_decisions;
mod cmd_init;
mod cmd_intent_for;
mod cmd_pause;
mod cmd_process;
mod cmd_search;
mod cmd_snapshot;
mod cmd_status;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skald", version, about = "Why-code-changed memory for AI-assisted repos")]
struct Cli {
    /// Repo root (defaults to walking up from the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize a .skald/ workspace
    Init,
    /// Capture one watcher event (JSON on stdin or via --json)
    Capture {
        /// Inline JSON payload; stdin is read when omitted
        #[arg(long)]
        json: Option<String>,
    },
    /// Run one processing batch (correlate, classify, link, synthesize, snapshot)
    Process,
    /// Show workspace status
    Status,
    /// List or inspect decision records
    Decisions {
        /// Show one record in full
        #[arg(long)]
        show: Option<String>,
        /// Include superseded records in the listing
        #[arg(long)]
        all: bool,
    },
    /// Mark a decision superseded by another
    Supersede {
        /// Record to retire (e.g. ADR-003)
        id: String,
        /// The superseding record
        #[arg(long)]
        by: String,
    },
    /// Build, verify, or print the snapshot (context.lock)
    Snapshot {
        /// Verify the stored checksum and exit
        #[arg(long)]
        verify: bool,
        /// Force a rebuild from the append-only sources
        #[arg(long)]
        rebuild: bool,
    },
    /// Print a token-bounded context pack for a downstream agent
    Context {
        /// Token budget for the rendered context
        #[arg(long, default_value_t = 2000)]
        max_tokens: usize,
    },
    /// Search decision records by trigger keyword
    Search {
        keyword: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the intent history of one file
    IntentFor {
        path: String,
        /// Maximum entries to print
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Tier old records into warm/cold archives
    Archive,
    /// Stop new capture (processing and history stay intact)
    Pause,
    /// Resume capture
    Resume,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = resolve_root(cli.root);

    let result = match cli.cmd {
        Command::Init => cmd_init::execute(&root),
        Command::Capture { json } => cmd_capture::execute(&root, json.as_deref()),
        Command::Process => cmd_process::execute(&root),
        Command::Status => cmd_status::execute(&root),
        Command::Decisions { show, all } => cmd_decisions::execute(&root, show.as_deref(), all),
        Command::Supersede { id, by } => cmd_decisions::supersede(&root, &id, &by),
        Command::Snapshot { verify, rebuild } => cmd_snapshot::execute(&root, verify, rebuild),
        Command::Context { max_tokens } => cmd_context::execute(&root, max_tokens),
        Command::Search { keyword, json } => cmd_search::execute(&root, &keyword, json),
        Command::IntentFor { path, limit } => cmd_intent_for::execute(&root, &path, limit),
        Command::Archive => cmd_archive::execute(&root),
        Command::Pause => cmd_pause::execute(&root, true),
        Command::Resume => cmd_pause::execute(&root, false),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn resolve_root(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(root) = explicit {
        return root;
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    skald_store::SkaldPaths::find_root(&cwd).unwrap_or(cwd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_root_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let root = resolve_root(Some(tmp.path().to_path_buf()));
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn cli_parses_common_invocations() {
        use clap::Parser;
        assert!(Cli::try_parse_from(["skald", "init"]).is_ok());
        assert!(Cli::try_parse_from(["skald", "process"]).is_ok());
        assert!(Cli::try_parse_from(["skald", "context", "--max-tokens", "500"]).is_ok());
        assert!(Cli::try_parse_from(["skald", "supersede", "ADR-001", "--by", "ADR-002"]).is_ok());
        assert!(Cli::try_parse_from(["skald", "bogus"]).is_err());
    }
}
