use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use varsnap::{
    eligible_names, OverwritePolicy, Scope, Selection, SnapshotError, VarStore, DEFAULT_STEM,
};

#[derive(Parser)]
#[command(
    name = "varsnap",
    version,
    about = "Save and restore session variable snapshots"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture variables from a scope file into a snapshot
    Save {
        /// Snapshot path; `.vars` is appended when no extension is given
        path: Option<PathBuf>,
        /// JSON scope file holding the session variables
        #[arg(long)]
        scope: PathBuf,
        /// Save only these variables
        #[arg(long, value_delimiter = ',')]
        vars: Option<Vec<String>>,
        /// Save variables whose name matches this glob pattern
        #[arg(long, conflicts_with = "vars")]
        matching: Option<String>,
        /// What to do when the snapshot file already exists
        #[arg(long, default_value = "prompt", value_parser = parse_policy)]
        overwrite: OverwritePolicy,
    },
    /// Restore variables from a snapshot into a scope file
    Load {
        /// Snapshot path; `.vars` is appended when no extension is given
        path: Option<PathBuf>,
        /// JSON scope file to merge the snapshot into
        #[arg(long)]
        scope: PathBuf,
        /// What to do when a variable already exists in the scope
        #[arg(long, default_value = "prompt", value_parser = parse_policy)]
        overwrite: OverwritePolicy,
        /// Skip the untrusted-data warning
        #[arg(long)]
        no_warn: bool,
    },
    /// List the eligible variables in a scope file
    Vars {
        /// JSON scope file holding the session variables
        #[arg(long)]
        scope: PathBuf,
    },
    /// List the variable names stored in a snapshot without loading it
    Peek {
        /// Snapshot path; `.vars` is appended when no extension is given
        path: Option<PathBuf>,
    },
}

fn parse_policy(s: &str) -> Result<OverwritePolicy, SnapshotError> {
    s.parse()
}

fn read_scope(path: &PathBuf) -> Result<Scope> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read scope file {}", path.display()))?;
    let value = serde_json::from_str(&text)
        .with_context(|| format!("scope file {} is not valid JSON", path.display()))?;
    Ok(Scope::from_json(value)?)
}

fn write_scope(path: &PathBuf, scope: &Scope) -> Result<()> {
    let text = serde_json::to_string_pretty(&scope.to_json())?;
    fs::write(path, text).with_context(|| format!("cannot write scope file {}", path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut store = VarStore::standard();
    let default_path = || PathBuf::from(DEFAULT_STEM);

    match cli.command {
        Command::Save {
            path,
            scope,
            vars,
            matching,
            overwrite,
        } => {
            let workspace = read_scope(&scope)?;
            let selection = match (vars, matching) {
                (Some(names), _) => Selection::Names(names),
                (None, Some(pattern)) => Selection::Pattern(pattern),
                (None, None) => Selection::All,
            };
            store.save(
                &workspace,
                path.unwrap_or_else(default_path),
                selection,
                overwrite,
            )?;
        }
        Command::Load {
            path,
            scope,
            overwrite,
            no_warn,
        } => {
            let mut workspace = read_scope(&scope)?;
            let report = store.load(
                &mut workspace,
                path.unwrap_or_else(default_path),
                overwrite,
                !no_warn,
            )?;
            if !report.bound.is_empty() {
                write_scope(&scope, &workspace)?;
            }
        }
        Command::Vars { scope } => {
            let workspace = read_scope(&scope)?;
            println!("variables: {}", eligible_names(&workspace).join(","));
        }
        Command::Peek { path } => {
            let names = store.peek(path.unwrap_or_else(default_path))?;
            println!("variables: {}", names.join(","));
        }
    }
    Ok(())
}
