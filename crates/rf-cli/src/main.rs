mod commands;

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use log::info;
use rf_core::StaticHost;
use rf_persistence::{build_pool, init_dotenv, DbConfig, PgRfStore, PoolProvider};

/// rf-cli - operate a Rules Framework database
#[derive(Parser, Debug)]
#[command(name = "rf-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Role id of the acting user (start/update/insert-child/transitions)
    #[arg(long, global = true, env = "RF_ROLE_ID")]
    role: Option<i64>,

    /// Business date, YYYY-MM-DD (default: today)
    #[arg(long, global = true, env = "RF_TODAY")]
    today: Option<NaiveDate>,

    /// Register a script object that only logs its parameters (repeatable)
    #[arg(long = "echo-script", global = true)]
    echo_scripts: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export workflows to a portable document
    Export {
        /// Workflow codes; all workflows when omitted
        #[arg(long = "workflow")]
        workflows: Vec<String>,
        /// Output file (default: stdout)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Import a portable document into this database
    Import { file: PathBuf },
    /// Remove dangling definition rows
    Clean,
    /// Check a workflow definition for structural problems
    Validate { workflow: String },
    /// Fire the initial transition on a parent object
    Start { workflow: String, parent: i64 },
    /// Apply the transition recorded on an existing child
    Update { workflow: String, child: i64 },
    /// Create a child with the given transition and apply it
    InsertChild {
        workflow: String,
        parent: i64,
        transition: String,
    },
    /// List transitions the current role may take, including those
    /// without a target state
    Transitions {
        workflow: String,
        parent: i64,
        /// Child being edited; its own transition is always listed
        #[arg(long)]
        child: Option<i64>,
        /// Only transitions that move the parent to a new state
        #[arg(long, conflicts_with = "child")]
        state_changing: bool,
    },
}

fn open_store() -> Result<PgRfStore<PoolProvider>> {
    init_dotenv();
    let cfg = DbConfig::from_env()?;
    let pool = build_pool(&cfg.url, cfg.min_connections, cfg.max_connections).context("could not build pool")?;
    Ok(PgRfStore::connect(PoolProvider { pool })?)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let host = StaticHost::new(cli.role, cli.today.unwrap_or_else(|| Local::now().date_naive()));
    let mut store = open_store()?;
    let stdout = io::stdout();

    match cli.command {
        Commands::Export { workflows, out } => {
            let rows = match out {
                Some(path) => {
                    let file = File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
                    commands::export(&mut store, &workflows, BufWriter::new(file))?
                }
                None => commands::export(&mut store, &workflows, stdout.lock())?,
            };
            info!("exported {rows} rows");
        }
        Commands::Import { file } => {
            let input = File::open(&file).with_context(|| format!("failed to open {}", file.display()))?;
            let report = commands::import(&mut store, BufReader::new(input))?;
            commands::write_import_report(&report, stdout.lock())?;
        }
        Commands::Clean => commands::run_clean(&mut store, stdout.lock())?,
        Commands::Validate { workflow } => commands::validate(&store, &workflow, &cli.echo_scripts, stdout.lock())?,
        Commands::Start { workflow, parent } => {
            let mut engine = commands::engine(store, host, &cli.echo_scripts);
            let child = engine.start_workflow(&workflow, parent)?;
            println!("{child}");
        }
        Commands::Update { workflow, child } => {
            let mut engine = commands::engine(store, host, &cli.echo_scripts);
            engine.update_workflow(&workflow, child)?;
        }
        Commands::InsertChild { workflow, parent, transition } => {
            let mut engine = commands::engine(store, host, &cli.echo_scripts);
            let child = engine.insert_child_workflow(&workflow, parent, &transition)?;
            println!("{child}");
        }
        Commands::Transitions { workflow, parent, child, state_changing } => {
            let engine = commands::engine(store, host, &cli.echo_scripts);
            commands::write_transitions(&engine, &workflow, parent, child, state_changing, stdout.lock())?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_insert_child_with_globals() {
        let cli = Cli::try_parse_from(["rf-cli", "insert-child", "LOAN", "42", "APPROVE", "--role", "7",
                                       "--today", "2024-03-01", "--echo-script", "rf.notify"]).unwrap();
        assert_eq!(cli.role, Some(7));
        assert_eq!(cli.today, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(cli.echo_scripts, vec!["rf.notify".to_string()]);
        match cli.command {
            Commands::InsertChild { workflow, parent, transition } => {
                assert_eq!((workflow.as_str(), parent, transition.as_str()), ("LOAN", 42, "APPROVE"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn state_changing_filter_excludes_child() {
        let cli = Cli::try_parse_from(["rf-cli", "transitions", "LOAN", "42", "--state-changing"]).unwrap();
        assert!(matches!(cli.command, Commands::Transitions { state_changing: true, child: None, .. }));
        assert!(Cli::try_parse_from(["rf-cli", "transitions", "LOAN", "42", "--state-changing", "--child", "3"]).is_err());
    }

    #[test]
    fn export_defaults_to_all_workflows_on_stdout() {
        let cli = Cli::try_parse_from(["rf-cli", "export"]).unwrap();
        match cli.command {
            Commands::Export { workflows, out } => {
                assert!(workflows.is_empty());
                assert!(out.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
