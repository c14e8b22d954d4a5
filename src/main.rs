mod interactive;
mod render;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use codeseek_core::bootstrap::{App, build_app};
use codeseek_core::config::{Backend, Config};
use codeseek_core::notice::Notice;
use codeseek_index::IndexError;
use codeseek_index::ingest::{IngestPhase, IngestReport};
use codeseek_llm::LlmProvider;
use tokio::sync::mpsc;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Parser)]
#[command(name = "codeseek", version)]
#[command(about = "Index local source files and search them in plain language", long_about = None)]
struct Cli {
    /// Config file (falls back to `CODESEEK_CONFIG`, then config/default.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log pipeline progress at info level.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Keep the index in memory for this run only.
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Index every matching file under a folder.
    Ingest { path: PathBuf },
    /// Find the closest files to a question and explain them.
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Menu-driven session (default).
    Interactive,
    /// Show what is currently indexed.
    Stats,
    /// Remove every indexed document.
    Reset {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_subscriber(cli.verbose);

    let config_path = resolve_config_path(cli.config.as_deref());
    let mut config = Config::load(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    if cli.ephemeral {
        config.index.backend = Backend::Memory;
    }
    config.validate()?;
    tracing::debug!(path = %config_path.display(), backend = %config.index.backend, "config loaded");

    let mut app = build_app(&config).await?;

    match cli.command.unwrap_or(Command::Interactive) {
        Command::Ingest { path } => {
            let ok = ingest(&mut app, &path).await;
            return Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE });
        }
        Command::Search { query } => search(&app, &query.join(" ")).await,
        Command::Interactive => interactive::run(&mut app).await?,
        Command::Stats => stats(&app).await?,
        Command::Reset { yes } => reset(&app, yes).await?,
    }
    Ok(ExitCode::SUCCESS)
}

fn init_subscriber(verbose: bool) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let default = if verbose { "info" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Priority: `--config` > `CODESEEK_CONFIG` > config/default.toml.
fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("CODESEEK_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Run one ingestion with live progress. Returns `false` if the folder was
/// rejected.
async fn ingest<P: LlmProvider>(app: &mut App<P>, path: &Path) -> bool {
    match run_ingest(app, path).await {
        Ok(report) => {
            for notice in Notice::for_ingest(&report) {
                render::print_notice(&notice);
            }
            true
        }
        Err(e) => {
            render::print_notice(&Notice::from_error(&e));
            false
        }
    }
}

async fn run_ingest<P: LlmProvider>(
    app: &mut App<P>,
    path: &Path,
) -> Result<IngestReport, IndexError> {
    let (tx, rx) = mpsc::unbounded_channel();
    app.ingest.set_phase_tx(tx);
    let printer = tokio::spawn(print_progress(rx));

    let result = app.ingest.run(path).await;
    if result.is_ok() {
        let _ = printer.await;
    } else {
        printer.abort();
    }
    result
}

async fn print_progress(mut rx: mpsc::UnboundedReceiver<IngestPhase>) {
    while let Some(phase) = rx.recv().await {
        if let Some(line) = render::format_phase(&phase) {
            eprintln!("{line}");
        }
        if phase == IngestPhase::Done {
            break;
        }
    }
}

async fn search<P: LlmProvider>(app: &App<P>, query: &str) {
    match app.query.search(query).await {
        Ok(results) => match Notice::for_search(&results) {
            Some(notice) => render::print_notice(&notice),
            None => print!("{}", render::format_results(&results)),
        },
        Err(e) => {
            render::print_notice(&Notice::from_error(&e));
            render::print_notice(&Notice::warning(codeseek_core::notice::NO_RESULTS));
        }
    }
}

async fn stats<P>(app: &App<P>) -> anyhow::Result<()> {
    let ids = app.index.ids().await.context("failed to list indexed documents")?;
    println!("{} document(s) in the {} index", ids.len(), app.index.name());
    for id in ids {
        println!("  {id}");
    }
    Ok(())
}

async fn reset<P>(app: &App<P>, yes: bool) -> anyhow::Result<()> {
    let count = app.index.count().await.context("failed to count indexed documents")?;
    if count == 0 {
        println!("Index is already empty.");
        return Ok(());
    }
    if !yes && !interactive::confirm_reset(count)? {
        println!("Aborted.");
        return Ok(());
    }
    app.index.clear().await.context("failed to clear index")?;
    render::print_notice(&Notice::success(format!("Removed {count} document(s).")));
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use serial_test::serial;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_interactive() {
        let cli = Cli::try_parse_from(["codeseek"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn search_joins_words() {
        let cli = Cli::try_parse_from(["codeseek", "search", "where", "is", "main"]).unwrap();
        let Some(Command::Search { query }) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(query.join(" "), "where is main");
    }

    #[test]
    fn search_requires_a_query() {
        assert!(Cli::try_parse_from(["codeseek", "search"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["codeseek", "ingest", "src", "--config", "x.toml", "-v"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("x.toml")));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Command::Ingest { .. })));
    }

    #[test]
    fn ephemeral_flag_is_global() {
        let cli = Cli::try_parse_from(["codeseek", "search", "main", "--ephemeral"]).unwrap();
        assert!(cli.ephemeral);
        assert!(!Cli::try_parse_from(["codeseek"]).unwrap().ephemeral);
    }

    #[test]
    fn reset_flag() {
        let cli = Cli::try_parse_from(["codeseek", "reset", "--yes"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Reset { yes: true })));
    }

    #[test]
    #[serial]
    fn config_path_priority() {
        unsafe { std::env::remove_var("CODESEEK_CONFIG") };
        assert_eq!(resolve_config_path(None), PathBuf::from(DEFAULT_CONFIG_PATH));

        unsafe { std::env::set_var("CODESEEK_CONFIG", "/etc/codeseek.toml") };
        assert_eq!(resolve_config_path(None), PathBuf::from("/etc/codeseek.toml"));
        assert_eq!(
            resolve_config_path(Some(Path::new("local.toml"))),
            PathBuf::from("local.toml")
        );
        unsafe { std::env::remove_var("CODESEEK_CONFIG") };
    }
}
