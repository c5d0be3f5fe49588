use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::Notify;

mod config;
mod error;
mod http;
mod logger;
mod report;
mod router;
mod server;
mod setup;
mod sheet;

/// Web hook that appends field visit reports to a sheet
#[derive(Parser, Debug)]
#[command(name = "sheethook", version, about)]
struct Cli {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the HTTP hook (default)
    Serve,
    /// Create the report sheet and write its header row
    Provision,
    /// Show where reports are read from and what the sheet holds
    Check,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let cfg = match config::Config::load_from(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[ERROR] Failed to load configuration '{}': {e}", cli.config);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logger::init(&cfg) {
        eprintln!("[ERROR] Failed to open log files: {e}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cfg),
        Command::Provision => run_setup(&cfg, |store| setup::provision(store, &cfg.sheet)),
        Command::Check => run_setup(&cfg, |store| setup::inspect(store, &cfg.sheet.name)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

/// Run a setup command against the configured store and print its JSON report
fn run_setup<T, F>(cfg: &config::Config, op: F) -> Result<(), Box<dyn std::error::Error>>
where
    T: serde::Serialize,
    F: FnOnce(&dyn sheet::SheetStore) -> Result<T, error::StorageError>,
{
    let store = cfg.open_store()?;
    match op(&*store) {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            let failure = serde_json::json!({ "success": false, "error": e.to_string() });
            println!("{}", serde_json::to_string_pretty(&failure)?);
            Err(e.into())
        }
    }
}

fn serve(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    // Worker count comes from configuration, default is one per CPU core
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr)?;

    let store = cfg.open_store()?;
    let location = store.location();
    let state = Arc::new(config::AppState::new(&cfg, store));

    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown))?;

    logger::log_server_start(&addr, &cfg, &location);

    // Connections are served with spawn_local
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::start_server_loop(listener, state, shutdown))
        .await
}
