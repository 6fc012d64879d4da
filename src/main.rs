mod cli;
mod compressor;
mod error;
mod fmt;
mod handler;
mod models;
mod report;
mod settings;
mod store;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, MetricsCommands};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compress {
            file,
            output,
            stdout,
            key,
            order,
        } => cli::compress::run(&file, output, stdout, key.as_deref(), order),
        Commands::Inspect { file, key } => cli::inspect::run(&file, key.as_deref()),
        Commands::Metrics { command } => match command {
            MetricsCommands::List => cli::metrics::list(),
            MetricsCommands::Add { name } => cli::metrics::add(&name),
            MetricsCommands::Remove { name } => cli::metrics::remove(&name),
            MetricsCommands::Reset => cli::metrics::reset(),
        },
        Commands::Handle { store, event } => cli::handle::run(&store, event.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error [{}]: {e}", e.code());
        std::process::exit(1);
    }
}
