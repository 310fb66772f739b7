use clap::Parser;

use edgehost::cli::{Cli, Commands};
use edgehost::commands;
use edgehost::config::{self, Config, LoggingConfig};
use edgehost::logger;
use edgehost::Result;

fn main() {
    // Parse CLI first so verbosity is known before logging starts
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let path = cli.config.as_deref().unwrap_or(config::DEFAULT_CONFIG_PATH);
    let cfg = match Config::load_from(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            // Still report the failure through the usual subscriber
            logger::init(&LoggingConfig::default(), cli.verbose, cli.quiet);
            return Err(e);
        }
    };
    logger::init(&cfg.logging, cli.verbose, cli.quiet);

    match cli.command {
        Commands::Deploy {
            function,
            name,
            store,
        } => commands::deploy::run(&cfg, &function, name, store).map(|_| ()),
        Commands::Ls { store } => commands::list::run(&cfg, store),
        Commands::Dev {
            function,
            port,
            hostname,
        } => runtime(&cfg)?.block_on(commands::dev::run(cfg, function, hostname, port)),
        Commands::Serve { host, port, store } => {
            runtime(&cfg)?.block_on(commands::serve::run(cfg, host, port, store))
        }
    }
}

/// Multi-threaded runtime sized by `server.workers` (CPU cores when unset)
fn runtime(cfg: &Config) -> Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        builder.worker_threads(workers);
        tracing::debug!("Using {workers} worker threads");
    }

    Ok(builder.build()?)
}
