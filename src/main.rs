use pathfinder::cli::commands::{CliArgs, Commands};
use pathfinder::cli::handlers::{
    handle_config, handle_phase, handle_route, handle_run, handle_scan,
};
use pathfinder::cli::OutputFormat;
use pathfinder::config::RouterConfig;
use pathfinder::util::logging::{init_logging, parse_level, LoggingConfig};
use pathfinder::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("pathfinder v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let format: OutputFormat = args.format.into();
    let exit_code = match &args.command {
        Commands::Scan(scan_args) => handle_scan(scan_args, format),
        Commands::Phase(phase_args) => {
            let config = RouterConfig::load(args.config.as_deref());
            handle_phase(phase_args, &config, format)
        }
        Commands::Route(route_args) => {
            let config = RouterConfig::load(args.config.as_deref());
            handle_route(route_args, &config, format)
        }
        Commands::Run(run_args) => {
            let config = RouterConfig::load(args.config.as_deref());
            handle_run(run_args, &config, format).await
        }
        Commands::Config => {
            let config = RouterConfig::load(args.config.as_deref());
            handle_config(&config, format)
        }
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        let level_str = env::var("PATHFINDER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        parse_level(&level_str)
    };

    let use_json = env::var("PATHFINDER_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    init_logging(LoggingConfig {
        level,
        use_json,
        ..LoggingConfig::default()
    });
}
