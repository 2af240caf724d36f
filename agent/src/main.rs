//! easy-deploy - Entry Point
//!
//! Watches a list of git projects and redeploys their containers whenever
//! the tracked branch moves.

use std::env;
use std::process::ExitCode;

use easy_deploy::app::options::{parse_args, AppOptions};
use easy_deploy::app::run::{run, run_once};
use easy_deploy::config::Config;
use easy_deploy::logs::{init_logging, LogOptions};
use easy_deploy::utils::version_info;

use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli_args = parse_args(env::args().skip(1));

    // Print version and exit
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(version) => println!("{}", version),
            Err(e) => eprintln!("Failed to render version info: {e}"),
        }
        return ExitCode::SUCCESS;
    }

    let options = AppOptions::from_args(&cli_args);

    // Load the configuration before logging so its level applies
    let config = match Config::load(&options.config_path).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Unable to load config file {}: {e}",
                options.config_path.display()
            );
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: config.log_level.clone(),
        json_format: options.json_logs,
        log_dir: options.log_dir.clone(),
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    };

    info!(
        config = %options.config_path.display(),
        projects = config.projects.len(),
        "Running easy-deploy"
    );

    if options.once {
        return match run_once(&config).await {
            Ok(report) if report.failed() == 0 => ExitCode::SUCCESS,
            Ok(_) => ExitCode::FAILURE,
            Err(e) => {
                error!("Failed to run reconciliation pass: {e}");
                ExitCode::FAILURE
            }
        };
    }

    if let Err(e) = run(options, config, await_shutdown_signal()).await {
        error!("Failed to run the deployer: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("SIGTERM received, shutting down...");
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Ctrl+C received, shutting down...");
                    }
                }
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                let _ = tokio::signal::ctrl_c().await;
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl+C received, shutting down...");
    }
}
