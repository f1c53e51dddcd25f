use clap::Parser;
use log::{error, info};
use std::process::ExitCode;
use std::time::Duration;

use solbot::api;
use solbot::bot;
use solbot::cli::Cli;
use solbot::config::{Config, Secrets};
use solbot::lark::LarkClient;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if cli.debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    info!("Starting sol bot report run...");

    let config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!("Failed to load configuration from {:?}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    let secrets = match Secrets::from_env() {
        Ok(secrets) => secrets,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    // The whole pass is retried, not individual fetches; those bound their
    // own retries. Either the report is delivered or an error report is.
    let attempts = config.report.report_attempts.max(1);
    let mut last_error = None;
    for attempt in 1..=attempts {
        match bot::run_report(&config, &secrets).await {
            Ok(()) => {
                info!("Report delivered on attempt {}/{}", attempt, attempts);
                return ExitCode::SUCCESS;
            }
            Err(e) => {
                error!("Report attempt {}/{} failed: {}", attempt, attempts, e);
                last_error = Some(e);
            }
        }
    }

    if let Some(err) = last_error {
        match &secrets.lark_error_key {
            Some(error_key) => {
                let timeout = Duration::from_secs(config.report.request_timeout_secs);
                match api::http_client(timeout) {
                    Ok(client) => {
                        let lark = LarkClient::new(client, error_key);
                        if let Err(e) = lark.send_error_report(attempts, &err).await {
                            error!("Failed to deliver error report: {}", e);
                        }
                    }
                    Err(e) => error!("Failed to build error-report client: {}", e),
                }
            }
            None => error!("No error webhook configured; final error: {}", err),
        }
    }
    ExitCode::FAILURE
}
