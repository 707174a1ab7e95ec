use cabin_fan_assistant::utils::logger::{self, LogFormat};
use cabin_fan_assistant::utils::validation::Validate;
use cabin_fan_assistant::{CliConfig, GrpcBrokerClient, HvacApp, SignalClient};
use clap::Parser;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    let log_format = if config.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    logger::init_logger(log_format, config.verbose);

    tracing::info!("Starting cabin-fan-assistant");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let settings = match config.load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Failed to load settings: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::info!("Shutdown requested");
        let _ = shutdown_tx.send(true);
    });

    if settings.narrate {
        println!("🚀 Starting AI climate assistant demo...");
    }

    let client = GrpcBrokerClient::new();
    let app = HvacApp::new(&client, settings);

    match app.run(shutdown_rx).await {
        Ok(summary) => {
            tracing::info!(
                "Demo finished: {} cycle(s), {} failed write(s)",
                summary.cycles,
                summary.failed_writes
            );
            if app.settings().narrate {
                println!("\n👋 Demo stopped by user");
            }
        }
        Err(e) => {
            tracing::error!("❌ Demo failed: {}", e);
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            client.disconnect().await;
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix. Never resolves if no handler
/// could be installed.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => {
                        if let Err(e) = result {
                            tracing::warn!("Ctrl-C handler failed: {}", e);
                            terminate.recv().await;
                        }
                    }
                    _ = terminate.recv() => {}
                }
                return;
            }
            Err(e) => tracing::warn!("SIGTERM handler unavailable: {}", e),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Ctrl-C handler failed: {}", e);
        std::future::pending::<()>().await;
    }
}
