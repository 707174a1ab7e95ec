use crate::config::AppSettings;
use crate::core::driver::{pause, shutdown_requested, ScenarioDriver};
use crate::domain::model::{RunSummary, VssSignal};
use crate::domain::ports::SignalClient;
use crate::utils::error::{AppError, Result};
use tokio::sync::watch;

/// Top-level demo: connect, show the banner, play scenarios until shutdown,
/// disconnect.
pub struct HvacApp<'a, C: SignalClient + ?Sized> {
    client: &'a C,
    settings: AppSettings,
}

impl<'a, C: SignalClient + ?Sized> HvacApp<'a, C> {
    pub fn new(client: &'a C, settings: AppSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Fails without touching the scenario loop when the initial connect fails.
    /// Shutdown is honored at every delay and while waiting on the broker; the
    /// client is disconnected before returning `Ok`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<RunSummary> {
        let mut driver = ScenarioDriver::new(
            self.client,
            self.settings.scenarios.clone(),
            self.settings.timing,
        )?
        .with_narration(self.settings.narrate);

        let host = &self.settings.host;
        let port = self.settings.port;

        if self.settings.narrate {
            println!("🔌 Connecting to data broker at {}:{}...", host, port);
        }
        let connected = tokio::select! {
            biased;
            connected = self.client.connect(host, port) => connected,
            _ = shutdown_requested(&mut shutdown) => {
                tracing::info!("Shutdown requested while connecting to {}:{}", host, port);
                self.client.disconnect().await;
                return Ok(RunSummary::default());
            }
        };
        if !connected {
            return Err(AppError::ConnectionError {
                host: host.clone(),
                port,
            });
        }

        if self.settings.narrate {
            print_banner();
        }

        let summary = if pause(self.settings.timing.intro, &mut shutdown).await {
            if self.settings.narrate {
                println!("\n🚀 AI Climate Assistant Demo Started! Press Ctrl+C to stop.\n");
            }
            driver.run(shutdown).await
        } else {
            RunSummary::default()
        };

        if self.settings.narrate {
            println!("🔌 Disconnecting from data broker...");
        }
        self.client.disconnect().await;
        tracing::debug!("Broker connection is now {}", self.client.state());

        Ok(summary)
    }
}

fn print_banner() {
    let rule = "=".repeat(80);
    println!("{}", rule);
    println!("🤖 AI-POWERED HVAC CONTROL DEMO");
    println!("{}", rule);
    println!("Goal & AI Interaction:");
    println!("  This demo simulates an AI assistant responding to user voice");
    println!("  commands for climate control, writing fan speeds to the");
    println!("  vehicle data broker.");
    println!();
    println!("Real-world Scenario:");
    println!("  👤 User: 'Hey AI, I'm feeling hot, can you turn up the AC?'");
    println!("  🤖 AI: 'Sure! Increasing fan speed to cool you down.'");
    println!("  ⚙️  DataBroker: Receives command → Sets fan speed to 80%");
    println!();
    println!("VSS Signals Controlled:");
    for signal in VssSignal::ALL {
        println!("  • {}", signal.path());
    }
    println!();
    println!("Starting AI-powered climate control simulation...");
    println!("{}", rule);
}
