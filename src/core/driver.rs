use crate::core::endpoint::SignalEndpoint;
use crate::domain::model::{clamp_percent, CycleReport, RunSummary, ScenarioEntry, VssSignal};
use crate::domain::ports::SignalClient;
use crate::utils::error::{AppError, Result};
use chrono::Utc;
use std::time::Duration;
use tokio::sync::watch;

/// Delays used by the demo loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverTiming {
    /// Once, after the banner and before the first cycle.
    pub intro: Duration,
    /// "Listening" to the user.
    pub listen: Duration,
    /// "Thinking" about the answer.
    pub think: Duration,
    /// After both writes.
    pub settle: Duration,
}

impl DriverTiming {
    /// No delays at all. Used for dry runs and tests.
    pub fn immediate() -> Self {
        Self {
            intro: Duration::ZERO,
            listen: Duration::ZERO,
            think: Duration::ZERO,
            settle: Duration::ZERO,
        }
    }
}

impl Default for DriverTiming {
    fn default() -> Self {
        Self {
            intro: Duration::from_secs(3),
            listen: Duration::from_secs(1),
            think: Duration::from_secs(1),
            settle: Duration::from_secs(4),
        }
    }
}

/// Resolves once shutdown has been requested. Never resolves if the sender is
/// gone, since nobody can ask us to stop any more.
pub(crate) async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let raised = shutdown.wait_for(|stop| *stop).await.is_ok();
    if !raised {
        std::future::pending::<()>().await;
    }
}

/// Sleeps for `duration` unless shutdown is requested first.
///
/// Returns `false` if shutdown was requested before or during the wait.
pub(crate) async fn pause(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return false;
    }

    tokio::select! {
        biased;
        _ = shutdown_requested(shutdown) => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// Plays the scenario list in a circle, writing each speed to the driver and
/// passenger fan signals.
pub struct ScenarioDriver<'a, C: SignalClient + ?Sized> {
    scenarios: Vec<ScenarioEntry>,
    index: usize,
    driver_seat: SignalEndpoint<'a, C>,
    passenger_seat: SignalEndpoint<'a, C>,
    timing: DriverTiming,
    narrate: bool,
}

impl<'a, C: SignalClient + ?Sized> ScenarioDriver<'a, C> {
    pub fn new(client: &'a C, scenarios: Vec<ScenarioEntry>, timing: DriverTiming) -> Result<Self> {
        if scenarios.is_empty() {
            return Err(AppError::EmptyScenarioList);
        }

        Ok(Self {
            scenarios,
            index: 0,
            driver_seat: SignalEndpoint::new(client, VssSignal::DriverFanSpeed),
            passenger_seat: SignalEndpoint::new(client, VssSignal::PassengerFanSpeed),
            timing,
            narrate: true,
        })
    }

    pub fn with_narration(mut self, narrate: bool) -> Self {
        self.narrate = narrate;
        self
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &ScenarioEntry {
        &self.scenarios[self.index]
    }

    pub fn driver_seat(&self) -> &SignalEndpoint<'a, C> {
        &self.driver_seat
    }

    pub fn passenger_seat(&self) -> &SignalEndpoint<'a, C> {
        &self.passenger_seat
    }

    fn say(&self, line: &str) {
        if self.narrate {
            println!("{}", line);
        }
    }

    fn report_write(&self, endpoint: &SignalEndpoint<'a, C>, ok: bool) {
        let outcome = if ok { "" } else { " (failed)" };
        self.say(&format!(
            "    → VSS Signal Update{}: {} = {}%",
            outcome,
            endpoint.path(),
            endpoint.cached()
        ));
    }

    /// Listen, think, then write both seats and advance to the next scenario.
    ///
    /// Returns `None` if shutdown arrives before the cycle completes. A write
    /// still waiting on the broker is abandoned.
    pub async fn run_cycle(&mut self, shutdown: &mut watch::Receiver<bool>) -> Option<CycleReport> {
        let index = self.index;
        let entry = self.scenarios[index].clone();

        self.say("🎤 User Request Detected...");
        if !pause(self.timing.listen, shutdown).await {
            return None;
        }

        self.say(&format!("🤖 {}", entry.narration()));
        if !pause(self.timing.think, shutdown).await {
            return None;
        }

        let speed = clamp_percent(entry.speed());
        self.say(&format!(
            "⚙️  DataBroker: Executing AI command → Fan Speed: {}% {}",
            speed,
            entry.status_label()
        ));

        let driver_ok = tokio::select! {
            biased;
            ok = self.driver_seat.set(entry.speed()) => ok,
            _ = shutdown_requested(shutdown) => return None,
        };
        self.report_write(&self.driver_seat, driver_ok);

        let passenger_ok = tokio::select! {
            biased;
            ok = self.passenger_seat.set(entry.speed()) => ok,
            _ = shutdown_requested(shutdown) => return None,
        };
        self.report_write(&self.passenger_seat, passenger_ok);

        let report = CycleReport {
            index,
            speed,
            driver_ok,
            passenger_ok,
            completed_at: Utc::now(),
        };

        if report.is_success() {
            self.say("✅ Climate adjustment complete via DataBroker!\n");
            tracing::info!("Scenario {} applied: fan speed {}%", index, speed);
        } else {
            self.say("⚠️  Climate adjustment only partially applied\n");
            tracing::warn!(
                "Scenario {} had {} failed write(s)",
                index,
                report.failed_writes()
            );
        }

        self.index = (self.index + 1) % self.scenarios.len();
        Some(report)
    }

    /// Runs cycles until shutdown is requested.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> RunSummary {
        let mut summary = RunSummary::default();

        while !*shutdown.borrow() {
            let Some(report) = self.run_cycle(&mut shutdown).await else {
                break;
            };
            summary.record(&report);

            if !pause(self.timing.settle, &mut shutdown).await {
                break;
            }
        }

        tracing::info!(
            "Scenario loop stopped after {} cycle(s), {} failed write(s)",
            summary.cycles,
            summary.failed_writes
        );
        summary
    }
}
