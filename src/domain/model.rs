use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PERCENT_MIN: f64 = 0.0;
pub const PERCENT_MAX: f64 = 100.0;

/// Clamp a percentage into `[0, 100]`. NaN maps to the lower bound.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return PERCENT_MIN;
    }
    value.clamp(PERCENT_MIN, PERCENT_MAX)
}

/// Dot-separated VSS path. Treated as an opaque identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalPath(String);

impl SignalPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SignalPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for SignalPath {
    fn from(path: String) -> Self {
        Self(path)
    }
}

impl From<VssSignal> for SignalPath {
    fn from(signal: VssSignal) -> Self {
        Self::new(signal.path())
    }
}

/// The signals this application drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VssSignal {
    DriverFanSpeed,
    PassengerFanSpeed,
}

impl VssSignal {
    pub const ALL: [VssSignal; 2] = [VssSignal::DriverFanSpeed, VssSignal::PassengerFanSpeed];

    pub fn path(self) -> &'static str {
        match self {
            VssSignal::DriverFanSpeed => "Vehicle.Cabin.HVAC.Station.Row1.Driver.FanSpeed",
            VssSignal::PassengerFanSpeed => "Vehicle.Cabin.HVAC.Station.Row1.Passenger.FanSpeed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => f.write_str("disconnected"),
            ConnectionState::Connected => f.write_str("connected"),
        }
    }
}

/// Outcome of an endpoint read. `Stale` carries the cached value returned
/// because the broker gave nothing back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalReading {
    Fresh(f64),
    Stale(f64),
}

impl SignalReading {
    pub fn value(self) -> f64 {
        match self {
            SignalReading::Fresh(v) | SignalReading::Stale(v) => v,
        }
    }

    pub fn is_stale(self) -> bool {
        matches!(self, SignalReading::Stale(_))
    }
}

/// One step of the demo: a target fan speed and the line the assistant says.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEntry {
    speed: f64,
    narration: String,
}

impl ScenarioEntry {
    pub fn new(speed: f64, narration: impl Into<String>) -> Self {
        Self {
            speed,
            narration: narration.into(),
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn narration(&self) -> &str {
        &self.narration
    }

    pub fn status_label(&self) -> &'static str {
        if clamp_percent(self.speed) <= PERCENT_MIN {
            "(OFF)"
        } else {
            "(ACTIVE)"
        }
    }
}

/// The six-step assistant script played when no scenario file is given.
pub fn default_scenarios() -> Vec<ScenarioEntry> {
    vec![
        ScenarioEntry::new(
            0.0,
            "AI: 'Turning off AC as requested - fresh air mode activated'",
        ),
        ScenarioEntry::new(25.0, "AI: 'Setting gentle breeze for comfortable reading'"),
        ScenarioEntry::new(50.0, "AI: 'Moderate cooling for normal driving comfort'"),
        ScenarioEntry::new(
            75.0,
            "AI: 'Increasing airflow - detected warm weather outside'",
        ),
        ScenarioEntry::new(
            100.0,
            "AI: 'Maximum cooling - hot day detected, cooling cabin quickly'",
        ),
        ScenarioEntry::new(
            40.0,
            "AI: 'Reducing to comfortable level - target temperature reached'",
        ),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub index: usize,
    pub speed: f64,
    pub driver_ok: bool,
    pub passenger_ok: bool,
    pub completed_at: DateTime<Utc>,
}

impl CycleReport {
    pub fn failed_writes(&self) -> usize {
        usize::from(!self.driver_ok) + usize::from(!self.passenger_ok)
    }

    pub fn is_success(&self) -> bool {
        self.driver_ok && self.passenger_ok
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: usize,
    pub failed_writes: usize,
}

impl RunSummary {
    pub fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;
        self.failed_writes += report.failed_writes();
    }
}
