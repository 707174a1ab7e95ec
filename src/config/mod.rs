#[cfg(feature = "cli")]
pub mod cli;
pub mod scenario_file;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

use crate::core::driver::DriverTiming;
use crate::domain::model::{default_scenarios, ScenarioEntry};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{validate_host, validate_non_empty_string, validate_range, Validate};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 55555;
/// Environment variable naming the broker host.
pub const HOST_ENV: &str = "KUKSA_ADDRESS";

/// Everything the application needs to run, however it was configured.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub scenarios: Vec<ScenarioEntry>,
    pub timing: DriverTiming,
    pub narrate: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            scenarios: default_scenarios(),
            timing: DriverTiming::default(),
            narrate: true,
        }
    }
}

impl Validate for AppSettings {
    fn validate(&self) -> Result<()> {
        validate_host("host", &self.host)?;
        validate_range("port", self.port, 1, u16::MAX)?;

        if self.scenarios.is_empty() {
            return Err(AppError::EmptyScenarioList);
        }
        for (i, scenario) in self.scenarios.iter().enumerate() {
            validate_non_empty_string(&format!("scenarios[{}].narration", i), scenario.narration())?;
            if !scenario.speed().is_finite() {
                return Err(AppError::InvalidConfigValueError {
                    field: format!("scenarios[{}].speed", i),
                    value: scenario.speed().to_string(),
                    reason: "Speed must be a finite number".to_string(),
                });
            }
        }

        Ok(())
    }
}
