use crate::config::scenario_file::ScenarioFile;
use crate::config::{AppSettings, DEFAULT_HOST, DEFAULT_PORT, HOST_ENV};
use crate::core::driver::DriverTiming;
use crate::utils::error::Result;
use crate::utils::validation::{validate_host, validate_range, Validate};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "cabin-fan-assistant")]
#[command(about = "Simulated AI assistant driving cabin fan speed through a vehicle data broker")]
pub struct CliConfig {
    /// Data broker host
    #[arg(long, env = HOST_ENV, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Data broker port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// TOML file with [[scenarios]] and an optional [timing] table
    #[arg(long)]
    pub scenarios: Option<PathBuf>,

    #[arg(long, help = "Skip all delays between steps")]
    pub no_delay: bool,

    #[arg(long, help = "Do not print the narration")]
    pub quiet: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Resolves the scenario file (if any) into runnable settings.
    pub fn load_settings(&self) -> Result<AppSettings> {
        let mut settings = AppSettings {
            host: self.host.clone(),
            port: self.port,
            narrate: !self.quiet,
            ..AppSettings::default()
        };

        if let Some(path) = &self.scenarios {
            tracing::info!("📁 Loading scenarios from: {}", path.display());
            let file = ScenarioFile::from_file(path)?;
            file.validate()?;
            settings.scenarios = file.scenarios.clone();
            settings.timing = file.timing()?;
        }

        if self.no_delay {
            settings.timing = DriverTiming::immediate();
        }

        settings.validate()?;
        Ok(settings)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_host("host", &self.host)?;
        validate_range("port", self.port, 1, u16::MAX)?;
        Ok(())
    }
}
