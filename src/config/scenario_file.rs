use crate::core::driver::DriverTiming;
use crate::domain::model::ScenarioEntry;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

const MAX_DELAY_SECS: f64 = 3600.0;

/// Scenario list plus optional timing overrides, loaded from TOML.
///
/// ```toml
/// [timing]
/// listen_secs = 1.0
///
/// [[scenarios]]
/// speed = 25
/// narration = "AI: 'Setting gentle breeze'"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFile {
    #[serde(default)]
    pub timing: Option<TimingConfig>,
    #[serde(default)]
    pub scenarios: Vec<ScenarioEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingConfig {
    pub intro_secs: Option<f64>,
    pub listen_secs: Option<f64>,
    pub think_secs: Option<f64>,
    pub settle_secs: Option<f64>,
}

impl ScenarioFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AppError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| AppError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value. Unset variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let re = PLACEHOLDER
            .get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    /// Timing with unspecified fields taken from [`DriverTiming::default`].
    pub fn timing(&self) -> Result<DriverTiming> {
        let defaults = DriverTiming::default();
        let Some(timing) = &self.timing else {
            return Ok(defaults);
        };

        Ok(DriverTiming {
            intro: secs("timing.intro_secs", timing.intro_secs, defaults.intro)?,
            listen: secs("timing.listen_secs", timing.listen_secs, defaults.listen)?,
            think: secs("timing.think_secs", timing.think_secs, defaults.think)?,
            settle: secs("timing.settle_secs", timing.settle_secs, defaults.settle)?,
        })
    }
}

fn secs(field: &str, value: Option<f64>, default: Duration) -> Result<Duration> {
    let Some(value) = value else {
        return Ok(default);
    };
    validate_range(field, value, 0.0, MAX_DELAY_SECS)?;
    Duration::try_from_secs_f64(value).map_err(|e| AppError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

impl Validate for ScenarioFile {
    fn validate(&self) -> Result<()> {
        if self.scenarios.is_empty() {
            return Err(AppError::EmptyScenarioList);
        }

        for (i, scenario) in self.scenarios.iter().enumerate() {
            validate_non_empty_string(&format!("scenarios[{}].narration", i), scenario.narration())?;
            if !(0.0..=100.0).contains(&scenario.speed()) {
                tracing::warn!(
                    "Scenario {} speed {} is outside 0-100 and will be clamped",
                    i,
                    scenario.speed()
                );
            }
        }

        self.timing().map(|_| ())
    }
}
