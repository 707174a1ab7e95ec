pub mod app;
pub mod driver;
pub mod endpoint;

pub use crate::domain::model::{CycleReport, RunSummary, ScenarioEntry, SignalPath};
pub use crate::domain::ports::SignalClient;
pub use crate::utils::error::Result;
