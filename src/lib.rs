pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::broker::GrpcBrokerClient;
pub use config::AppSettings;
pub use core::{
    app::HvacApp,
    driver::{DriverTiming, ScenarioDriver},
    endpoint::SignalEndpoint,
};
pub use domain::model::{ConnectionState, ScenarioEntry, SignalPath, SignalReading, VssSignal};
pub use domain::ports::SignalClient;
pub use utils::error::{AppError, Result};
