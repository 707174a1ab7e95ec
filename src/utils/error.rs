use thiserror::Error;
use tonic::Code;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Broker call failed: {0}")]
    GrpcError(#[from] tonic::Status),

    #[error("Broker transport error: {0}")]
    TransportError(#[from] tonic::transport::Error),

    #[error("Broker rejected {path} (code {code}): {message}")]
    BrokerRejected {
        path: String,
        code: u32,
        message: String,
    },

    #[error("Signal {path} has type {data_type}, which cannot hold a percentage")]
    UnsupportedSignalType { path: String, data_type: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to connect to data broker at {host}:{port}")]
    ConnectionError { host: String, port: u16 },

    #[error("Scenario list is empty")]
    EmptyScenarioList,
}

impl AppError {
    /// True when the broker could not be reached at all, as opposed to
    /// answering with an error status. Statuses built on the client side from
    /// a transport failure carry that failure as their source.
    pub fn is_connection_loss(&self) -> bool {
        match self {
            AppError::GrpcError(status) => {
                status.code() == Code::Unavailable || std::error::Error::source(status).is_some()
            }
            AppError::TransportError(_) | AppError::ConnectionError { .. } => true,
            _ => false,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            AppError::ConnectionError { host, port } => {
                format!("Failed to connect to the data broker at {}:{}", host, port)
            }
            AppError::GrpcError(status) => {
                format!("The data broker call failed: {}", status.message())
            }
            AppError::TransportError(_) => "Could not open a connection to the data broker".to_string(),
            AppError::BrokerRejected { path, message, .. } => {
                format!("The data broker refused {}: {}", path, message)
            }
            AppError::UnsupportedSignalType { path, data_type } => {
                format!("{} is declared as {} on the data broker", path, data_type)
            }
            AppError::IoError(e) => format!("Could not read a local file: {}", e),
            AppError::ConfigValidationError { field, message } => {
                format!("Configuration problem in '{}': {}", field, message)
            }
            AppError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            AppError::EmptyScenarioList => "No scenarios to play".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AppError::ConnectionError { .. }
            | AppError::GrpcError(_)
            | AppError::TransportError(_) => {
                "Make sure the data broker is running and reachable, or set KUKSA_ADDRESS to its host"
            }
            AppError::BrokerRejected { .. } | AppError::UnsupportedSignalType { .. } => {
                "Check that the broker's VSS tree declares the fan speed signals as numeric actuators"
            }
            AppError::IoError(_) => "Check that the scenario file exists and is readable",
            AppError::ConfigValidationError { .. } | AppError::InvalidConfigValueError { .. } => {
                "Fix the reported setting and start again"
            }
            AppError::EmptyScenarioList => "Add at least one [[scenarios]] entry to the scenario file",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
