use crate::adapters::proto::{
    self, datapoint, val_client::ValClient, DataEntry, DataEntryError, DataType, Datapoint,
    EntryRequest, EntryUpdate, Field, GetRequest, GetServerInfoRequest, SetRequest, View,
};
use crate::domain::model::{ConnectionState, SignalPath};
use crate::domain::ports::SignalClient;
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tonic::transport::{Channel, Endpoint};
use tonic::Code;

/// Error code the broker puts in a per-entry error for an unknown path.
const NOT_FOUND: u32 = 404;

/// Data broker client speaking KUKSA's `kuksa.val.v1` gRPC API.
///
/// Writes go to the actuator target of a signal and reads come back from it.
/// The value is encoded with the signal's declared data type, looked up once
/// per path and kept until the next disconnect.
#[derive(Debug, Default)]
pub struct GrpcBrokerClient {
    session: Mutex<Option<ValClient<Channel>>>,
    data_types: Mutex<HashMap<SignalPath, DataType>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl GrpcBrokerClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn session(&self) -> Option<ValClient<Channel>> {
        lock(&self.session).clone()
    }

    fn replace_session(&self, session: Option<ValClient<Channel>>) -> Option<ValClient<Channel>> {
        lock(&self.data_types).clear();
        std::mem::replace(&mut *lock(&self.session), session)
    }

    fn broker_uri(host: &str, port: u16) -> String {
        if host.contains(':') && !host.starts_with('[') {
            format!("http://[{}]:{}", host, port)
        } else {
            format!("http://{}:{}", host, port)
        }
    }

    async fn open(host: &str, port: u16) -> Result<ValClient<Channel>> {
        let channel = Endpoint::from_shared(Self::broker_uri(host, port))?
            .connect()
            .await?;
        let mut val = ValClient::new(channel);

        let info = val
            .get_server_info(GetServerInfoRequest {})
            .await?
            .into_inner();
        tracing::debug!("Data broker is {} {}", info.name, info.version);
        Ok(val)
    }

    async fn data_type(&self, val: &mut ValClient<Channel>, path: &SignalPath) -> Result<DataType> {
        let cached = lock(&self.data_types).get(path).copied();
        if let Some(data_type) = cached {
            return Ok(data_type);
        }

        let response = val
            .get(GetRequest {
                entries: vec![entry_request(path, View::Metadata, Field::Metadata)],
            })
            .await?
            .into_inner();
        if let Some(error) = first_error(response.error, response.errors) {
            return Err(rejected(path, error));
        }

        let data_type = response
            .entries
            .into_iter()
            .find(|entry| entry.path == path.as_str())
            .and_then(|entry| entry.metadata)
            .map(|metadata| metadata.data_type())
            .unwrap_or(DataType::Unspecified);

        if data_type != DataType::Unspecified {
            lock(&self.data_types).insert(path.clone(), data_type);
        }
        Ok(data_type)
    }

    async fn try_set(&self, val: &mut ValClient<Channel>, path: &SignalPath, value: f64) -> Result<()> {
        let data_type = self.data_type(val, path).await?;
        let target = encode(data_type, value).ok_or_else(|| AppError::UnsupportedSignalType {
            path: path.to_string(),
            data_type: data_type.as_str_name().to_string(),
        })?;

        let request = SetRequest {
            updates: vec![EntryUpdate {
                entry: Some(DataEntry {
                    path: path.to_string(),
                    actuator_target: Some(Datapoint {
                        value: Some(target),
                    }),
                    ..Default::default()
                }),
                fields: vec![Field::ActuatorTarget as i32],
            }],
        };

        let response = val.set(request).await?.into_inner();
        match first_error(response.error, response.errors) {
            Some(error) => Err(rejected(path, error)),
            None => Ok(()),
        }
    }

    async fn try_get(val: &mut ValClient<Channel>, path: &SignalPath) -> Result<Option<f64>> {
        let request = GetRequest {
            entries: vec![entry_request(path, View::TargetValue, Field::ActuatorTarget)],
        };
        let response = match val.get(request).await {
            Ok(response) => response.into_inner(),
            Err(status) if status.code() == Code::NotFound => {
                tracing::warn!("Signal {} not found on data broker", path);
                return Ok(None);
            }
            Err(status) => return Err(status.into()),
        };

        if let Some(error) = first_error(response.error, response.errors) {
            if error.code == NOT_FOUND {
                tracing::warn!("Signal {} not found on data broker", path);
                return Ok(None);
            }
            return Err(rejected(path, error));
        }

        let target = response
            .entries
            .into_iter()
            .find(|entry| entry.path == path.as_str())
            .and_then(|entry| entry.actuator_target)
            .and_then(|datapoint| datapoint.value);

        match target {
            None => {
                tracing::debug!("Signal {} has no target value yet", path);
                Ok(None)
            }
            Some(value) => {
                let decoded = decode(&value);
                if decoded.is_none() {
                    tracing::warn!("Signal {} has no numeric value: {:?}", path, value);
                }
                Ok(decoded)
            }
        }
    }

    fn handle_failure(&self, err: &AppError) {
        if err.is_connection_loss() && self.replace_session(None).is_some() {
            tracing::warn!("Lost connection to data broker: {}", err);
        }
    }
}

fn entry_request(path: &SignalPath, view: View, field: Field) -> EntryRequest {
    EntryRequest {
        path: path.to_string(),
        view: view as i32,
        fields: vec![field as i32],
    }
}

fn first_error(error: Option<proto::Error>, errors: Vec<DataEntryError>) -> Option<proto::Error> {
    error
        .filter(|e| e.code != 0)
        .or_else(|| errors.into_iter().filter_map(|e| e.error).find(|e| e.code != 0))
}

fn rejected(path: &SignalPath, error: proto::Error) -> AppError {
    AppError::BrokerRejected {
        path: path.to_string(),
        code: error.code,
        message: format!("{} {}", error.reason, error.message).trim().to_string(),
    }
}

/// Encodes a percentage for a signal of the given type. Integer types get the
/// nearest whole number.
fn encode(data_type: DataType, value: f64) -> Option<datapoint::Value> {
    let whole = value.round();
    let encoded = match data_type {
        DataType::Int8 | DataType::Int16 | DataType::Int32 => datapoint::Value::Int32(whole as i32),
        DataType::Int64 => datapoint::Value::Int64(whole as i64),
        DataType::Uint8 | DataType::Uint16 | DataType::Uint32 => {
            datapoint::Value::Uint32(whole as u32)
        }
        DataType::Uint64 => datapoint::Value::Uint64(whole as u64),
        DataType::Float => datapoint::Value::Float(value as f32),
        DataType::Double => datapoint::Value::Double(value),
        DataType::Unspecified | DataType::String | DataType::Boolean => return None,
    };
    Some(encoded)
}

fn decode(value: &datapoint::Value) -> Option<f64> {
    match *value {
        datapoint::Value::Int32(v) => Some(f64::from(v)),
        datapoint::Value::Int64(v) => Some(v as f64),
        datapoint::Value::Uint32(v) => Some(f64::from(v)),
        datapoint::Value::Uint64(v) => Some(v as f64),
        datapoint::Value::Float(v) => Some(f64::from(v)),
        datapoint::Value::Double(v) => Some(v),
        datapoint::Value::String(_) | datapoint::Value::Bool(_) => None,
    }
}

#[async_trait]
impl SignalClient for GrpcBrokerClient {
    async fn connect(&self, host: &str, port: u16) -> bool {
        tracing::info!("Connecting to data broker at {}:{}", host, port);

        match Self::open(host, port).await {
            Ok(val) => {
                self.replace_session(Some(val));
                tracing::info!("✅ Successfully connected to data broker");
                true
            }
            Err(e) => {
                tracing::error!("❌ Failed to connect to data broker: {}", e);
                self.replace_session(None);
                false
            }
        }
    }

    async fn disconnect(&self) {
        if self.replace_session(None).is_some() {
            tracing::info!("Disconnected from data broker");
        } else {
            tracing::debug!("Disconnect requested while already disconnected");
        }
    }

    async fn set_value(&self, path: &SignalPath, value: f64) -> bool {
        let Some(mut val) = self.session() else {
            tracing::error!("Not connected to data broker");
            return false;
        };

        match self.try_set(&mut val, path, value).await {
            Ok(()) => {
                tracing::info!("Set {} = {}", path, value);
                true
            }
            Err(e) => {
                tracing::error!("Failed to set {} = {}: {}", path, value, e);
                self.handle_failure(&e);
                false
            }
        }
    }

    async fn get_value(&self, path: &SignalPath) -> Option<f64> {
        let Some(mut val) = self.session() else {
            tracing::error!("Not connected to data broker");
            return None;
        };

        match Self::try_get(&mut val, path).await {
            Ok(Some(value)) => {
                tracing::info!("Got {} = {}", path, value);
                Some(value)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!("Failed to get {}: {}", path, e);
                self.handle_failure(&e);
                None
            }
        }
    }

    fn state(&self) -> ConnectionState {
        if lock(&self.session).is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }
}
