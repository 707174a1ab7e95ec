//! In-process data broker serving the `kuksa.val.v1` `VAL` service, plus a
//! listener that accepts connections and never answers.
#![allow(dead_code)]

use cabin_fan_assistant::adapters::proto::{
    datapoint,
    val_server::{Val, ValServer},
    DataEntry, DataEntryError, DataType, Datapoint, Error, Field, GetRequest, GetResponse,
    GetServerInfoRequest, GetServerInfoResponse, Metadata, SetRequest, SetResponse,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Code, Request, Response, Status};

pub const DRIVER: &str = "Vehicle.Cabin.HVAC.Station.Row1.Driver.FanSpeed";
pub const PASSENGER: &str = "Vehicle.Cabin.HVAC.Station.Row1.Passenger.FanSpeed";

#[derive(Debug, Clone)]
struct Signal {
    data_type: DataType,
    target: Option<datapoint::Value>,
}

#[derive(Debug, Default)]
struct BrokerState {
    signals: HashMap<String, Signal>,
    set_calls: Vec<(String, datapoint::Value)>,
    set_failure: Option<Code>,
    hang_on_set: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FakeBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both fan speeds, declared `uint8` as in the standard VSS tree.
    pub fn with_fan_signals(self) -> Self {
        self.with_signal(DRIVER, DataType::Uint8)
            .with_signal(PASSENGER, DataType::Uint8)
    }

    pub fn with_signal(self, path: &str, data_type: DataType) -> Self {
        self.state.lock().unwrap().signals.insert(
            path.to_string(),
            Signal {
                data_type,
                target: None,
            },
        );
        self
    }

    pub fn with_target(self, path: &str, value: datapoint::Value) -> Self {
        if let Some(signal) = self.state.lock().unwrap().signals.get_mut(path) {
            signal.target = Some(value);
        }
        self
    }

    /// Answer every `Set` with a bare status of `code`.
    pub fn failing_sets(self, code: Code) -> Self {
        self.state.lock().unwrap().set_failure = Some(code);
        self
    }

    /// Accept `Set` calls and never answer them.
    pub fn hanging_sets(self) -> Self {
        self.state.lock().unwrap().hang_on_set = true;
        self
    }

    pub async fn start(self) -> RunningBroker {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let service = ValServer::new(self.clone());
        let task = tokio::spawn(async move {
            let _ = Server::builder()
                .add_service(service)
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async {
                    let _ = stop_rx.await;
                })
                .await;
        });

        RunningBroker {
            port,
            stop: Some(stop_tx),
            task,
            broker: self,
        }
    }
}

fn not_found(path: &str) -> DataEntryError {
    DataEntryError {
        path: path.to_string(),
        error: Some(Error {
            code: 404,
            reason: "not_found".to_string(),
            message: format!("{} not found", path),
        }),
    }
}

#[tonic::async_trait]
impl Val for FakeBroker {
    async fn get(&self, request: Request<GetRequest>) -> Result<Response<GetResponse>, Status> {
        let state = self.state.lock().unwrap();
        let mut response = GetResponse::default();

        for entry in request.into_inner().entries {
            let Some(signal) = state.signals.get(&entry.path) else {
                response.errors.push(not_found(&entry.path));
                continue;
            };

            let mut data = DataEntry {
                path: entry.path.clone(),
                ..Default::default()
            };
            if entry.fields.contains(&(Field::Metadata as i32)) {
                data.metadata = Some(Metadata {
                    data_type: signal.data_type as i32,
                });
            }
            if entry.fields.contains(&(Field::ActuatorTarget as i32)) {
                data.actuator_target = signal
                    .target
                    .clone()
                    .map(|value| Datapoint { value: Some(value) });
            }
            response.entries.push(data);
        }

        Ok(Response::new(response))
    }

    async fn set(&self, request: Request<SetRequest>) -> Result<Response<SetResponse>, Status> {
        let (failure, hang) = {
            let state = self.state.lock().unwrap();
            (state.set_failure, state.hang_on_set)
        };
        if hang {
            std::future::pending::<()>().await;
        }
        if let Some(code) = failure {
            return Err(Status::new(code, "set refused by test broker"));
        }

        let mut state = self.state.lock().unwrap();
        let mut response = SetResponse::default();

        for update in request.into_inner().updates {
            let Some(entry) = update.entry else { continue };
            let Some(value) = entry.actuator_target.and_then(|datapoint| datapoint.value) else {
                continue;
            };
            match state.signals.get_mut(&entry.path) {
                Some(signal) => signal.target = Some(value.clone()),
                None => {
                    response.errors.push(not_found(&entry.path));
                    continue;
                }
            }
            state.set_calls.push((entry.path, value));
        }

        Ok(Response::new(response))
    }

    async fn get_server_info(
        &self,
        _request: Request<GetServerInfoRequest>,
    ) -> Result<Response<GetServerInfoResponse>, Status> {
        Ok(Response::new(GetServerInfoResponse {
            name: "test-databroker".to_string(),
            version: "0.0.0".to_string(),
        }))
    }
}

pub struct RunningBroker {
    port: u16,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    broker: FakeBroker,
}

impl RunningBroker {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn set_calls(&self) -> Vec<(String, datapoint::Value)> {
        self.broker.state.lock().unwrap().set_calls.clone()
    }

    /// Stops serving and closes the listening socket.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if tokio::time::timeout(Duration::from_secs(5), &mut self.task)
            .await
            .is_err()
        {
            self.task.abort();
            let _ = (&mut self.task).await;
        }
    }
}

impl Drop for RunningBroker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A port that completes TCP handshakes and then stays silent forever.
pub struct SilentListener {
    port: u16,
    task: JoinHandle<()>,
}

impl SilentListener {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let task = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        Self { port, task }
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for SilentListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A port nothing is listening on.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
