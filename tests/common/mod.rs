//! Test doubles shared by the integration tests.
//!
//! `RecordingClient` stands in for the broker client and records every write
//! attempt, including the ones it refuses, so tests can assert on the full
//! command history. `broker` runs a real gRPC server in-process.

pub mod broker;

use async_trait::async_trait;
use cabin_fan_assistant::{ConnectionState, SignalClient, SignalPath};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq)]
pub struct WriteAttempt {
    pub path: String,
    pub value: f64,
    pub accepted: bool,
}

pub struct RecordingClient {
    accept_connect: bool,
    state: Mutex<ConnectionState>,
    failing_paths: HashSet<String>,
    values: Mutex<HashMap<String, f64>>,
    writes: Mutex<Vec<WriteAttempt>>,
    stop_after: Mutex<Option<(usize, watch::Sender<bool>)>>,
    pub connect_calls: AtomicUsize,
    pub disconnect_calls: AtomicUsize,
}

#[allow(dead_code)]
impl RecordingClient {
    pub fn new() -> Self {
        Self {
            accept_connect: true,
            state: Mutex::new(ConnectionState::Disconnected),
            failing_paths: HashSet::new(),
            values: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
            stop_after: Mutex::new(None),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
        }
    }

    /// A broker that is never reachable.
    pub fn unreachable() -> Self {
        Self {
            accept_connect: false,
            ..Self::new()
        }
    }

    /// Refuse every write to `path`.
    pub fn failing_on(mut self, path: &str) -> Self {
        self.failing_paths.insert(path.to_string());
        self
    }

    /// Raise `shutdown` once `writes` write attempts have been seen.
    pub fn stop_after_writes(self, writes: usize, shutdown: watch::Sender<bool>) -> Self {
        *self.stop_after.lock().unwrap() = Some((writes, shutdown));
        self
    }

    pub fn writes(&self) -> Vec<WriteAttempt> {
        self.writes.lock().unwrap().clone()
    }

    pub fn written_values(&self) -> Vec<f64> {
        self.writes().into_iter().map(|w| w.value).collect()
    }

    pub fn written_paths(&self) -> Vec<String> {
        self.writes().into_iter().map(|w| w.path).collect()
    }
}

impl Default for RecordingClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalClient for RecordingClient {
    async fn connect(&self, _host: &str, _port: u16) -> bool {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        let state = if self.accept_connect {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        };
        *self.state.lock().unwrap() = state;
        self.accept_connect
    }

    async fn disconnect(&self) {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        *self.state.lock().unwrap() = ConnectionState::Disconnected;
    }

    async fn set_value(&self, path: &SignalPath, value: f64) -> bool {
        let accepted = self.is_connected() && !self.failing_paths.contains(path.as_str());
        if accepted {
            self.values
                .lock()
                .unwrap()
                .insert(path.to_string(), value);
        }

        let count = {
            let mut writes = self.writes.lock().unwrap();
            writes.push(WriteAttempt {
                path: path.to_string(),
                value,
                accepted,
            });
            writes.len()
        };

        if let Some((limit, shutdown)) = self.stop_after.lock().unwrap().as_ref() {
            if count >= *limit {
                let _ = shutdown.send(true);
            }
        }

        accepted
    }

    async fn get_value(&self, path: &SignalPath) -> Option<f64> {
        if !self.is_connected() {
            return None;
        }
        self.values.lock().unwrap().get(path.as_str()).copied()
    }

    fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap()
    }
}
