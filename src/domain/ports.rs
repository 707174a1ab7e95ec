use crate::domain::model::{ConnectionState, SignalPath};
use async_trait::async_trait;

/// Read/write access to named signals on a remote data broker.
///
/// Failures never escape as errors: writes report `false` and reads report
/// `None`, with the cause logged by the implementation.
#[async_trait]
pub trait SignalClient: Send + Sync {
    /// Returns `false` and stays disconnected on any transport error.
    async fn connect(&self, host: &str, port: u16) -> bool;

    /// Safe to call repeatedly.
    async fn disconnect(&self);

    async fn set_value(&self, path: &SignalPath, value: f64) -> bool;

    /// `None` when disconnected, when the broker does not know the path, or on error.
    async fn get_value(&self, path: &SignalPath) -> Option<f64>;

    fn state(&self) -> ConnectionState;

    fn is_connected(&self) -> bool {
        self.state().is_connected()
    }
}
