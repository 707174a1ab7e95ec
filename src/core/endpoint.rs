use crate::domain::model::{clamp_percent, SignalPath, SignalReading, PERCENT_MIN};
use crate::domain::ports::SignalClient;

/// One percentage signal on the broker, with a local copy of its last value.
///
/// The cache holds the last value this endpoint tried to write or last read
/// back, always clamped to `[0, 100]`.
pub struct SignalEndpoint<'a, C: SignalClient + ?Sized> {
    client: &'a C,
    path: SignalPath,
    value: f64,
}

impl<'a, C: SignalClient + ?Sized> SignalEndpoint<'a, C> {
    pub fn new(client: &'a C, path: impl Into<SignalPath>) -> Self {
        Self {
            client,
            path: path.into(),
            value: PERCENT_MIN,
        }
    }

    pub fn path(&self) -> &SignalPath {
        &self.path
    }

    pub fn cached(&self) -> f64 {
        self.value
    }

    /// Clamps, caches and writes `value`. The cache is updated even when the
    /// write fails.
    pub async fn set(&mut self, value: f64) -> bool {
        self.value = clamp_percent(value);
        if self.value != value {
            tracing::debug!("Clamped {} from {} to {}", self.path, value, self.value);
        }

        let ok = self.client.set_value(&self.path, self.value).await;
        if !ok {
            tracing::warn!("Write of {} = {} did not reach the broker", self.path, self.value);
        }
        ok
    }

    /// Current value, falling back to the cached one when the broker has none.
    pub async fn get(&mut self) -> f64 {
        self.read().await.value()
    }

    pub async fn read(&mut self) -> SignalReading {
        match self.client.get_value(&self.path).await {
            Some(value) => {
                self.value = clamp_percent(value);
                SignalReading::Fresh(self.value)
            }
            None => {
                tracing::debug!("Using cached {} = {}", self.path, self.value);
                SignalReading::Stale(self.value)
            }
        }
    }
}
