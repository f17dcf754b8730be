use log::{debug, error, info, warn};

/// Scheduler-facing log sink. Every line carries the batch tag so runs can be told apart.
pub struct LogManager {
    tag: String,
}

impl LogManager {
    pub fn new() -> Self {
        Self::tagged("threat-batch")
    }

    pub fn tagged(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.tag, message);
    }

    pub fn trace_vessel(&self, mmsi: &str, message: &str) {
        debug!("[{}] {}: {}", self.tag, mmsi, message);
    }

    /// Vessel-level problem that did not stop the batch.
    pub fn warn_vessel(&self, mmsi: &str, message: &str) {
        warn!("[{}] {}: {}", self.tag, mmsi, message);
    }

    /// Run-level failure.
    pub fn fault(&self, message: &str) {
        error!("[{}] {}", self.tag, message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
