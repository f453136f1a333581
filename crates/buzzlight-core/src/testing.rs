//! Transport doubles used by unit and integration tests

use crate::error::{CoreError, Result};
use crate::sink::ControlOutput;
use parking_lot::Mutex;
use std::sync::Arc;

/// Output that records every message it is asked to send
///
/// Clones share the same log, so a test can keep one clone while the sink
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingOutput {
    sent: Arc<Mutex<Vec<[u8; 3]>>>,
}

impl RecordingOutput {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far
    pub fn messages(&self) -> Vec<[u8; 3]> {
        self.sent.lock().clone()
    }

    /// Last value sent to `controller`
    pub fn last_value(&self, controller: u8) -> Option<u8> {
        self.sent
            .lock()
            .iter()
            .rev()
            .find(|m| m[1] == controller)
            .map(|m| m[2])
    }
}

impl ControlOutput for RecordingOutput {
    fn send(&mut self, message: [u8; 3]) -> Result<()> {
        self.sent.lock().push(message);
        Ok(())
    }
}

/// Output whose every write fails
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingOutput;

impl ControlOutput for FailingOutput {
    fn send(&mut self, _message: [u8; 3]) -> Result<()> {
        Err(CoreError::TransportUnavailable("port closed".to_string()))
    }
}
