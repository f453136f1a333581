//! Test doubles for the control side

use crate::error::Result;
use crate::media::{MediaKey, MediaKeyEmitter};
use parking_lot::Mutex;
use std::sync::Arc;

/// Media key emitter that records presses; clones share the log
#[derive(Debug, Clone, Default)]
pub struct RecordingMediaKeys {
    pressed: Arc<Mutex<Vec<MediaKey>>>,
}

impl RecordingMediaKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys pressed so far, oldest first
    pub fn pressed(&self) -> Vec<MediaKey> {
        self.pressed.lock().clone()
    }
}

impl MediaKeyEmitter for RecordingMediaKeys {
    fn press(&mut self, key: MediaKey) -> Result<()> {
        self.pressed.lock().push(key);
        Ok(())
    }
}
