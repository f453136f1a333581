//! Media key side channel
//!
//! The engine only names the key; how a press reaches the operating system
//! is up to the [`MediaKeyEmitter`] implementation. Failures are logged and
//! never propagate into gesture handling.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Keys the knob and click can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKey {
    NextTrack,
    PreviousTrack,
    PlayPause,
}

impl MediaKey {
    /// Windows virtual-key code for this key
    pub fn virtual_key_code(self) -> u8 {
        match self {
            MediaKey::NextTrack => 0xB0,
            MediaKey::PreviousTrack => 0xB1,
            MediaKey::PlayPause => 0xB3,
        }
    }
}

/// Performs a press and release of a media key without blocking
pub trait MediaKeyEmitter: Send {
    fn press(&mut self, key: MediaKey) -> Result<()>;
}

/// Emitter that only logs the key and its virtual-key code
///
/// No OS key injection is shipped, so with media keys enabled a press
/// shows up in the log and nowhere else. Platform emitters plug in through
/// [`MediaKeyEmitter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMediaKeys;

impl MediaKeyEmitter for LoggingMediaKeys {
    fn press(&mut self, key: MediaKey) -> Result<()> {
        info!("Media key: {:?} (vk 0x{:02X})", key, key.virtual_key_code());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_key_codes() {
        assert_eq!(MediaKey::NextTrack.virtual_key_code(), 0xB0);
        assert_eq!(MediaKey::PreviousTrack.virtual_key_code(), 0xB1);
        assert_eq!(MediaKey::PlayPause.virtual_key_code(), 0xB3);
    }

    #[test]
    fn test_logging_emitter_never_fails() {
        let mut keys = LoggingMediaKeys;
        assert!(keys.press(MediaKey::PlayPause).is_ok());
        assert!(keys.press(MediaKey::NextTrack).is_ok());
    }
}
