//! MIDI message parsing and the device port

#[cfg(feature = "midi")]
mod port;

#[cfg(feature = "midi")]
pub use port::*;

use serde::{Deserialize, Serialize};

/// One raw `[status, data1, data2]` message as delivered by the port
pub type RawMessage = [u8; 3];

const CONTROL_CHANGE: u8 = 0xB0;

/// A control change, the only message the surface sends that we act on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlChange {
    pub channel: u8,
    pub controller: u8,
    pub value: u8,
}

impl ControlChange {
    /// Parse a control change from raw bytes
    ///
    /// Returns `None` for short messages and every other message type.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let [status, controller, value, ..] = *bytes else {
            return None;
        };
        if status & 0xF0 != CONTROL_CHANGE {
            return None;
        }
        Some(Self {
            channel: status & 0x0F,
            controller,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_change_parsing() {
        assert_eq!(
            ControlChange::from_bytes(&[0xBB, 80, 64]),
            Some(ControlChange {
                channel: 11,
                controller: 80,
                value: 64
            })
        );

        assert_eq!(ControlChange::from_bytes(&[0x90, 60, 100]), None);
        assert_eq!(ControlChange::from_bytes(&[0xF8]), None);
        assert_eq!(ControlChange::from_bytes(&[0xBB, 1]), None);
    }
}
