//! Gesture decoding
//!
//! Turns raw control-change messages into knob, touch and click gestures.
//! The decoder keeps the last knob value and touch state across messages.

use crate::midi::ControlChange;
use serde::{Deserialize, Serialize};

/// Half of the 7-bit value range
const MIDPOINT: u8 = 64;
/// Deltas beyond this are taken as a wrap through the range boundary
const WRAP_THRESHOLD: i16 = 64;

/// Controller numbers the surface reports gestures on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureMap {
    pub channel: u8,
    pub knob: u8,
    pub touch: u8,
    pub click: u8,
}

impl GestureMap {
    /// Standard TimeBuzzer controllers on `channel`
    pub fn new(channel: u8) -> Self {
        Self {
            channel: channel & 0x0F,
            knob: 80,
            touch: 81,
            click: 82,
        }
    }
}

impl Default for GestureMap {
    fn default() -> Self {
        Self::new(11)
    }
}

/// Knob rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Positive,
    Negative,
}

/// A logical gesture event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gesture {
    KnobDelta(Direction),
    TouchChanged(bool),
    ClickEdge,
}

/// What the decoder remembers between messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GestureState {
    pub last_knob_value: Option<u8>,
    pub last_touch_state: bool,
}

/// Stateful decoder for one message stream
#[derive(Debug, Clone, Default)]
pub struct GestureDecoder {
    map: GestureMap,
    state: GestureState,
}

impl GestureDecoder {
    pub fn new(map: GestureMap) -> Self {
        Self {
            map,
            state: GestureState::default(),
        }
    }

    pub fn map(&self) -> &GestureMap {
        &self.map
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// Decode raw bytes; anything but a control change on our channel is ignored
    pub fn decode_bytes(&mut self, bytes: &[u8]) -> Option<Gesture> {
        self.decode(&ControlChange::from_bytes(bytes)?)
    }

    /// Decode one parsed control change
    pub fn decode(&mut self, message: &ControlChange) -> Option<Gesture> {
        let ControlChange {
            channel,
            controller,
            value,
        } = *message;
        if channel != self.map.channel {
            return None;
        }

        if controller == self.map.knob {
            self.knob(value)
        } else if controller == self.map.touch {
            self.touch(value)
        } else if controller == self.map.click {
            // No latch: every high reading is a fresh edge
            (value > MIDPOINT).then_some(Gesture::ClickEdge)
        } else {
            None
        }
    }

    fn knob(&mut self, value: u8) -> Option<Gesture> {
        let previous = self.state.last_knob_value.replace(value)?;
        let delta = i16::from(value) - i16::from(previous);

        let direction = if delta < -WRAP_THRESHOLD {
            Direction::Positive
        } else if delta > WRAP_THRESHOLD {
            Direction::Negative
        } else if delta > 0 {
            Direction::Positive
        } else if delta < 0 {
            Direction::Negative
        } else {
            return None;
        };
        Some(Gesture::KnobDelta(direction))
    }

    fn touch(&mut self, value: u8) -> Option<Gesture> {
        // Active low
        let touched = value < MIDPOINT;
        let changed = touched != self.state.last_touch_state;
        self.state.last_touch_state = touched;
        changed.then_some(Gesture::TouchChanged(touched))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cc(controller: u8, value: u8) -> [u8; 3] {
        [0xBB, controller, value]
    }

    #[test]
    fn test_first_knob_value_only_seeds() {
        let mut decoder = GestureDecoder::default();
        assert_eq!(decoder.decode_bytes(&cc(80, 40)), None);
        assert_eq!(decoder.state().last_knob_value, Some(40));
        assert_eq!(
            decoder.decode_bytes(&cc(80, 41)),
            Some(Gesture::KnobDelta(Direction::Positive))
        );
        assert_eq!(
            decoder.decode_bytes(&cc(80, 39)),
            Some(Gesture::KnobDelta(Direction::Negative))
        );
        assert_eq!(decoder.decode_bytes(&cc(80, 39)), None);
    }

    #[test]
    fn test_knob_wraparound() {
        let mut decoder = GestureDecoder::default();
        decoder.decode_bytes(&cc(80, 2));
        assert_eq!(
            decoder.decode_bytes(&cc(80, 125)),
            Some(Gesture::KnobDelta(Direction::Negative))
        );
        assert_eq!(
            decoder.decode_bytes(&cc(80, 2)),
            Some(Gesture::KnobDelta(Direction::Positive))
        );
    }

    #[test]
    fn test_touch_edges_only() {
        let mut decoder = GestureDecoder::default();
        assert_eq!(
            decoder.decode_bytes(&cc(81, 0)),
            Some(Gesture::TouchChanged(true))
        );
        assert_eq!(decoder.decode_bytes(&cc(81, 10)), None);
        assert_eq!(
            decoder.decode_bytes(&cc(81, 127)),
            Some(Gesture::TouchChanged(false))
        );
        assert_eq!(decoder.decode_bytes(&cc(81, 127)), None);
    }

    #[test]
    fn test_click_refires_while_high() {
        let mut decoder = GestureDecoder::default();
        assert_eq!(decoder.decode_bytes(&cc(82, 127)), Some(Gesture::ClickEdge));
        assert_eq!(decoder.decode_bytes(&cc(82, 127)), Some(Gesture::ClickEdge));
        assert_eq!(decoder.decode_bytes(&cc(82, 64)), None);
        assert_eq!(decoder.decode_bytes(&cc(82, 0)), None);
    }

    #[test]
    fn test_other_channels_and_types_ignored() {
        let mut decoder = GestureDecoder::default();
        assert_eq!(decoder.decode_bytes(&[0xB0, 82, 127]), None);
        assert_eq!(decoder.decode_bytes(&[0x9B, 82, 127]), None);
        assert_eq!(decoder.decode_bytes(&cc(83, 127)), None);
        assert_eq!(decoder.state(), &GestureState::default());
    }

    proptest! {
        #[test]
        fn test_first_knob_message_never_emits(value in 0u8..=127) {
            let mut decoder = GestureDecoder::default();
            prop_assert_eq!(decoder.decode_bytes(&cc(80, value)), None);
        }

        #[test]
        fn test_knob_value_always_tracked(values in proptest::collection::vec(0u8..=127, 1..50)) {
            let mut decoder = GestureDecoder::default();
            for &value in &values {
                decoder.decode_bytes(&cc(80, value));
                prop_assert_eq!(decoder.state().last_knob_value, Some(value));
            }
        }

        #[test]
        fn test_repeated_touch_emits_at_most_once(value in 0u8..=127, repeats in 2usize..10) {
            let mut decoder = GestureDecoder::default();
            let events = (0..repeats)
                .filter_map(|_| decoder.decode_bytes(&cc(81, value)))
                .count();
            prop_assert!(events <= 1);
        }
    }
}
