//! Buzzlight Control - Gestures, Feedback and the Lighting Engine
//!
//! This crate connects the TimeBuzzer surface to the animation core:
//! - **MIDI**: message parsing and the device port (requires `midir`)
//! - **Gestures**: knob, touch and click decoding with wraparound handling
//! - **Interaction**: gesture feedback animations and media key mapping
//! - **Engine**: the single task that owns settings, scheduler and output
//!
//! ## Feature Flags
//!
//! - `midi`: Enable the hardware port (requires `midir`)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use buzzlight_control::{GestureDecoder, Gesture};
//!
//! let mut decoder = GestureDecoder::default();
//! let gesture = decoder.decode_bytes(&[0xBB, 82, 127]);
//! assert_eq!(gesture, Some(Gesture::ClickEdge));
//! ```
//!
//! ## Modules
//!
//! - [`midi`] - Message parsing and device port
//! - [`gesture`] - Gesture decoding
//! - [`interaction`] - Feedback state machine and animations
//! - [`media`] - Media key side channel
//! - [`engine`] - Lighting engine and its handle
//! - [`error`] - Error types

#![allow(missing_docs)]

/// Error types
pub mod error;

/// MIDI message parsing and port
pub mod midi;

/// Gesture decoding
pub mod gesture;
/// Gesture feedback state machine
pub mod interaction;
/// Media key emission
pub mod media;

/// Lighting engine
pub mod engine;

/// Test doubles
pub mod testing;

// Re-exports
pub use engine::{EngineCommand, EngineHandle, LightingEngine, StatusEvent};
pub use error::{ControlError, Result};
pub use gesture::{Direction, Gesture, GestureDecoder, GestureMap, GestureState};
pub use interaction::{InteractionEngine, InteractionState};
pub use media::{LoggingMediaKeys, MediaKey, MediaKeyEmitter};
pub use midi::{ControlChange, RawMessage};

#[cfg(feature = "midi")]
pub use midi::{list_ports, MidirOutput, MidirPort, PortStatus};
