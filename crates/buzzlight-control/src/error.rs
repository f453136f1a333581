//! Error types for the control side
use buzzlight_core::CoreError;
use thiserror::Error;

/// Control errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// MIDI initialization error
    #[error("MIDI init error: {0}")]
    #[cfg(feature = "midi")]
    MidiInit(#[from] midir::InitError),

    /// MIDI input connection error
    #[error("MIDI input connection error: {0}")]
    #[cfg(feature = "midi")]
    MidiInputConnection(#[from] midir::ConnectError<midir::MidiInput>),

    /// MIDI output connection error
    #[error("MIDI output connection error: {0}")]
    #[cfg(feature = "midi")]
    MidiOutputConnection(#[from] midir::ConnectError<midir::MidiOutput>),

    /// No port matched the configured name filter
    #[error("No MIDI {direction} port matching '{filter}'")]
    PortNotFound {
        /// "input" or "output"
        direction: &'static str,
        /// Name filter that was searched for
        filter: String,
    },

    /// The engine is no longer running
    #[error("Engine stopped")]
    EngineStopped,

    /// Error from the core crate
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;
