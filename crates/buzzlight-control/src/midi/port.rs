//! midir-backed device port
//!
//! The input callback runs on midir's own thread. It only forwards raw
//! messages into a channel; everything else happens on the engine task.

use super::RawMessage;
use crate::error::{ControlError, Result};
use buzzlight_core::{ControlOutput, CoreError};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use tokio::sync::mpsc;
use tracing::{debug, info};

const CLIENT_NAME: &str = "Buzzlight";

/// Names of the ports that were opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortStatus {
    pub input: String,
    pub output: String,
}

/// List available input and output port names
pub fn list_ports() -> Result<(Vec<String>, Vec<String>)> {
    let input = MidiInput::new(CLIENT_NAME)?;
    let output = MidiOutput::new(CLIENT_NAME)?;
    let inputs = input
        .ports()
        .iter()
        .filter_map(|p| input.port_name(p).ok())
        .collect();
    let outputs = output
        .ports()
        .iter()
        .filter_map(|p| output.port_name(p).ok())
        .collect();
    Ok((inputs, outputs))
}

fn matches(name: &str, filter: &str) -> bool {
    name.to_lowercase().contains(&filter.to_lowercase())
}

/// An open input connection to the controller
///
/// Dropping it closes the input.
pub struct MidirPort {
    _input: MidiInputConnection<()>,
    status: PortStatus,
}

impl MidirPort {
    /// Open the first input and output whose names contain `filter`
    ///
    /// Incoming messages of exactly three bytes go to `messages`. The
    /// returned output is meant to be attached to the color sink.
    pub fn open(
        filter: &str,
        messages: mpsc::UnboundedSender<RawMessage>,
    ) -> Result<(Self, MidirOutput)> {
        let mut input = MidiInput::new(CLIENT_NAME)?;
        input.ignore(Ignore::All);

        let in_port = input
            .ports()
            .into_iter()
            .find(|p| input.port_name(p).is_ok_and(|n| matches(&n, filter)))
            .ok_or_else(|| ControlError::PortNotFound {
                direction: "input",
                filter: filter.to_string(),
            })?;
        let in_name = input.port_name(&in_port).unwrap_or_default();

        let output = MidiOutput::new(CLIENT_NAME)?;
        let out_port = output
            .ports()
            .into_iter()
            .find(|p| output.port_name(p).is_ok_and(|n| matches(&n, filter)))
            .ok_or_else(|| ControlError::PortNotFound {
                direction: "output",
                filter: filter.to_string(),
            })?;
        let out_name = output.port_name(&out_port).unwrap_or_default();

        let connection = input.connect(
            &in_port,
            "buzzlight-in",
            move |_stamp, bytes, _| {
                if let Ok(message) = <RawMessage>::try_from(bytes) {
                    // Receiver gone means the engine is shutting down
                    let _ = messages.send(message);
                }
            },
            (),
        )?;
        let out_connection = output.connect(&out_port, "buzzlight-out")?;

        info!("MIDI connected: in='{}' out='{}'", in_name, out_name);
        Ok((
            Self {
                _input: connection,
                status: PortStatus {
                    input: in_name,
                    output: out_name,
                },
            },
            MidirOutput {
                connection: out_connection,
            },
        ))
    }

    /// Port names in use
    pub fn status(&self) -> &PortStatus {
        &self.status
    }
}

/// Output half of the port, written by the color sink
pub struct MidirOutput {
    connection: MidiOutputConnection,
}

impl ControlOutput for MidirOutput {
    fn send(&mut self, message: [u8; 3]) -> buzzlight_core::Result<()> {
        self.connection.send(&message).map_err(|e| {
            debug!("MIDI send failed: {}", e);
            CoreError::TransportUnavailable(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_name_match_is_case_insensitive() {
        assert!(matches("TimeBuzzer MIDI 1", "timebuzzer"));
        assert!(matches("timebuzzer", "TimeBuzzer"));
        assert!(!matches("Launchpad", "TimeBuzzer"));
    }
}
