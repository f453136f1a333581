//! Color sink: brightness scaling, clamping and control-change writes

use crate::color::Color;
use crate::error::Result;
use crate::settings::SettingsHandle;
use crate::zone::Zone;
use tracing::{debug, trace};

/// Control-change status nibble
const CONTROL_CHANGE: u8 = 0xB0;

/// Write side of the protocol port
///
/// Receives raw 3-byte control-change messages. Implementations must not
/// block; failures are reported but never retried by the sink.
pub trait ControlOutput: Send {
    /// Send one `[status, controller, value]` message
    fn send(&mut self, message: [u8; 3]) -> Result<()>;
}

/// Applies brightness and writes zone colors to the transport
///
/// Without an attached output every write is a silent no-op, which mirrors
/// "device not connected".
pub struct ColorSink {
    zones: Vec<Zone>,
    channel: u8,
    output: Option<Box<dyn ControlOutput>>,
    settings: SettingsHandle,
    written: Vec<Option<[u8; 3]>>,
}

impl ColorSink {
    /// Create a sink for `zones` writing on logical `channel` (0-15)
    pub fn new(zones: Vec<Zone>, channel: u8, settings: SettingsHandle) -> Self {
        let written = vec![None; zones.len()];
        Self {
            zones,
            channel: channel & 0x0F,
            output: None,
            settings,
            written,
        }
    }

    /// Attach an output, replacing any previous one
    pub fn attach(&mut self, output: Box<dyn ControlOutput>) {
        self.output = Some(output);
    }

    /// Detach and return the current output
    pub fn detach(&mut self) -> Option<Box<dyn ControlOutput>> {
        self.output.take()
    }

    /// Whether an output is attached
    pub fn is_connected(&self) -> bool {
        self.output.is_some()
    }

    /// Zones this sink addresses
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Number of zones
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Write one zone
    ///
    /// Out-of-range zones and a missing output are dropped silently.
    pub fn emit(&mut self, zone: usize, color: Color) {
        let Some(target) = self.zones.get(zone) else {
            trace!("Dropping write to unknown zone {}", zone);
            return;
        };
        let Some(output) = self.output.as_mut() else {
            return;
        };

        let factor = self.settings.scaling().brightness_factor();
        let values = color.to_wire(factor);
        let status = CONTROL_CHANGE | self.channel;

        for (controller, value) in target.channels.controllers().into_iter().zip(values) {
            if let Err(e) = output.send([status, controller, value]) {
                debug!("Control write to zone {} failed: {}", zone, e);
            }
        }
        self.written[zone] = Some(values);
    }

    /// Write the same color to every zone
    pub fn set_all(&mut self, color: Color) {
        for zone in 0..self.zones.len() {
            self.emit(zone, color);
        }
    }

    /// Turn every zone off
    pub fn blackout(&mut self) {
        self.set_all(Color::OFF);
    }

    /// Last values written to `zone`, after scaling and clamping
    pub fn readback(&self, zone: usize) -> Option<[u8; 3]> {
        self.written.get(zone).copied().flatten()
    }

    /// Whether every zone was last written as off
    pub fn all_off(&self) -> bool {
        self.written
            .iter()
            .all(|values| values.map_or(true, |v| v == [0, 0, 0]))
    }
}
