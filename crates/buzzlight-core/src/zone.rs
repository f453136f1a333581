//! Lighting zones and their controller addresses

use serde::{Deserialize, Serialize};

/// Controller numbers carrying the three color components of a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelMap {
    /// Controller for red
    pub red: u8,
    /// Controller for green
    pub green: u8,
    /// Controller for blue
    pub blue: u8,
}

impl ChannelMap {
    /// Controllers in r, g, b order
    pub const fn controllers(&self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }
}

/// One independently addressable lighting region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Zone {
    /// Position in the zone list, left to right
    pub index: usize,
    /// Where the zone lives on the protocol
    pub channels: ChannelMap,
}

/// The three zones of the TimeBuzzer surface: left, center, right
pub fn default_zones() -> Vec<Zone> {
    [(70, 71, 72), (73, 74, 75), (76, 77, 78)]
        .into_iter()
        .enumerate()
        .map(|(index, (red, green, blue))| Zone {
            index,
            channels: ChannelMap { red, green, blue },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_zones_layout() {
        let zones = default_zones();
        assert_eq!(zones.len(), 3);
        assert_eq!(zones[0].channels.controllers(), [70, 71, 72]);
        assert_eq!(zones[2].channels.controllers(), [76, 77, 78]);
        assert!(zones.iter().enumerate().all(|(i, z)| z.index == i));
    }
}
