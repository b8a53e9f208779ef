//! Reference station description
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// [Station] gathers what the reference station messages need to know
/// about the site. It is usually deduced from the RINEX header.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Station {
    /// Station label (marker name)
    pub name: String,
    /// Antenna reference point, ECEF [m]
    pub position: Option<(f64, f64, f64)>,
    /// Antenna height above marker [m]
    pub antenna_height: f64,
    /// Antenna descriptor (model)
    pub antenna: String,
    /// Antenna serial number
    pub antenna_serial: String,
    /// Antenna setup ID
    pub antenna_setup: u8,
    /// Receiver descriptor (model)
    pub receiver: String,
    /// Receiver firmware version
    pub receiver_firmware: String,
    /// Receiver serial number
    pub receiver_serial: String,
}

impl Station {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
    /// Copies and returns [Station] with ECEF antenna reference point [m]
    pub fn with_position(&self, x: f64, y: f64, z: f64) -> Self {
        let mut s = self.clone();
        s.position = Some((x, y, z));
        s
    }
    /// Copies and returns [Station] with antenna height [m]
    pub fn with_antenna_height(&self, height: f64) -> Self {
        let mut s = self.clone();
        s.antenna_height = height;
        s
    }
    /// Copies and returns [Station] with antenna model and serial number
    pub fn with_antenna(&self, model: &str, serial: &str) -> Self {
        let mut s = self.clone();
        s.antenna = model.trim().to_string();
        s.antenna_serial = serial.trim().to_string();
        s
    }
    /// Copies and returns [Station] with receiver model, firmware and serial number
    pub fn with_receiver(&self, model: &str, firmware: &str, serial: &str) -> Self {
        let mut s = self.clone();
        s.receiver = model.trim().to_string();
        s.receiver_firmware = firmware.trim().to_string();
        s.receiver_serial = serial.trim().to_string();
        s
    }
}
