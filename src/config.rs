//! Session configuration
use std::path::{Path, PathBuf};

use log::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    message::MessageType,
    prelude::{Duration, Epoch},
    reader::ReadOptions,
    station::Station,
    Error,
};

/// Default TCP broadcast port
pub const DEFAULT_PORT: u16 = 2101;

/// Operating mode, selected once when the session opens
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mode {
    /// Paced to the wall clock, following the observation timestamps
    #[default]
    RealTime,
    /// Generated as fast as possible, along with a virtual time index
    Fast,
}

/// Session [Config]uration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// RINEX observation file
    pub input: PathBuf,
    /// Tagged output file
    pub output: Option<PathBuf>,
    /// TCP broadcast port
    pub port: Option<u16>,
    /// Reference station ID (1..=4095)
    pub station_id: u16,
    /// Station label. Empty: use the marker name
    pub station_name: String,
    /// Drop observations before this instant
    pub start: Option<Epoch>,
    /// Drop observations after this instant
    pub end: Option<Epoch>,
    /// Resampling interval
    pub interval: Option<Duration>,
    /// Ordered list of message types, transmitted once per epoch
    pub messages: Vec<MessageType>,
    /// Operating [Mode]
    pub mode: Mode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: None,
            port: None,
            station_id: 1,
            station_name: "test".to_string(),
            start: None,
            end: None,
            interval: None,
            messages: [1006, 1077, 1087, 1097, 1127]
                .into_iter()
                .map(MessageType::new)
                .collect(),
            mode: Mode::default(),
        }
    }
}

impl Config {
    /// Copies and returns [Config] with given input file
    pub fn with_input(&self, path: &Path) -> Self {
        let mut s = self.clone();
        s.input = path.to_path_buf();
        s
    }
    /// Copies and returns [Config] with a tagged output file
    pub fn with_output(&self, path: &Path) -> Self {
        let mut s = self.clone();
        s.output = Some(path.to_path_buf());
        s
    }
    /// Copies and returns [Config] with a TCP broadcast port
    pub fn with_port(&self, port: u16) -> Self {
        let mut s = self.clone();
        s.port = Some(port);
        s
    }
    /// Copies and returns [Config] with a reference station ID
    pub fn with_station_id(&self, id: u16) -> Self {
        let mut s = self.clone();
        s.station_id = id;
        s
    }
    /// Copies and returns [Config] with a station label
    pub fn with_station_name(&self, name: &str) -> Self {
        let mut s = self.clone();
        s.station_name = name.to_string();
        s
    }
    /// Copies and returns [Config] with a start instant
    pub fn with_start(&self, start: Epoch) -> Self {
        let mut s = self.clone();
        s.start = Some(start);
        s
    }
    /// Copies and returns [Config] with an end instant
    pub fn with_end(&self, end: Epoch) -> Self {
        let mut s = self.clone();
        s.end = Some(end);
        s
    }
    /// Copies and returns [Config] with a resampling interval
    pub fn with_interval(&self, interval: Duration) -> Self {
        let mut s = self.clone();
        s.interval = Some(interval);
        s
    }
    /// Copies and returns [Config] with an ordered list of message types
    pub fn with_messages(&self, messages: &[MessageType]) -> Self {
        let mut s = self.clone();
        s.messages = messages.to_vec();
        s
    }
    /// Copies and returns [Config] with operating [Mode]
    pub fn with_mode(&self, mode: Mode) -> Self {
        let mut s = self.clone();
        s.mode = mode;
        s
    }

    /// Record selection to apply when reading the input
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            start: self.start,
            end: self.end,
            interval: self.interval,
        }
    }

    /// Reference [Station] to describe: the station label
    /// overrides the marker name, unless empty.
    pub fn station(&self, described: &Station) -> Station {
        let mut station = described.clone();
        if !self.station_name.is_empty() {
            station.name = self.station_name.clone();
        }
        station
    }

    /// Verifies this [Config] can open a session.
    /// Fast mode without an output file streams to stdout.
    pub fn validate(&self) -> Result<(), Error> {
        if !(1..=4095).contains(&self.station_id) {
            return Err(Error::StationId(self.station_id));
        }
        if self.mode == Mode::RealTime && self.output.is_none() && self.port.is_none() {
            return Err(Error::NoOutput);
        }
        if !self.messages.iter().any(|msg| msg.category().is_framed()) {
            warn!("no transmittable message type: nothing will be emitted");
        }
        Ok(())
    }
}
