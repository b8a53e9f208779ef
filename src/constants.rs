//! Constants shared by the framing core and the RTCM3 codec

/// Framing limits
pub struct Framing;

impl Framing {
    /// Observation records whose timestamps lie within this many seconds
    /// of the first record of an epoch belong to that epoch.
    pub const DTTOL: f64 = 0.025;

    /// Signal slots available in one paged message (64 bit cell mask).
    pub const SIGNAL_CAPACITY: usize = 64;

    /// Number of distinct signal codes known to the library
    /// (size of the per epoch [crate::signal::SignalSet] mask).
    pub const MAX_CODE: usize = 70;

    /// Greatest message type number of the legacy (single page) family.
    pub const LEGACY_MAX: u16 = 1012;

    /// First message type of the paged (MSM) family.
    pub const MSM_FIRST: u16 = 1071;

    /// Last message type of the paged (MSM) family.
    pub const MSM_LAST: u16 = 1137;
}

/// Inter epoch pacing
pub struct Pacing;

impl Pacing {
    /// Delay applied when two consecutive epochs are not strictly
    /// increasing, so the stream keeps moving forward.
    pub const MIN_DELAY_MS: u32 = 1000;
}

/// Physical constants used when forging observation messages
pub(crate) struct Physics;

impl Physics {
    /// Speed of light in vacuum [m/s]
    pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

    /// Range of one millisecond of light travel [m]
    pub const RANGE_MS: f64 = Self::SPEED_OF_LIGHT_M_S * 1.0E-3;
}

/// Tag index file layout
pub struct TagLayout;

impl TagLayout {
    /// Total header size, reference tick included.
    pub const HEADER_SIZE: usize = 64;

    /// Identification string written at the start of the header.
    pub const IDENTIFICATION: &'static str = "TIMETAG RNX2RTCM";

    /// (u32 whole seconds, f64 fraction)
    pub const START_TIME_SIZE: usize = 12;

    /// (u32 tick, u32 offset)
    pub const RECORD_SIZE: usize = 8;

    /// Seconds from 1970-01-01 to the GPST origin (1980-01-06)
    pub const GPST_UNIX_OFFSET_S: f64 = 315_964_800.0;
}
