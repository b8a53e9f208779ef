//! rnx2rtcm lib test modules
pub mod toolkit;

mod framing;
