use std::io::Error as IoError;

use rinex::prelude::ParsingError as RinexError;
use thiserror::Error;

/// Errors that may rise when reading observation files
#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("file i/o error: {0}")]
    IoError(#[from] IoError),
    #[error("rinex error: {0}")]
    Rinex(#[from] RinexError),
    #[error("only RINEX 3 observation files are supported (version {0})")]
    NonSupportedVersion(String),
    #[error("not an observation RINEX")]
    NotObservation,
    #[error("gzip compressed data require the flate2 feature")]
    GzipSupport,
}

/// Session level errors: all of them are fatal, and only rise
/// while setting up (or tearing down) a session.
#[derive(Error, Debug)]
pub enum Error {
    #[error("parsing error: {0}")]
    ParsingError(#[from] ParsingError),
    #[error("i/o error: {0}")]
    IoError(#[from] IoError),
    #[error("failed to open output \"{0}\": {1}")]
    OutputOpen(String, IoError),
    #[error("failed to open tcp server on port {0}: {1}")]
    TcpBind(u16, IoError),
    #[error("failed to write tag header: {0}")]
    TagHeader(IoError),
    #[error("invalid tag file: {0}")]
    TagFile(&'static str),
    #[error("no output enabled")]
    NoOutput,
    #[error("station id {0} out of range (1..=4095)")]
    StationId(u16),
}
