//! Synthetic observations, mock codec and in memory sinks
use std::{
    cell::RefCell,
    io::Write,
    path::PathBuf,
    rc::Rc,
    str::FromStr,
};

use crate::{
    codec::{CodecError, MessageCodec},
    message::MessageType,
    observation::{Code, Observation, Signal},
    output::Transport,
    page::Page,
    prelude::{Constellation, Epoch, SV},
};

/// Parses a satellite ("G01", "E12", ..)
pub fn sv(s: &str) -> SV {
    SV::from_str(s).unwrap()
}

/// Builds one [Observation] with a complete signal per code
/// (pseudo range, phase and SNR)
pub fn gps_observation(t: Epoch, sv: SV, codes: &[&str]) -> Observation {
    let mut obs = Observation::new(t, sv);
    for (i, code) in codes.iter().enumerate() {
        let pr = 2.0E7 + 1000.0 * sv.prn as f64 + i as f64;
        obs = obs.with_signal(
            Signal::new(Code::from_str(code).unwrap())
                .with_pseudorange(pr)
                .with_phase(pr / 0.19)
                .with_snr(45.0),
        );
    }
    obs
}

/// Builds one synthetic GPS epoch with `n` distinct satellites
/// (PRN 1..=n) tracking the same codes.
pub fn synthetic_gps_epoch(t: Epoch, n: usize, codes: &[&str]) -> Vec<Observation> {
    (1..=n)
        .map(|prn| gps_observation(t, SV::new(Constellation::GPS, prn as u8), codes))
        .collect()
}

/// Unique temporary file path
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("rnx2rtcm-{}-{}", std::process::id(), name))
}

/// Path to a test resource
pub fn test_resource(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_resources")
        .join(relative)
}

/// One [MockCodec] invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub message: MessageType,
    pub page_size: usize,
    pub sync: bool,
}

/// [MockCodec] records every call and encodes each message as
/// `[type (2 bytes), sync, page size, 0xAA x page size]`.
#[derive(Debug, Clone, Default)]
pub struct MockCodec {
    pub calls: Vec<Call>,
    pub epochs: Vec<Epoch>,
    declined: Vec<MessageType>,
}

impl MockCodec {
    /// Copies and returns [MockCodec] declining given message types
    pub fn declining(&self, numbers: &[u16]) -> Self {
        let mut s = self.clone();
        s.declined = numbers.iter().map(|n| MessageType(*n)).collect();
        s
    }

    /// Encoded size of one message carrying `page_size` records
    pub fn encoded_size(page_size: usize) -> usize {
        4 + page_size
    }
}

impl MessageCodec for MockCodec {
    fn begin_epoch(&mut self, epoch: Epoch) {
        self.epochs.push(epoch);
    }

    fn encode(
        &mut self,
        message: MessageType,
        page: &Page<'_>,
        sync: bool,
    ) -> Result<Vec<u8>, CodecError> {
        self.calls.push(Call {
            message,
            page_size: page.len(),
            sync,
        });
        if self.declined.contains(&message) {
            return Err(CodecError::UnsupportedMessage(message));
        }
        let number = message.number().to_be_bytes();
        let mut bytes = vec![number[0], number[1], sync as u8, page.len() as u8];
        bytes.extend(std::iter::repeat(0xAA).take(page.len()));
        Ok(bytes)
    }
}

/// Clonable in memory sink
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }
    pub fn bytes(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// [Transport] accepting at most `limit` bytes per write
#[derive(Debug, Default)]
pub struct ShortWriter {
    limit: usize,
    pub accepted: usize,
}

impl ShortWriter {
    pub fn new(limit: usize) -> Self {
        Self { limit, accepted: 0 }
    }
}

impl Transport for ShortWriter {
    fn write(&mut self, bytes: &[u8]) -> usize {
        let size = bytes.len().min(self.limit);
        self.accepted += size;
        size
    }
    fn close(&mut self) {}
}
