//! Output multiplexer: fans the encoded byte stream out to all open sinks
use std::{io::Write, time::Duration};

use log::{error, warn};

use super::{
    tag::{TagRecord, TagWriter},
    Transport,
};

use crate::pacer::VirtualClock;

/// Primary output of a session. The operating mode is selected once,
/// when the session opens.
pub enum Primary {
    /// Paced transport: each epoch blocks for the inter epoch delay.
    /// The transport is responsible for its own time index, if any.
    RealTime(Box<dyn Transport>),
    /// Data sink written as fast as possible, along with a time index
    /// driven by a [VirtualClock].
    Fast {
        data: Box<dyn Transport>,
        tags: Option<TagWriter<Box<dyn Write>>>,
        clock: VirtualClock,
    },
}

impl std::fmt::Debug for Primary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::RealTime(_) => write!(f, "RealTime"),
            Self::Fast { clock, tags, .. } => f
                .debug_struct("Fast")
                .field("tick", &clock.tick())
                .field("tagged", &tags.is_some())
                .finish(),
        }
    }
}

/// Sink slot, with its participation state for the current epoch
struct Sink {
    stalled: bool,
    short_writes: u32,
}

impl Sink {
    fn new() -> Self {
        Self {
            stalled: false,
            short_writes: 0,
        }
    }

    /// Writes to the transport unless stalled during this epoch.
    /// Returns the number of bytes accepted.
    fn write<T: Transport + ?Sized>(&mut self, name: &str, transport: &mut T, bytes: &[u8]) -> usize {
        if self.stalled {
            return 0;
        }
        let size = transport.write(bytes);
        if size < bytes.len() {
            warn!("{} - short write ({}/{} bytes)", name, size, bytes.len());
            self.stalled = true;
            self.short_writes += 1;
        }
        size
    }
}

/// [Multiplexer] presents a single write operation to the epoch loop,
/// and advances the time index between epochs.
pub struct Multiplexer {
    primary: Option<Primary>,
    broadcast: Option<Box<dyn Transport>>,
    primary_sink: Sink,
    broadcast_sink: Sink,
    /// Primary data sink length
    offset: u64,
    /// Total pacing delay
    paced_ms: u64,
    sleep: fn(Duration),
}

impl std::fmt::Debug for Multiplexer {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Multiplexer")
            .field("primary", &self.primary)
            .field("broadcast", &self.broadcast.is_some())
            .field("offset", &self.offset)
            .finish()
    }
}

impl Multiplexer {
    pub fn new(primary: Primary) -> Self {
        Self {
            primary: Some(primary),
            broadcast: None,
            primary_sink: Sink::new(),
            broadcast_sink: Sink::new(),
            offset: 0,
            paced_ms: 0,
            sleep: std::thread::sleep,
        }
    }

    /// Copies and returns [Multiplexer] with an unpaced broadcast sink,
    /// receiving every write identically to the primary sink.
    pub fn with_broadcast(mut self, broadcast: Box<dyn Transport>) -> Self {
        self.broadcast = Some(broadcast);
        self
    }

    /// Copies and returns [Multiplexer] with custom blocking primitive,
    /// used for real time pacing.
    pub fn with_sleep(mut self, sleep: fn(Duration)) -> Self {
        self.sleep = sleep;
        self
    }

    /// Primary data sink length
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Total pacing delay applied so far [ms]
    pub fn paced_ms(&self) -> u64 {
        self.paced_ms
    }

    /// Number of short writes, all sinks included
    pub fn short_writes(&self) -> u32 {
        self.primary_sink.short_writes + self.broadcast_sink.short_writes
    }

    /// Returns true if this [Multiplexer] paces to the wall clock
    pub fn is_real_time(&self) -> bool {
        matches!(self.primary, Some(Primary::RealTime(_)))
    }

    /// Fans given bytes out to all open sinks
    pub fn write(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        match self.primary.as_mut() {
            Some(Primary::RealTime(transport)) => {
                self.offset += self.primary_sink.write("output", transport, bytes) as u64;
            },
            Some(Primary::Fast { data, .. }) => {
                self.offset += self.primary_sink.write("output", data, bytes) as u64;
            },
            None => {},
        }
        if let Some(broadcast) = self.broadcast.as_mut() {
            self.broadcast_sink.write("broadcast", broadcast, bytes);
        }
    }

    /// Closes the current epoch: real time mode blocks for `delay_ms`,
    /// fast mode appends one (tick, offset) record then moves the virtual clock forward.
    pub fn after_epoch(&mut self, delay_ms: u32) {
        self.primary_sink.stalled = false;
        self.broadcast_sink.stalled = false;

        let offset = self.offset.min(u32::MAX as u64) as u32;

        match self.primary.as_mut() {
            Some(Primary::RealTime(transport)) => {
                if let Err(e) = transport.flush() {
                    error!("output flush error: {}", e);
                }
                if delay_ms > 0 {
                    (self.sleep)(Duration::from_millis(delay_ms as u64));
                    self.paced_ms += delay_ms as u64;
                }
            },
            Some(Primary::Fast { data, tags, clock }) => {
                if let Err(e) = data.flush() {
                    error!("output flush error: {}", e);
                }
                if let Some(tags) = tags.as_mut() {
                    if let Err(e) = tags.append(TagRecord::new(clock.tick(), offset)) {
                        error!("tag error: {}", e);
                    }
                }
                clock.advance(delay_ms);
                self.paced_ms += delay_ms as u64;
            },
            None => {},
        }
    }

    /// Closes all sinks. Closing twice has no effect.
    pub fn close(&mut self) {
        match self.primary.take() {
            Some(Primary::RealTime(mut transport)) => transport.close(),
            Some(Primary::Fast { mut data, tags, .. }) => {
                data.close();
                if let Some(tags) = tags {
                    if let Err(e) = tags.into_inner().flush() {
                        error!("tag flush error: {}", e);
                    }
                }
            },
            None => {},
        }
        if let Some(mut broadcast) = self.broadcast.take() {
            broadcast.close();
        }
    }
}

impl Drop for Multiplexer {
    fn drop(&mut self) {
        self.close();
    }
}
