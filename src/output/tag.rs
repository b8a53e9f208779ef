//! Time tag index: (tick, byte offset) pairs enabling time accurate replay
use std::{
    io::{Read, Write},
    path::{Path, PathBuf},
};

use crate::{constants::TagLayout, pacer::SessionClock, prelude::Epoch, Error};

/// Tag index path of given data file
pub fn tag_path(data: &Path) -> PathBuf {
    let mut path = data.as_os_str().to_owned();
    path.push(".tag");
    PathBuf::from(path)
}

/// Splits an [Epoch] into (whole seconds, fraction) of GPST since 1970
pub fn gpst_time_pair(epoch: Epoch) -> (u32, f64) {
    let seconds = epoch.to_gpst_seconds() + TagLayout::GPST_UNIX_OFFSET_S;
    let whole = seconds.floor();
    (whole as u32, seconds - whole)
}

/// [TagHeader] is written once, before any [TagRecord]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TagHeader {
    /// Wall clock tick at session opening
    pub reference_tick: u32,
    /// Session start time: GPST (whole seconds, fraction) since 1970
    pub start: (u32, f64),
}

impl TagHeader {
    /// Total encoded size
    pub const SIZE: usize = TagLayout::HEADER_SIZE + TagLayout::START_TIME_SIZE;

    /// Builds a [TagHeader] from the session time references
    pub fn from_clock(clock: &SessionClock) -> Self {
        Self {
            reference_tick: clock.reference_tick,
            start: gpst_time_pair(clock.start),
        }
    }

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        let id = TagLayout::IDENTIFICATION.as_bytes();
        bytes[..id.len()].copy_from_slice(id);

        let footer = TagLayout::HEADER_SIZE - 4;
        bytes[footer..TagLayout::HEADER_SIZE].copy_from_slice(&self.reference_tick.to_le_bytes());

        let offset = TagLayout::HEADER_SIZE;
        bytes[offset..offset + 4].copy_from_slice(&self.start.0.to_le_bytes());
        bytes[offset + 4..offset + 12].copy_from_slice(&self.start.1.to_le_bytes());
        bytes
    }

    pub fn decode(bytes: &[u8; Self::SIZE]) -> Result<Self, Error> {
        let id = TagLayout::IDENTIFICATION.as_bytes();
        if !bytes.starts_with(id) {
            return Err(Error::TagFile("bad identification"));
        }

        let u32_at = |offset: usize| {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(&bytes[offset..offset + 4]);
            u32::from_le_bytes(buf)
        };

        let offset = TagLayout::HEADER_SIZE;
        let mut fraction = [0u8; 8];
        fraction.copy_from_slice(&bytes[offset + 4..offset + 12]);

        Ok(Self {
            reference_tick: u32_at(TagLayout::HEADER_SIZE - 4),
            start: (u32_at(offset), f64::from_le_bytes(fraction)),
        })
    }
}

/// One (tick, byte offset) index entry
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TagRecord {
    /// Milliseconds since session opening
    pub tick: u32,
    /// Data sink length at that instant
    pub offset: u32,
}

impl TagRecord {
    pub fn new(tick: u32, offset: u32) -> Self {
        Self { tick, offset }
    }

    pub fn encode(&self) -> [u8; TagLayout::RECORD_SIZE] {
        let mut bytes = [0u8; TagLayout::RECORD_SIZE];
        bytes[..4].copy_from_slice(&self.tick.to_le_bytes());
        bytes[4..].copy_from_slice(&self.offset.to_le_bytes());
        bytes
    }

    pub fn decode(bytes: &[u8; TagLayout::RECORD_SIZE]) -> Self {
        let mut tick = [0u8; 4];
        let mut offset = [0u8; 4];
        tick.copy_from_slice(&bytes[..4]);
        offset.copy_from_slice(&bytes[4..]);
        Self {
            tick: u32::from_le_bytes(tick),
            offset: u32::from_le_bytes(offset),
        }
    }
}

/// [TagWriter] appends [TagRecord]s to a tag index, flushing after each of them
/// so an interrupted session leaves a consistent index behind.
#[derive(Debug)]
pub struct TagWriter<W: Write> {
    writer: W,
    records: usize,
}

impl<W: Write> TagWriter<W> {
    /// Writes the [TagHeader] and returns a [TagWriter] ready for records
    pub fn new(mut writer: W, header: &TagHeader) -> Result<Self, Error> {
        writer
            .write_all(&header.encode())
            .and_then(|_| writer.flush())
            .map_err(Error::TagHeader)?;
        Ok(Self { writer, records: 0 })
    }

    pub fn append(&mut self, record: TagRecord) -> std::io::Result<()> {
        self.writer.write_all(&record.encode())?;
        self.writer.flush()?;
        self.records += 1;
        Ok(())
    }

    /// Number of records written so far
    pub fn records(&self) -> usize {
        self.records
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// [TagIndex] is a complete tag file, as read back
#[derive(Debug, Clone, PartialEq)]
pub struct TagIndex {
    pub header: TagHeader,
    pub records: Vec<TagRecord>,
}

impl TagIndex {
    /// Parses a complete tag file. A trailing partial record
    /// (interrupted session) is ignored.
    pub fn read<R: Read>(mut reader: R) -> Result<Self, Error> {
        let mut header = [0u8; TagHeader::SIZE];
        reader
            .read_exact(&mut header)
            .map_err(|_| Error::TagFile("truncated header"))?;
        let header = TagHeader::decode(&header)?;

        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;

        let records = content
            .chunks_exact(TagLayout::RECORD_SIZE)
            .map(|chunk| {
                let mut bytes = [0u8; TagLayout::RECORD_SIZE];
                bytes.copy_from_slice(chunk);
                TagRecord::decode(&bytes)
            })
            .collect();

        Ok(Self { header, records })
    }
}
