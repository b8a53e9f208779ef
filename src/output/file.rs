use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use log::{debug, error};

use super::{
    tag::{tag_path, TagHeader, TagRecord, TagWriter},
    Transport,
};

use crate::{pacer::SessionClock, Error};

/// [FileTransport] is a buffered file sink.
/// When tagged, it maintains its own time index: one (elapsed ms, offset)
/// record per write, in a companion `.tag` file.
#[derive(Debug)]
pub struct FileTransport {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    tags: Option<(TagWriter<BufWriter<File>>, SessionClock)>,
    offset: u64,
}

impl FileTransport {
    /// Creates (truncates) the file at given path.
    pub fn create(path: &Path) -> Result<Self, Error> {
        let fd = File::create(path)
            .map_err(|e| Error::OutputOpen(path.display().to_string(), e))?;
        debug!("{} opened", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(BufWriter::new(fd)),
            tags: None,
            offset: 0,
        })
    }

    /// Creates the file at given path, along with its time index.
    pub fn create_tagged(path: &Path, clock: &SessionClock) -> Result<Self, Error> {
        let mut transport = Self::create(path)?;

        let tag_path = tag_path(path);
        let fd = File::create(&tag_path)
            .map_err(|e| Error::OutputOpen(tag_path.display().to_string(), e))?;

        let writer = TagWriter::new(BufWriter::new(fd), &TagHeader::from_clock(clock))?;
        transport.tags = Some((writer, *clock));
        Ok(transport)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written so far
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl Transport for FileTransport {
    fn write(&mut self, bytes: &[u8]) -> usize {
        let writer = match self.writer.as_mut() {
            Some(writer) => writer,
            None => return 0,
        };

        if let Err(e) = writer.write_all(bytes) {
            error!("{}: {}", self.path.display(), e);
            return 0;
        }
        self.offset += bytes.len() as u64;

        if let Some((tags, clock)) = self.tags.as_mut() {
            // data is flushed before its index record
            let record = TagRecord::new(clock.elapsed_ms(), self.offset as u32);
            let record = writer.flush().and_then(|_| tags.append(record));
            if let Err(e) = record {
                error!("{}: tag error: {}", self.path.display(), e);
            }
        }

        bytes.len()
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }

    fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                error!("{}: {}", self.path.display(), e);
            }
            debug!("{} closed ({} bytes)", self.path.display(), self.offset);
        }
        self.tags = None;
    }
}

impl Drop for FileTransport {
    fn drop(&mut self) {
        self.close();
    }
}
