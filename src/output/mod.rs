//! Byte stream outputs
mod file;
mod mux;
mod tag;
mod tcp;
mod writer;

pub use file::FileTransport;
pub use mux::{Multiplexer, Primary};
pub use tag::{gpst_time_pair, tag_path, TagHeader, TagIndex, TagRecord, TagWriter};
pub use tcp::TcpBroadcast;
pub use writer::WriterTransport;

/// [Transport] is an opaque byte stream sink.
/// Writing fewer bytes than requested is the only observable fault.
pub trait Transport {
    /// Writes given bytes, returns the number of bytes accepted.
    fn write(&mut self, bytes: &[u8]) -> usize;

    /// Pushes buffered content down to the sink.
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    /// Releases the sink. Writes are refused once closed.
    fn close(&mut self);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> usize {
        (**self).write(bytes)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        (**self).flush()
    }
    fn close(&mut self) {
        (**self).close()
    }
}
