use std::io::Write;

use log::error;

use super::Transport;

/// [WriterTransport] turns any [Write]able into a [Transport],
/// for example the standard output.
#[derive(Debug)]
pub struct WriterTransport<W: Write> {
    writer: Option<W>,
}

impl<W: Write> WriterTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
        }
    }

    /// Returns the inner writer, unless already closed
    pub fn into_inner(self) -> Option<W> {
        self.writer
    }
}

impl<W: Write> Transport for WriterTransport<W> {
    fn write(&mut self, bytes: &[u8]) -> usize {
        let writer = match self.writer.as_mut() {
            Some(writer) => writer,
            None => return 0,
        };
        match writer.write_all(bytes) {
            Ok(_) => bytes.len(),
            Err(e) => {
                error!("write error: {}", e);
                0
            },
        }
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
                error!("flush error: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn closed_writer_refuses_data() {
        let mut transport = WriterTransport::new(Vec::new());
        assert_eq!(transport.write(&[1, 2, 3]), 3);
        transport.close();
        assert_eq!(transport.write(&[4]), 0);
        assert!(transport.into_inner().is_none());
    }
}
