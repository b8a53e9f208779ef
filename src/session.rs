//! Conversion session: drives the epoch loop, from observations to paced outputs
use std::{
    fs::File,
    io::{BufWriter, Write},
};

use log::{debug, info};

use crate::{
    codec::MessageCodec,
    config::{Config, Mode},
    epoch::EpochGrouper,
    message::MessageType,
    observation::Observation,
    output::{
        tag_path, FileTransport, Multiplexer, Primary, TagHeader, TagWriter, TcpBroadcast,
        Transport, WriterTransport,
    },
    pacer::{inter_epoch_delay_ms, SessionClock, VirtualClock},
    sequencer::{Counters, Sequencer},
    Error,
};

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    /// Epochs processed
    pub epochs: usize,
    /// Per message type counters, codec refusals and skipped constellations
    pub counters: Counters,
    /// Short writes, all sinks included
    pub short_writes: u32,
    /// Total pacing delay [ms], virtual in fast mode
    pub paced_ms: u64,
    /// Encoded bytes handed over to the outputs
    pub bytes: u64,
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "  MT  # OF MSGS")?;
        for (message, count) in self.counters.messages.iter() {
            writeln!(f, "{:04} {:10}", message.number(), count)?;
        }
        Ok(())
    }
}

/// [Session] owns the [MessageCodec] and every output for the lifetime
/// of one conversion.
#[derive(Debug)]
pub struct Session<C: MessageCodec> {
    sequencer: Sequencer,
    codec: C,
    mux: Multiplexer,
    report: Report,
}

impl<C: MessageCodec> Session<C> {
    /// Builds a [Session] from already opened outputs
    pub fn new(messages: &[MessageType], codec: C, mux: Multiplexer) -> Self {
        Self {
            sequencer: Sequencer::new(messages),
            codec,
            mux,
            report: Report::default(),
        }
    }

    /// Opens all outputs described by this [Config].
    /// Outputs already opened are closed when a later one fails.
    pub fn open(config: &Config, codec: C) -> Result<Self, Error> {
        config.validate()?;

        let clock = SessionClock::now();

        let primary = match config.mode {
            Mode::RealTime => match (&config.output, config.port) {
                (Some(path), _) => {
                    let file = FileTransport::create_tagged(path, &clock)?;
                    info!("{} (tagged, real time)", path.display());
                    Primary::RealTime(Box::new(file))
                },
                (None, Some(port)) => {
                    let tcp = TcpBroadcast::bind(port)?;
                    info!("tcp://{} (real time)", tcp.local_addr());
                    Primary::RealTime(Box::new(tcp))
                },
                (None, None) => return Err(Error::NoOutput),
            },
            Mode::Fast => match &config.output {
                Some(path) => {
                    let mut data = FileTransport::create(path)?;
                    let tags = match Self::open_tags(path, &clock) {
                        Ok(tags) => tags,
                        Err(e) => {
                            data.close();
                            return Err(e);
                        },
                    };
                    info!("{} (tagged, fast)", path.display());
                    Primary::Fast {
                        data: Box::new(data),
                        tags: Some(tags),
                        clock: VirtualClock::default(),
                    }
                },
                None => {
                    info!("stdout (fast)");
                    Primary::Fast {
                        data: Box::new(WriterTransport::new(std::io::stdout())),
                        tags: None,
                        clock: VirtualClock::default(),
                    }
                },
            },
        };

        let mut mux = Multiplexer::new(primary);

        let broadcast = match (config.mode, &config.output, config.port) {
            (Mode::RealTime, Some(_), Some(port)) | (Mode::Fast, _, Some(port)) => Some(port),
            _ => None,
        };

        if let Some(port) = broadcast {
            match TcpBroadcast::bind(port) {
                Ok(tcp) => {
                    info!("tcp://{} (broadcast)", tcp.local_addr());
                    mux = mux.with_broadcast(Box::new(tcp));
                },
                Err(e) => {
                    mux.close();
                    return Err(e);
                },
            }
        }

        Ok(Self::new(&config.messages, codec, mux))
    }

    fn open_tags(
        path: &std::path::Path,
        clock: &SessionClock,
    ) -> Result<TagWriter<Box<dyn Write>>, Error> {
        let tag_path = tag_path(path);
        let fd = File::create(&tag_path)
            .map_err(|e| Error::OutputOpen(tag_path.display().to_string(), e))?;
        let writer: Box<dyn Write> = Box::new(BufWriter::new(fd));
        TagWriter::new(writer, &TagHeader::from_clock(clock))
    }

    /// Processes a time ordered series of observations, one epoch at a time.
    /// Returns the statistics accumulated so far.
    pub fn run(&mut self, records: &[Observation]) -> Report {
        let mut epochs = EpochGrouper::new(records).peekable();

        while let Some(epoch) = epochs.next() {
            let t = match epoch.first() {
                Some(first) => first.epoch,
                None => continue,
            };

            debug!("{}  NOBS={:2}", t, epoch.len());

            let mut bytes = 0_u64;
            let mux = &mut self.mux;

            self.sequencer.run(
                &mut self.codec,
                epoch,
                &mut self.report.counters,
                |emission| {
                    bytes += emission.bytes.len() as u64;
                    mux.write(&emission.bytes);
                },
            );

            let delay_ms = match epochs.peek().and_then(|next| next.first()) {
                Some(next) => inter_epoch_delay_ms(t, next.epoch),
                None => 0,
            };

            self.mux.after_epoch(delay_ms);

            self.report.epochs += 1;
            self.report.bytes += bytes;
        }

        self.report.short_writes = self.mux.short_writes();
        self.report.paced_ms = self.mux.paced_ms();
        self.report.clone()
    }

    /// Statistics accumulated so far
    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Returns true if this [Session] paces to the wall clock
    pub fn is_real_time(&self) -> bool {
        self.mux.is_real_time()
    }

    /// Flushes and closes every output
    pub fn close(mut self) -> Report {
        self.mux.close();
        debug!(
            "closed: {} epochs, {} messages",
            self.report.epochs,
            self.report.counters.total()
        );
        std::mem::take(&mut self.report)
    }
}
