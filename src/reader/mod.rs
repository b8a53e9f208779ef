//! RINEX 3 observation reader
use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

#[cfg(feature = "flate2")]
use flate2::read::GzDecoder;

use log::debug;

use rinex::{
    observation::{EpochFlag, SignalObservation},
    prelude::{Header, Observable, Rinex},
};

use crate::{
    constants::Framing,
    observation::{Code, LliFlags, Observation, Signal},
    prelude::{Constellation, Duration, Epoch, SV},
    station::Station,
    ParsingError,
};

/// Seconds per GPS week
const WEEK_SECONDS: f64 = 604_800.0;

/// Record selection applied while reading
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ReadOptions {
    /// Drop records before this instant
    pub start: Option<Epoch>,
    /// Drop records after this instant
    pub end: Option<Epoch>,
    /// Resampling interval
    pub interval: Option<Duration>,
}

impl ReadOptions {
    /// Copies and returns [ReadOptions] with a start instant (inclusive)
    pub fn with_start(&self, start: Epoch) -> Self {
        let mut s = *self;
        s.start = Some(start);
        s
    }
    /// Copies and returns [ReadOptions] with an end instant (inclusive)
    pub fn with_end(&self, end: Epoch) -> Self {
        let mut s = *self;
        s.end = Some(end);
        s
    }
    /// Copies and returns [ReadOptions] with a resampling interval
    pub fn with_interval(&self, interval: Duration) -> Self {
        let mut s = *self;
        s.interval = Some(interval);
        s
    }

    /// Returns true if this epoch should be retained
    pub fn retains(&self, epoch: Epoch) -> bool {
        if let Some(start) = self.start {
            if epoch < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if epoch > end {
                return false;
            }
        }
        if let Some(interval) = self.interval {
            let interval = interval.to_seconds();
            if interval > 0.0 {
                let tow = epoch.to_gpst_seconds().rem_euclid(WEEK_SECONDS);
                if (tow + Framing::DTTOL).rem_euclid(interval) > 2.0 * Framing::DTTOL {
                    return false;
                }
            }
        }
        true
    }
}

/// Observations of one file, time ordered, ready to be framed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationSet {
    /// Records sorted by (epoch, satellite), without duplicates
    pub records: Vec<Observation>,
    /// Reference station described by the header
    pub station: Station,
    /// Glonass frequency channel numbers, per PRN
    pub glo_fcn: HashMap<u8, i8>,
}

impl ObservationSet {
    /// Number of epochs, once grouped
    pub fn epochs(&self) -> usize {
        crate::epoch::EpochGrouper::new(&self.records).count()
    }

    /// Parses a complete RINEX 3 observation stream
    pub fn from_reader<R: Read>(
        reader: &mut BufReader<R>,
        options: &ReadOptions,
    ) -> Result<Self, ParsingError> {
        let rinex = Rinex::parse(reader)?;
        Self::from_rinex(&rinex, options)
    }

    /// Reads a RINEX 3 observation file, plain or gzip compressed
    pub fn from_file(path: &Path, options: &ReadOptions) -> Result<Self, ParsingError> {
        let fd = File::open(path)?;
        let gzip = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("gz"))
            .unwrap_or(false);

        let set = if gzip {
            #[cfg(feature = "flate2")]
            {
                Self::from_reader(&mut BufReader::new(GzDecoder::new(fd)), options)?
            }
            #[cfg(not(feature = "flate2"))]
            {
                return Err(ParsingError::GzipSupport);
            }
        } else {
            Self::from_reader(&mut BufReader::new(fd), options)?
        };

        debug!(
            "{}: {} records, {} epochs",
            path.display(),
            set.records.len(),
            set.epochs()
        );
        Ok(set)
    }

    /// Converts a parsed observation [Rinex] into time ordered records.
    /// Event epochs are skipped. When a satellite is described twice
    /// within one epoch, its first line wins.
    pub fn from_rinex(rinex: &Rinex, options: &ReadOptions) -> Result<Self, ParsingError> {
        let version = rinex.header.version;
        if version.major != 3 {
            return Err(ParsingError::NonSupportedVersion(format!(
                "{}.{:02}",
                version.major, version.minor
            )));
        }

        let record = rinex.record.as_obs().ok_or(ParsingError::NotObservation)?;

        let mut records = Vec::<Observation>::new();

        for (key, observations) in record.iter() {
            if !matches!(key.flag, EpochFlag::Ok | EpochFlag::PowerFailure) {
                debug!("{}: event flag {:?}", key.epoch, key.flag);
                continue;
            }
            if !options.retains(key.epoch) {
                continue;
            }

            let mut epoch = Vec::<Observation>::new();
            let mut line = Option::<(SV, bool)>::None;

            for sig in observations.signals.iter() {
                // a new satellite line starts whenever the satellite changes
                let skip = match line {
                    Some((sv, skip)) if sv == sig.sv => skip,
                    _ => {
                        let duplicate = epoch.iter().any(|obs| obs.sv == sig.sv);
                        if duplicate {
                            debug!("{}({}): duplicate satellite line", key.epoch, sig.sv);
                        }
                        line = Some((sig.sv, duplicate));
                        duplicate
                    },
                };
                if skip {
                    continue;
                }

                let pos = match epoch.iter().position(|obs| obs.sv == sig.sv) {
                    Some(pos) => pos,
                    None => {
                        epoch.push(Observation::new(key.epoch, sig.sv));
                        epoch.len() - 1
                    },
                };

                merge_signal(&mut epoch[pos], sig);
            }

            records.extend(epoch.into_iter().filter(|obs| !obs.signals.is_empty()));
        }

        records.sort_by(|a, b| a.epoch.cmp(&b.epoch).then(a.sv.cmp(&b.sv)));
        let total = records.len();
        records.dedup_by(|b, a| a.epoch == b.epoch && a.sv == b.sv);
        if records.len() < total {
            debug!("{} duplicate records dropped", total - records.len());
        }

        Ok(Self {
            records,
            station: station(&rinex.header),
            glo_fcn: glonass_channels(&rinex.header),
        })
    }
}

/// Stores one RINEX observable into the matching [Signal].
/// Blank (null) measurements and unknown signal codes are dropped.
fn merge_signal(obs: &mut Observation, sig: &SignalObservation) {
    if sig.value == 0.0 {
        return;
    }

    let code = match sig.observable.code().map(|code| code.parse::<Code>()) {
        Some(Ok(code)) => code,
        _ => return,
    };

    let signal = match obs.signals.iter().position(|s| s.code == code) {
        Some(pos) => &mut obs.signals[pos],
        None => {
            obs.signals.push(Signal::new(code));
            let last = obs.signals.len() - 1;
            &mut obs.signals[last]
        },
    };

    match sig.observable {
        Observable::PseudoRange(_) => signal.pseudorange = Some(sig.value),
        Observable::PhaseRange(_) => {
            signal.phase = Some(sig.value);
            signal.lli = sig
                .lli
                .map(|lli| LliFlags::from_bits_truncate(lli.bits()))
                .unwrap_or_default();
        },
        Observable::Doppler(_) => signal.doppler = Some(sig.value),
        Observable::SSI(_) => signal.snr = Some(sig.value),
        _ => {},
    }
}

/// Reference station described by the RINEX [Header]
fn station(header: &Header) -> Station {
    let name = header
        .geodetic_marker
        .as_ref()
        .map(|marker| marker.name.as_str())
        .unwrap_or_default();

    let mut station = Station::new(name);

    if let Some(rcvr) = &header.rcvr {
        station = station.with_receiver(&rcvr.model, &rcvr.firmware, &rcvr.sn);
    }
    if let Some(antenna) = &header.rcvr_antenna {
        station = station
            .with_antenna(&antenna.model, &antenna.sn)
            .with_antenna_height(antenna.height.unwrap_or(0.0));
    }
    if let Some((x, y, z)) = header.rx_position {
        station = station.with_position(x, y, z);
    }
    station
}

/// Glonass frequency channel numbers, per PRN
fn glonass_channels(header: &Header) -> HashMap<u8, i8> {
    header
        .glo_channels
        .iter()
        .filter(|(sv, _)| sv.constellation == Constellation::Glonass)
        .map(|(sv, fcn)| (sv.prn, *fcn))
        .collect()
}
