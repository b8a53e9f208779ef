//! Multiple Signal Messages (MSM4 to MSM7)
use std::collections::{BTreeMap, HashMap};

use rtcm_rs::{msg::*, prelude::Message, util::DataVec};

use super::signals::{msm_signal, satellite_id, wavelength};

use crate::{
    codec::CodecError,
    constants::{Framing, Physics},
    observation::{Code, Observation, Signal},
    page::Page,
    prelude::{Constellation, Epoch, SV},
};

const P2_10: f64 = 1.0 / 1024.0;

/// Satellite and signal field resolutions of one MSM level
#[derive(Debug, Copy, Clone, PartialEq)]
struct Resolution {
    /// Fine pseudo range: (width, 2^-n ms)
    pseudorange: (usize, i32),
    /// Fine phase range: (width, 2^-n ms)
    phase: (usize, i32),
    /// Lock time indicator width
    lock: usize,
    /// CNR: (width, 2^-n dB-Hz)
    cnr: (usize, i32),
}

impl Resolution {
    fn from_level(level: u8) -> Option<Self> {
        let compact = match level {
            4 | 5 => true,
            6 | 7 => false,
            _ => return None,
        };
        if compact {
            Some(Self {
                pseudorange: (15, 24),
                phase: (22, 29),
                lock: 4,
                cnr: (6, 0),
            })
        } else {
            Some(Self {
                pseudorange: (20, 29),
                phase: (24, 31),
                lock: 10,
                cnr: (10, 4),
            })
        }
    }
}

/// Quantizes `value` to a `bits` wide signed field at 2^-`exp` resolution.
/// Returns None if the value does not fit.
fn quantized(value: f64, bits: usize, exp: i32) -> Option<f64> {
    let scale = 2.0_f64.powi(exp);
    let units = (value * scale).round();
    let limit = (1i64 << (bits - 1)) as f64;
    if units.abs() < limit {
        Some(units / scale)
    } else {
        None
    }
}

/// Lock time indicator, 4 bit flavor (MSM4 and MSM5)
pub(crate) fn lock_indicator_4bit(lock_ms: u64) -> u16 {
    let mut ind = 0;
    let mut t = lock_ms / 32;
    while t > 0 && ind < 15 {
        ind += 1;
        t >>= 1;
    }
    ind
}

/// Lock time indicator, extended range and resolution (MSM6 and MSM7)
pub(crate) fn lock_indicator_10bit(lock_ms: u64) -> u16 {
    if lock_ms < 64 {
        return lock_ms as u16;
    }
    let k = 63 - lock_ms.leading_zeros() as u64 - 6;
    if k > 19 {
        704
    } else {
        ((lock_ms >> (k + 1)) + 32 * (k + 1)) as u16
    }
}

/// GNSS time of week [ms] of this [Epoch], in the [Constellation] timescale.
/// Glonass is described by day of week (3 bits, sunday = 0) + Moscow time of day.
pub(crate) fn epoch_time_field(epoch: Epoch, constellation: Constellation) -> u32 {
    const WEEK_MS: i64 = 604_800_000;
    const DAY_MS: i64 = 86_400_000;

    let tow = |seconds: f64| (seconds * 1.0E3).round() as i64;

    match constellation {
        Constellation::Glonass => {
            let ms = tow(epoch.to_unix_seconds() + 10_800.0);
            let days = ms.div_euclid(DAY_MS);
            let tod = ms.rem_euclid(DAY_MS);
            // 1970-01-01 was a thursday
            let dow = (days + 4).rem_euclid(7);
            ((dow << 27) | tod) as u32
        },
        Constellation::Galileo => tow(epoch.to_gst_seconds()).rem_euclid(WEEK_MS) as u32,
        Constellation::BeiDou => tow(epoch.to_bdt_seconds()).rem_euclid(WEEK_MS) as u32,
        _ => tow(epoch.to_gpst_seconds()).rem_euclid(WEEK_MS) as u32,
    }
}

/// Carrier phase continuity of one (SV, Code) pair
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct PhaseTracker {
    /// Lock start
    start: Epoch,
    /// Integer cycles removed from the raw phase
    offset: f64,
}

impl PhaseTracker {
    fn new(start: Epoch, phase: f64, rough_cycles: f64) -> Self {
        Self {
            start,
            offset: (phase - rough_cycles).round(),
        }
    }

    fn lock_ms(&self, now: Epoch) -> u64 {
        let seconds = (now - self.start).to_seconds();
        if seconds > 0.0 {
            (seconds * 1.0E3).round() as u64
        } else {
            0
        }
    }
}

/// One (satellite, signal) cell, in physical units
struct Cell {
    satellite_id: u8,
    /// MSM signal (band, attribute)
    signal: (u8, char),
    /// Fine pseudo range [ms]
    pseudorange: Option<f64>,
    /// Fine phase range [ms]
    phase: Option<f64>,
    lock: u16,
    half_cycle: bool,
    /// CNR [dB-Hz]
    cnr: Option<f64>,
    /// Fine phase range rate [m/s]
    rate: Option<f64>,
}

/// One satellite of the message
struct Satellite<'a> {
    id: u8,
    obs: &'a Observation,
    /// (MSM signal, signal), one entry per MSM signal
    signals: Vec<((u8, char), &'a Signal)>,
    /// Rough range [ms units of 2^-10]
    rough_range: Option<i64>,
    /// Rough range rate [m/s]
    rough_rate: Option<i64>,
    /// Glonass frequency channel number
    fcn: Option<i8>,
}

impl<'a> Satellite<'a> {
    fn rough_range_m(&self) -> Option<f64> {
        self.rough_range
            .map(|units| units as f64 * P2_10 * Physics::RANGE_MS)
    }
    /// Integer milliseconds of the rough range
    fn rough_range_ms(&self) -> Option<u8> {
        self.rough_range.map(|units| (units >> 10) as u8)
    }
    /// Rough range modulo 1 ms [ms]
    fn rough_range_mod1ms(&self) -> f64 {
        self.rough_range
            .map(|units| (units & 0x3FF) as f64 * P2_10)
            .unwrap_or(0.0)
    }
    fn rough_rate_m_s(&self) -> Option<i16> {
        self.rough_rate.map(|rate| rate as i16)
    }
}

/// Satellite and signal content of one message
struct Content<'a> {
    satellites: Vec<Satellite<'a>>,
    cells: Vec<Cell>,
}

impl<'a> Content<'a> {
    fn msm46_satellites(&self) -> DataVec<Msm46Sat, 64> {
        let mut data = DataVec::new();
        for sat in self.satellites.iter() {
            data.push(Msm46Sat {
                satellite_id: sat.id,
                gnss_satellite_rough_range_integer_ms: sat.rough_range_ms(),
                gnss_satellite_rough_range_mod1ms_ms: sat.rough_range_mod1ms(),
            });
        }
        data
    }

    fn msm57_satellites(&self) -> DataVec<Msm57Sat, 64> {
        let mut data = DataVec::new();
        for sat in self.satellites.iter() {
            data.push(Msm57Sat {
                satellite_id: sat.id,
                gnss_satellite_rough_range_integer_ms: sat.rough_range_ms(),
                reserved_8_4: 0,
                gnss_satellite_rough_range_mod1ms_ms: sat.rough_range_mod1ms(),
                gnss_satellite_rough_phaserange_rates_m_s: sat.rough_rate_m_s(),
            });
        }
        data
    }

    fn msm57_glo_satellites(&self) -> DataVec<Msm57GloSat, 64> {
        let mut data = DataVec::new();
        for sat in self.satellites.iter() {
            data.push(Msm57GloSat {
                satellite_id: sat.id,
                gnss_satellite_rough_range_integer_ms: sat.rough_range_ms(),
                glonass_satellite_frequency_channel_number: sat
                    .fcn
                    .filter(|fcn| (-7..=6).contains(fcn)),
                gnss_satellite_rough_range_mod1ms_ms: sat.rough_range_mod1ms(),
                gnss_satellite_rough_phaserange_rates_m_s: sat.rough_rate_m_s(),
            });
        }
        data
    }
}

/// Signal data of MSM4 and MSM5 messages
macro_rules! compact_signals {
    ($content:expr, $sig:ident, $sig_id:ident) => {{
        let mut data = DataVec::<$sig, 64>::new();
        for cell in $content.cells.iter() {
            data.push($sig {
                satellite_id: cell.satellite_id,
                signal_id: $sig_id::new(cell.signal.0, cell.signal.1),
                gnss_signal_fine_pseudorange_ms: cell.pseudorange,
                gnss_signal_fine_phaserange_ms: cell.phase,
                gnss_phaserange_lock_time_ind: cell.lock as u8,
                half_cycle_ambiguity_ind: cell.half_cycle as u8,
                gnss_signal_cnr_dbhz: cell.cnr.map(|cnr| cnr as u8),
            });
        }
        data
    }};
    ($content:expr, $sig:ident, $sig_id:ident, rates) => {{
        let mut data = DataVec::<$sig, 64>::new();
        for cell in $content.cells.iter() {
            data.push($sig {
                satellite_id: cell.satellite_id,
                signal_id: $sig_id::new(cell.signal.0, cell.signal.1),
                gnss_signal_fine_pseudorange_ms: cell.pseudorange,
                gnss_signal_fine_phaserange_ms: cell.phase,
                gnss_phaserange_lock_time_ind: cell.lock as u8,
                half_cycle_ambiguity_ind: cell.half_cycle as u8,
                gnss_signal_cnr_dbhz: cell.cnr.map(|cnr| cnr as u8),
                gnss_signal_fine_phaserange_rate_m_s: cell.rate,
            });
        }
        data
    }};
}

/// Signal data of MSM6 and MSM7 messages
macro_rules! extended_signals {
    ($content:expr, $sig:ident, $sig_id:ident) => {{
        let mut data = DataVec::<$sig, 64>::new();
        for cell in $content.cells.iter() {
            data.push($sig {
                satellite_id: cell.satellite_id,
                signal_id: $sig_id::new(cell.signal.0, cell.signal.1),
                gnss_signal_fine_pseudorange_ext_ms: cell.pseudorange,
                gnss_signal_fine_phaserange_ext_ms: cell.phase,
                gnss_phaserange_lock_time_ext_ind: cell.lock,
                half_cycle_ambiguity_ind: cell.half_cycle as u8,
                gnss_signal_cnr_ext_dbhz: cell.cnr,
            });
        }
        data
    }};
    ($content:expr, $sig:ident, $sig_id:ident, rates) => {{
        let mut data = DataVec::<$sig, 64>::new();
        for cell in $content.cells.iter() {
            data.push($sig {
                satellite_id: cell.satellite_id,
                signal_id: $sig_id::new(cell.signal.0, cell.signal.1),
                gnss_signal_fine_pseudorange_ext_ms: cell.pseudorange,
                gnss_signal_fine_phaserange_ext_ms: cell.phase,
                gnss_phaserange_lock_time_ext_ind: cell.lock,
                half_cycle_ambiguity_ind: cell.half_cycle as u8,
                gnss_signal_cnr_ext_dbhz: cell.cnr,
                gnss_signal_fine_phaserange_rate_m_s: cell.rate,
            });
        }
        data
    }};
}

/// Builds one MSM [Message] from its header fields and data segment
macro_rules! msm_message {
    (
        $variant:ident, $t:ident, $data:ident,
        header: $header:expr,
        epoch: { $($epoch_field:ident: $epoch_value:expr),+ },
        satellites: $satellites:expr,
        signals: $signals:expr $(,)?
    ) => {
        Message::$variant($t {
            reference_station_id: $header.station_id,
            $($epoch_field: $epoch_value,)+
            msm_multiple_message_flag: $header.multiple_message as u8,
            issue_of_data_station: None,
            reserved_58_7: 0,
            clock_steering_ind: 0,
            external_clock_ind: 0,
            gnss_smoothing_type_ind: 0,
            gnss_smoothing_interval_index: 0,
            data_segment: $data {
                satellite_data: $satellites,
                signal_data: $signals,
            },
        })
    };
}

/// MSM header fields
struct Header {
    station_id: u16,
    /// Epoch time field, see [epoch_time_field]
    time: u32,
    multiple_message: bool,
}

impl Header {
    fn glo_day_of_week(&self) -> Option<u8> {
        Some((self.time >> 27) as u8)
    }
    fn glo_time_of_day(&self) -> u32 {
        self.time & 0x7FF_FFFF
    }
}

/// Builds the MSM [Message] of this [Constellation] and level.
fn build(
    constellation: Constellation,
    level: u8,
    header: &Header,
    content: &Content<'_>,
) -> Option<Message> {
    let tow = header.time;
    let msg = match (constellation, level) {
        (Constellation::GPS, 4) => msm_message!(
            Msg1074, Msg1074T, Msg1074Data,
            header: header,
            epoch: { gps_epoch_time_ms: tow },
            satellites: content.msm46_satellites(),
            signals: compact_signals!(content, Msg1074Sig, GpsSigId),
        ),
        (Constellation::GPS, 5) => msm_message!(
            Msg1075, Msg1075T, Msg1075Data,
            header: header,
            epoch: { gps_epoch_time_ms: tow },
            satellites: content.msm57_satellites(),
            signals: compact_signals!(content, Msg1075Sig, GpsSigId, rates),
        ),
        (Constellation::GPS, 6) => msm_message!(
            Msg1076, Msg1076T, Msg1076Data,
            header: header,
            epoch: { gps_epoch_time_ms: tow },
            satellites: content.msm46_satellites(),
            signals: extended_signals!(content, Msg1076Sig, GpsSigId),
        ),
        (Constellation::GPS, 7) => msm_message!(
            Msg1077, Msg1077T, Msg1077Data,
            header: header,
            epoch: { gps_epoch_time_ms: tow },
            satellites: content.msm57_satellites(),
            signals: extended_signals!(content, Msg1077Sig, GpsSigId, rates),
        ),
        (Constellation::Glonass, 4) => msm_message!(
            Msg1084, Msg1084T, Msg1084Data,
            header: header,
            epoch: {
                glo_day_of_week: header.glo_day_of_week(),
                glo_epoch_time_ms: header.glo_time_of_day()
            },
            satellites: content.msm46_satellites(),
            signals: compact_signals!(content, Msg1084Sig, GloSigId),
        ),
        (Constellation::Glonass, 5) => msm_message!(
            Msg1085, Msg1085T, Msg1085Data,
            header: header,
            epoch: {
                glo_day_of_week: header.glo_day_of_week(),
                glo_epoch_time_ms: header.glo_time_of_day()
            },
            satellites: content.msm57_glo_satellites(),
            signals: compact_signals!(content, Msg1085Sig, GloSigId, rates),
        ),
        (Constellation::Glonass, 6) => msm_message!(
            Msg1086, Msg1086T, Msg1086Data,
            header: header,
            epoch: {
                glo_day_of_week: header.glo_day_of_week(),
                glo_epoch_time_ms: header.glo_time_of_day()
            },
            satellites: content.msm46_satellites(),
            signals: extended_signals!(content, Msg1086Sig, GloSigId),
        ),
        (Constellation::Glonass, 7) => msm_message!(
            Msg1087, Msg1087T, Msg1087Data,
            header: header,
            epoch: {
                glo_day_of_week: header.glo_day_of_week(),
                glo_epoch_time_ms: header.glo_time_of_day()
            },
            satellites: content.msm57_glo_satellites(),
            signals: extended_signals!(content, Msg1087Sig, GloSigId, rates),
        ),
        (Constellation::Galileo, 4) => msm_message!(
            Msg1094, Msg1094T, Msg1094Data,
            header: header,
            epoch: { gal_epoch_time_ms: tow },
            satellites: content.msm46_satellites(),
            signals: compact_signals!(content, Msg1094Sig, GalSigId),
        ),
        (Constellation::Galileo, 5) => msm_message!(
            Msg1095, Msg1095T, Msg1095Data,
            header: header,
            epoch: { gal_epoch_time_ms: tow },
            satellites: content.msm57_satellites(),
            signals: compact_signals!(content, Msg1095Sig, GalSigId, rates),
        ),
        (Constellation::Galileo, 6) => msm_message!(
            Msg1096, Msg1096T, Msg1096Data,
            header: header,
            epoch: { gal_epoch_time_ms: tow },
            satellites: content.msm46_satellites(),
            signals: extended_signals!(content, Msg1096Sig, GalSigId),
        ),
        (Constellation::Galileo, 7) => msm_message!(
            Msg1097, Msg1097T, Msg1097Data,
            header: header,
            epoch: { gal_epoch_time_ms: tow },
            satellites: content.msm57_satellites(),
            signals: extended_signals!(content, Msg1097Sig, GalSigId, rates),
        ),
        (c, 4) if c.is_sbas() => msm_message!(
            Msg1104, Msg1104T, Msg1104Data,
            header: header,
            epoch: { gps_epoch_time_ms: tow },
            satellites: content.msm46_satellites(),
            signals: compact_signals!(content, Msg1104Sig, SbasSigId),
        ),
        (c, 5) if c.is_sbas() => msm_message!(
            Msg1105, Msg1105T, Msg1105Data,
            header: header,
            epoch: { gps_epoch_time_ms: tow },
            satellites: content.msm57_satellites(),
            signals: compact_signals!(content, Msg1105Sig, SbasSigId, rates),
        ),
        (c, 6) if c.is_sbas() => msm_message!(
            Msg1106, Msg1106T, Msg1106Data,
            header: header,
            epoch: { gps_epoch_time_ms: tow },
            satellites: content.msm46_satellites(),
            signals: extended_signals!(content, Msg1106Sig, SbasSigId),
        ),
        (c, 7) if c.is_sbas() => msm_message!(
            Msg1107, Msg1107T, Msg1107Data,
            header: header,
            epoch: { gps_epoch_time_ms: tow },
            satellites: content.msm57_satellites(),
            signals: extended_signals!(content, Msg1107Sig, SbasSigId, rates),
        ),
        (Constellation::QZSS, 4) => msm_message!(
            Msg1114, Msg1114T, Msg1114Data,
            header: header,
            epoch: { qzss_epoch_time_ms: tow },
            satellites: content.msm46_satellites(),
            signals: compact_signals!(content, Msg1114Sig, QzssSigId),
        ),
        (Constellation::QZSS, 5) => msm_message!(
            Msg1115, Msg1115T, Msg1115Data,
            header: header,
            epoch: { qzss_epoch_time_ms: tow },
            satellites: content.msm57_satellites(),
            signals: compact_signals!(content, Msg1115Sig, QzssSigId, rates),
        ),
        (Constellation::QZSS, 6) => msm_message!(
            Msg1116, Msg1116T, Msg1116Data,
            header: header,
            epoch: { qzss_epoch_time_ms: tow },
            satellites: content.msm46_satellites(),
            signals: extended_signals!(content, Msg1116Sig, QzssSigId),
        ),
        (Constellation::QZSS, 7) => msm_message!(
            Msg1117, Msg1117T, Msg1117Data,
            header: header,
            epoch: { qzss_epoch_time_ms: tow },
            satellites: content.msm57_satellites(),
            signals: extended_signals!(content, Msg1117Sig, QzssSigId, rates),
        ),
        (Constellation::BeiDou, 4) => msm_message!(
            Msg1124, Msg1124T, Msg1124Data,
            header: header,
            epoch: { bds_epoch_time_ms: tow },
            satellites: content.msm46_satellites(),
            signals: compact_signals!(content, Msg1124Sig, BdsSigId),
        ),
        (Constellation::BeiDou, 5) => msm_message!(
            Msg1125, Msg1125T, Msg1125Data,
            header: header,
            epoch: { bds_epoch_time_ms: tow },
            satellites: content.msm57_satellites(),
            signals: compact_signals!(content, Msg1125Sig, BdsSigId, rates),
        ),
        (Constellation::BeiDou, 6) => msm_message!(
            Msg1126, Msg1126T, Msg1126Data,
            header: header,
            epoch: { bds_epoch_time_ms: tow },
            satellites: content.msm46_satellites(),
            signals: extended_signals!(content, Msg1126Sig, BdsSigId),
        ),
        (Constellation::BeiDou, 7) => msm_message!(
            Msg1127, Msg1127T, Msg1127Data,
            header: header,
            epoch: { bds_epoch_time_ms: tow },
            satellites: content.msm57_satellites(),
            signals: extended_signals!(content, Msg1127Sig, BdsSigId, rates),
        ),
        (Constellation::IRNSS, 4) => msm_message!(
            Msg1134, Msg1134T, Msg1134Data,
            header: header,
            epoch: { navic_epoch_time_ms: tow },
            satellites: content.msm46_satellites(),
            signals: compact_signals!(content, Msg1134Sig, NavicSigId),
        ),
        (Constellation::IRNSS, 5) => msm_message!(
            Msg1135, Msg1135T, Msg1135Data,
            header: header,
            epoch: { navic_epoch_time_ms: tow },
            satellites: content.msm57_satellites(),
            signals: compact_signals!(content, Msg1135Sig, NavicSigId, rates),
        ),
        (Constellation::IRNSS, 6) => msm_message!(
            Msg1136, Msg1136T, Msg1136Data,
            header: header,
            epoch: { navic_epoch_time_ms: tow },
            satellites: content.msm46_satellites(),
            signals: extended_signals!(content, Msg1136Sig, NavicSigId),
        ),
        (Constellation::IRNSS, 7) => msm_message!(
            Msg1137, Msg1137T, Msg1137Data,
            header: header,
            epoch: { navic_epoch_time_ms: tow },
            satellites: content.msm57_satellites(),
            signals: extended_signals!(content, Msg1137Sig, NavicSigId, rates),
        ),
        _ => return None,
    };
    Some(msg)
}

/// MSM encoder, borrows the codec states for the duration of one message.
pub(crate) struct MsmEncoder<'a> {
    pub station_id: u16,
    pub epoch: Epoch,
    pub glo_fcn: &'a HashMap<u8, i8>,
    pub trackers: &'a mut HashMap<(SV, Code), PhaseTracker>,
}

impl<'a> MsmEncoder<'a> {
    /// Builds the MSM [Message] describing the records of this [Page].
    /// Returns None for MSM levels and constellations that have no message.
    pub fn encode(
        &mut self,
        constellation: Constellation,
        level: u8,
        page: &Page<'_>,
        sync: bool,
    ) -> Result<Option<Message>, CodecError> {
        let res = match Resolution::from_level(level) {
            Some(res) => res,
            None => return Ok(None),
        };

        let satellites = self.satellites(constellation, page);

        let mut signals = satellites
            .iter()
            .flat_map(|sat| sat.signals.iter().map(|(signal, _)| *signal))
            .collect::<Vec<_>>();
        signals.sort_unstable();
        signals.dedup();

        let ncell = satellites.len() * signals.len();
        if ncell > Framing::SIGNAL_CAPACITY {
            return Err(CodecError::TooManyCells(ncell));
        }

        let cells = satellites
            .iter()
            .flat_map(|sat| sat.signals.iter().map(move |(id, signal)| (sat, *id, *signal)))
            .map(|(sat, id, signal)| self.cell(constellation, &res, sat, id, signal))
            .collect::<Vec<_>>();

        let header = Header {
            station_id: self.station_id,
            time: epoch_time_field(self.epoch, constellation),
            multiple_message: sync,
        };

        let content = Content { satellites, cells };
        Ok(build(constellation, level, &header, &content))
    }

    /// Selects the satellites of this page, in increasing satellite ID order.
    /// Signals without MSM identifier are dropped, and so are
    /// satellites left without any signal.
    fn satellites<'p>(
        &self,
        constellation: Constellation,
        page: &Page<'p>,
    ) -> Vec<Satellite<'p>> {
        let mut selected = BTreeMap::<u8, Satellite<'p>>::new();

        for obs in page.records().iter().copied() {
            let id = match satellite_id(&obs.sv) {
                Some(id) => id,
                None => continue,
            };
            if selected.contains_key(&id) {
                continue;
            }

            let mut signals = Vec::<((u8, char), &Signal)>::with_capacity(obs.signals.len());
            for sig in obs.signals.iter() {
                if let Some(signal) = msm_signal(constellation, sig.code) {
                    if signals.iter().all(|(known, _)| *known != signal) {
                        signals.push((signal, sig));
                    }
                }
            }

            if signals.is_empty() {
                continue;
            }

            let fcn = match constellation {
                Constellation::Glonass => self.glo_fcn.get(&obs.sv.prn).copied(),
                _ => None,
            };

            let rough_range = signals
                .iter()
                .filter_map(|(_, sig)| sig.pseudorange)
                .find(|pr| *pr > 0.0)
                .map(|pr| (pr / Physics::RANGE_MS / P2_10).round() as i64)
                .filter(|units| (0..255 << 10).contains(units));

            let rough_rate = signals
                .iter()
                .filter_map(|(_, sig)| {
                    let doppler = sig.doppler?;
                    let lambda = wavelength(constellation, sig.code, fcn)?;
                    Some(-doppler * lambda)
                })
                .next()
                .map(|rate| rate.round() as i64)
                .filter(|rate| rate.abs() < 8192);

            selected.insert(
                id,
                Satellite {
                    id,
                    obs,
                    signals,
                    rough_range,
                    rough_rate,
                    fcn,
                },
            );
        }

        selected.into_values().collect()
    }

    fn cell(
        &mut self,
        constellation: Constellation,
        res: &Resolution,
        sat: &Satellite<'_>,
        id: (u8, char),
        signal: &Signal,
    ) -> Cell {
        let lambda = wavelength(constellation, signal.code, sat.fcn);
        let rough_m = sat.rough_range_m();

        let pseudorange = match (signal.pseudorange, rough_m) {
            (Some(pr), Some(rough)) => quantized(
                (pr - rough) / Physics::RANGE_MS,
                res.pseudorange.0,
                res.pseudorange.1,
            ),
            _ => None,
        };

        let key = (sat.obs.sv, signal.code);
        if signal.lli.lock_loss() {
            self.trackers.remove(&key);
        }

        let (phase, lock_ms) = match (signal.phase, lambda, rough_m) {
            (Some(cp), Some(lambda), Some(rough)) if cp != 0.0 => {
                let rough_cycles = rough / lambda;
                let epoch = self.epoch;
                let tracker = self
                    .trackers
                    .entry(key)
                    .or_insert_with(|| PhaseTracker::new(epoch, cp, rough_cycles));

                let phase_ms = |tracker: &PhaseTracker| {
                    ((cp - tracker.offset) * lambda - rough) / Physics::RANGE_MS
                };

                match quantized(phase_ms(&*tracker), res.phase.0, res.phase.1) {
                    Some(ms) => (Some(ms), tracker.lock_ms(epoch)),
                    None => {
                        // phase drifted out of range: new lock
                        *tracker = PhaseTracker::new(epoch, cp, rough_cycles);
                        (quantized(phase_ms(&*tracker), res.phase.0, res.phase.1), 0)
                    },
                }
            },
            _ => {
                self.trackers.remove(&key);
                (None, 0)
            },
        };

        let lock = if res.lock == 4 {
            lock_indicator_4bit(lock_ms)
        } else {
            lock_indicator_10bit(lock_ms)
        };

        let cnr_scale = 2.0_f64.powi(res.cnr.1);
        let cnr_max = ((1u32 << res.cnr.0) - 1) as f64;
        let cnr = signal
            .snr
            .map(|snr| (snr * cnr_scale).round().clamp(0.0, cnr_max) / cnr_scale)
            .filter(|cnr| *cnr > 0.0);

        let rate = match (signal.doppler, lambda, sat.rough_rate) {
            (Some(doppler), Some(lambda), Some(rough)) => {
                let fine = ((-doppler * lambda - rough as f64) / 1.0E-4).round();
                if fine.abs() < 16384.0 {
                    Some(fine * 1.0E-4)
                } else {
                    None
                }
            },
            _ => None,
        };

        Cell {
            satellite_id: sat.id,
            signal: id,
            pseudorange,
            phase,
            lock,
            half_cycle: signal.lli.half_cycle(),
            cnr,
            rate,
        }
    }
}
