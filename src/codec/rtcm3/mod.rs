//! RTCM 3 message codec
use std::collections::HashMap;

use log::trace;
use rtcm_rs::prelude::{Message, MessageBuilder, RtcmError};

mod msm;
mod signals;
mod station;

use msm::{MsmEncoder, PhaseTracker};

use crate::{
    codec::{CodecError, MessageCodec},
    message::{Category, MessageType},
    observation::Code,
    page::Page,
    prelude::{Epoch, SV},
    station::Station,
};

/// [Rtcm3Codec] encodes station descriptions (1005 to 1008)
/// and Multiple Signal Messages (MSM4 to MSM7) of all constellations.
/// Each encoded message is a complete transport frame
/// (preamble, length, payload and CRC-24Q).
#[derive(Debug, Clone, Default)]
pub struct Rtcm3Codec {
    /// Reference station ID (12 bit)
    station_id: u16,
    /// Reference station description
    station: Station,
    /// Glonass frequency channel numbers, per PRN
    glo_fcn: HashMap<u8, i8>,
    /// Current epoch
    epoch: Option<Epoch>,
    /// Phase continuity, per tracked signal
    trackers: HashMap<(SV, Code), PhaseTracker>,
}

impl Rtcm3Codec {
    /// Builds a new [Rtcm3Codec] for given reference station.
    pub fn new(station_id: u16, station: Station) -> Self {
        Self {
            station_id: station_id & 0x0FFF,
            station,
            ..Default::default()
        }
    }

    /// Copies and returns [Rtcm3Codec] with Glonass frequency channel numbers
    pub fn with_glonass_channels(&self, glo_fcn: &HashMap<u8, i8>) -> Self {
        let mut s = self.clone();
        s.glo_fcn = glo_fcn.clone();
        s
    }

    pub fn station_id(&self) -> u16 {
        self.station_id
    }

    pub fn station(&self) -> &Station {
        &self.station
    }

    fn message(
        &mut self,
        message: MessageType,
        page: &Page<'_>,
        sync: bool,
    ) -> Result<Message, CodecError> {
        let number = message.number();
        match message.category() {
            Category::Legacy => match number {
                1005 | 1006 => station::arp(number, self.station_id, &self.station),
                1007 | 1008 => Ok(station::antenna(number, self.station_id, &self.station)),
                _ => Err(CodecError::UnsupportedMessage(message)),
            },
            Category::Msm {
                constellation,
                level,
            } => {
                let epoch = self.epoch.ok_or(CodecError::NoEpoch)?;
                let mut encoder = MsmEncoder {
                    station_id: self.station_id,
                    epoch,
                    glo_fcn: &self.glo_fcn,
                    trackers: &mut self.trackers,
                };
                encoder
                    .encode(constellation, level, page, sync)?
                    .ok_or(CodecError::UnsupportedMessage(message))
            },
            _ => Err(CodecError::UnsupportedMessage(message)),
        }
    }
}

impl MessageCodec for Rtcm3Codec {
    fn begin_epoch(&mut self, epoch: Epoch) {
        self.epoch = Some(epoch);
    }

    fn encode(
        &mut self,
        message: MessageType,
        page: &Page<'_>,
        sync: bool,
    ) -> Result<Vec<u8>, CodecError> {
        let msg = self.message(message, page, sync)?;
        let mut builder = MessageBuilder::new();
        let bytes = builder.build_message(&msg).map_err(|e| match e {
            RtcmError::BufferOverflow => CodecError::PayloadTooLarge,
            e => CodecError::Encoding(e.to_string()),
        })?;
        trace!("{} - {} bytes (sync={})", message, bytes.len(), sync);
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tests::toolkit::{gps_observation, sv};
    use rtcm_rs::prelude::MessageFrame;

    fn codec() -> Rtcm3Codec {
        let station = Station::new("test").with_position(4027881.628, 306998.792, 4919499.138);
        Rtcm3Codec::new(1, station)
    }

    #[test]
    fn station_messages() {
        let mut codec = codec();
        let bytes = codec
            .encode(MessageType(1006), &Page::default(), false)
            .unwrap();
        let frame = MessageFrame::new(&bytes).unwrap();
        assert_eq!(frame.frame_len(), bytes.len());
        assert_eq!(frame.message_number(), Some(1006));
        let payload = frame.data();
        assert_eq!(payload.len(), 21);
        assert_eq!(&payload[..2], &[0x3E, 0xE0]);
    }

    #[test]
    fn declined_messages() {
        let mut codec = codec();
        codec.begin_epoch(Epoch::from_gpst_seconds(1.0E9));
        for number in [1001, 1004, 1012, 1033, 1071, 1230] {
            let msg = MessageType(number);
            assert_eq!(
                codec.encode(msg, &Page::default(), false),
                Err(CodecError::UnsupportedMessage(msg)),
                "{} should be declined",
                number
            );
        }
    }

    #[test]
    fn msm_needs_an_epoch() {
        let mut codec = codec();
        assert_eq!(
            codec.encode(MessageType(1077), &Page::default(), false),
            Err(CodecError::NoEpoch)
        );

        let t = Epoch::from_gpst_seconds(1.0E9);
        let records = vec![gps_observation(t, sv("G12"), &["1C", "5Q"])];
        codec.begin_epoch(t);
        let bytes = codec
            .encode(MessageType(1077), &Page::new(records.iter().collect()), true)
            .unwrap();
        let frame = MessageFrame::new(&bytes).unwrap();
        let payload = frame.data();
        assert_eq!(&payload[..2], &[0x43, 0x50]);
        // multiple message bit
        assert_eq!(payload[6] & 0x02, 0x02);
    }
}
