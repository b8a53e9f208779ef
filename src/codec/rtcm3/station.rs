//! Reference station messages (1005, 1006, 1007, 1008)
use rtcm_rs::{
    msg::{Msg1005T, Msg1006T, Msg1007T, Msg1008T},
    prelude::Message,
    util::Df88591String,
};

use crate::{codec::CodecError, station::Station};

/// Antenna height resolution [m]
const HEIGHT_RESOLUTION: f64 = 1.0E-4;

/// Stationary antenna reference point, with (1006) or without (1005) height.
pub(crate) fn arp(number: u16, station_id: u16, station: &Station) -> Result<Message, CodecError> {
    let (x, y, z) = station.position.unwrap_or_default();

    if number == 1005 {
        return Ok(Message::Msg1005(Msg1005T {
            reference_station_id: station_id,
            reserved_24_6: 0,
            gps_flag: 1,
            glonass_flag: 1,
            galileo_flag: 1,
            reference_station_ind: 0,
            antenna_ref_point_ecef_x_m: x,
            single_receiver_osc_ind: 1,
            reserved_73_1: 0,
            antenna_ref_point_ecef_y_m: y,
            quarter_cycle_ind: 0,
            antenna_ref_point_ecef_z_m: z,
        }));
    }

    let height = (station.antenna_height / HEIGHT_RESOLUTION).round();
    if !(0.0..=u16::MAX as f64).contains(&height) {
        return Err(CodecError::InvalidStationInfo);
    }

    Ok(Message::Msg1006(Msg1006T {
        reference_station_id: station_id,
        reserved_24_6: 0,
        gps_flag: 1,
        glonass_flag: 1,
        galileo_flag: 1,
        reference_station_ind: 0,
        antenna_ref_point_ecef_x_m: x,
        single_receiver_osc_ind: 1,
        reserved_73_1: 0,
        antenna_ref_point_ecef_y_m: y,
        quarter_cycle_ind: 0,
        antenna_ref_point_ecef_z_m: z,
        antenna_height_m: height * HEIGHT_RESOLUTION,
    }))
}

/// Antenna descriptor, with (1008) or without (1007) serial number.
/// Descriptors longer than 31 characters are truncated.
pub(crate) fn antenna(number: u16, station_id: u16, station: &Station) -> Message {
    let descriptor = Df88591String::from(station.antenna.as_str());
    if number == 1007 {
        Message::Msg1007(Msg1007T {
            reference_station_id: station_id,
            antenna_descriptor_str: descriptor,
            antenna_setup_id: station.antenna_setup,
        })
    } else {
        Message::Msg1008(Msg1008T {
            reference_station_id: station_id,
            antenna_descriptor_str: descriptor,
            antenna_setup_id: station.antenna_setup,
            antenna_serial_number_str: Df88591String::from(station.antenna_serial.as_str()),
        })
    }
}
