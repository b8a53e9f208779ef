//! MSM signal identifiers and carrier frequencies
use rtcm_rs::msg::{BdsSigId, GalSigId, GloSigId, GpsSigId, NavicSigId, QzssSigId, SbasSigId};

use crate::{
    constants::Physics,
    observation::Code,
    prelude::{Constellation, SV},
};

/// Returns the MSM signal (band, attribute) of this [Code],
/// if the [Constellation] has a signal ID for it.
pub(crate) fn msm_signal(constellation: Constellation, code: Code) -> Option<(u8, char)> {
    let band = code.band()?;
    let attribute = code.as_str().chars().nth(1)?;
    let valid = match constellation {
        Constellation::GPS => GpsSigId::new(band, attribute).is_valid(),
        Constellation::Glonass => GloSigId::new(band, attribute).is_valid(),
        Constellation::Galileo => GalSigId::new(band, attribute).is_valid(),
        Constellation::QZSS => QzssSigId::new(band, attribute).is_valid(),
        Constellation::BeiDou => BdsSigId::new(band, attribute).is_valid(),
        Constellation::IRNSS => NavicSigId::new(band, attribute).is_valid(),
        c if c.is_sbas() => SbasSigId::new(band, attribute).is_valid(),
        _ => false,
    };
    if valid {
        Some((band, attribute))
    } else {
        None
    }
}

/// Returns the MSM satellite ID (1..=64) of this [SV].
pub(crate) fn satellite_id(sv: &SV) -> Option<u8> {
    let id = if sv.constellation.is_sbas() {
        // S20 is PRN 120
        sv.prn.checked_sub(19)?
    } else {
        sv.prn
    };
    if (1..=64).contains(&id) {
        Some(id)
    } else {
        None
    }
}

/// Carrier frequency [Hz] of this signal.
/// Glonass FDMA bands require the frequency channel number.
pub(crate) fn carrier_frequency(
    constellation: Constellation,
    code: Code,
    glo_fcn: Option<i8>,
) -> Option<f64> {
    let band = code.band()?;
    let mhz = match constellation {
        Constellation::GPS | Constellation::QZSS => match band {
            1 => 1575.42,
            2 => 1227.60,
            5 => 1176.45,
            6 => 1278.75,
            _ => return None,
        },
        Constellation::Glonass => match band {
            1 => 1602.0 + 0.5625 * glo_fcn? as f64,
            2 => 1246.0 + 0.4375 * glo_fcn? as f64,
            3 => 1202.025,
            4 => 1600.995,
            6 => 1248.06,
            _ => return None,
        },
        Constellation::Galileo => match band {
            1 => 1575.42,
            5 => 1176.45,
            6 => 1278.75,
            7 => 1207.14,
            8 => 1191.795,
            _ => return None,
        },
        Constellation::BeiDou => match band {
            1 => 1575.42,
            2 => 1561.098,
            5 => 1176.45,
            6 => 1268.52,
            7 => 1207.14,
            8 => 1191.795,
            _ => return None,
        },
        Constellation::IRNSS => match band {
            5 => 1176.45,
            9 => 2492.028,
            _ => return None,
        },
        c if c.is_sbas() => match band {
            1 => 1575.42,
            5 => 1176.45,
            _ => return None,
        },
        _ => return None,
    };
    Some(mhz * 1.0E6)
}

/// Carrier wavelength [m] of this signal.
pub(crate) fn wavelength(constellation: Constellation, code: Code, glo_fcn: Option<i8>) -> Option<f64> {
    carrier_frequency(constellation, code, glo_fcn).map(|f| Physics::SPEED_OF_LIGHT_M_S / f)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    fn code(s: &str) -> Code {
        Code::from_str(s).unwrap()
    }

    #[test]
    fn msm_signals() {
        assert_eq!(msm_signal(Constellation::GPS, code("1C")), Some((1, 'C')));
        assert_eq!(msm_signal(Constellation::GPS, code("2W")), Some((2, 'W')));
        assert_eq!(msm_signal(Constellation::GPS, code("5Q")), Some((5, 'Q')));
        assert_eq!(msm_signal(Constellation::GPS, code("1X")), Some((1, 'X')));
        assert_eq!(msm_signal(Constellation::Galileo, code("7Q")), Some((7, 'Q')));
        assert_eq!(msm_signal(Constellation::BeiDou, code("2I")), Some((2, 'I')));
        assert_eq!(msm_signal(Constellation::Glonass, code("2P")), Some((2, 'P')));
        assert_eq!(msm_signal(Constellation::SBAS, code("5I")), Some((5, 'I')));
        assert_eq!(msm_signal(Constellation::GPS, code("7Q")), None);
        assert_eq!(msm_signal(Constellation::Glonass, code("5Q")), None);
        assert_eq!(msm_signal(Constellation::GPS, Code::NONE), None);
    }

    #[test]
    fn satellite_ids() {
        assert_eq!(satellite_id(&SV::new(Constellation::GPS, 1)), Some(1));
        assert_eq!(satellite_id(&SV::new(Constellation::GPS, 65)), None);
        assert_eq!(satellite_id(&SV::new(Constellation::SBAS, 20)), Some(1));
        assert_eq!(satellite_id(&SV::new(Constellation::SBAS, 5)), None);
    }

    #[test]
    fn wavelengths() {
        let l1 = wavelength(Constellation::GPS, code("1C"), None).unwrap();
        assert!((l1 - 0.190293672798).abs() < 1.0E-9);

        assert!(wavelength(Constellation::Glonass, code("1C"), None).is_none());
        let g1 = carrier_frequency(Constellation::Glonass, code("1C"), Some(-7)).unwrap();
        assert!((g1 - 1598.0625E6).abs() < 1.0);
    }
}
