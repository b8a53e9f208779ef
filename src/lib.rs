#![doc(html_logo_url = "https://raw.githubusercontent.com/georust/meta/master/logo/logo.png")]
#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

/*
 * RNX2RTCM is part of the Geo-Rust framework.
 * Authors: Guillaume W. Bres <guillaume.bressaix@gmail.com> et al.
 * (cf. https://github.com/georust/rinex/graphs/contributors)
 * This framework is shipped under Mozilla Public V2 license.
 *
 * Documentation: https://github.com/georust/rinex
 */

extern crate gnss_rs as gnss;

#[macro_use]
extern crate lazy_static;

pub mod codec;
pub mod config;
pub mod epoch;
pub mod message;
pub mod observation;
pub mod output;
pub mod pacer;
pub mod page;
pub mod reader;
pub mod sequencer;
pub mod session;
pub mod signal;
pub mod station;

mod constants;
mod error;

#[cfg(test)]
mod tests;

pub use constants::{Framing, Pacing, TagLayout};
pub use error::{Error, ParsingError};

/// Package to include all basic structures
pub mod prelude {
    // export
    pub use crate::{
        codec::{rtcm3::Rtcm3Codec, CodecError, MessageCodec},
        config::{Config, Mode},
        epoch::EpochGrouper,
        error::{Error, ParsingError},
        message::{Category, MessageType},
        observation::{Code, LliFlags, Observation, Signal},
        output::{Multiplexer, Primary, TagIndex, Transport},
        reader::{ObservationSet, ReadOptions},
        session::{Report, Session},
        station::Station,
    };

    // pub re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
}
