//! Observation records, as handed over by the reader to the framing core
mod code;
mod lli;

pub use code::{Code, CodeError};
pub use lli::LliFlags;

use crate::prelude::{Constellation, Epoch, SV};

/// [Signal] groups all measurements made on one tracked signal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signal {
    /// Signal [Code]
    pub code: Code,
    /// Pseudo range [m]
    pub pseudorange: Option<f64>,
    /// Carrier phase [cycles]
    pub phase: Option<f64>,
    /// Doppler shift [Hz]
    pub doppler: Option<f64>,
    /// Carrier to noise density ratio [dB-Hz]
    pub snr: Option<f64>,
    /// Loss of lock indications
    pub lli: LliFlags,
}

impl Signal {
    pub fn new(code: Code) -> Self {
        Self {
            code,
            ..Default::default()
        }
    }
    /// Copies and returns [Signal] with pseudo range [m]
    pub fn with_pseudorange(&self, pr: f64) -> Self {
        let mut s = self.clone();
        s.pseudorange = Some(pr);
        s
    }
    /// Copies and returns [Signal] with carrier phase [cycles]
    pub fn with_phase(&self, cycles: f64) -> Self {
        let mut s = self.clone();
        s.phase = Some(cycles);
        s
    }
    /// Copies and returns [Signal] with doppler [Hz]
    pub fn with_doppler(&self, hz: f64) -> Self {
        let mut s = self.clone();
        s.doppler = Some(hz);
        s
    }
    /// Copies and returns [Signal] with SNR [dB-Hz]
    pub fn with_snr(&self, snr: f64) -> Self {
        let mut s = self.clone();
        s.snr = Some(snr);
        s
    }
    /// Copies and returns [Signal] with [LliFlags]
    pub fn with_lli(&self, lli: LliFlags) -> Self {
        let mut s = self.clone();
        s.lli = lli;
        s
    }
}

/// [Observation] gathers all signals of one satellite at one epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Sampling instant
    pub epoch: Epoch,
    /// Observed satellite
    pub sv: SV,
    /// Tracked signals (frequency slots)
    pub signals: Vec<Signal>,
}

impl Observation {
    pub fn new(epoch: Epoch, sv: SV) -> Self {
        Self {
            epoch,
            sv,
            signals: Vec::with_capacity(4),
        }
    }

    /// Copies and returns [Observation] with one more [Signal]
    pub fn with_signal(&self, signal: Signal) -> Self {
        let mut s = self.clone();
        s.signals.push(signal);
        s
    }

    /// [Constellation] this record belongs to
    pub fn constellation(&self) -> Constellation {
        self.sv.constellation
    }

    /// Returns true if this record belongs to the targeted [Constellation].
    /// All augmentation systems match [Constellation::SBAS].
    pub fn is_constellation(&self, target: Constellation) -> bool {
        same_system(self.sv.constellation, target)
    }

    /// Returns the [Signal] tracked with given [Code], if any.
    pub fn signal(&self, code: Code) -> Option<&Signal> {
        self.signals.iter().find(|s| s.code == code)
    }
}

/// Compares two [Constellation]s, merging all augmentation systems together.
pub(crate) fn same_system(a: Constellation, b: Constellation) -> bool {
    if a.is_sbas() && b.is_sbas() {
        true
    } else {
        a == b
    }
}
