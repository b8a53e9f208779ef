//! Signal set analysis of one (epoch, constellation) pair
use itertools::Itertools;

use crate::{
    constants::Framing,
    observation::{Code, Observation},
    prelude::Constellation,
};

/// Presence mask of signal [Code]s, one slot per known code.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalMask([bool; Framing::MAX_CODE]);

impl Default for SignalMask {
    fn default() -> Self {
        Self([false; Framing::MAX_CODE])
    }
}

impl SignalMask {
    /// Marks this [Code] as present, returns true on first occurrence.
    /// [Code::NONE] is never inserted.
    pub fn insert(&mut self, code: Code) -> bool {
        if code.is_none() {
            return false;
        }
        let slot = &mut self.0[code.index() as usize - 1];
        let first = !*slot;
        *slot = true;
        first
    }

    pub fn contains(&self, code: Code) -> bool {
        !code.is_none() && self.0[code.index() as usize - 1]
    }

    /// Present [Code]s, in increasing order
    pub fn codes(&self) -> impl Iterator<Item = Code> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, present)| **present)
            .filter_map(|(i, _)| Code::from_index(i as u8 + 1))
    }
}

/// [SignalSet] describes the satellites and signals of one
/// [Constellation] observed during one epoch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalSet {
    /// Number of distinct satellites
    pub satellites: usize,
    /// Number of distinct signal codes
    pub signals: usize,
    /// Signal presence
    pub mask: SignalMask,
}

impl SignalSet {
    /// Analyzes one epoch worth of [Observation]s for the targeted [Constellation].
    /// A code is counted once, even when tracked by several satellites or
    /// several frequency slots.
    pub fn analyze(epoch: &[Observation], constellation: Constellation) -> Self {
        let mut mask = SignalMask::default();
        let mut signals = 0;

        let records = epoch
            .iter()
            .filter(|obs| obs.is_constellation(constellation));

        let satellites = records.clone().map(|obs| obs.sv).unique().count();

        for obs in records {
            for signal in obs.signals.iter() {
                if mask.insert(signal.code) {
                    signals += 1;
                }
            }
        }

        Self {
            satellites,
            signals,
            mask,
        }
    }

    /// Returns true if this set does not fit in a single message
    /// signal mask, in which case the constellation is not transmitted.
    pub fn overflows(&self) -> bool {
        self.signals > Framing::SIGNAL_CAPACITY
    }
}
