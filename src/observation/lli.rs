//! Loss of Lock Indication (LLI) for phase tracking
use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Debug, Default, Copy, Clone)]
    #[derive(PartialEq, Eq, PartialOrd)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct LliFlags: u8 {
        /// Current epoch is marked Ok or Unknown status
        const OK_OR_UNKNOWN = 0x00;
        /// Lock lost between previous observation and current observation,
        /// cycle slip is possible
        const LOCK_LOSS = 0x01;
        /// Half cycle ambiguity, phase tracking is not settled yet
        const HALF_CYCLE_SLIP = 0x02;
        /// Observing under anti spoofing,
        /// might suffer from decreased SNR - decreased signal quality
        const UNDER_ANTI_SPOOFING = 0x04;
    }
}

impl LliFlags {
    /// Returns true if phase tracking was interrupted.
    pub fn lock_loss(&self) -> bool {
        self.contains(Self::LOCK_LOSS)
    }
    /// Returns true if the half cycle ambiguity is not resolved.
    pub fn half_cycle(&self) -> bool {
        self.contains(Self::HALF_CYCLE_SLIP)
    }
}
