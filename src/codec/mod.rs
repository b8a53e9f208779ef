//! Message codec interface
use thiserror::Error;

use crate::{message::MessageType, page::Page, prelude::Epoch};

pub mod rtcm3;

/// Reasons for a codec to decline one message.
/// None of these is fatal to a session: the message is simply not transmitted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("message type {0} is not supported")]
    UnsupportedMessage(MessageType),
    #[error("payload exceeds the frame capacity")]
    PayloadTooLarge,
    #[error("too many signal cells: {0}")]
    TooManyCells(usize),
    #[error("epoch is not defined")]
    NoEpoch,
    #[error("invalid station information")]
    InvalidStationInfo,
    #[error("rtcm encoding error: {0}")]
    Encoding(String),
}

/// [MessageCodec] translates one logical message into its binary encoding.
/// The framing core never inspects the returned bytes.
pub trait MessageCodec {
    /// Called once per epoch, before any message of this epoch is encoded.
    fn begin_epoch(&mut self, _epoch: Epoch) {}

    /// Encodes one message of given type, from given [Page] of records.
    /// `sync` is true when more messages follow for the same epoch.
    fn encode(
        &mut self,
        message: MessageType,
        page: &Page<'_>,
        sync: bool,
    ) -> Result<Vec<u8>, CodecError>;
}

impl<C: MessageCodec + ?Sized> MessageCodec for Box<C> {
    fn begin_epoch(&mut self, epoch: Epoch) {
        (**self).begin_epoch(epoch)
    }
    fn encode(
        &mut self,
        message: MessageType,
        page: &Page<'_>,
        sync: bool,
    ) -> Result<Vec<u8>, CodecError> {
        (**self).encode(message, page, sync)
    }
}
