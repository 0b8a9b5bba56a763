//! Error taxonomy for control-plane and data-plane operations

use thiserror::Error;

use crate::{bus::BusError, transport::TransportError};

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Sub-steps of the init sequence, reported on failure
#[derive(Clone, Copy, PartialEq, Eq, Debug, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum InitStep {
    SetClock,
    StatusCheck,
    SetVolume,
    OutputStage,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("control bus fault accessing register {register:#04x}: {source}")]
    BusFault {
        register: u8,
        #[source]
        source: BusError,
    },

    #[error("a control bus transaction timed out")]
    Timeout,

    #[error("the bus returned fewer bytes than requested for register {register:#04x}")]
    ShortTransfer { register: u8 },

    #[error(transparent)]
    UnsupportedRate(#[from] soundterminal_protocol::UnsupportedRate),

    #[error("invalid or uninitialized device handle")]
    InvalidHandle,

    #[error("device not ready: status register read {status:#04x}, expected {expected:#04x}")]
    DeviceNotReady { status: u8, expected: u8 },

    #[error("init failed during {step}: {source}")]
    Init {
        step: InitStep,
        #[source]
        source: Box<Error>,
    },

    #[error("device instance slot {0} is already in use")]
    SlotInUse(usize),

    #[error("no such device instance slot: {0}")]
    NoSuchSlot(usize),

    #[error("the stream is not playing")]
    NotPlaying,

    #[error("the stream is not paused")]
    NotPaused,

    #[error("the stream must be stopped first")]
    StreamActive,

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl Error {
    pub(crate) fn init(step: InitStep, source: Error) -> Self {
        Error::Init {
            step,
            source: Box::new(source),
        }
    }
}
