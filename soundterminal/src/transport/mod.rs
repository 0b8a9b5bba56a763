//! PCM data-plane transports
//!
//! The control plane (register writes over [`crate::bus::ControlBus`]) and
//! the data plane are deliberately separate: a transport moves sample
//! buffers toward the codec and reports progress through a broadcast
//! channel, while the codec driver only ever touches registers.

use async_trait::async_trait;
use bytes::Bytes;
use soundterminal_protocol::ClockSettings;
use thiserror::Error;
use tokio::sync::broadcast;

#[cfg(feature = "mock")]
pub mod mock;

/// Largest single transfer a transport accepts, in frames. Callers are
/// expected to clamp before calling [`PcmTransport::start`].
pub const MAX_TRANSFER_LEN: usize = 0xFFFF;

/// Progress notifications emitted while a transfer runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEvent {
    /// The buffer has been fully consumed and the transport wrapped around
    Complete,
    /// The first half of the buffer has been consumed
    HalfComplete,
    /// The transfer aborted; the stream is stopped
    Error,
}

#[derive(Error, Debug)]
pub enum TransportError {
    /// The requested state change does not apply to the current stream state
    #[error("no transfer is active")]
    NotActive,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A circular PCM transfer engine
#[async_trait]
pub trait PcmTransport: Send + Sync {
    /// Applies new clock settings. Only valid while no transfer is active.
    async fn reconfigure(&self, clock: ClockSettings) -> Result<(), TransportError>;

    /// Begins a circular transfer over `data`
    async fn start(&self, data: Bytes) -> Result<(), TransportError>;

    /// Suspends the running transfer, keeping its position
    async fn pause(&self) -> Result<(), TransportError>;

    /// Resumes a previously paused transfer from where it stopped
    async fn resume(&self) -> Result<(), TransportError>;

    /// Stops any transfer and discards its position
    async fn stop(&self) -> Result<(), TransportError>;

    /// Subscribes to transfer progress events
    fn subscribe(&self) -> broadcast::Receiver<TransferEvent>;
}
