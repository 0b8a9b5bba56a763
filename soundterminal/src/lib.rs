//! Async control interface for Sound Terminal audio amplifiers.
//!
//! The crate splits device access into two planes. The control plane
//! programs codec registers through a [`bus::ControlBus`] implementation;
//! the data plane moves PCM through a [`transport::PcmTransport`]. The
//! [`SoundTerminal`] orchestrator owns a fixed set of output slots and
//! keeps both planes consistent across init, playback and reconfiguration.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use soundterminal::{
//!     codec::CodecModel, mock::MockBus, transport::mock::MockTransport, Channel, OutputConfig,
//!     SoundTerminal,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let bus = Arc::new(MockBus::new());
//!     let transport = Arc::new(MockTransport::new());
//!
//!     let terminal = SoundTerminal::new();
//!     terminal
//!         .init(CodecModel::Sta350bw, 0, bus, transport, OutputConfig::default())
//!         .await?;
//!     terminal.set_volume(0, Channel::Master, 0x28).await?;
//!     Ok(())
//! }
//! ```

pub mod bus;
pub mod codec;
pub mod device;
pub mod error;
#[cfg(feature = "mock")]
pub mod mock;
pub mod transport;

pub use bus::{BusKind, ControlBus};
pub use device::{
    DeviceContext, OutputConfig, OutputStatus, SoundTerminal, StreamState, DEVICE_SLOTS,
};
pub use error::{Error, Result};
pub use soundterminal_protocol::{
    BiquadCoefficients, Channel, ClockSettings, DspOption, RamBank, Switch,
};
pub use transport::{PcmTransport, TransferEvent, MAX_TRANSFER_LEN};
