//! Control-bus access
//!
//! The bus itself (I2C or SPI wiring, transaction framing) is an external
//! collaborator: this module only defines the seam the codec drivers talk
//! through, plus a register-level binding that folds in the device address,
//! the per-transaction timeout and bitfield read-modify-writes.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use soundterminal_protocol::regs::BitField;
use thiserror::Error;

use crate::error::{Error, Result};

/// Errors surfaced by a bus implementation, passed through verbatim
#[derive(Error, Debug)]
pub enum BusError {
    #[error("the device did not acknowledge the transfer")]
    Nack,

    #[error("arbitration lost on the control bus")]
    ArbitrationLost,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Physical bus variant a device instance is wired to
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BusKind {
    I2c,
    Spi,
}

/// Raw byte access to device registers.
///
/// Each call is a single bus transaction addressed by a 7-bit device address
/// and an 8-bit register address. No retries happen at this layer; retry
/// policy, if any, belongs to the caller.
#[async_trait]
pub trait ControlBus: Send + Sync {
    async fn read(&self, address: u8, reg: u8, len: usize) -> Result<Vec<u8>, BusError>;
    async fn write(&self, address: u8, reg: u8, data: &[u8]) -> Result<(), BusError>;
}

/// Register accessor bound to one device instance.
///
/// Every transaction is bounded by the configured timeout; a stalled bus
/// surfaces as [`Error::Timeout`] instead of blocking the caller forever.
pub struct Registers {
    bus: Arc<dyn ControlBus>,
    address: u8,
    timeout: Duration,
}

impl Registers {
    pub fn new(bus: Arc<dyn ControlBus>, address: u8, timeout: Duration) -> Self {
        Self {
            bus,
            address,
            timeout,
        }
    }

    pub async fn read_reg(&self, reg: u8) -> Result<u8> {
        let data = tokio::time::timeout(self.timeout, self.bus.read(self.address, reg, 1))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(|source| Error::BusFault {
                register: reg,
                source,
            })?;

        data.first()
            .copied()
            .ok_or(Error::ShortTransfer { register: reg })
    }

    pub async fn write_reg(&self, reg: u8, value: u8) -> Result<()> {
        tokio::time::timeout(self.timeout, self.bus.write(self.address, reg, &[value]))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(|source| Error::BusFault {
                register: reg,
                source,
            })
    }

    /// Read-modify-write of one bitfield, leaving the other bits untouched
    pub async fn update_reg(&self, field: BitField, value: u8) -> Result<u8> {
        let current = self.read_reg(field.reg).await?;
        let next = field.apply(current, value);
        self.write_reg(field.reg, next).await?;
        Ok(next)
    }
}
