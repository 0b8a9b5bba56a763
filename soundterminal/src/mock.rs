//! Control-bus mock backed by an in-memory register file
//!
//! Records every transaction so tests can assert the exact bus traffic a
//! driver operation produces.

use std::sync::Mutex;

use async_trait::async_trait;
use soundterminal_protocol::regs;

use crate::bus::{BusError, ControlBus};

/// One recorded bus transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    Read(u8),
    Write(u8, u8),
}

struct MockBusState {
    registers: [u8; 256],
    log: Vec<BusOp>,
    /// Register address that fails every access with a NACK
    fail_on: Option<u8>,
}

pub struct MockBus {
    state: Mutex<MockBusState>,
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBus {
    /// A bus whose device reports a locked PLL and no faults
    pub fn new() -> Self {
        let mut registers = [0u8; 256];
        registers[regs::STATUS as usize] = regs::STATUS_GOOD;
        MockBus {
            state: Mutex::new(MockBusState {
                registers,
                log: Vec::new(),
                fail_on: None,
            }),
        }
    }

    /// A bus whose status register reads back the given value
    pub fn with_status(status: u8) -> Self {
        let bus = Self::new();
        bus.set_register(regs::STATUS, status);
        bus
    }

    pub fn set_register(&self, reg: u8, value: u8) {
        self.lock().registers[reg as usize] = value;
    }

    pub fn register(&self, reg: u8) -> u8 {
        self.lock().registers[reg as usize]
    }

    /// Makes every access to `reg` fail with a NACK
    pub fn fail_on(&self, reg: u8) {
        self.lock().fail_on = Some(reg);
    }

    /// Drains and returns the transaction log
    pub fn take_log(&self) -> Vec<BusOp> {
        std::mem::take(&mut self.lock().log)
    }

    /// Writes from the log, in order, reads skipped
    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.lock()
            .log
            .iter()
            .filter_map(|op| match op {
                BusOp::Write(reg, value) => Some((*reg, *value)),
                BusOp::Read(_) => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockBusState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl ControlBus for MockBus {
    async fn read(&self, _address: u8, reg: u8, len: usize) -> Result<Vec<u8>, BusError> {
        let mut state = self.lock();
        if state.fail_on == Some(reg) {
            return Err(BusError::Nack);
        }
        let start = reg as usize;
        let data = state
            .registers
            .get(start..start + len)
            .ok_or_else(|| {
                BusError::Other(anyhow::anyhow!(
                    "read of {} bytes runs past register {:#04x}",
                    len,
                    reg
                ))
            })?
            .to_vec();
        state.log.push(BusOp::Read(reg));
        Ok(data)
    }

    async fn write(&self, _address: u8, reg: u8, data: &[u8]) -> Result<(), BusError> {
        let mut state = self.lock();
        if state.fail_on == Some(reg) {
            return Err(BusError::Nack);
        }
        for (i, byte) in data.iter().enumerate() {
            let target = reg as usize + i;
            state.registers[target] = *byte;
            state.log.push(BusOp::Write(target as u8, *byte));
        }
        Ok(())
    }
}
