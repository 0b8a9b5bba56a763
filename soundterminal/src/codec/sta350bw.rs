//! STA350BW codec driver
//!
//! The device streams PCM by itself once its clocks are valid, so `play`,
//! `stop`, `reset` and `read_id` are register-level no-ops. Pausing is
//! implemented by muting the master channel; the data-plane transfer keeps
//! running and must be paused separately by the orchestrator.

use async_trait::async_trait;
use soundterminal_protocol::{
    clock, regs, BiquadCoefficients, Channel, DspOption, RamBank, Switch,
};

use super::Codec;
use crate::{
    device::DeviceContext,
    error::{Error, InitStep, Result},
};

pub struct Sta350bw;

#[async_trait]
impl Codec for Sta350bw {
    /// Multi-step and not transactional: a failure partway through leaves
    /// the device in whatever state the completed prefix produced, and the
    /// returned error names the sub-step that failed.
    async fn init(&self, ctx: &DeviceContext, volume: u8, rate: u32) -> Result<()> {
        self.set_frequency(ctx, rate)
            .await
            .map_err(|e| Error::init(InitStep::SetClock, e))?;

        let status = ctx
            .registers()
            .read_reg(regs::STATUS)
            .await
            .map_err(|e| Error::init(InitStep::StatusCheck, e))?;
        if status != regs::STATUS_GOOD {
            // PLL not locked, clocks invalid or a fault bit set
            return Err(Error::DeviceNotReady {
                status,
                expected: regs::STATUS_GOOD,
            });
        }

        self.set_volume(ctx, Channel::Master, volume)
            .await
            .map_err(|e| Error::init(InitStep::SetVolume, e))?;

        ctx.registers()
            .update_reg(regs::OUTPUT_ENABLE, 1)
            .await
            .map_err(|e| Error::init(InitStep::OutputStage, e))?;

        Ok(())
    }

    async fn deinit(&self, ctx: &DeviceContext) -> Result<()> {
        self.power_off(ctx).await
    }

    async fn read_id(&self, _ctx: &DeviceContext) -> Result<()> {
        Ok(())
    }

    async fn play(&self, _ctx: &DeviceContext) -> Result<()> {
        Ok(())
    }

    async fn pause(&self, ctx: &DeviceContext) -> Result<()> {
        self.set_mute(ctx, Channel::Master, Switch::Enable).await
    }

    async fn resume(&self, ctx: &DeviceContext) -> Result<()> {
        self.set_mute(ctx, Channel::Master, Switch::Disable).await
    }

    async fn stop(&self, _ctx: &DeviceContext) -> Result<()> {
        Ok(())
    }

    async fn power_on(&self, ctx: &DeviceContext) -> Result<()> {
        ctx.registers().update_reg(regs::OUTPUT_STAGE, 0x03).await?;
        Ok(())
    }

    async fn power_off(&self, ctx: &DeviceContext) -> Result<()> {
        ctx.registers().update_reg(regs::OUTPUT_STAGE, 0x00).await?;
        Ok(())
    }

    async fn reset(&self, _ctx: &DeviceContext) -> Result<()> {
        Ok(())
    }

    async fn set_eq(
        &self,
        ctx: &DeviceContext,
        bank: RamBank,
        filter: u8,
        coefficients: &BiquadCoefficients,
    ) -> Result<()> {
        let registers = ctx.registers();

        registers
            .update_reg(regs::EQ_BANK_SELECT, bank.bits())
            .await?;
        registers
            .update_reg(regs::COEFF_ADDRESS, BiquadCoefficients::ram_address(filter))
            .await?;

        for (reg, byte) in coefficients.register_writes() {
            registers.write_reg(reg, byte).await?;
        }

        // The strobe register is read but the value discarded: the commit is
        // always a literal write, matching captured bus traces.
        let _ = registers.read_reg(regs::CFUD).await?;
        registers.write_reg(regs::CFUD, regs::CFUD_WRITE_ALL).await
    }

    async fn set_tone(&self, ctx: &DeviceContext, gain: u8) -> Result<()> {
        ctx.registers().write_reg(regs::TONE, gain).await
    }

    async fn set_mute(&self, ctx: &DeviceContext, channel: Channel, state: Switch) -> Result<()> {
        let registers = ctx.registers();
        let current = registers.read_reg(regs::MUTE).await?;
        let next = if state.is_on() {
            current | channel.mute_mask()
        } else {
            current & !channel.mute_mask()
        };
        registers.write_reg(regs::MUTE, next).await
    }

    async fn set_volume(&self, ctx: &DeviceContext, channel: Channel, value: u8) -> Result<()> {
        ctx.registers()
            .write_reg(regs::MVOL + channel.volume_offset(), value)
            .await
    }

    async fn set_frequency(&self, ctx: &DeviceContext, rate: u32) -> Result<()> {
        // Reject unknown rates before touching the device
        let select = clock::mclk_select(rate)?;
        ctx.registers()
            .update_reg(regs::CLOCK_SELECT, select)
            .await?;
        Ok(())
    }

    async fn set_dsp_option(
        &self,
        ctx: &DeviceContext,
        option: DspOption,
        state: u8,
    ) -> Result<()> {
        ctx.registers()
            .update_reg(option.field(), option.encode_state(state))
            .await?;
        Ok(())
    }
}
