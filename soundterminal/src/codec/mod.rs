//! Codec capability dispatch
//!
//! A codec model implements the fixed capability set below; orchestration
//! code is written only against the [`Codec`] trait and holds an
//! `Arc<dyn Codec>`, never a concrete model. Adding support for another
//! sound terminal variant means adding a module here and an arm in
//! [`by_model`].

use std::sync::Arc;

use async_trait::async_trait;
use soundterminal_protocol::{BiquadCoefficients, Channel, DspOption, RamBank, Switch};

use crate::{device::DeviceContext, error::Result};

pub mod sta350bw;

/// Supported codec models
#[derive(Clone, Copy, PartialEq, Eq, Debug, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum CodecModel {
    Sta350bw,
}

/// The capability set every codec model provides.
///
/// Operations that are register-level no-ops for a given model still appear
/// here so the orchestrator can sequence them uniformly.
#[async_trait]
pub trait Codec: Send + Sync {
    /// Brings the device to a configured, unmuted state
    async fn init(&self, ctx: &DeviceContext, volume: u8, rate: u32) -> Result<()>;
    /// Control-plane teardown; context destruction belongs to the orchestrator
    async fn deinit(&self, ctx: &DeviceContext) -> Result<()>;
    async fn read_id(&self, ctx: &DeviceContext) -> Result<()>;
    async fn play(&self, ctx: &DeviceContext) -> Result<()>;
    async fn pause(&self, ctx: &DeviceContext) -> Result<()>;
    async fn resume(&self, ctx: &DeviceContext) -> Result<()>;
    async fn stop(&self, ctx: &DeviceContext) -> Result<()>;
    async fn power_on(&self, ctx: &DeviceContext) -> Result<()>;
    async fn power_off(&self, ctx: &DeviceContext) -> Result<()>;
    async fn reset(&self, ctx: &DeviceContext) -> Result<()>;
    async fn set_eq(
        &self,
        ctx: &DeviceContext,
        bank: RamBank,
        filter: u8,
        coefficients: &BiquadCoefficients,
    ) -> Result<()>;
    async fn set_tone(&self, ctx: &DeviceContext, gain: u8) -> Result<()>;
    async fn set_mute(&self, ctx: &DeviceContext, channel: Channel, state: Switch) -> Result<()>;
    async fn set_volume(&self, ctx: &DeviceContext, channel: Channel, value: u8) -> Result<()>;
    async fn set_frequency(&self, ctx: &DeviceContext, rate: u32) -> Result<()>;
    async fn set_dsp_option(&self, ctx: &DeviceContext, option: DspOption, state: u8)
        -> Result<()>;
}

/// Selects the capability implementation for a model
pub fn by_model(model: CodecModel) -> Arc<dyn Codec> {
    match model {
        CodecModel::Sta350bw => Arc::new(sta350bw::Sta350bw),
    }
}
