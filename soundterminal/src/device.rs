//! Output orchestration
//!
//! [`SoundTerminal`] owns a fixed set of output slots, one per physical
//! device instance, and sequences every operation across the control plane
//! (codec registers) and the data plane (PCM transport). Mixed-plane
//! operations always touch the codec first so that a register fault leaves
//! the transport untouched.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use bytes::Bytes;
use tokio::sync::{broadcast, Mutex};
use tokio_stream::wrappers::BroadcastStream;

use soundterminal_protocol::{
    BiquadCoefficients, Channel, ClockSettings, DspOption, RamBank, Switch,
};

use crate::{
    bus::{BusKind, ControlBus, Registers},
    codec::{self, Codec, CodecModel},
    error::{Error, Result},
    transport::{PcmTransport, TransferEvent, MAX_TRANSFER_LEN},
};

/// Number of device instances the orchestrator can drive at once
pub const DEVICE_SLOTS: usize = 2;

/// Default per-transaction control bus timeout
pub const DEFAULT_BUS_TIMEOUT: Duration = Duration::from_secs(1);

/// Silence sent through the transport during init so the device sees valid
/// serial clocks before its registers are programmed
const PRIMING_FRAMES: [u8; 32] = [0; 32];

/// Everything a codec driver needs to reach one device instance
pub struct DeviceContext {
    pub instance: usize,
    pub address: u8,
    pub bus_kind: BusKind,
    bus: Arc<dyn ControlBus>,
    timeout: Duration,
    initialized: AtomicBool,
    enabled: AtomicBool,
}

impl DeviceContext {
    pub fn new(
        instance: usize,
        address: u8,
        bus_kind: BusKind,
        bus: Arc<dyn ControlBus>,
        timeout: Duration,
    ) -> Self {
        DeviceContext {
            instance,
            address,
            bus_kind,
            bus,
            timeout,
            initialized: AtomicBool::new(false),
            enabled: AtomicBool::new(false),
        }
    }

    pub fn registers(&self) -> Registers {
        Registers::new(self.bus.clone(), self.address, self.timeout)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub(crate) fn set_initialized(&self, value: bool) {
        self.initialized.store(value, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub(crate) fn set_enabled(&self, value: bool) {
        self.enabled.store(value, Ordering::Release);
    }
}

/// Initial settings for one output
#[derive(Clone, Copy, Debug)]
pub struct OutputConfig {
    /// 7-bit control bus device address
    pub address: u8,
    pub bus_kind: BusKind,
    /// Initial master volume, register encoding
    pub volume: u8,
    /// Initial sample rate in Hz
    pub rate: u32,
    pub timeout: Duration,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            address: 0x1C,
            bus_kind: BusKind::I2c,
            volume: 0x20,
            rate: 48_000,
            timeout: DEFAULT_BUS_TIMEOUT,
        }
    }
}

/// Data-plane stream state tracked per output
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StreamState {
    Stopped,
    Playing,
    Paused,
}

/// Snapshot of one output's state
#[derive(Clone, Copy, Debug)]
pub struct OutputStatus {
    pub initialized: bool,
    pub enabled: bool,
    pub stream: StreamState,
    pub rate: u32,
}

/// Maps a sample rate to the transport clock settings for this board
pub type ClockStrategy = Arc<dyn Fn(u32) -> ClockSettings + Send + Sync>;

struct Output {
    context: Arc<DeviceContext>,
    codec: Arc<dyn Codec>,
    transport: Arc<dyn PcmTransport>,
    stream: StreamState,
    rate: u32,
}

pub struct SoundTerminal {
    slots: [Mutex<Option<Output>>; DEVICE_SLOTS],
    clock_strategy: ClockStrategy,
}

impl Default for SoundTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundTerminal {
    pub fn new() -> Self {
        Self::with_clock_strategy(Arc::new(ClockSettings::for_rate))
    }

    /// Overrides how sample rates map to transport clocks, for boards whose
    /// clock tree differs from the default
    pub fn with_clock_strategy(clock_strategy: ClockStrategy) -> Self {
        SoundTerminal {
            slots: std::array::from_fn(|_| Mutex::new(None)),
            clock_strategy,
        }
    }

    fn slot(&self, instance: usize) -> Result<&Mutex<Option<Output>>> {
        self.slots.get(instance).ok_or(Error::NoSuchSlot(instance))
    }

    /// Brings up one output: transport clocks first, then a short silent
    /// priming transfer so the device sees valid serial clocks, then the
    /// codec init sequence. The slot is only claimed once all of it
    /// succeeded.
    pub async fn init(
        &self,
        model: CodecModel,
        instance: usize,
        bus: Arc<dyn ControlBus>,
        transport: Arc<dyn PcmTransport>,
        config: OutputConfig,
    ) -> Result<()> {
        let mut slot = self.slot(instance)?.lock().await;
        if slot.is_some() {
            return Err(Error::SlotInUse(instance));
        }

        let context = Arc::new(DeviceContext::new(
            instance,
            config.address,
            config.bus_kind,
            bus,
            config.timeout,
        ));
        let codec = codec::by_model(model);

        transport.reconfigure((self.clock_strategy)(config.rate)).await?;
        transport.start(Bytes::from_static(&PRIMING_FRAMES)).await?;

        if let Err(err) = codec.init(&context, config.volume, config.rate).await {
            // The init failure is the error worth reporting; a stop failure
            // during teardown only gets logged
            if let Err(stop_err) = transport.stop().await {
                log::warn!(
                    "instance {}: stopping the priming transfer failed: {}",
                    instance,
                    stop_err
                );
            }
            return Err(err);
        }
        transport.stop().await?;

        context.set_initialized(true);
        context.set_enabled(true);
        log::info!(
            "instance {} at {:#04x} initialized, rate {} Hz",
            instance,
            config.address,
            config.rate
        );

        *slot = Some(Output {
            context,
            codec,
            transport,
            stream: StreamState::Stopped,
            rate: config.rate,
        });
        Ok(())
    }

    /// Tears the output down and frees its slot for re-init
    pub async fn deinit(&self, instance: usize) -> Result<()> {
        let mut slot = self.slot(instance)?.lock().await;
        let output = slot.take().ok_or(Error::InvalidHandle)?;

        output.transport.stop().await?;
        output.codec.deinit(&output.context).await?;
        output.context.set_initialized(false);
        output.context.set_enabled(false);
        log::info!("instance {} deinitialized", instance);
        Ok(())
    }

    /// Starts circular playback of `data`. Buffers beyond the transport's
    /// maximum transfer length are truncated, not rejected.
    pub async fn play(&self, instance: usize, data: Bytes) -> Result<()> {
        let mut slot = self.slot(instance)?.lock().await;
        let output = slot.as_mut().ok_or(Error::InvalidHandle)?;

        let data = if data.len() > MAX_TRANSFER_LEN {
            log::warn!(
                "instance {}: buffer of {} bytes truncated to {}",
                instance,
                data.len(),
                MAX_TRANSFER_LEN
            );
            data.slice(..MAX_TRANSFER_LEN)
        } else {
            data
        };

        output.codec.play(&output.context).await?;
        output.transport.start(data).await?;
        output.stream = StreamState::Playing;
        Ok(())
    }

    /// Pauses playback, muting the output and freezing the transfer in
    /// place. Only valid while playing.
    pub async fn pause(&self, instance: usize) -> Result<()> {
        let mut slot = self.slot(instance)?.lock().await;
        let output = slot.as_mut().ok_or(Error::InvalidHandle)?;

        if output.stream != StreamState::Playing {
            return Err(Error::NotPlaying);
        }
        output.codec.pause(&output.context).await?;
        output.transport.pause().await?;
        output.stream = StreamState::Paused;
        Ok(())
    }

    /// Resumes a paused transfer from where it stopped
    pub async fn resume(&self, instance: usize) -> Result<()> {
        let mut slot = self.slot(instance)?.lock().await;
        let output = slot.as_mut().ok_or(Error::InvalidHandle)?;

        if output.stream != StreamState::Paused {
            return Err(Error::NotPaused);
        }
        output.codec.resume(&output.context).await?;
        output.transport.resume().await?;
        output.stream = StreamState::Playing;
        Ok(())
    }

    /// Stops playback from any stream state
    pub async fn stop(&self, instance: usize) -> Result<()> {
        let mut slot = self.slot(instance)?.lock().await;
        let output = slot.as_mut().ok_or(Error::InvalidHandle)?;

        output.codec.stop(&output.context).await?;
        output.transport.stop().await?;
        output.stream = StreamState::Stopped;
        Ok(())
    }

    /// Changes the sample rate on both planes. Only valid while the stream
    /// is stopped: the codec clock ratio and the transport clocks must
    /// change together, and the transport cannot reconfigure mid-transfer.
    /// The codec is reprogrammed first, so an unsupported rate fails there
    /// and leaves the transport clocks untouched.
    pub async fn set_frequency(&self, instance: usize, rate: u32) -> Result<()> {
        let mut slot = self.slot(instance)?.lock().await;
        let output = slot.as_mut().ok_or(Error::InvalidHandle)?;

        if output.stream != StreamState::Stopped {
            return Err(Error::StreamActive);
        }

        output.codec.set_frequency(&output.context, rate).await?;
        output
            .transport
            .reconfigure((self.clock_strategy)(rate))
            .await?;
        output.rate = rate;
        Ok(())
    }

    pub async fn set_volume(&self, instance: usize, channel: Channel, value: u8) -> Result<()> {
        let slot = self.slot(instance)?.lock().await;
        let output = slot.as_ref().ok_or(Error::InvalidHandle)?;
        output.codec.set_volume(&output.context, channel, value).await
    }

    pub async fn set_mute(&self, instance: usize, channel: Channel, state: Switch) -> Result<()> {
        let slot = self.slot(instance)?.lock().await;
        let output = slot.as_ref().ok_or(Error::InvalidHandle)?;
        output.codec.set_mute(&output.context, channel, state).await
    }

    pub async fn set_tone(&self, instance: usize, gain: u8) -> Result<()> {
        let slot = self.slot(instance)?.lock().await;
        let output = slot.as_ref().ok_or(Error::InvalidHandle)?;
        output.codec.set_tone(&output.context, gain).await
    }

    /// Loads one biquad's coefficients into the selected RAM bank
    pub async fn set_eq(
        &self,
        instance: usize,
        bank: RamBank,
        filter: u8,
        coefficients: &BiquadCoefficients,
    ) -> Result<()> {
        let slot = self.slot(instance)?.lock().await;
        let output = slot.as_ref().ok_or(Error::InvalidHandle)?;
        output
            .codec
            .set_eq(&output.context, bank, filter, coefficients)
            .await
    }

    pub async fn set_dsp_option(
        &self,
        instance: usize,
        option: DspOption,
        state: u8,
    ) -> Result<()> {
        let slot = self.slot(instance)?.lock().await;
        let output = slot.as_ref().ok_or(Error::InvalidHandle)?;
        output
            .codec
            .set_dsp_option(&output.context, option, state)
            .await
    }

    pub async fn power_on(&self, instance: usize) -> Result<()> {
        let slot = self.slot(instance)?.lock().await;
        let output = slot.as_ref().ok_or(Error::InvalidHandle)?;
        output.codec.power_on(&output.context).await?;
        output.context.set_enabled(true);
        Ok(())
    }

    pub async fn power_off(&self, instance: usize) -> Result<()> {
        let slot = self.slot(instance)?.lock().await;
        let output = slot.as_ref().ok_or(Error::InvalidHandle)?;
        output.codec.power_off(&output.context).await?;
        output.context.set_enabled(false);
        Ok(())
    }

    pub async fn read_id(&self, instance: usize) -> Result<()> {
        let slot = self.slot(instance)?.lock().await;
        let output = slot.as_ref().ok_or(Error::InvalidHandle)?;
        output.codec.read_id(&output.context).await
    }

    pub async fn reset(&self, instance: usize) -> Result<()> {
        let slot = self.slot(instance)?.lock().await;
        let output = slot.as_ref().ok_or(Error::InvalidHandle)?;
        output.codec.reset(&output.context).await
    }

    /// Stream of transfer progress events from the output's transport
    pub async fn subscribe(&self, instance: usize) -> Result<BroadcastStream<TransferEvent>> {
        let slot = self.slot(instance)?.lock().await;
        let output = slot.as_ref().ok_or(Error::InvalidHandle)?;
        Ok(BroadcastStream::new(output.transport.subscribe()))
    }

    /// Raw broadcast receiver, when the stream wrapper is not wanted
    pub async fn subscribe_raw(
        &self,
        instance: usize,
    ) -> Result<broadcast::Receiver<TransferEvent>> {
        let slot = self.slot(instance)?.lock().await;
        let output = slot.as_ref().ok_or(Error::InvalidHandle)?;
        Ok(output.transport.subscribe())
    }

    pub async fn status(&self, instance: usize) -> Result<OutputStatus> {
        let slot = self.slot(instance)?.lock().await;
        let output = slot.as_ref().ok_or(Error::InvalidHandle)?;
        Ok(OutputStatus {
            initialized: output.context.is_initialized(),
            enabled: output.context.is_enabled(),
            stream: output.stream,
            rate: output.rate,
        })
    }
}
