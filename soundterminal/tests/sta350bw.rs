//! Drives the STA350BW driver against the mock bus and transport, asserting
//! the exact register traffic each operation produces.

use std::sync::Arc;

use bytes::Bytes;
use soundterminal::{
    codec::CodecModel,
    mock::{BusOp, MockBus},
    transport::{
        mock::{MockStream, MockTransport},
        TransportError,
    },
    BiquadCoefficients, Channel, DspOption, Error, OutputConfig, RamBank, SoundTerminal,
    StreamState, Switch, TransferEvent, MAX_TRANSFER_LEN,
};
use soundterminal_protocol::regs;

async fn setup() -> (SoundTerminal, Arc<MockBus>, Arc<MockTransport>) {
    let _ = env_logger::builder().is_test(true).try_init();

    let bus = Arc::new(MockBus::new());
    let transport = Arc::new(MockTransport::new());
    let terminal = SoundTerminal::new();
    terminal
        .init(
            CodecModel::Sta350bw,
            0,
            bus.clone(),
            transport.clone(),
            OutputConfig::default(),
        )
        .await
        .unwrap();
    bus.take_log();
    (terminal, bus, transport)
}

#[tokio::test]
async fn init_programs_the_device() {
    let (terminal, bus, transport) = setup().await;

    let status = terminal.status(0).await.unwrap();
    assert!(status.initialized);
    assert!(status.enabled);
    assert_eq!(status.stream, StreamState::Stopped);
    assert_eq!(status.rate, 48_000);

    // Clock ratio for the 48 kHz family, initial volume, output stage on
    assert_eq!(bus.register(regs::CONF_REGA) & 0x1F, 0x03);
    assert_eq!(bus.register(regs::MVOL), 0x20);
    assert_eq!(bus.register(regs::CONF_REGF) & 0x80, 0x80);

    // The priming transfer ran during init and was stopped again
    assert_eq!(transport.stream().await, MockStream::Idle);
    assert_eq!(transport.starts().await, 1);
    assert_eq!(transport.clock().await.unwrap().rate, 48_000);
}

#[tokio::test]
async fn init_preserves_reserved_configuration_bits() {
    let bus = Arc::new(MockBus::new());
    bus.set_register(regs::CONF_REGA, 0xE5);

    let terminal = SoundTerminal::new();
    terminal
        .init(
            CodecModel::Sta350bw,
            0,
            bus.clone(),
            Arc::new(MockTransport::new()),
            OutputConfig::default(),
        )
        .await
        .unwrap();

    assert_eq!(bus.register(regs::CONF_REGA), 0xE3);
}

#[tokio::test]
async fn init_fails_when_device_not_ready() {
    let bus = Arc::new(MockBus::with_status(0x00));
    let transport = Arc::new(MockTransport::new());
    let terminal = SoundTerminal::new();

    let err = terminal
        .init(
            CodecModel::Sta350bw,
            0,
            bus.clone(),
            transport.clone(),
            OutputConfig::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::DeviceNotReady {
            status: 0x00,
            expected: regs::STATUS_GOOD
        }
    ));

    // The slot stays free and can be initialized once the device recovers
    assert!(matches!(terminal.status(0).await, Err(Error::InvalidHandle)));
    bus.set_register(regs::STATUS, regs::STATUS_GOOD);
    terminal
        .init(
            CodecModel::Sta350bw,
            0,
            bus,
            transport,
            OutputConfig::default(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn init_twice_reports_slot_in_use() {
    let (terminal, bus, transport) = setup().await;

    let err = terminal
        .init(
            CodecModel::Sta350bw,
            0,
            bus,
            transport,
            OutputConfig::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SlotInUse(0)));
}

#[tokio::test]
async fn unknown_instance_is_rejected() {
    let terminal = SoundTerminal::new();
    assert!(matches!(
        terminal.status(5).await,
        Err(Error::NoSuchSlot(5))
    ));
}

#[tokio::test]
async fn set_frequency_switches_clock_family() {
    let (terminal, bus, transport) = setup().await;

    terminal.set_frequency(0, 96_000).await.unwrap();
    assert_eq!(bus.register(regs::CONF_REGA) & 0x1F, 0x0B);
    assert_eq!(transport.clock().await.unwrap().rate, 96_000);
    assert_eq!(terminal.status(0).await.unwrap().rate, 96_000);

    terminal.set_frequency(0, 44_100).await.unwrap();
    assert_eq!(bus.register(regs::CONF_REGA) & 0x1F, 0x03);
    assert_eq!(transport.clock().await.unwrap().rate, 44_100);
}

#[tokio::test]
async fn set_frequency_requires_a_stopped_stream() {
    let (terminal, bus, transport) = setup().await;

    terminal.play(0, Bytes::from(vec![0u8; 64])).await.unwrap();
    let err = terminal.set_frequency(0, 96_000).await.unwrap_err();
    assert!(matches!(err, Error::StreamActive));

    // Both planes keep the 48 kHz family they agreed on at init
    assert_eq!(bus.register(regs::CONF_REGA) & 0x1F, 0x03);
    assert_eq!(transport.clock().await.unwrap().rate, 48_000);

    // Paused still counts as an active transfer
    terminal.pause(0).await.unwrap();
    assert!(matches!(
        terminal.set_frequency(0, 96_000).await,
        Err(Error::StreamActive)
    ));

    terminal.stop(0).await.unwrap();
    terminal.set_frequency(0, 96_000).await.unwrap();
    assert_eq!(bus.register(regs::CONF_REGA) & 0x1F, 0x0B);
    assert_eq!(transport.clock().await.unwrap().rate, 96_000);
}

#[tokio::test]
async fn unsupported_rate_leaves_both_planes_untouched() {
    let (terminal, bus, transport) = setup().await;
    bus.take_log();

    let err = terminal.set_frequency(0, 22_050).await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedRate(_)));

    assert!(bus.take_log().is_empty());
    assert_eq!(transport.clock().await.unwrap().rate, 48_000);
    assert_eq!(terminal.status(0).await.unwrap().rate, 48_000);
}

#[tokio::test]
async fn volume_goes_to_the_channel_register() {
    let (terminal, bus, _) = setup().await;

    terminal.set_volume(0, Channel::Ch2, 0x33).await.unwrap();
    assert_eq!(bus.take_log(), vec![BusOp::Write(regs::C2VOL, 0x33)]);

    terminal.set_volume(0, Channel::Master, 0x10).await.unwrap();
    assert_eq!(bus.take_log(), vec![BusOp::Write(regs::MVOL, 0x10)]);
}

#[tokio::test]
async fn mute_bits_accumulate_per_channel() {
    let (terminal, bus, _) = setup().await;

    terminal.set_mute(0, Channel::Ch1, Switch::Enable).await.unwrap();
    assert_eq!(bus.register(regs::MUTE), 0x02);

    terminal
        .set_mute(0, Channel::Master, Switch::Enable)
        .await
        .unwrap();
    assert_eq!(bus.register(regs::MUTE), 0x03);

    terminal.set_mute(0, Channel::Ch1, Switch::Disable).await.unwrap();
    assert_eq!(bus.register(regs::MUTE), 0x01);
}

#[tokio::test]
async fn tone_is_a_plain_register_write() {
    let (terminal, bus, _) = setup().await;

    terminal.set_tone(0, 0x77).await.unwrap();
    assert_eq!(bus.take_log(), vec![BusOp::Write(regs::TONE, 0x77)]);
}

#[tokio::test]
async fn eq_load_produces_the_full_coefficient_sequence() {
    let (terminal, bus, _) = setup().await;
    bus.set_register(regs::EQCFG, 0xA8);

    let coeffs = BiquadCoefficients::from([
        0x0011_2233,
        0x0044_5566,
        0x0077_8899,
        0x00AA_BBCC,
        0x007F_FFFF,
    ]);
    terminal.set_eq(0, RamBank(1), 2, &coeffs).await.unwrap();

    let mut expected = vec![
        BusOp::Read(regs::EQCFG),
        BusOp::Write(regs::EQCFG, 0xA9),
        BusOp::Read(regs::CFADDR),
        BusOp::Write(regs::CFADDR, 0x0A),
    ];
    expected.extend(
        coeffs
            .register_writes()
            .iter()
            .map(|(reg, byte)| BusOp::Write(*reg, *byte)),
    );
    expected.push(BusOp::Read(regs::CFUD));
    expected.push(BusOp::Write(regs::CFUD, regs::CFUD_WRITE_ALL));

    assert_eq!(bus.take_log(), expected);
}

#[tokio::test]
async fn dsp_options_only_touch_their_field() {
    let (terminal, bus, _) = setup().await;

    for option in DspOption::ALL {
        let field = option.field();
        bus.set_register(field.reg, 0x55);
        bus.take_log();

        terminal.set_dsp_option(0, option, 1).await.unwrap();

        assert_eq!(
            bus.take_log(),
            vec![
                BusOp::Read(field.reg),
                BusOp::Write(field.reg, field.apply(0x55, option.encode_state(1))),
            ]
        );
    }
}

#[tokio::test]
async fn extended_range_state_is_preshifted() {
    let (terminal, bus, _) = setup().await;

    bus.set_register(regs::CXT_B4B1, 0x00);
    terminal
        .set_dsp_option(0, DspOption::ExtRangeBq1, 2)
        .await
        .unwrap();
    assert_eq!(bus.register(regs::CXT_B4B1), 0x01);
}

#[tokio::test]
async fn pause_mutes_and_freezes_the_transfer() {
    let (terminal, bus, transport) = setup().await;

    terminal.play(0, Bytes::from(vec![0u8; 1024])).await.unwrap();
    transport.advance(100).await;

    terminal.pause(0).await.unwrap();
    assert_eq!(transport.stream().await, MockStream::Paused);
    assert_eq!(transport.position().await, 100);
    assert_eq!(bus.register(regs::MUTE) & 0x01, 0x01);

    terminal.resume(0).await.unwrap();
    assert_eq!(transport.stream().await, MockStream::Running);
    assert_eq!(transport.position().await, 100);
    assert_eq!(bus.register(regs::MUTE) & 0x01, 0x00);
    // Resume continues the existing transfer, it does not restart it
    assert_eq!(transport.starts().await, 2);
}

#[tokio::test]
async fn pause_and_resume_guard_the_stream_state() {
    let (terminal, _, _) = setup().await;

    assert!(matches!(terminal.pause(0).await, Err(Error::NotPlaying)));
    assert!(matches!(terminal.resume(0).await, Err(Error::NotPaused)));

    terminal.play(0, Bytes::from(vec![0u8; 64])).await.unwrap();
    terminal.pause(0).await.unwrap();
    assert!(matches!(terminal.pause(0).await, Err(Error::NotPlaying)));
}

#[tokio::test]
async fn oversized_buffers_are_truncated() {
    let (terminal, _, transport) = setup().await;

    terminal
        .play(0, Bytes::from(vec![0u8; MAX_TRANSFER_LEN + 5]))
        .await
        .unwrap();
    assert_eq!(transport.buffer_len().await, MAX_TRANSFER_LEN);
}

#[tokio::test]
async fn stop_works_from_any_state() {
    let (terminal, _, transport) = setup().await;

    terminal.stop(0).await.unwrap();
    assert_eq!(transport.stream().await, MockStream::Idle);

    terminal.play(0, Bytes::from(vec![0u8; 64])).await.unwrap();
    terminal.pause(0).await.unwrap();
    terminal.stop(0).await.unwrap();
    assert_eq!(transport.stream().await, MockStream::Idle);
    assert_eq!(terminal.status(0).await.unwrap().stream, StreamState::Stopped);
}

#[tokio::test]
async fn power_cycle_toggles_the_output_stage() {
    let (terminal, bus, _) = setup().await;

    terminal.power_on(0).await.unwrap();
    assert_eq!(bus.register(regs::CONF_REGF) & 0xC0, 0xC0);
    assert!(terminal.status(0).await.unwrap().enabled);

    terminal.power_off(0).await.unwrap();
    assert_eq!(bus.register(regs::CONF_REGF) & 0xC0, 0x00);
    assert!(!terminal.status(0).await.unwrap().enabled);
}

#[tokio::test]
async fn deinit_frees_the_slot_for_reuse() {
    let (terminal, bus, transport) = setup().await;

    terminal.deinit(0).await.unwrap();
    assert_eq!(bus.register(regs::CONF_REGF) & 0xC0, 0x00);
    assert!(matches!(terminal.status(0).await, Err(Error::InvalidHandle)));

    terminal
        .init(
            CodecModel::Sta350bw,
            0,
            bus,
            transport,
            OutputConfig::default(),
        )
        .await
        .unwrap();
    assert!(terminal.status(0).await.unwrap().initialized);
}

#[tokio::test]
async fn bus_fault_carries_the_register_address() {
    let (terminal, bus, _) = setup().await;

    bus.fail_on(regs::TONE);
    let err = terminal.set_tone(0, 0x10).await.unwrap_err();
    assert!(matches!(
        err,
        Error::BusFault {
            register: regs::TONE,
            ..
        }
    ));
}

#[tokio::test]
async fn transfer_events_reach_subscribers() {
    let (terminal, _, transport) = setup().await;

    let mut events = terminal.subscribe_raw(0).await.unwrap();
    transport.raise(TransferEvent::HalfComplete);
    transport.raise(TransferEvent::Complete);

    assert_eq!(events.recv().await.unwrap(), TransferEvent::HalfComplete);
    assert_eq!(events.recv().await.unwrap(), TransferEvent::Complete);
}

#[tokio::test]
async fn transfer_events_arrive_as_a_stream() {
    use tokio_stream::StreamExt;

    let (terminal, _, transport) = setup().await;

    let mut events = terminal.subscribe(0).await.unwrap();
    transport.raise(TransferEvent::HalfComplete);
    transport.raise(TransferEvent::Complete);

    assert_eq!(
        events.next().await.unwrap().unwrap(),
        TransferEvent::HalfComplete
    );
    assert_eq!(
        events.next().await.unwrap().unwrap(),
        TransferEvent::Complete
    );
}

/// Transport double whose `stop` always fails, as a wedged DMA engine would
struct WedgedStopTransport {
    inner: MockTransport,
}

#[async_trait::async_trait]
impl soundterminal::PcmTransport for WedgedStopTransport {
    async fn reconfigure(
        &self,
        clock: soundterminal::ClockSettings,
    ) -> Result<(), TransportError> {
        self.inner.reconfigure(clock).await
    }

    async fn start(&self, data: Bytes) -> Result<(), TransportError> {
        self.inner.start(data).await
    }

    async fn pause(&self) -> Result<(), TransportError> {
        self.inner.pause().await
    }

    async fn resume(&self) -> Result<(), TransportError> {
        self.inner.resume().await
    }

    async fn stop(&self) -> Result<(), TransportError> {
        Err(TransportError::NotActive)
    }

    fn subscribe(&self) -> tokio::sync::broadcast::Receiver<TransferEvent> {
        self.inner.subscribe()
    }
}

#[tokio::test]
async fn failed_init_is_not_masked_by_transport_teardown() {
    let bus = Arc::new(MockBus::with_status(0x00));
    let transport = Arc::new(WedgedStopTransport {
        inner: MockTransport::new(),
    });
    let terminal = SoundTerminal::new();

    let err = terminal
        .init(
            CodecModel::Sta350bw,
            0,
            bus,
            transport,
            OutputConfig::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DeviceNotReady { .. }));
}

#[tokio::test]
async fn two_instances_are_independent() {
    let (terminal, _, _) = setup().await;

    let bus = Arc::new(MockBus::new());
    let transport = Arc::new(MockTransport::new());
    terminal
        .init(
            CodecModel::Sta350bw,
            1,
            bus.clone(),
            transport,
            OutputConfig {
                address: regs::DEVICE_ADDRESS_2,
                volume: 0x40,
                ..OutputConfig::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(bus.register(regs::MVOL), 0x40);
    terminal.set_volume(1, Channel::Master, 0x11).await.unwrap();
    assert_eq!(bus.register(regs::MVOL), 0x11);

    // Instance 0 keeps its own volume
    assert_eq!(terminal.status(0).await.unwrap().rate, 48_000);
}
