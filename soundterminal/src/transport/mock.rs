//! In-memory transport used by the integration tests
//!
//! Tracks stream state and transfer position without moving any audio, and
//! lets tests raise progress events by hand.

use async_trait::async_trait;
use bytes::Bytes;
use soundterminal_protocol::ClockSettings;
use tokio::sync::{broadcast, Mutex};

use super::{PcmTransport, TransferEvent, TransportError, MAX_TRANSFER_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockStream {
    Idle,
    Running,
    Paused,
}

#[derive(Debug)]
struct MockState {
    stream: MockStream,
    /// Consumed frames within the current buffer
    position: usize,
    buffer_len: usize,
    clock: Option<ClockSettings>,
    /// Number of `start` calls observed, including the priming transfer
    starts: usize,
}

pub struct MockTransport {
    state: Mutex<MockState>,
    events: broadcast::Sender<TransferEvent>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        MockTransport {
            state: Mutex::new(MockState {
                stream: MockStream::Idle,
                position: 0,
                buffer_len: 0,
                clock: None,
                starts: 0,
            }),
            events,
        }
    }

    pub async fn stream(&self) -> MockStream {
        self.state.lock().await.stream
    }

    pub async fn position(&self) -> usize {
        self.state.lock().await.position
    }

    pub async fn buffer_len(&self) -> usize {
        self.state.lock().await.buffer_len
    }

    pub async fn clock(&self) -> Option<ClockSettings> {
        self.state.lock().await.clock
    }

    pub async fn starts(&self) -> usize {
        self.state.lock().await.starts
    }

    /// Simulates transfer progress by the given number of frames
    pub async fn advance(&self, frames: usize) {
        let mut state = self.state.lock().await;
        if state.stream == MockStream::Running && state.buffer_len > 0 {
            state.position = (state.position + frames) % state.buffer_len;
        }
    }

    /// Emits an event to all subscribers, as the hardware callback would
    pub fn raise(&self, event: TransferEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl PcmTransport for MockTransport {
    async fn reconfigure(&self, clock: ClockSettings) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        if state.stream != MockStream::Idle {
            return Err(TransportError::NotActive);
        }
        state.clock = Some(clock);
        Ok(())
    }

    async fn start(&self, data: Bytes) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        state.stream = MockStream::Running;
        state.position = 0;
        state.buffer_len = data.len().min(MAX_TRANSFER_LEN);
        state.starts += 1;
        Ok(())
    }

    async fn pause(&self) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        if state.stream != MockStream::Running {
            return Err(TransportError::NotActive);
        }
        state.stream = MockStream::Paused;
        Ok(())
    }

    async fn resume(&self) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        if state.stream != MockStream::Paused {
            return Err(TransportError::NotActive);
        }
        state.stream = MockStream::Running;
        Ok(())
    }

    async fn stop(&self) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        state.stream = MockStream::Idle;
        state.position = 0;
        state.buffer_len = 0;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<TransferEvent> {
        self.events.subscribe()
    }
}
