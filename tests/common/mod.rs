// Shared test helpers; not all items used by every test binary.
#![allow(unused)]

use async_trait::async_trait;
use chatrelay::bus::OutboundMessage;
use chatrelay::channels::base::BaseChannel;
use chatrelay::config::Config;
use chatrelay::errors::{RelayError, RelayResult};
use chatrelay::providers::base::{
    CompletionProvider, CompletionRequest, CompletionResponse, FinishReason,
};
use chatrelay::relay::{RelayHandler, RelaySettings};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

// --- Providers ---

pub struct MockProvider {
    responses: Mutex<VecDeque<RelayResult<CompletionResponse>>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl MockProvider {
    pub fn with_responses(responses: Vec<RelayResult<CompletionResponse>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::from(responses)),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, req: &CompletionRequest) -> RelayResult<CompletionResponse> {
        self.requests.lock().unwrap().push(req.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(CompletionResponse::completed("Mock response")))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub fn completed(text: &str) -> RelayResult<CompletionResponse> {
    Ok(CompletionResponse::completed(text))
}

pub fn finished(text: &str, finish_reason: FinishReason) -> RelayResult<CompletionResponse> {
    Ok(CompletionResponse {
        text: text.to_string(),
        finish_reason,
    })
}

pub fn connection_reset() -> RelayResult<CompletionResponse> {
    Err(RelayError::Transport(
        "OpenAI request failed: error sending request: connection reset by peer".to_string(),
    ))
}

pub fn test_handler(provider: Arc<dyn CompletionProvider>) -> Arc<RelayHandler> {
    Arc::new(RelayHandler::new(
        provider,
        RelaySettings::from_config(&Config::default()),
    ))
}

// --- Channel ---

#[derive(Default)]
pub struct RecordingChannel {
    pub sent: Mutex<Vec<OutboundMessage>>,
    failures_left: Mutex<usize>,
}

impl RecordingChannel {
    /// A channel whose first `n` sends fail.
    pub fn failing_first(n: usize) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failures_left: Mutex::new(n),
        }
    }

    pub fn contents(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.content.clone())
            .collect()
    }
}

#[async_trait]
impl BaseChannel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn start(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn send(&self, msg: &OutboundMessage) -> anyhow::Result<()> {
        {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                anyhow::bail!("gateway send failed");
            }
        }
        self.sent.lock().unwrap().push(msg.clone());
        Ok(())
    }
}

// --- Log capture ---

/// In-memory sink for `tracing` output.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Route this thread's `tracing` events into a buffer until the guard drops.
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}
