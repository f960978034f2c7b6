use crate::bus::InboundMessage;
use anyhow::{Context, Result};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const DEFAULT_INBOUND_CAPACITY: usize = 1000;
/// Timeout for queue sends so a stalled dispatcher cannot block a channel forever.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum inbound message content length (1 MB)
const MAX_INBOUND_CONTENT_LEN: usize = 1_000_000;

/// Inbound queue between channels and the dispatcher.
pub struct MessageBus {
    inbound_tx: mpsc::Sender<InboundMessage>,
    inbound_rx: Option<mpsc::Receiver<InboundMessage>>,
}

impl MessageBus {
    pub fn new(inbound_capacity: usize) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(inbound_capacity.max(1));
        Self {
            inbound_tx,
            inbound_rx: Some(inbound_rx),
        }
    }

    /// Cloneable handle for channels to publish into.
    pub fn sender(&self) -> InboundSender {
        InboundSender {
            tx: self.inbound_tx.clone(),
        }
    }

    /// Extract the inbound receiver. Only the first call returns `Some`.
    pub fn take_inbound_rx(&mut self) -> Option<mpsc::Receiver<InboundMessage>> {
        self.inbound_rx.take()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(DEFAULT_INBOUND_CAPACITY)
    }
}

#[derive(Clone)]
pub struct InboundSender {
    tx: mpsc::Sender<InboundMessage>,
}

impl InboundSender {
    pub async fn publish(&self, mut msg: InboundMessage) -> Result<()> {
        if msg.content.len() > MAX_INBOUND_CONTENT_LEN {
            warn!(
                "inbound message too large ({} bytes), truncating to {}",
                msg.content.len(),
                MAX_INBOUND_CONTENT_LEN
            );
            let mut cut = MAX_INBOUND_CONTENT_LEN;
            while !msg.content.is_char_boundary(cut) {
                cut -= 1;
            }
            msg.content.truncate(cut);
        }

        let channel = msg.channel.clone();
        let chat_id = msg.chat_id.clone();
        tokio::time::timeout(SEND_TIMEOUT, self.tx.send(msg))
            .await
            .map_err(|_| {
                warn!(
                    "inbound send timed out after {}s, queue full or dispatcher stalled",
                    SEND_TIMEOUT.as_secs()
                );
                anyhow::anyhow!("inbound send timed out, queue full")
            })?
            .context("Failed to send inbound message - receiver closed")?;
        debug!(
            "inbound message queued: channel={}, chat_id={}",
            channel, chat_id
        );
        Ok(())
    }
}
