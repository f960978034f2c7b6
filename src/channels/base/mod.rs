use crate::bus::OutboundMessage;
use async_trait::async_trait;

/// A messaging gateway: delivers inbound messages onto the bus and sends replies.
#[async_trait]
pub trait BaseChannel: Send + Sync {
    fn name(&self) -> &str;

    /// Begin delivering inbound messages. Returns once the subscription is running.
    async fn start(&mut self) -> anyhow::Result<()>;

    /// Stop accepting new inbound messages.
    async fn stop(&self) -> anyhow::Result<()>;

    async fn send(&self, msg: &OutboundMessage) -> anyhow::Result<()>;

    /// Send a typing indicator to signal the bot is processing.
    /// Default is a no-op for channels that don't support typing indicators.
    async fn send_typing(&self, _chat_id: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Split a message into chunks of at most `limit` bytes, preferring paragraph
/// then line boundaries and never cutting inside a UTF-8 character.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if text.len() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while remaining.len() > limit {
        let mut split_at = limit;
        while split_at > 0 && !remaining.is_char_boundary(split_at) {
            split_at -= 1;
        }
        if split_at == 0 {
            // Single character wider than limit
            split_at = remaining
                .char_indices()
                .nth(1)
                .map_or(remaining.len(), |(i, _)| i);
        }

        let window = &remaining[..split_at];
        let (end, skip) = if let Some(idx) = window.rfind("\n\n") {
            (idx, 2)
        } else if let Some(idx) = window.rfind('\n') {
            (idx, 1)
        } else {
            (split_at, 0)
        };

        if skip == 0 {
            chunks.push(window.to_string());
        } else {
            chunks.push(remaining[..end].trim().to_string());
        }
        remaining = &remaining[end + skip..];
    }

    if !remaining.is_empty() {
        chunks.push(remaining.trim().to_string());
    }

    chunks.into_iter().filter(|c| !c.is_empty()).collect()
}
