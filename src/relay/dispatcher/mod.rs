use crate::bus::InboundMessage;
use crate::channels::base::BaseChannel;
use crate::relay::handler::{ERROR_NOTICE, RelayHandler};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Runs one task per inbound message: relay through the handler, then send
/// the reply on the channel the message arrived on.
pub struct Dispatcher {
    handler: Arc<RelayHandler>,
    channel: Arc<dyn BaseChannel>,
}

impl Dispatcher {
    pub fn new(handler: Arc<RelayHandler>, channel: Arc<dyn BaseChannel>) -> Self {
        Self { handler, channel }
    }

    /// Consume the inbound queue until it closes.
    pub async fn run(&self, inbound_rx: mpsc::Receiver<InboundMessage>) {
        self.run_until(inbound_rx, std::future::pending()).await;
    }

    /// Consume the inbound queue until it closes or `shutdown` resolves.
    /// Messages already accepted are always answered before this returns.
    pub async fn run_until<F>(&self, mut inbound_rx: mpsc::Receiver<InboundMessage>, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        let mut tasks = JoinSet::new();
        tokio::pin!(shutdown);
        info!("dispatcher started on channel {}", self.channel.name());

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!("dispatcher shutting down");
                    // Refuse new messages but answer the ones already queued
                    inbound_rx.close();
                    while let Some(msg) = inbound_rx.recv().await {
                        self.spawn_message(&mut tasks, msg);
                    }
                    break;
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    log_join_result(joined);
                }
                msg = inbound_rx.recv() => {
                    let Some(msg) = msg else {
                        debug!("inbound queue closed");
                        break;
                    };
                    self.spawn_message(&mut tasks, msg);
                }
            }
        }

        if !tasks.is_empty() {
            info!("waiting for {} in-flight replies", tasks.len());
        }
        while let Some(joined) = tasks.join_next().await {
            log_join_result(joined);
        }
    }

    fn spawn_message(&self, tasks: &mut JoinSet<()>, msg: InboundMessage) {
        let handler = Arc::clone(&self.handler);
        let channel = Arc::clone(&self.channel);
        tasks.spawn(async move {
            process_message(handler, channel.as_ref(), msg).await;
        });
    }
}

async fn process_message(
    handler: Arc<RelayHandler>,
    channel: &dyn BaseChannel,
    msg: InboundMessage,
) {
    if !RelayHandler::is_relayable(&msg) {
        debug!("skipping empty message in chat {}", msg.chat_id);
        return;
    }

    if let Err(e) = channel.send_typing(&msg.chat_id).await {
        debug!("typing indicator failed for chat {}: {:#}", msg.chat_id, e);
    }

    // A panic while generating still owes the chat a reply
    let fallback = msg.reply(ERROR_NOTICE);
    let reply = match tokio::spawn(async move { handler.handle(msg).await }).await {
        Ok(Some(reply)) => reply,
        Ok(None) => return,
        Err(e) if e.is_panic() => {
            error!("reply generation for chat {} panicked: {}", fallback.chat_id, e);
            fallback
        }
        Err(e) => {
            warn!("reply generation for chat {} cancelled: {}", fallback.chat_id, e);
            fallback
        }
    };

    if let Err(e) = channel.send(&reply).await {
        error!(
            "failed to deliver reply on {} to chat {}: {:#}",
            channel.name(),
            reply.chat_id,
            e
        );
    }
}

fn log_join_result(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!("message task panicked: {}", e);
        } else {
            warn!("message task cancelled: {}", e);
        }
    }
}
