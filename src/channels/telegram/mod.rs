use crate::bus::{InboundMessage, InboundSender, OutboundMessage};
use crate::channels::base::{BaseChannel, split_message};
use crate::config::TelegramConfig;
use crate::utils::regex::RegexPatterns;
use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::dispatching::ShutdownToken;
use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, Message as TgMessage, ParseMode, Update};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Telegram message size limit.
pub const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

pub struct TelegramChannel {
    config: TelegramConfig,
    inbound: InboundSender,
    bot: Bot,
    shutdown: Mutex<Option<ShutdownToken>>,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig, inbound: InboundSender) -> Self {
        let bot = Bot::new(&config.token);
        Self {
            config,
            inbound,
            bot,
            shutdown: Mutex::new(None),
        }
    }
}

/// Only listed sender IDs are admitted; a `"*"` entry admits everyone.
/// An empty list admits no one.
pub fn is_allowed(allow_from: &[String], sender_id: &str) -> bool {
    if sender_id.is_empty() {
        return allow_from.iter().any(|a| a.trim() == "*");
    }
    allow_from
        .iter()
        .map(|entry| entry.trim())
        .any(|entry| entry == "*" || entry == sender_id)
}

/// Bot commands (`/start`, `/help@mybot`) are not relayed.
pub fn is_bot_command(text: &str) -> bool {
    text.trim_start().starts_with('/')
}

async fn on_message(msg: TgMessage, inbound: InboundSender, allow_from: Vec<String>) -> Result<()> {
    let Some(text) = msg.text() else {
        debug!("ignoring non-text telegram message in chat {}", msg.chat.id);
        return Ok(());
    };
    if is_bot_command(text) {
        debug!("ignoring bot command in chat {}", msg.chat.id);
        return Ok(());
    }
    let sender_id = msg
        .from
        .as_ref()
        .map(|u| u.id.0.to_string())
        .unwrap_or_default();

    if !is_allowed(&allow_from, &sender_id) {
        warn!(
            "telegram message from unlisted sender {} in chat {} dropped",
            sender_id, msg.chat.id
        );
        return Ok(());
    }

    let inbound_msg = InboundMessage::new("telegram", sender_id, msg.chat.id.0.to_string(), text);
    inbound.publish(inbound_msg).await
}

#[async_trait]
impl BaseChannel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&mut self) -> Result<()> {
        info!("Initializing Telegram bot...");
        let me = self
            .bot
            .get_me()
            .await
            .context("Telegram rejected the bot token")?;
        info!("Telegram bot authenticated as @{}", me.username());

        let inbound = self.inbound.clone();
        let allow_from = self.config.allow_from.clone();
        let handler = Update::filter_message().endpoint(move |msg: TgMessage| {
            let inbound = inbound.clone();
            let allow_from = allow_from.clone();
            async move { on_message(msg, inbound, allow_from).await }
        });

        let mut dispatcher = Dispatcher::builder(self.bot.clone(), handler).build();
        *self.shutdown.get_mut() = Some(dispatcher.shutdown_token());

        tokio::spawn(async move {
            dispatcher.dispatch().await;
        });

        info!("Telegram channel started");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let Some(token) = self.shutdown.lock().await.take() else {
            return Ok(());
        };
        match token.shutdown() {
            Ok(done) => {
                done.await;
                info!("Telegram dispatcher stopped");
            }
            Err(_) => debug!("Telegram dispatcher was not running"),
        }
        Ok(())
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<()> {
        let chat_id: i64 = msg
            .chat_id
            .parse()
            .with_context(|| format!("invalid telegram chat id '{}'", msg.chat_id))?;

        for chunk in split_message(&msg.content, TELEGRAM_MAX_MESSAGE_LEN) {
            if chunk.is_empty() {
                continue;
            }
            let html = markdown_to_telegram_html(&chunk);
            let sent = self
                .bot
                .send_message(ChatId(chat_id), html)
                .parse_mode(ParseMode::Html)
                .await;
            match sent {
                Ok(_) => {}
                // Telegram rejected the markup (e.g. a tag pair cut by splitting)
                Err(RequestError::Api(api_err)) => {
                    debug!("telegram rejected HTML ({}), resending as plain text", api_err);
                    self.bot
                        .send_message(ChatId(chat_id), chunk)
                        .await
                        .context("telegram send_message failed")?;
                }
                Err(e) => return Err(e).context("telegram send_message failed"),
            }
        }
        Ok(())
    }

    async fn send_typing(&self, chat_id: &str) -> Result<()> {
        let chat_id: i64 = chat_id
            .parse()
            .with_context(|| format!("invalid telegram chat id '{}'", chat_id))?;
        self.bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await
            .context("telegram send_chat_action failed")?;
        Ok(())
    }
}

/// Render common markdown as Telegram-flavoured HTML. Code spans are
/// escaped but otherwise left untouched.
pub fn markdown_to_telegram_html(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut html = String::with_capacity(text.len() + 16);
    let mut last = 0;
    for caps in RegexPatterns::markdown_code().captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        html.push_str(&render_inline(&text[last..whole.start()]));
        if let Some(block) = caps.get(1) {
            html.push_str("<pre>");
            html.push_str(&html_escape::encode_text(block.as_str().trim_end_matches('\n')));
            html.push_str("</pre>");
        } else if let Some(code) = caps.get(2) {
            html.push_str("<code>");
            html.push_str(&html_escape::encode_text(code.as_str()));
            html.push_str("</code>");
        }
        last = whole.end();
    }
    html.push_str(&render_inline(&text[last..]));
    html
}

fn render_inline(segment: &str) -> String {
    if segment.is_empty() {
        return String::new();
    }
    let escaped = html_escape::encode_text(segment);
    let out = RegexPatterns::markdown_link().replace_all(&escaped, r#"<a href="$2">$1</a>"#);
    let out = RegexPatterns::markdown_heading().replace_all(&out, "<b>$1</b>");
    let out = RegexPatterns::markdown_bold().replace_all(&out, "<b>$1</b>");
    let out = RegexPatterns::markdown_strike().replace_all(&out, "<s>$1</s>");
    let out = RegexPatterns::markdown_italic().replace_all(&out, "<i>$1</i>");
    out.into_owned()
}
