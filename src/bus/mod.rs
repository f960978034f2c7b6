pub mod events;
pub mod queue;

pub use events::{InboundMessage, OutboundMessage};
pub use queue::{InboundSender, MessageBus};
