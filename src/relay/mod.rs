pub mod dispatcher;
pub mod handler;

pub use dispatcher::Dispatcher;
pub use handler::{
    EMPTY_REPLY_NOTICE, ERROR_NOTICE, REFUSAL_NOTICE, RelayHandler, RelaySettings,
    TRUNCATION_NOTICE,
};
