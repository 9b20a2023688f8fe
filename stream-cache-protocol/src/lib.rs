//! Session state and control-message dispatch sitting between the
//! connection server/client and the stream store.

pub mod message_handler;
pub mod session;

pub use message_handler::{HandlerResponse, MessageHandler};
pub use session::Session;
