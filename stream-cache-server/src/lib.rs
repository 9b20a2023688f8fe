//! Connection server: accepts WebSocket connections, runs one session
//! per connection, and dispatches frames into the stream store through
//! the protocol crate's Message Handler.

pub mod app_context;
pub mod cli;
pub mod connection_server;
pub mod shutdown;

pub use app_context::AppContext;
pub use cli::Cli;
pub use connection_server::{ConnectionServer, ServerConfig};
pub use shutdown::Shutdown;
