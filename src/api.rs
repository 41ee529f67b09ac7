//! HTTP front-end over the ingestion pipeline and query engine.
//!
//! One of two thin adapters (the other is the interactive console); both
//! depend only on the pipeline and engine interfaces.

mod server;
mod state;

pub use server::start_http_server;
pub use state::ApiState;
