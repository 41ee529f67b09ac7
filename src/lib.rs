//! grounder: retrieval-augmented document Q&A over a local vector index.
//!
//! Documents are split into overlapping chunks, embedded with fastembed,
//! and stored in LanceDB. Questions retrieve the nearest chunks and pass
//! them as grounded context to a chat-completion model.

pub mod api;
pub mod config;
pub mod console;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod generation;
pub mod index;

pub use config::Config;
pub use error::{Error, Result};
