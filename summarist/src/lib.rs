// Library interface for summarist modules
// This allows tests and other binaries to import modules

pub mod chunker;
pub mod classify;
pub mod document;
pub mod error;
pub mod llm;
pub mod loader;
pub mod server;
pub mod service;
pub mod transcript;

pub use document::{Chunk, Document, SummaryResult};
pub use error::SummaryError;
pub use service::{SummaryResponse, SummaryService};
