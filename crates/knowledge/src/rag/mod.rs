//! Retrieval-augmented answering.
//!
//! Combines retrieved documents with a prompt template and asks the
//! completion endpoint for an answer.

pub mod ask;
pub mod types;

pub use ask::{build_context, ChatOrchestrator, CONTEXT_SNIPPET_CHARS};
pub use types::{RagResponse, RagSourceRef};
