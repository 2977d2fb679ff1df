//! Client for the remote question-answering service.

pub mod client;
pub mod http;
pub mod types;

pub use client::{ChatClient, ChatTransport, RawResponse, TransportError, response_to_message};
pub use http::HttpTransport;
pub use types::{ChatRequest, ChatResponse, HistoryEntry, VISUALIZATION_PLACEHOLDER, history_for_api};
