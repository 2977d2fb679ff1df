//! floatchat - conversational client for ocean float data.
//!
//! Keeps a durable set of chat sessions, talks to the `/api/chat` service,
//! and turns each answer into render instructions for the visualization its
//! data actually supports.

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod render;
pub mod storage;

pub use app::ChatApp;
pub use config::Config;
pub use error::{Error, Result};
