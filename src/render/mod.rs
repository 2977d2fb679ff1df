//! Response rendering: visualization dispatch, message rendering, and the
//! visible conversation.

pub mod dispatch;
pub mod pipeline;
pub mod terminal;

pub use dispatch::{Axis, ShapeMismatch, Table, Visual, dispatch, select_bar_columns};
pub use pipeline::{
    Body, ConversationView, Mutation, NO_RESULTS, PENDING_TEXT, RenderedMessage, SqlDetails,
    ViewEntry, render_message,
};
