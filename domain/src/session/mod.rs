//! Provider session domain.
//!
//! - [`entities::Message`] - a single role-tagged message in a request
//! - [`stream::StreamEvent`] - incremental output of a streaming request

pub mod entities;
pub mod stream;
