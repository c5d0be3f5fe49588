//! HTTP protocol layer module
//!
//! Query decoding and response building, kept apart from the router so the
//! router never sees hyper bodies.

pub mod query;
pub mod response;

// Re-export commonly used items
pub use query::parse_query;
pub use response::{build_413_response, build_hook_response};
