//! Common type definitions shared across server crates.

mod context;

pub use context::RequestContext;
