//! Configuration types shared across server crates.

mod environment;

pub use environment::Environment;
