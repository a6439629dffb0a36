//! Revocation storage boundary: blacklist membership and per-token metadata.

mod r#trait;
pub use r#trait::RevocationStore;

mod memory;
pub use memory::MemoryRevocationStore;
