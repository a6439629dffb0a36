//! Secret provider boundary supplying root signing material.

mod r#trait;
pub use r#trait::SecretProvider;

mod providers;
pub use providers::{EnvSecretProvider, StaticSecretProvider};
