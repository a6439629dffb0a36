//! Secret provider implementations.

use async_trait::async_trait;

use crate::errors::{DomainError, DomainResult};

use super::r#trait::SecretProvider;

/// Default environment variable holding the root key material
pub const ROOT_KEY_ENV: &str = "TD_ROOT_KEY";

/// Reads root key material from an environment variable.
///
/// The value is interpreted as hex when it decodes cleanly, otherwise its
/// raw bytes are used as-is.
#[derive(Debug, Clone)]
pub struct EnvSecretProvider {
    var: String,
}

impl EnvSecretProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvSecretProvider {
    fn default() -> Self {
        Self::new(ROOT_KEY_ENV)
    }
}

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn root_key_material(&self) -> DomainResult<Vec<u8>> {
        let raw = std::env::var(&self.var).map_err(|_| DomainError::Internal {
            message: format!("secret variable {} is not set", self.var),
        })?;

        if raw.is_empty() {
            return Err(DomainError::Internal {
                message: format!("secret variable {} is empty", self.var),
            });
        }

        Ok(hex::decode(&raw).unwrap_or_else(|_| raw.into_bytes()))
    }
}

/// Fixed key material, for tests and embedded configurations.
#[derive(Clone)]
pub struct StaticSecretProvider {
    material: Vec<u8>,
}

impl StaticSecretProvider {
    pub fn new(material: impl Into<Vec<u8>>) -> Self {
        Self {
            material: material.into(),
        }
    }
}

#[async_trait]
impl SecretProvider for StaticSecretProvider {
    async fn root_key_material(&self) -> DomainResult<Vec<u8>> {
        if self.material.is_empty() {
            return Err(DomainError::Internal {
                message: "static secret material is empty".to_string(),
            });
        }
        Ok(self.material.clone())
    }
}
