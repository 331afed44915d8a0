#![deny(missing_docs)]
//! Stub crypto provider for Vault Transit engine.
//!
//! This crate provides the correct trait impl shape for a Vault Transit crypto provider.
//! The actual Vault Transit integration is not implemented — all operations return
//! `CryptoError::UnsupportedOperation`.

use async_trait::async_trait;
use neuron_crypto::{CryptoError, CryptoProvider};

/// Stub for Vault Transit engine.
pub struct VaultTransitProvider {
    _addr: String,
}

impl VaultTransitProvider {
    /// Create a new Vault Transit provider (stub).
    pub fn new(addr: impl Into<String>) -> Self {
        Self { _addr: addr.into() }
    }
}

#[async_trait]
impl CryptoProvider for VaultTransitProvider {
    async fn sign(
        &self,
        _key_ref: &str,
        _algorithm: &str,
        _data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        Err(CryptoError::UnsupportedOperation(
            "VaultTransitProvider is a stub".into(),
        ))
    }

    async fn verify(
        &self,
        _key_ref: &str,
        _algorithm: &str,
        _data: &[u8],
        _signature: &[u8],
    ) -> Result<bool, CryptoError> {
        Err(CryptoError::UnsupportedOperation(
            "VaultTransitProvider is a stub".into(),
        ))
    }

    async fn encrypt(&self, _key_ref: &str, _plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Err(CryptoError::UnsupportedOperation(
            "VaultTransitProvider is a stub".into(),
        ))
    }

    async fn decrypt(&self, _key_ref: &str, _ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Err(CryptoError::UnsupportedOperation(
            "VaultTransitProvider is a stub".into(),
        ))
    }
}
