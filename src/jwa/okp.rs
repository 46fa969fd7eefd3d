use alloc::{string::String, vec::Vec};

use ed25519_dalek::Signature;
use signature::Signer as _;

use super::JsonWebSigningAlgorithm;
use crate::{
    sign::Signer,
    verify::{Verifier, VerifyError},
};

/// A private Ed25519 key for the `EdDSA` algorithm from [RFC 8037].
///
/// Ed448, the other curve `EdDSA` is defined for, is not supported.
///
/// [RFC 8037]: <https://datatracker.ietf.org/doc/html/rfc8037>
#[derive(Clone)]
pub struct Ed25519SigningKey {
    key: ed25519_dalek::SigningKey,
    key_id: Option<String>,
}

impl core::fmt::Debug for Ed25519SigningKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Ed25519SigningKey")
            .field("key", &"[redacted]")
            .field("key_id", &self.key_id)
            .finish()
    }
}

impl Ed25519SigningKey {
    /// Creates a signing key from the 32 secret key bytes, the `d` member
    /// of an `OKP` JSON Web Key.
    ///
    /// # Errors
    ///
    /// Fails if the slice is not exactly 32 bytes long.
    pub fn from_bytes(d: &[u8]) -> Result<Self, signature::Error> {
        let d = <[u8; 32]>::try_from(d).map_err(|_| signature::Error::new())?;
        Ok(Self {
            key: ed25519_dalek::SigningKey::from_bytes(&d),
            key_id: None,
        })
    }

    /// Attaches a key id that will end up in the `kid` header parameter
    /// of tokens signed with this key.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    /// The public half of this key.
    pub fn verifying_key(&self) -> Ed25519VerifyingKey {
        Ed25519VerifyingKey {
            key: self.key.verifying_key(),
        }
    }
}

impl Signer for Ed25519SigningKey {
    fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, signature::Error> {
        let signature = self.key.try_sign(msg)?;
        Ok(signature.to_bytes().to_vec())
    }

    fn algorithm(&self) -> JsonWebSigningAlgorithm {
        JsonWebSigningAlgorithm::EdDSA
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }
}

/// A public Ed25519 key for the `EdDSA` algorithm from [RFC 8037].
///
/// [RFC 8037]: <https://datatracker.ietf.org/doc/html/rfc8037>
#[derive(Debug, Clone)]
pub struct Ed25519VerifyingKey {
    key: ed25519_dalek::VerifyingKey,
}

impl Ed25519VerifyingKey {
    /// Creates a verifying key from the 32 public key bytes, the `x`
    /// member of an `OKP` JSON Web Key.
    ///
    /// # Errors
    ///
    /// Fails if the slice is not exactly 32 bytes long or does not encode
    /// a valid curve point.
    pub fn from_bytes(x: &[u8]) -> Result<Self, signature::Error> {
        let x = <[u8; 32]>::try_from(x).map_err(|_| signature::Error::new())?;
        Ok(Self {
            key: ed25519_dalek::VerifyingKey::from_bytes(&x)?,
        })
    }
}

impl Verifier for Ed25519VerifyingKey {
    fn verify(&self, msg: &[u8], signature: &[u8]) -> Result<(), VerifyError> {
        let signature =
            Signature::from_slice(signature).map_err(|_| VerifyError::InvalidSignature)?;
        // verify_strict also rejects the small order points plain
        // verification lets through
        self.key
            .verify_strict(msg, &signature)
            .map_err(|_| VerifyError::InvalidSignature)
    }

    fn algorithm(&self) -> JsonWebSigningAlgorithm {
        JsonWebSigningAlgorithm::EdDSA
    }
}
