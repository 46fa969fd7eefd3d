use alloc::{string::String, vec::Vec};

use hmac::{Mac, SimpleHmac};
use secrecy::{ExposeSecret, SecretSlice};
use sha2::{digest::core_api::BlockSizeUser, Digest, Sha256, Sha384, Sha512};

use super::JsonWebSigningAlgorithm;
use crate::{
    sign::Signer,
    verify::{Verifier, VerifyError},
};

/// HMAC with SHA-2 Functions as defined in [section 3.2 of RFC 7518]
///
/// [section 3.2 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-3.2>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hmac {
    /// HMAC using SHA-256
    Hs256,
    /// HMAC using SHA-384
    Hs384,
    /// HMAC using SHA-512
    Hs512,
}

impl Hmac {
    // Digest output length in bytes. RFC 7518 section 3.2 rejects keys
    // shorter than this.
    pub(crate) const fn output_size(self) -> usize {
        match self {
            Hmac::Hs256 => 32,
            Hmac::Hs384 => 48,
            Hmac::Hs512 => 64,
        }
    }
}

impl From<Hmac> for super::JsonWebSigningAlgorithm {
    fn from(x: Hmac) -> Self {
        Self::Hmac(x)
    }
}

impl From<Hmac> for super::JsonWebAlgorithm {
    fn from(x: Hmac) -> Self {
        Self::Signing(super::JsonWebSigningAlgorithm::Hmac(x))
    }
}

/// A symmetric key for the [`Hmac`] family of signing algorithms.
///
/// The same key signs and verifies, so a single type implements both
/// [`Signer`] and [`Verifier`].
pub struct HmacKey {
    key: SecretSlice<u8>,
    variant: Hmac,
    key_id: Option<String>,
}

impl core::fmt::Debug for HmacKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HmacKey")
            .field("key", &"[redacted]")
            .field("variant", &self.variant)
            .field("key_id", &self.key_id)
            .finish()
    }
}

impl HmacKey {
    /// Creates a key for the given HMAC variant.
    ///
    /// Any key length is accepted. Note that [section 3.2 of RFC 7518]
    /// asks for keys at least as long as the hash output.
    ///
    /// [section 3.2 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-3.2>
    pub fn new(key: impl Into<Vec<u8>>, variant: Hmac) -> Self {
        Self {
            key: SecretSlice::from(key.into()),
            variant,
            key_id: None,
        }
    }

    /// Attaches a key id that will end up in the `kid` header parameter
    /// of tokens signed with this key.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

fn compute<D>(key: &[u8], msg: &[u8]) -> Result<Vec<u8>, signature::Error>
where
    D: Digest + BlockSizeUser,
{
    let mut mac =
        <SimpleHmac<D> as Mac>::new_from_slice(key).map_err(|_| signature::Error::new())?;
    mac.update(msg);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn check<D>(key: &[u8], msg: &[u8], signature: &[u8]) -> Result<(), VerifyError>
where
    D: Digest + BlockSizeUser,
{
    let mut mac =
        <SimpleHmac<D> as Mac>::new_from_slice(key).map_err(|_| VerifyError::InvalidSignature)?;
    mac.update(msg);
    // verify_slice compares in constant time
    mac.verify_slice(signature)
        .map_err(|_| VerifyError::InvalidSignature)
}

impl Signer for HmacKey {
    fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, signature::Error> {
        let key = self.key.expose_secret();
        match self.variant {
            Hmac::Hs256 => compute::<Sha256>(key, msg),
            Hmac::Hs384 => compute::<Sha384>(key, msg),
            Hmac::Hs512 => compute::<Sha512>(key, msg),
        }
    }

    fn algorithm(&self) -> JsonWebSigningAlgorithm {
        JsonWebSigningAlgorithm::Hmac(self.variant)
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }
}

impl Verifier for HmacKey {
    fn verify(&self, msg: &[u8], signature: &[u8]) -> Result<(), VerifyError> {
        let key = self.key.expose_secret();
        match self.variant {
            Hmac::Hs256 => check::<Sha256>(key, msg, signature),
            Hmac::Hs384 => check::<Sha384>(key, msg, signature),
            Hmac::Hs512 => check::<Sha512>(key, msg, signature),
        }
    }

    fn algorithm(&self) -> JsonWebSigningAlgorithm {
        JsonWebSigningAlgorithm::Hmac(self.variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Base64UrlString;

    // the example from appendix A.1 of RFC 7515
    const A1_KEY: &str = "AyM1SysPpbyDfgZld3umj1qzKObwVMkoqQ-EstJQLr_T-1qS0gZH75\
                          aKtMN3Yj0iPS4hcgUuTwjAzZr1Z9CAow";
    const A1_INPUT: &[u8] = b"eyJ0eXAiOiJKV1QiLA0KICJhbGciOiJIUzI1NiJ9.eyJpc3MiOiJqb2UiLA0KICJleHAiOjEzMDA4MTkzODAsDQogImh0dHA6Ly9leGFtcGxlLmNvbS9pc19yb290Ijp0cnVlfQ";
    const A1_SIGNATURE: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";

    fn a1_key() -> HmacKey {
        let key = Base64UrlString::from(A1_KEY).decode().unwrap();
        HmacKey::new(key, Hmac::Hs256)
    }

    #[test]
    fn signs_the_rfc_7515_a1_example() {
        let signature = a1_key().sign(A1_INPUT).unwrap();
        assert_eq!(Base64UrlString::encode(signature).as_str(), A1_SIGNATURE);
    }

    #[test]
    fn verifies_the_rfc_7515_a1_example() {
        let signature = Base64UrlString::from(A1_SIGNATURE).decode().unwrap();
        a1_key().verify(A1_INPUT, &signature).unwrap();
    }

    #[test]
    fn rejects_a_tampered_message() {
        let signature = Base64UrlString::from(A1_SIGNATURE).decode().unwrap();
        let mut msg = A1_INPUT.to_vec();
        msg[0] ^= 0x01;
        assert!(matches!(
            a1_key().verify(&msg, &signature),
            Err(VerifyError::InvalidSignature)
        ));
    }

    #[test]
    fn short_keys_are_usable() {
        let key = HmacKey::new(*b"SECRETKEY", Hmac::Hs256);
        let signature = key.sign(b"PAYLOAD").unwrap();
        key.verify(b"PAYLOAD", &signature).unwrap();
    }
}
