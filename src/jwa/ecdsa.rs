use alloc::{string::String, vec::Vec};
use core::fmt;

use signature::{Signer as _, Verifier as _};

use super::JsonWebSigningAlgorithm;
use crate::{
    sign::Signer,
    verify::{Verifier, VerifyError},
};

/// Digital Signature with ECDSA as defined in [section 3.4 of RFC 7518]
///
/// [section 3.4 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-3.4>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcDSA {
    /// ECDSA using P-256 and SHA-256
    Es256,
    /// ECDSA using P-384 and SHA-384
    Es384,
    /// ECDSA using P-521 and SHA-512
    Es512,
    /// ECDSA using secp256k1 curve and SHA-256
    ///
    /// ECDSA with secp256k1 is defined in [RFC 8812 section 3]
    ///
    /// [RFC 8812 section 3]: <https://datatracker.ietf.org/doc/html/rfc8812#section-3>
    Es256K,
}

impl From<EcDSA> for super::JsonWebSigningAlgorithm {
    fn from(x: EcDSA) -> Self {
        Self::EcDSA(x)
    }
}

impl From<EcDSA> for super::JsonWebAlgorithm {
    fn from(x: EcDSA) -> Self {
        Self::Signing(super::JsonWebSigningAlgorithm::EcDSA(x))
    }
}

#[derive(Clone)]
enum SigningInner {
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
    P521(p521::ecdsa::SigningKey),
    Secp256k1(k256::ecdsa::SigningKey),
}

// manual impl because `p521::ecdsa::SigningKey` does not implement `Debug`
impl fmt::Debug for SigningInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P256(key) => f.debug_tuple("P256").field(key).finish(),
            Self::P384(key) => f.debug_tuple("P384").field(key).finish(),
            Self::P521(_) => f
                .debug_tuple("P521")
                .field(&format_args!("SigningKey {{ .. }}"))
                .finish(),
            Self::Secp256k1(key) => f.debug_tuple("Secp256k1").field(key).finish(),
        }
    }
}

/// A private key for one of the [`EcDSA`] algorithms.
///
/// Signatures are produced deterministically following [RFC 6979] and
/// serialized in the fixed width `R || S` form JOSE requires, not in ASN.1
/// DER.
///
/// [RFC 6979]: <https://datatracker.ietf.org/doc/html/rfc6979>
#[derive(Debug, Clone)]
pub struct EcdsaSigningKey {
    inner: SigningInner,
    key_id: Option<String>,
}

impl EcdsaSigningKey {
    /// Creates a signing key from the raw secret scalar of the curve the
    /// given algorithm uses.
    ///
    /// # Errors
    ///
    /// Fails if the bytes do not form a valid non-zero scalar for the
    /// curve.
    pub fn from_secret_bytes(variant: EcDSA, d: &[u8]) -> Result<Self, signature::Error> {
        let inner = match variant {
            EcDSA::Es256 => SigningInner::P256(p256::ecdsa::SigningKey::from_slice(d)?),
            EcDSA::Es384 => SigningInner::P384(p384::ecdsa::SigningKey::from_slice(d)?),
            EcDSA::Es512 => SigningInner::P521(p521::ecdsa::SigningKey::from_slice(d)?),
            EcDSA::Es256K => SigningInner::Secp256k1(k256::ecdsa::SigningKey::from_slice(d)?),
        };
        Ok(Self {
            inner,
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
    pub fn verifying_key(&self) -> EcdsaVerifyingKey {
        let inner = match &self.inner {
            SigningInner::P256(key) => VerifyingInner::P256(key.verifying_key().clone()),
            SigningInner::P384(key) => VerifyingInner::P384(key.verifying_key().clone()),
            SigningInner::P521(key) => VerifyingInner::P521(p521::ecdsa::VerifyingKey::from(key)),
            SigningInner::Secp256k1(key) => {
                VerifyingInner::Secp256k1(key.verifying_key().clone())
            }
        };
        EcdsaVerifyingKey { inner }
    }
}

impl Signer for EcdsaSigningKey {
    fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, signature::Error> {
        Ok(match &self.inner {
            SigningInner::P256(key) => {
                let signature: p256::ecdsa::Signature = key.try_sign(msg)?;
                signature.to_bytes().to_vec()
            }
            SigningInner::P384(key) => {
                let signature: p384::ecdsa::Signature = key.try_sign(msg)?;
                signature.to_bytes().to_vec()
            }
            SigningInner::P521(key) => {
                let signature: p521::ecdsa::Signature = key.try_sign(msg)?;
                signature.to_bytes().to_vec()
            }
            SigningInner::Secp256k1(key) => {
                let signature: k256::ecdsa::Signature = key.try_sign(msg)?;
                signature.to_bytes().to_vec()
            }
        })
    }

    fn algorithm(&self) -> JsonWebSigningAlgorithm {
        let variant = match self.inner {
            SigningInner::P256(..) => EcDSA::Es256,
            SigningInner::P384(..) => EcDSA::Es384,
            SigningInner::P521(..) => EcDSA::Es512,
            SigningInner::Secp256k1(..) => EcDSA::Es256K,
        };
        JsonWebSigningAlgorithm::EcDSA(variant)
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }
}

#[derive(Clone)]
enum VerifyingInner {
    P256(p256::ecdsa::VerifyingKey),
    P384(p384::ecdsa::VerifyingKey),
    P521(p521::ecdsa::VerifyingKey),
    Secp256k1(k256::ecdsa::VerifyingKey),
}

// manual impl because `p521::ecdsa::VerifyingKey` does not implement `Debug`
impl fmt::Debug for VerifyingInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P256(key) => f.debug_tuple("P256").field(key).finish(),
            Self::P384(key) => f.debug_tuple("P384").field(key).finish(),
            Self::P521(_) => f
                .debug_tuple("P521")
                .field(&format_args!("VerifyingKey {{ .. }}"))
                .finish(),
            Self::Secp256k1(key) => f.debug_tuple("Secp256k1").field(key).finish(),
        }
    }
}

/// A public key for one of the [`EcDSA`] algorithms.
#[derive(Debug, Clone)]
pub struct EcdsaVerifyingKey {
    inner: VerifyingInner,
}

impl EcdsaVerifyingKey {
    /// Creates a verifying key from a SEC1 encoded point on the curve the
    /// given algorithm uses.
    ///
    /// # Errors
    ///
    /// Fails if the bytes do not encode a point on the curve.
    pub fn from_sec1_bytes(variant: EcDSA, bytes: &[u8]) -> Result<Self, signature::Error> {
        let inner = match variant {
            EcDSA::Es256 => VerifyingInner::P256(p256::ecdsa::VerifyingKey::from_sec1_bytes(bytes)?),
            EcDSA::Es384 => VerifyingInner::P384(p384::ecdsa::VerifyingKey::from_sec1_bytes(bytes)?),
            EcDSA::Es512 => VerifyingInner::P521(p521::ecdsa::VerifyingKey::from_sec1_bytes(bytes)?),
            EcDSA::Es256K => {
                VerifyingInner::Secp256k1(k256::ecdsa::VerifyingKey::from_sec1_bytes(bytes)?)
            }
        };
        Ok(Self { inner })
    }

    /// Creates a verifying key from the affine `x` and `y` coordinates of
    /// a point on the curve the given algorithm uses, as they appear in
    /// an `EC` JSON Web Key.
    ///
    /// # Errors
    ///
    /// Fails if the coordinates do not form a point on the curve.
    pub fn from_affine_coordinates(
        variant: EcDSA,
        x: &[u8],
        y: &[u8],
    ) -> Result<Self, signature::Error> {
        let mut sec1 = Vec::with_capacity(1 + x.len() + y.len());
        sec1.push(0x04);
        sec1.extend_from_slice(x);
        sec1.extend_from_slice(y);
        Self::from_sec1_bytes(variant, &sec1)
    }
}

impl Verifier for EcdsaVerifyingKey {
    fn verify(&self, msg: &[u8], signature: &[u8]) -> Result<(), VerifyError> {
        match &self.inner {
            VerifyingInner::P256(key) => {
                let signature = p256::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| VerifyError::InvalidSignature)?;
                key.verify(msg, &signature)
                    .map_err(|_| VerifyError::InvalidSignature)
            }
            VerifyingInner::P384(key) => {
                let signature = p384::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| VerifyError::InvalidSignature)?;
                key.verify(msg, &signature)
                    .map_err(|_| VerifyError::InvalidSignature)
            }
            VerifyingInner::P521(key) => {
                let signature = p521::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| VerifyError::InvalidSignature)?;
                key.verify(msg, &signature)
                    .map_err(|_| VerifyError::InvalidSignature)
            }
            VerifyingInner::Secp256k1(key) => {
                let signature = k256::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| VerifyError::InvalidSignature)?;
                key.verify(msg, &signature)
                    .map_err(|_| VerifyError::InvalidSignature)
            }
        }
    }

    fn algorithm(&self) -> JsonWebSigningAlgorithm {
        let variant = match self.inner {
            VerifyingInner::P256(..) => EcDSA::Es256,
            VerifyingInner::P384(..) => EcDSA::Es384,
            VerifyingInner::P521(..) => EcDSA::Es512,
            VerifyingInner::Secp256k1(..) => EcDSA::Es256K,
        };
        JsonWebSigningAlgorithm::EcDSA(variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Base64UrlString;

    // the example key pair from appendix A.3 of RFC 7515
    const A3_X: &str = "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU";
    const A3_Y: &str = "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0";
    const A3_D: &str = "jpsQnnGQmL-YBIffH1136cspYG6-0iY7X1fCE9-E9LI";
    const A3_INPUT: &[u8] =
        b"eyJhbGciOiJFUzI1NiJ9.eyJpc3MiOiJqb2UiLA0KICJleHAiOjEzMDA4MTkzODAsDQogImh0dHA6Ly9leGFtcGxlLmNvbS9pc19yb290Ijp0cnVlfQ";
    const A3_SIGNATURE: &str =
        "DtEhU3ljbEg8L38VWAfUAqOyKAM6-Xx-F4GawxaepmXFCgfTjDxw5djxLa8IS\
         lSApmWQxfKTUJqPP3-Kg6NU1Q";

    fn a3_verifying_key() -> EcdsaVerifyingKey {
        let x = Base64UrlString::from(A3_X).decode().unwrap();
        let y = Base64UrlString::from(A3_Y).decode().unwrap();
        EcdsaVerifyingKey::from_affine_coordinates(EcDSA::Es256, &x, &y).unwrap()
    }

    #[test]
    fn verifies_the_rfc_7515_a3_example() {
        let signature = Base64UrlString::from(A3_SIGNATURE).decode().unwrap();
        a3_verifying_key().verify(A3_INPUT, &signature).unwrap();
    }

    #[test]
    fn rejects_a_tampered_signature() {
        let mut signature = Base64UrlString::from(A3_SIGNATURE).decode().unwrap();
        signature[10] ^= 0x01;
        assert!(matches!(
            a3_verifying_key().verify(A3_INPUT, &signature),
            Err(VerifyError::InvalidSignature)
        ));
    }

    #[test]
    fn signatures_round_trip() {
        let d = Base64UrlString::from(A3_D).decode().unwrap();
        let key = EcdsaSigningKey::from_secret_bytes(EcDSA::Es256, &d).unwrap();
        let signature = key.sign(A3_INPUT).unwrap();
        assert_eq!(signature.len(), 64);
        key.verifying_key().verify(A3_INPUT, &signature).unwrap();
    }

    #[test]
    fn coordinates_off_the_curve_are_rejected() {
        let x = Base64UrlString::from(A3_X).decode().unwrap();
        let mut y = Base64UrlString::from(A3_Y).decode().unwrap();
        y[0] ^= 0x01;
        assert!(EcdsaVerifyingKey::from_affine_coordinates(EcDSA::Es256, &x, &y).is_err());
    }
}
