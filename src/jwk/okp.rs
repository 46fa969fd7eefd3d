//! Octet key pairs, the `OKP` key type of [RFC 8037]
//!
//! [RFC 8037]: <https://datatracker.ietf.org/doc/html/rfc8037>

use alloc::{format, string::String};

use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{de::Error, Deserialize, Deserializer, Serialize};

use super::{
    thumbprint::{self, Thumbprint},
    FromJsonWebKeyError, JsonWebKey, JsonWebKeyType,
};
use crate::{
    base64_url::Base64UrlBytes,
    jwa::{Ed25519SigningKey, Ed25519VerifyingKey, JsonWebSigningAlgorithm},
    sign::{FromKey, InvalidSigningAlgorithmError},
};

const CRV: &str = "Ed25519";
const KTY: &str = "OKP";

/// An octet key pair as defined in [section 2 of RFC 8037]
///
/// Only the `Ed25519` curve is supported.
///
/// [section 2 of RFC 8037]: <https://datatracker.ietf.org/doc/html/rfc8037#section-2>
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
// Private stays before Public: the public repr also accepts the JSON of a
// private key and would silently drop `d`.
pub enum OkpJsonWebKey {
    /// A key carrying the private `d` member
    Private(Ed25519PrivateKey),
    /// A key carrying the public `x` member only
    Public(Ed25519PublicKey),
}

impl crate::sealed::Sealed for OkpJsonWebKey {}
impl Thumbprint for OkpJsonWebKey {
    fn thumbprint_prehashed(&self) -> String {
        match self {
            OkpJsonWebKey::Private(key) => key.thumbprint_prehashed(),
            OkpJsonWebKey::Public(key) => key.thumbprint_prehashed(),
        }
    }
}

/// An Ed25519 public key used to verify signatures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ed25519PublicKey(VerifyingKey);

impl Ed25519PublicKey {
    /// Creates a JWK representation of the given verifying key.
    pub fn new(key: VerifyingKey) -> Self {
        Self(key)
    }

    /// The wrapped key in the representation of `ed25519_dalek`.
    pub fn into_inner(self) -> VerifyingKey {
        self.0
    }
}

impl crate::sealed::Sealed for Ed25519PublicKey {}
impl Thumbprint for Ed25519PublicKey {
    fn thumbprint_prehashed(&self) -> String {
        thumbprint::serialize_key_thumbprint(self)
    }
}

/// An Ed25519 private key used to create signatures
#[derive(Clone)]
pub struct Ed25519PrivateKey(SigningKey);

impl core::fmt::Debug for Ed25519PrivateKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Ed25519PrivateKey")
            .field("x", &self.0.verifying_key())
            .field("d", &"[redacted]")
            .finish()
    }
}

impl Ed25519PrivateKey {
    /// Creates a JWK representation of the given signing key.
    pub fn new(key: SigningKey) -> Self {
        Self(key)
    }

    /// Generate a new private key using the provided rng.
    pub fn generate(rng: &mut impl rand_core::CryptoRngCore) -> Self {
        Self(SigningKey::generate(rng))
    }

    /// The public key corresponding to this private key.
    pub fn to_public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.0.verifying_key())
    }

    /// The wrapped key in the representation of `ed25519_dalek`.
    pub fn into_inner(self) -> SigningKey {
        self.0
    }
}

// one public key corresponds to one private key
impl PartialEq for Ed25519PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.verifying_key() == other.0.verifying_key()
    }
}
impl Eq for Ed25519PrivateKey {}

impl crate::sealed::Sealed for Ed25519PrivateKey {}
impl Thumbprint for Ed25519PrivateKey {
    // RFC 7638 hashes the required public members only, `d` never
    // contributes
    fn thumbprint_prehashed(&self) -> String {
        self.to_public_key().thumbprint_prehashed()
    }
}

impl From<Ed25519PublicKey> for OkpJsonWebKey {
    fn from(key: Ed25519PublicKey) -> Self {
        Self::Public(key)
    }
}

impl From<Ed25519PrivateKey> for OkpJsonWebKey {
    fn from(key: Ed25519PrivateKey) -> Self {
        Self::Private(key)
    }
}

impl From<OkpJsonWebKey> for JsonWebKeyType {
    fn from(key: OkpJsonWebKey) -> Self {
        JsonWebKeyType::Okp(key)
    }
}

impl From<Ed25519PublicKey> for JsonWebKeyType {
    fn from(key: Ed25519PublicKey) -> Self {
        JsonWebKeyType::Okp(OkpJsonWebKey::Public(key))
    }
}

impl From<Ed25519PrivateKey> for JsonWebKeyType {
    fn from(key: Ed25519PrivateKey) -> Self {
        JsonWebKeyType::Okp(OkpJsonWebKey::Private(key))
    }
}

#[derive(Serialize, Deserialize)]
struct PublicRepr {
    kty: String,
    crv: String,
    x: Base64UrlBytes,
}

#[derive(Serialize, Deserialize)]
struct PrivateRepr {
    kty: String,
    crv: String,
    x: Base64UrlBytes,
    d: Base64UrlBytes,
}

fn check_kty_and_crv<'de, D>(kty: &str, crv: &str) -> Result<(), D::Error>
where
    D: Deserializer<'de>,
{
    if crv != CRV {
        return Err(D::Error::custom(format!(
            "Invalid curve type `{crv}`. Expected `{CRV}`"
        )));
    }
    if kty != KTY {
        return Err(D::Error::custom(format!(
            "Invalid key type `{kty}`. Expected `{KTY}`"
        )));
    }
    Ok(())
}

impl<'de> Deserialize<'de> for Ed25519PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = PublicRepr::deserialize(deserializer)?;
        check_kty_and_crv::<D>(&repr.kty, &repr.crv)?;

        let key = VerifyingKey::from_bytes((*repr.x.0).try_into().map_err(|_| {
            D::Error::invalid_length(repr.x.0.len(), &"a base64url encoded 32 byte array")
        })?)
        .map_err(D::Error::custom)?;
        Ok(Self(key))
    }
}

impl Serialize for Ed25519PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        PublicRepr {
            kty: KTY.into(),
            crv: CRV.into(),
            x: Base64UrlBytes(self.0.as_bytes().to_vec()),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Ed25519PrivateKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = PrivateRepr::deserialize(deserializer)?;
        check_kty_and_crv::<D>(&repr.kty, &repr.crv)?;

        let public_key = VerifyingKey::from_bytes((*repr.x.0).try_into().map_err(|_| {
            D::Error::invalid_length(repr.x.0.len(), &"a base64url encoded 32 byte array")
        })?)
        .map_err(D::Error::custom)?;

        let signing_key = SigningKey::from_bytes((*repr.d.0).try_into().map_err(|_| {
            D::Error::invalid_length(repr.d.0.len(), &"a base64url encoded 32 byte array")
        })?);

        if public_key != signing_key.verifying_key() {
            return Err(D::Error::custom("public and private key part do not match"));
        }

        Ok(Self(signing_key))
    }
}

impl Serialize for Ed25519PrivateKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        PrivateRepr {
            kty: KTY.into(),
            crv: CRV.into(),
            x: Base64UrlBytes(self.0.verifying_key().to_bytes().to_vec()),
            d: Base64UrlBytes(self.0.to_bytes().to_vec()),
        }
        .serialize(serializer)
    }
}

impl FromKey<&JsonWebKey> for Ed25519SigningKey {
    type Error = FromJsonWebKeyError;

    fn from_key(jwk: &JsonWebKey, alg: JsonWebSigningAlgorithm) -> Result<Self, Self::Error> {
        if alg != JsonWebSigningAlgorithm::EdDSA {
            return Err(InvalidSigningAlgorithmError.into());
        }
        match jwk.key_type() {
            JsonWebKeyType::Okp(OkpJsonWebKey::Private(key)) => {
                let key = Ed25519SigningKey::from_bytes(key.0.as_bytes())?;
                Ok(match jwk.key_id() {
                    Some(kid) => key.with_key_id(kid),
                    None => key,
                })
            }
            JsonWebKeyType::Okp(OkpJsonWebKey::Public(_)) => {
                Err(FromJsonWebKeyError::NoPrivateKey)
            }
            _ => Err(FromJsonWebKeyError::WrongKeyType),
        }
    }
}

impl FromKey<&JsonWebKey> for Ed25519VerifyingKey {
    type Error = FromJsonWebKeyError;

    fn from_key(jwk: &JsonWebKey, alg: JsonWebSigningAlgorithm) -> Result<Self, Self::Error> {
        if alg != JsonWebSigningAlgorithm::EdDSA {
            return Err(InvalidSigningAlgorithmError.into());
        }
        match jwk.key_type() {
            JsonWebKeyType::Okp(OkpJsonWebKey::Public(key)) => {
                Ok(Ed25519VerifyingKey::from_bytes(key.0.as_bytes())?)
            }
            JsonWebKeyType::Okp(OkpJsonWebKey::Private(key)) => Ok(
                Ed25519VerifyingKey::from_bytes(key.0.verifying_key().as_bytes())?,
            ),
            _ => Err(FromJsonWebKeyError::WrongKeyType),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;
    use crate::base64_url::Base64UrlString;

    // the Ed25519 key pair from appendix A.1 of RFC 8037
    const PRIVATE_JSON: &str = r#"{
        "kty": "OKP",
        "crv": "Ed25519",
        "d": "nWGxne_9WmC6hEr0kuwsxERJxWl7MmkZcDusAxyuf2A",
        "x": "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"
    }"#;

    #[test]
    fn the_rfc_8037_thumbprint_is_reproduced() {
        // appendix A.3 of RFC 8037 lists the canonical form and the
        // SHA-256 thumbprint of the appendix A.1 key
        let key: Ed25519PrivateKey =
            serde_json::from_str(PRIVATE_JSON).expect("a valid private key");

        assert_eq!(
            key.thumbprint_prehashed(),
            r#"{"crv":"Ed25519","kty":"OKP","x":"11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"}"#
        );
        assert_eq!(
            Base64UrlString::encode(key.thumbprint_sha256()).as_str(),
            "kPrK_qmxVWaYVA9wwBF6Iuo3vVzz7TxHCTwXBygrS4k"
        );
    }

    #[test]
    fn mismatching_key_parts_are_rejected() {
        // x belongs to a different key than d
        let json = r#"{
            "kty": "OKP",
            "crv": "Ed25519",
            "d": "nWGxne_9WmC6hEr0kuwsxERJxWl7MmkZcDusAxyuf2A",
            "x": "ExHZwqC68IdcI5dUjZHkJHfDFhZGVVsgcpcFmS6zym4"
        }"#;

        let error = serde_json::from_str::<Ed25519PrivateKey>(json)
            .expect_err("a foreign public part must be rejected");
        assert!(error.to_string().contains("do not match"));
    }

    #[test]
    fn foreign_curves_are_rejected() {
        let json = r#"{
            "kty": "OKP",
            "crv": "X25519",
            "x": "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"
        }"#;

        let error = serde_json::from_str::<Ed25519PublicKey>(json)
            .expect_err("X25519 keys are not supported");
        assert!(error.to_string().contains("Invalid curve type"));
    }

    #[test]
    fn only_eddsa_converts_okp_keys() {
        let key: Ed25519PrivateKey =
            serde_json::from_str(PRIVATE_JSON).expect("a valid private key");
        let jwk = JsonWebKey::new(key);

        Ed25519SigningKey::from_key(&jwk, JsonWebSigningAlgorithm::EdDSA)
            .expect("an Ed25519 key signs EdDSA");

        let error = Ed25519SigningKey::from_key(
            &jwk,
            JsonWebSigningAlgorithm::Hmac(crate::jwa::Hmac::Hs256),
        )
        .expect_err("an Ed25519 key must not sign HS256");
        assert_eq!(
            error,
            FromJsonWebKeyError::InvalidAlgorithm(InvalidSigningAlgorithmError)
        );
    }
}
