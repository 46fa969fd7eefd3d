//! Symmetric keys, the `oct` key type of [section 6.4 of RFC 7518]
//!
//! [section 6.4 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-6.4>

use alloc::{string::String, vec::Vec};

use serde::{de::Error, Deserialize, Deserializer, Serialize};

use super::{
    thumbprint::{self, Thumbprint},
    FromJsonWebKeyError, JsonWebKey, JsonWebKeyType,
};
use crate::{
    base64_url::Base64UrlBytes,
    jwa::{HmacKey, JsonWebSigningAlgorithm},
    sign::{FromKey, InvalidSigningAlgorithmError},
};

/// A symmetric key as defined in [section 6.4 of RFC 7518]
///
/// [section 6.4 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-6.4>
#[non_exhaustive]
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymmetricJsonWebKey {
    /// The `oct` key type
    OctetSequence(OctetSequence),
}

impl crate::sealed::Sealed for SymmetricJsonWebKey {}
impl Thumbprint for SymmetricJsonWebKey {
    fn thumbprint_prehashed(&self) -> String {
        match self {
            SymmetricJsonWebKey::OctetSequence(key) => key.thumbprint_prehashed(),
        }
    }
}

/// A raw octet sequence, used as the key for the HMAC, AES and PBES2
/// based algorithms ([section 6.4.1 of RFC 7518])
///
/// [section 6.4.1 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-6.4.1>
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct OctetSequence(Base64UrlBytes);

impl OctetSequence {
    /// Creates an octet sequence from raw bytes.
    pub fn new(x: impl Into<Vec<u8>>) -> Self {
        Self(Base64UrlBytes(x.into()))
    }

    /// Returns the number of bytes that are in this octet sequence.
    #[inline]
    pub fn len(&self) -> usize {
        self.0 .0.len()
    }

    /// Returns `true` if this octet sequence has a length of zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw key bytes.
    ///
    /// Use this to feed the key into one of the symmetric key types of
    /// the [`jwa`](crate::jwa) module, for example
    /// [`DirectKey`](crate::jwa::DirectKey) or
    /// [`AesKwKey`](crate::jwa::AesKwKey).
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0 .0
    }
}

impl crate::sealed::Sealed for OctetSequence {}
impl Thumbprint for OctetSequence {
    fn thumbprint_prehashed(&self) -> String {
        thumbprint::serialize_key_thumbprint(self)
    }
}

impl From<SymmetricJsonWebKey> for JsonWebKeyType {
    fn from(x: SymmetricJsonWebKey) -> Self {
        JsonWebKeyType::Symmetric(x)
    }
}

impl From<OctetSequence> for JsonWebKeyType {
    fn from(x: OctetSequence) -> Self {
        JsonWebKeyType::Symmetric(SymmetricJsonWebKey::OctetSequence(x))
    }
}

impl<'de> Deserialize<'de> for OctetSequence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Repr {
            kty: String,
            k: Base64UrlBytes,
        }

        let repr = Repr::deserialize(deserializer)?;
        if repr.kty != "oct" {
            return Err(D::Error::custom("`kty` field is required to be `oct`"));
        }

        Ok(Self(repr.k))
    }
}

impl Serialize for OctetSequence {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        struct Repr<'a> {
            kty: &'static str,
            k: &'a Base64UrlBytes,
        }
        Repr {
            kty: "oct",
            k: &self.0,
        }
        .serialize(serializer)
    }
}

/// An error that can occur when creating an [`HmacKey`] from an
/// [`OctetSequence`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FromOctetSequenceError {
    /// An invalid signing algorithm was used
    #[error(transparent)]
    InvalidSigningAlgorithm(#[from] InvalidSigningAlgorithmError),
    /// The key is shorter than the output of the digest it would be
    /// used with
    #[error("the key is shorter than the output size of the chosen digest")]
    InvalidLength,
}

impl From<FromOctetSequenceError> for FromJsonWebKeyError {
    fn from(e: FromOctetSequenceError) -> Self {
        match e {
            FromOctetSequenceError::InvalidSigningAlgorithm(e) => Self::InvalidAlgorithm(e),
            FromOctetSequenceError::InvalidLength => Self::KeyTooShort,
        }
    }
}

impl FromKey<&OctetSequence> for HmacKey {
    type Error = FromOctetSequenceError;

    fn from_key(key: &OctetSequence, alg: JsonWebSigningAlgorithm) -> Result<Self, Self::Error> {
        match alg {
            JsonWebSigningAlgorithm::Hmac(variant) => {
                // not required for HMAC itself, but RFC 7518 section 3.2
                // forbids keys shorter than the digest output
                if key.len() < variant.output_size() {
                    return Err(FromOctetSequenceError::InvalidLength);
                }

                Ok(HmacKey::new(key.as_bytes(), variant))
            }
            _ => Err(FromOctetSequenceError::InvalidSigningAlgorithm(
                InvalidSigningAlgorithmError,
            )),
        }
    }
}

impl FromKey<&JsonWebKey> for HmacKey {
    type Error = FromJsonWebKeyError;

    fn from_key(jwk: &JsonWebKey, alg: JsonWebSigningAlgorithm) -> Result<Self, Self::Error> {
        match jwk.key_type() {
            JsonWebKeyType::Symmetric(SymmetricJsonWebKey::OctetSequence(key)) => {
                let key = HmacKey::from_key(key, alg)?;
                Ok(match jwk.key_id() {
                    Some(kid) => key.with_key_id(kid),
                    None => key,
                })
            }
            _ => Err(FromJsonWebKeyError::WrongKeyType),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;
    use crate::jwa::Hmac;

    #[test]
    fn oct_keys_round_trip() {
        let json = r#"{"kty":"oct","k":"GawgguFyGrWKav7AX4VKUg"}"#;
        let key: OctetSequence = serde_json::from_str(json).expect("a valid oct key");
        assert_eq!(key.len(), 16);

        let serialized = serde_json::to_string(&key).expect("serialization does not fail");
        assert_eq!(serialized, json);
    }

    #[test]
    fn the_kty_member_is_checked() {
        let error = serde_json::from_str::<OctetSequence>(
            r#"{"kty":"EC","k":"GawgguFyGrWKav7AX4VKUg"}"#,
        )
        .expect_err("an EC kty must not parse as an octet sequence");
        assert!(error.to_string().contains("oct"));
    }

    #[test]
    fn short_hmac_keys_are_rejected() {
        // 16 bytes, shorter than the 32 byte SHA-256 output
        let key = OctetSequence::new([0x61; 16]);
        let error = HmacKey::from_key(&key, JsonWebSigningAlgorithm::Hmac(Hmac::Hs256))
            .expect_err("a 16 byte key must not be used with HS256");
        assert_eq!(error, FromOctetSequenceError::InvalidLength);

        let key = OctetSequence::new([0x61; 32]);
        HmacKey::from_key(&key, JsonWebSigningAlgorithm::Hmac(Hmac::Hs256))
            .expect("a 32 byte key is long enough for HS256");
    }

    #[test]
    fn non_hmac_algorithms_are_rejected() {
        let key = OctetSequence::new([0x61; 32]);
        let error = HmacKey::from_key(&key, JsonWebSigningAlgorithm::EdDSA)
            .expect_err("an octet sequence is no EdDSA key");
        assert!(matches!(
            error,
            FromOctetSequenceError::InvalidSigningAlgorithm(_)
        ));
    }
}
