//! Elliptic curve keys, the `EC` key type of [section 6.2 of RFC 7518]
//!
//! [section 6.2 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-6.2>

use alloc::{string::String, vec::Vec};

use serde::{Deserialize, Serialize};

use super::{thumbprint::Thumbprint, FromJsonWebKeyError, JsonWebKey, JsonWebKeyType};
use crate::{
    jwa::{EcDSA, EcdsaSigningKey, EcdsaVerifyingKey, JsonWebSigningAlgorithm},
    sign::{FromKey, InvalidSigningAlgorithmError},
};

// Generates the JWK (de)serialization, thumbprint and conversion impls
// for one curve. `x`, `y` and `d` are fixed-width big endian field
// elements, RFC 7518 section 6.2.1.2 requires them zero padded to the
// full field size.
macro_rules! impl_serde_ec {
    ($public:ident, $private:ident, $crv:literal, $kty:literal, $curve:ty, $variant:ident) => {
        impl $public {
            /// Creates a JWK representation of the given public key.
            pub fn new(key: elliptic_curve::PublicKey<$curve>) -> Self {
                Self(key)
            }

            /// The wrapped key in the representation of the curve's crate.
            pub fn into_inner(self) -> elliptic_curve::PublicKey<$curve> {
                self.0
            }

            // uncompressed SEC1 encoding, `0x04 || x || y`
            pub(crate) fn sec1_bytes(&self) -> alloc::vec::Vec<u8> {
                elliptic_curve::sec1::ToEncodedPoint::to_encoded_point(&self.0, false)
                    .as_bytes()
                    .to_vec()
            }
        }

        impl $private {
            /// Creates a JWK representation of the given secret key.
            pub fn new(key: elliptic_curve::SecretKey<$curve>) -> Self {
                Self(key)
            }

            /// The public key corresponding to this private key.
            pub fn to_public_key(&self) -> $public {
                $public(self.0.public_key())
            }

            /// The wrapped key in the representation of the curve's crate.
            pub fn into_inner(self) -> elliptic_curve::SecretKey<$curve> {
                self.0
            }

            pub(crate) fn scalar_bytes(&self) -> alloc::vec::Vec<u8> {
                self.0.to_bytes().to_vec()
            }
        }

        impl From<elliptic_curve::PublicKey<$curve>> for $public {
            fn from(key: elliptic_curve::PublicKey<$curve>) -> Self {
                Self(key)
            }
        }

        impl From<elliptic_curve::SecretKey<$curve>> for $private {
            fn from(key: elliptic_curve::SecretKey<$curve>) -> Self {
                Self(key)
            }
        }

        impl From<$public> for crate::jwk::ec::EcPublic {
            fn from(key: $public) -> Self {
                Self::$variant(key)
            }
        }

        impl From<$private> for crate::jwk::ec::EcPrivate {
            fn from(key: $private) -> Self {
                Self::$variant(key)
            }
        }

        impl From<$public> for crate::jwk::JsonWebKeyType {
            fn from(key: $public) -> Self {
                Self::Ec(crate::jwk::ec::EcJsonWebKey::Public(
                    crate::jwk::ec::EcPublic::$variant(key),
                ))
            }
        }

        impl From<$private> for crate::jwk::JsonWebKeyType {
            fn from(key: $private) -> Self {
                Self::Ec(crate::jwk::ec::EcJsonWebKey::Private(
                    crate::jwk::ec::EcPrivate::$variant(key),
                ))
            }
        }

        impl crate::sealed::Sealed for $public {}
        impl crate::jwk::Thumbprint for $public {
            fn thumbprint_prehashed(&self) -> alloc::string::String {
                crate::jwk::thumbprint::serialize_key_thumbprint(self)
            }
        }

        impl crate::sealed::Sealed for $private {}
        impl crate::jwk::Thumbprint for $private {
            // RFC 7638 hashes the required public members only, `d` never
            // contributes
            fn thumbprint_prehashed(&self) -> alloc::string::String {
                self.to_public_key().thumbprint_prehashed()
            }
        }

        impl serde::Serialize for $public {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                #[derive(serde::Serialize)]
                struct Repr {
                    kty: &'static str,
                    crv: &'static str,
                    x: crate::base64_url::Base64UrlBytes,
                    y: crate::base64_url::Base64UrlBytes,
                }

                let point =
                    elliptic_curve::sec1::ToEncodedPoint::to_encoded_point(&self.0, false);
                let (x, y) = match point.coordinates() {
                    elliptic_curve::sec1::Coordinates::Uncompressed { x, y } => (x, y),
                    _ => unreachable!("an uncompressed point carries both coordinates"),
                };

                Repr {
                    kty: $kty,
                    crv: $crv,
                    x: crate::base64_url::Base64UrlBytes(x.to_vec()),
                    y: crate::base64_url::Base64UrlBytes(y.to_vec()),
                }
                .serialize(serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $public {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                use serde::de::Error;

                #[derive(serde::Deserialize)]
                struct Repr {
                    kty: alloc::string::String,
                    crv: alloc::string::String,
                    x: crate::base64_url::Base64UrlBytes,
                    y: crate::base64_url::Base64UrlBytes,
                }

                let repr = Repr::deserialize(deserializer)?;
                crate::jwk::ec::check_kty_and_crv::<D>(&repr.kty, $kty, &repr.crv, $crv)?;

                let size = <<$curve as elliptic_curve::Curve>::FieldBytesSize as
                    typenum::Unsigned>::USIZE;
                crate::jwk::ec::check_field_len::<D>(repr.x.0.len(), size)?;
                crate::jwk::ec::check_field_len::<D>(repr.y.0.len(), size)?;

                let mut sec1 = alloc::vec::Vec::with_capacity(1 + size * 2);
                sec1.push(0x04);
                sec1.extend_from_slice(&repr.x.0);
                sec1.extend_from_slice(&repr.y.0);

                let key = elliptic_curve::PublicKey::from_sec1_bytes(&sec1).map_err(|_| {
                    D::Error::custom("the `x` and `y` members are no valid point on the curve")
                })?;
                Ok(Self(key))
            }
        }

        impl serde::Serialize for $private {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                #[derive(serde::Serialize)]
                struct Repr {
                    kty: &'static str,
                    crv: &'static str,
                    x: crate::base64_url::Base64UrlBytes,
                    y: crate::base64_url::Base64UrlBytes,
                    d: crate::base64_url::Base64UrlBytes,
                }

                let public = self.0.public_key();
                let point =
                    elliptic_curve::sec1::ToEncodedPoint::to_encoded_point(&public, false);
                let (x, y) = match point.coordinates() {
                    elliptic_curve::sec1::Coordinates::Uncompressed { x, y } => (x, y),
                    _ => unreachable!("an uncompressed point carries both coordinates"),
                };

                Repr {
                    kty: $kty,
                    crv: $crv,
                    x: crate::base64_url::Base64UrlBytes(x.to_vec()),
                    y: crate::base64_url::Base64UrlBytes(y.to_vec()),
                    d: crate::base64_url::Base64UrlBytes(self.0.to_bytes().to_vec()),
                }
                .serialize(serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $private {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                use serde::de::Error;

                #[derive(serde::Deserialize)]
                struct Repr {
                    kty: alloc::string::String,
                    crv: alloc::string::String,
                    x: crate::base64_url::Base64UrlBytes,
                    y: crate::base64_url::Base64UrlBytes,
                    d: crate::base64_url::Base64UrlBytes,
                }

                let repr = Repr::deserialize(deserializer)?;
                crate::jwk::ec::check_kty_and_crv::<D>(&repr.kty, $kty, &repr.crv, $crv)?;

                let size = <<$curve as elliptic_curve::Curve>::FieldBytesSize as
                    typenum::Unsigned>::USIZE;
                crate::jwk::ec::check_field_len::<D>(repr.x.0.len(), size)?;
                crate::jwk::ec::check_field_len::<D>(repr.y.0.len(), size)?;
                crate::jwk::ec::check_field_len::<D>(repr.d.0.len(), size)?;

                let secret = elliptic_curve::SecretKey::<$curve>::from_slice(&repr.d.0)
                    .map_err(|_| D::Error::custom("`d` is no valid scalar for the curve"))?;

                let public = secret.public_key();
                let point =
                    elliptic_curve::sec1::ToEncodedPoint::to_encoded_point(&public, false);
                let matches = match point.coordinates() {
                    elliptic_curve::sec1::Coordinates::Uncompressed { x, y } => {
                        x.as_slice() == repr.x.0 && y.as_slice() == repr.y.0
                    }
                    _ => false,
                };
                if !matches {
                    return Err(D::Error::custom(
                        "the `x` and `y` members do not match the private key",
                    ));
                }

                Ok(Self(secret))
            }
        }
    };
}

mod p256;
mod p384;
mod p521;
mod secp256k1;

pub use self::{
    p256::{P256PrivateKey, P256PublicKey},
    p384::{P384PrivateKey, P384PublicKey},
    p521::{P521PrivateKey, P521PublicKey},
    secp256k1::{Secp256k1PrivateKey, Secp256k1PublicKey},
};

fn check_kty_and_crv<'de, D>(
    kty: &str,
    expected_kty: &str,
    crv: &str,
    expected_crv: &str,
) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    if crv != expected_crv {
        return Err(D::Error::custom(alloc::format!(
            "Invalid curve type `{crv}`. Expected `{expected_crv}`"
        )));
    }
    if kty != expected_kty {
        return Err(D::Error::custom(alloc::format!(
            "Invalid key type `{kty}`. Expected `{expected_kty}`"
        )));
    }
    Ok(())
}

fn check_field_len<'de, D>(len: usize, expected: usize) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    if len != expected {
        let expected = alloc::format!("a base64url encoded {expected} byte field element");
        return Err(D::Error::invalid_length(len, &expected.as_str()));
    }
    Ok(())
}

/// An elliptic curve key as defined in [section 6.2 of RFC 7518]
///
/// [section 6.2 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-6.2>
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
// Private stays before Public: the public repr also accepts the JSON of a
// private key and would silently drop `d`.
pub enum EcJsonWebKey {
    /// A key carrying the private `d` member
    Private(EcPrivate),
    /// A key carrying the public coordinates only
    Public(EcPublic),
}

impl crate::sealed::Sealed for EcJsonWebKey {}
impl Thumbprint for EcJsonWebKey {
    fn thumbprint_prehashed(&self) -> String {
        match self {
            EcJsonWebKey::Private(key) => key.thumbprint_prehashed(),
            EcJsonWebKey::Public(key) => key.thumbprint_prehashed(),
        }
    }
}

/// The public part of an elliptic curve key
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EcPublic {
    /// A public key on the P-256 curve
    P256(P256PublicKey),
    /// A public key on the P-384 curve
    P384(P384PublicKey),
    /// A public key on the P-521 curve
    P521(P521PublicKey),
    /// A public key on the secp256k1 curve
    Secp256k1(Secp256k1PublicKey),
}

impl crate::sealed::Sealed for EcPublic {}
impl Thumbprint for EcPublic {
    fn thumbprint_prehashed(&self) -> String {
        match self {
            EcPublic::P256(key) => key.thumbprint_prehashed(),
            EcPublic::P384(key) => key.thumbprint_prehashed(),
            EcPublic::P521(key) => key.thumbprint_prehashed(),
            EcPublic::Secp256k1(key) => key.thumbprint_prehashed(),
        }
    }
}

/// The private part of an elliptic curve key
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EcPrivate {
    /// A private key on the P-256 curve
    P256(P256PrivateKey),
    /// A private key on the P-384 curve
    P384(P384PrivateKey),
    /// A private key on the P-521 curve
    P521(P521PrivateKey),
    /// A private key on the secp256k1 curve
    Secp256k1(Secp256k1PrivateKey),
}

impl crate::sealed::Sealed for EcPrivate {}
impl Thumbprint for EcPrivate {
    fn thumbprint_prehashed(&self) -> String {
        match self {
            EcPrivate::P256(key) => key.thumbprint_prehashed(),
            EcPrivate::P384(key) => key.thumbprint_prehashed(),
            EcPrivate::P521(key) => key.thumbprint_prehashed(),
            EcPrivate::Secp256k1(key) => key.thumbprint_prehashed(),
        }
    }
}

impl EcPrivate {
    /// The public part corresponding to this private key.
    pub fn to_public(&self) -> EcPublic {
        match self {
            EcPrivate::P256(key) => EcPublic::P256(key.to_public_key()),
            EcPrivate::P384(key) => EcPublic::P384(key.to_public_key()),
            EcPrivate::P521(key) => EcPublic::P521(key.to_public_key()),
            EcPrivate::Secp256k1(key) => EcPublic::Secp256k1(key.to_public_key()),
        }
    }
}

impl From<EcPublic> for EcJsonWebKey {
    fn from(key: EcPublic) -> Self {
        Self::Public(key)
    }
}

impl From<EcPrivate> for EcJsonWebKey {
    fn from(key: EcPrivate) -> Self {
        Self::Private(key)
    }
}

impl From<EcJsonWebKey> for JsonWebKeyType {
    fn from(key: EcJsonWebKey) -> Self {
        Self::Ec(key)
    }
}

impl From<EcPublic> for JsonWebKeyType {
    fn from(key: EcPublic) -> Self {
        Self::Ec(EcJsonWebKey::Public(key))
    }
}

impl From<EcPrivate> for JsonWebKeyType {
    fn from(key: EcPrivate) -> Self {
        Self::Ec(EcJsonWebKey::Private(key))
    }
}

impl FromKey<&JsonWebKey> for EcdsaSigningKey {
    type Error = FromJsonWebKeyError;

    fn from_key(jwk: &JsonWebKey, alg: JsonWebSigningAlgorithm) -> Result<Self, Self::Error> {
        let JsonWebSigningAlgorithm::EcDSA(variant) = alg else {
            return Err(InvalidSigningAlgorithmError.into());
        };
        let key = match jwk.key_type() {
            JsonWebKeyType::Ec(EcJsonWebKey::Private(key)) => key,
            JsonWebKeyType::Ec(EcJsonWebKey::Public(_)) => {
                return Err(FromJsonWebKeyError::NoPrivateKey)
            }
            _ => return Err(FromJsonWebKeyError::WrongKeyType),
        };

        let d: Vec<u8> = match (variant, key) {
            (EcDSA::Es256, EcPrivate::P256(key)) => key.scalar_bytes(),
            (EcDSA::Es384, EcPrivate::P384(key)) => key.scalar_bytes(),
            (EcDSA::Es512, EcPrivate::P521(key)) => key.scalar_bytes(),
            (EcDSA::Es256K, EcPrivate::Secp256k1(key)) => key.scalar_bytes(),
            _ => return Err(FromJsonWebKeyError::CurveMismatch),
        };

        let key = EcdsaSigningKey::from_secret_bytes(variant, &d)?;
        Ok(match jwk.key_id() {
            Some(kid) => key.with_key_id(kid),
            None => key,
        })
    }
}

impl FromKey<&JsonWebKey> for EcdsaVerifyingKey {
    type Error = FromJsonWebKeyError;

    fn from_key(jwk: &JsonWebKey, alg: JsonWebSigningAlgorithm) -> Result<Self, Self::Error> {
        let JsonWebSigningAlgorithm::EcDSA(variant) = alg else {
            return Err(InvalidSigningAlgorithmError.into());
        };
        let key = match jwk.key_type() {
            JsonWebKeyType::Ec(key) => key,
            _ => return Err(FromJsonWebKeyError::WrongKeyType),
        };

        // verification only needs the public half, which a private key can
        // provide as well
        use self::{EcJsonWebKey::*, EcPrivate as Sec, EcPublic as Pub};
        let sec1: Vec<u8> = match (variant, key) {
            (EcDSA::Es256, Public(Pub::P256(key))) => key.sec1_bytes(),
            (EcDSA::Es256, Private(Sec::P256(key))) => key.to_public_key().sec1_bytes(),
            (EcDSA::Es384, Public(Pub::P384(key))) => key.sec1_bytes(),
            (EcDSA::Es384, Private(Sec::P384(key))) => key.to_public_key().sec1_bytes(),
            (EcDSA::Es512, Public(Pub::P521(key))) => key.sec1_bytes(),
            (EcDSA::Es512, Private(Sec::P521(key))) => key.to_public_key().sec1_bytes(),
            (EcDSA::Es256K, Public(Pub::Secp256k1(key))) => key.sec1_bytes(),
            (EcDSA::Es256K, Private(Sec::Secp256k1(key))) => key.to_public_key().sec1_bytes(),
            _ => return Err(FromJsonWebKeyError::CurveMismatch),
        };

        Ok(EcdsaVerifyingKey::from_sec1_bytes(variant, &sec1)?)
    }
}
