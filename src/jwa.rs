//! Implementation of JSON Web Algorithms (JWA) as defined in [RFC 7518]
//!
//! [RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518>

mod aes_cbc_hs;
mod aes_gcm;
mod aes_kw;
mod deflate;
mod direct;
mod ecdh_es;
mod ecdsa;
mod hmac;
mod okp;
mod pbes2;
mod rsa;

use alloc::{borrow::Cow, string::String, vec::Vec};
use core::fmt;

use serde::{de::value::CowStrDeserializer, Deserialize, Serialize};
use thiserror::Error;

#[doc(inline)]
pub use self::{
    aes_cbc_hs::AesCbcHs,
    aes_gcm::{AesGcm, AesGcmKwKey},
    aes_kw::{AesKw, AesKwKey},
    direct::DirectKey,
    ecdh_es::{EcDhES, EcdhEsKey},
    ecdsa::{EcDSA, EcdsaSigningKey, EcdsaVerifyingKey},
    hmac::{Hmac, HmacKey},
    okp::{Ed25519SigningKey, Ed25519VerifyingKey},
    pbes2::{Pbes2, Pbes2Key},
    rsa::{
        RsaEncryption, RsaEncryptionKey, RsaSigning, RsaSigningKey, RsaVerifyingKey,
        RsaesOaep, RsassaPkcs1V1_5, RsassaPss,
    },
};

use crate::{
    sign::Signer,
    verify::{Verifier, VerifyError},
};

/// Either a JSON Web Algorithm for signing operations or an algorithm for
/// encryption operations. Possible values should be registered in the
/// [IANA `JSON Web Signature and Encryption Algorithms` registry][1].
///
/// [1]: <https://www.iana.org/assignments/jose/jose.xhtml#web-signature-encryption-algorithms>
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum JsonWebAlgorithm {
    /// Signing algorithm.
    Signing(JsonWebSigningAlgorithm),
    /// Encryption algorithm.
    Encryption(JsonWebEncryptionAlgorithm),
    /// Unknown algorithm.
    Other(String),
}

impl JsonWebAlgorithm {
    /// Turn this algorithm into a [`JsonWebKeyAlgorithm`].
    pub fn into_jwk_algorithm(self) -> JsonWebKeyAlgorithm {
        match self {
            Self::Signing(alg) => JsonWebKeyAlgorithm::Signing(alg),
            Self::Encryption(alg) => JsonWebKeyAlgorithm::Encryption(alg),
            Self::Other(alg) => JsonWebKeyAlgorithm::Other(alg),
        }
    }
}

impl<'de> Deserialize<'de> for JsonWebAlgorithm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let val = <Cow<'_, str> as Deserialize>::deserialize(deserializer)?;
        let deser = CowStrDeserializer::<'_, D::Error>::new(val.clone());

        let signing = <JsonWebSigningAlgorithm as Deserialize>::deserialize(deser.clone())?;
        let encryption = <JsonWebEncryptionAlgorithm as Deserialize>::deserialize(deser)?;

        if !matches!(signing, JsonWebSigningAlgorithm::Other(_)) {
            return Ok(Self::Signing(signing));
        }

        if !matches!(encryption, JsonWebEncryptionAlgorithm::Other(_)) {
            return Ok(Self::Encryption(encryption));
        }

        Ok(Self::Other(val.into_owned()))
    }
}

impl fmt::Display for JsonWebAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signing(alg) => alg.fmt(f),
            Self::Encryption(alg) => alg.fmt(f),
            Self::Other(alg) => f.write_str(alg),
        }
    }
}

/// Either a JSON Web Algorithm for signing operations, an algorithm for
/// encryption operations or an algorithm for content encryption
/// operations, as it may appear in the `alg` member of a JSON Web Key.
/// Possible values should be registered in the
/// [IANA `JSON Web Signature and Encryption Algorithms` registry][1].
///
/// [1]: <https://www.iana.org/assignments/jose/jose.xhtml#web-signature-encryption-algorithms>
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum JsonWebKeyAlgorithm {
    /// Signing algorithm.
    Signing(JsonWebSigningAlgorithm),
    /// Encryption algorithm.
    Encryption(JsonWebEncryptionAlgorithm),
    /// Content encryption algorithm.
    ContentEncryption(JsonWebContentEncryptionAlgorithm),
    /// Unknown algorithm.
    Other(String),
}

impl JsonWebKeyAlgorithm {
    /// Turn this algorithm into a [`JsonWebAlgorithm`], if possible.
    ///
    /// This will return [`None`] if the algorithm is a content encryption
    /// algorithm, which can never appear in the `alg` header parameter.
    pub fn into_jwa(self) -> Option<JsonWebAlgorithm> {
        match self {
            Self::Signing(alg) => Some(JsonWebAlgorithm::Signing(alg)),
            Self::Encryption(alg) => Some(JsonWebAlgorithm::Encryption(alg)),
            Self::ContentEncryption(..) => None,
            Self::Other(alg) => Some(JsonWebAlgorithm::Other(alg)),
        }
    }
}

impl<'de> Deserialize<'de> for JsonWebKeyAlgorithm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let val = <Cow<'_, str> as Deserialize>::deserialize(deserializer)?;
        let deser = CowStrDeserializer::<'_, D::Error>::new(val.clone());

        let signing = <JsonWebSigningAlgorithm as Deserialize>::deserialize(deser.clone())?;
        let encryption = <JsonWebEncryptionAlgorithm as Deserialize>::deserialize(deser.clone())?;
        let content = <JsonWebContentEncryptionAlgorithm as Deserialize>::deserialize(deser)?;

        if !matches!(signing, JsonWebSigningAlgorithm::Other(_)) {
            return Ok(Self::Signing(signing));
        }

        if !matches!(encryption, JsonWebEncryptionAlgorithm::Other(_)) {
            return Ok(Self::Encryption(encryption));
        }

        if !matches!(content, JsonWebContentEncryptionAlgorithm::Other(_)) {
            return Ok(Self::ContentEncryption(content));
        }

        Ok(Self::Other(val.into_owned()))
    }
}

impl fmt::Display for JsonWebKeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signing(alg) => alg.fmt(f),
            Self::Encryption(alg) => alg.fmt(f),
            Self::ContentEncryption(alg) => alg.fmt(f),
            Self::Other(alg) => f.write_str(alg),
        }
    }
}

/// A JSON Web Algorithm (JWA) for signing operations (JWS) as defined in
/// [RFC 7518 section 3]
///
/// This enum covers the `alg` Header Parameter Values for JWS. It
/// represents the table from [section 3.1].
///
/// [RFC 7518 section 3]: <https://datatracker.ietf.org/doc/html/rfc7518#section-3>
/// [section 3.1]: <https://datatracker.ietf.org/doc/html/rfc7518#section-3.1>
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum JsonWebSigningAlgorithm {
    /// HMAC with SHA-2 Functions
    Hmac(Hmac),
    /// Digital Signature with RSASSA-PKCS1-v1_5 or RSASSA-PSS
    Rsa(RsaSigning),
    /// Digital Signature with ECDSA
    EcDSA(EcDSA),
    /// Digital Signature with Edwards-curve Digital Signature Algorithm
    /// (EdDSA) as defined in [section 3.1 of RFC 8037]
    ///
    /// Note: `EdDSA` should not be confused with
    /// [`EcDSA`](JsonWebSigningAlgorithm::EcDSA).
    /// Also note that an EdDSA signature can either be made using
    /// `Ed25519` or `Ed448` but this information is not included.
    ///
    /// [section 3.1 of RFC 8037]: <https://datatracker.ietf.org/doc/html/rfc8037#section-3.1>
    EdDSA,
    /// The "none" algorithm as defined in [section 3.6 of RFC 7518].
    ///
    /// Using this algorithm essentially means that there is
    /// no integrity protection for the JWS.
    ///
    /// [section 3.6 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-3.6>
    None,
    /// JSON Web Algorithms that are not recognised by this
    /// implementation.
    ///
    /// If you want to implement custom algorithms via a custom
    /// [`Signer`](crate::Signer) and [`Verifier`](crate::Verifier) type,
    /// you should use this type to define an identifier for your
    /// algorithm.
    Other(String),
}

impl From<JsonWebSigningAlgorithm> for JsonWebAlgorithm {
    fn from(x: JsonWebSigningAlgorithm) -> Self {
        Self::Signing(x)
    }
}

impl From<JsonWebEncryptionAlgorithm> for JsonWebAlgorithm {
    fn from(x: JsonWebEncryptionAlgorithm) -> Self {
        Self::Encryption(x)
    }
}

impl_serde_jwa!(
    JsonWebSigningAlgorithm,
    [
        "HS256" => Self::Hmac(Hmac::Hs256); Self::Hmac(Hmac::Hs256),
        "HS384" => Self::Hmac(Hmac::Hs384); Self::Hmac(Hmac::Hs384),
        "HS512" => Self::Hmac(Hmac::Hs512); Self::Hmac(Hmac::Hs512),

        "RS256" => Self::Rsa(RsaSigning::RsPkcs1V1_5(RsassaPkcs1V1_5::Rs256)); Self::Rsa(RsaSigning::RsPkcs1V1_5(RsassaPkcs1V1_5::Rs256)),
        "RS384" => Self::Rsa(RsaSigning::RsPkcs1V1_5(RsassaPkcs1V1_5::Rs384)); Self::Rsa(RsaSigning::RsPkcs1V1_5(RsassaPkcs1V1_5::Rs384)),
        "RS512" => Self::Rsa(RsaSigning::RsPkcs1V1_5(RsassaPkcs1V1_5::Rs512)); Self::Rsa(RsaSigning::RsPkcs1V1_5(RsassaPkcs1V1_5::Rs512)),

        "ES256" => Self::EcDSA(EcDSA::Es256); Self::EcDSA(EcDSA::Es256),
        "ES384" => Self::EcDSA(EcDSA::Es384); Self::EcDSA(EcDSA::Es384),
        "ES512" => Self::EcDSA(EcDSA::Es512); Self::EcDSA(EcDSA::Es512),
        "ES256K" => Self::EcDSA(EcDSA::Es256K); Self::EcDSA(EcDSA::Es256K),

        "EdDSA" => Self::EdDSA; Self::EdDSA,

        "PS256" => Self::Rsa(RsaSigning::Pss(RsassaPss::Ps256)); Self::Rsa(RsaSigning::Pss(RsassaPss::Ps256)),
        "PS384" => Self::Rsa(RsaSigning::Pss(RsassaPss::Ps384)); Self::Rsa(RsaSigning::Pss(RsassaPss::Ps384)),
        "PS512" => Self::Rsa(RsaSigning::Pss(RsassaPss::Ps512)); Self::Rsa(RsaSigning::Pss(RsassaPss::Ps512)),

        "none" => Self::None; Self::None,
    ]
);

/// A JSON Web Algorithm (JWA) for encryption and decryption of the
/// Content Encryption Key (CEK) as defined in [RFC 7518 section 4]
///
/// This enum covers the `alg` Header Parameter Values for JWE. It
/// represents the table from [section 4.1].
///
/// [RFC 7518 section 4]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4>
/// [section 4.1]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.1>
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum JsonWebEncryptionAlgorithm {
    /// Key Encryption with RSAES-PKCS1-v1_5 as defined in [section 4.2]
    ///
    /// [section 4.2]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.2>
    Rsa1_5,
    /// Key Encryption with RSAES OAEP
    RsaesOaep(RsaesOaep),
    /// AES Key Wrap
    AesKw(AesKw),
    /// Direct use of a shared symmetric key as the CEK as defined in
    /// [section 4.5]
    ///
    /// [section 4.5]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.5>
    Direct,
    /// Elliptic Curve Diffie-Hellman Ephemeral Static (ECDH-ES)
    EcDhES(EcDhES),
    /// Key wrapping with AES GCM
    AesGcmKw(AesGcm),
    /// PBES2 Key Encryption
    Pbes2(Pbes2),
    /// JSON Web Algorithms that are not recognised by this
    /// implementation.
    ///
    /// If you want to implement custom algorithms for use in JSON Web
    /// Encryption, you should use this variant to identify your
    /// algorithm.
    ///
    /// Note: When you deserialize the `alg` header parameter via the
    /// [`JsonWebAlgorithm`] enum, this variant will probably never be
    /// constructed, because it matches [`JsonWebSigningAlgorithm::Other`]
    /// first.
    Other(String),
}

impl_serde_jwa!(
    JsonWebEncryptionAlgorithm,
    [
        "RSA1_5" => Self::Rsa1_5; Self::Rsa1_5,
        "RSA-OAEP" => Self::RsaesOaep(RsaesOaep::RsaesOaep); Self::RsaesOaep(RsaesOaep::RsaesOaep),
        "RSA-OAEP-256" => Self::RsaesOaep(RsaesOaep::RsaesOaep256); Self::RsaesOaep(RsaesOaep::RsaesOaep256),
        "A128KW" => Self::AesKw(AesKw::Aes128); Self::AesKw(AesKw::Aes128),
        "A192KW" => Self::AesKw(AesKw::Aes192); Self::AesKw(AesKw::Aes192),
        "A256KW" => Self::AesKw(AesKw::Aes256); Self::AesKw(AesKw::Aes256),
        "dir" => Self::Direct; Self::Direct,
        "ECDH-ES" => Self::EcDhES(EcDhES::Direct); Self::EcDhES(EcDhES::Direct),
        "ECDH-ES+A128KW" => Self::EcDhES(EcDhES::AesKw(AesKw::Aes128)); Self::EcDhES(EcDhES::AesKw(AesKw::Aes128)),
        "ECDH-ES+A192KW" => Self::EcDhES(EcDhES::AesKw(AesKw::Aes192)); Self::EcDhES(EcDhES::AesKw(AesKw::Aes192)),
        "ECDH-ES+A256KW" => Self::EcDhES(EcDhES::AesKw(AesKw::Aes256)); Self::EcDhES(EcDhES::AesKw(AesKw::Aes256)),
        "A128GCMKW" => Self::AesGcmKw(AesGcm::Aes128); Self::AesGcmKw(AesGcm::Aes128),
        "A192GCMKW" => Self::AesGcmKw(AesGcm::Aes192); Self::AesGcmKw(AesGcm::Aes192),
        "A256GCMKW" => Self::AesGcmKw(AesGcm::Aes256); Self::AesGcmKw(AesGcm::Aes256),
        "PBES2-HS256+A128KW" => Self::Pbes2(Pbes2::Hs256Aes128); Self::Pbes2(Pbes2::Hs256Aes128),
        "PBES2-HS384+A192KW" => Self::Pbes2(Pbes2::Hs384Aes192); Self::Pbes2(Pbes2::Hs384Aes192),
        "PBES2-HS512+A256KW" => Self::Pbes2(Pbes2::Hs512Aes256); Self::Pbes2(Pbes2::Hs512Aes256),
    ]
);

/// A JSON Web Algorithm (JWA) for content encryption and decryption of a
/// JWE as defined in [RFC 7518 section 5]
///
/// This enum covers the `enc` Header Parameter Values for JWE. It
/// represents the table from [section 5.1].
///
/// [RFC 7518 section 5]: <https://datatracker.ietf.org/doc/html/rfc7518#section-5>
/// [section 5.1]: <https://datatracker.ietf.org/doc/html/rfc7518#section-5.1>
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum JsonWebContentEncryptionAlgorithm {
    /// Content Encryption using AES in CBC mode with HMAC
    AesCbcHs(AesCbcHs),
    /// Content Encryption using AES GCM
    AesGcm(AesGcm),
    /// JSON Web Algorithms that are not recognised by this
    /// implementation.
    ///
    /// A JWE carrying this variant can be parsed but never encrypted or
    /// decrypted.
    Other(String),
}

impl_serde_jwa!(
    JsonWebContentEncryptionAlgorithm,
    [
        "A128CBC-HS256" => Self::AesCbcHs(AesCbcHs::Aes128CbcHs256); Self::AesCbcHs(AesCbcHs::Aes128CbcHs256),
        "A192CBC-HS384" => Self::AesCbcHs(AesCbcHs::Aes192CbcHs384); Self::AesCbcHs(AesCbcHs::Aes192CbcHs384),
        "A256CBC-HS512" => Self::AesCbcHs(AesCbcHs::Aes256CbcHs512); Self::AesCbcHs(AesCbcHs::Aes256CbcHs512),

        "A128GCM" => Self::AesGcm(AesGcm::Aes128); Self::AesGcm(AesGcm::Aes128),
        "A192GCM" => Self::AesGcm(AesGcm::Aes192); Self::AesGcm(AesGcm::Aes192),
        "A256GCM" => Self::AesGcm(AesGcm::Aes256); Self::AesGcm(AesGcm::Aes256),
    ]
);

impl JsonWebContentEncryptionAlgorithm {
    /// The size in bytes of the Content Encryption Key this algorithm
    /// requires, or `None` for algorithms this crate cannot perform.
    pub fn key_size(&self) -> Option<usize> {
        match self {
            Self::AesCbcHs(alg) => Some(alg.key_size()),
            Self::AesGcm(alg) => Some(alg.key_size()),
            Self::Other(_) => None,
        }
    }

    /// The size in bytes of the initialization vector this algorithm
    /// requires, or `None` for algorithms this crate cannot perform.
    pub fn iv_size(&self) -> Option<usize> {
        match self {
            Self::AesCbcHs(_) => Some(16),
            Self::AesGcm(_) => Some(12),
            Self::Other(_) => None,
        }
    }

    /// Encrypts `plaintext`, authenticating `aad` alongside it.
    ///
    /// # Errors
    ///
    /// Fails if the key or initialization vector has the wrong size for
    /// this algorithm, or if the algorithm is not supported.
    pub fn encrypt(
        &self,
        key: &[u8],
        iv: &[u8],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<AuthenticatedCiphertext, ContentEncryptionError> {
        match self {
            Self::AesCbcHs(alg) => alg.encrypt(key, iv, plaintext, aad),
            Self::AesGcm(alg) => alg.encrypt_content(key, iv, plaintext, aad),
            Self::Other(name) => Err(ContentEncryptionError::Unsupported(name.clone())),
        }
    }

    /// Decrypts `ciphertext` after verifying the authentication `tag`
    /// over it and `aad`.
    ///
    /// # Errors
    ///
    /// Fails if the tag does not match, if the key or initialization
    /// vector has the wrong size, or if the algorithm is not supported.
    pub fn decrypt(
        &self,
        key: &[u8],
        iv: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>, ContentEncryptionError> {
        match self {
            Self::AesCbcHs(alg) => alg.decrypt(key, iv, ciphertext, tag, aad),
            Self::AesGcm(alg) => alg.decrypt_content(key, iv, ciphertext, tag, aad),
            Self::Other(name) => Err(ContentEncryptionError::Unsupported(name.clone())),
        }
    }
}

/// A compression algorithm from the `zip` parameter registry of
/// [section 7.3 of RFC 7516], applied to the plaintext of a JWE before
/// encryption.
///
/// [section 7.3 of RFC 7516]: <https://datatracker.ietf.org/doc/html/rfc7516#section-7.3>
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum JsonWebCompressionAlgorithm {
    /// The DEFLATE algorithm as defined in [RFC 1951].
    ///
    /// [RFC 1951]: <https://datatracker.ietf.org/doc/html/rfc1951>
    Deflate,
    /// A compression algorithm not recognised by this implementation.
    ///
    /// A JWE carrying this variant can be parsed but never encrypted or
    /// decrypted.
    Other(String),
}

impl_serde_jwa!(
    JsonWebCompressionAlgorithm,
    [
        "DEF" => Self::Deflate; Self::Deflate,
    ]
);

impl JsonWebCompressionAlgorithm {
    /// Compresses `data`.
    ///
    /// # Errors
    ///
    /// Fails if the algorithm is not supported.
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        match self {
            Self::Deflate => Ok(deflate::compress(data)),
            Self::Other(name) => Err(CompressionError::Unsupported(name.clone())),
        }
    }

    /// Decompresses `data`.
    ///
    /// # Errors
    ///
    /// Fails if the data is malformed, if the output grows beyond the
    /// size limit or if the algorithm is not supported.
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        match self {
            Self::Deflate => deflate::decompress(data),
            Self::Other(name) => Err(CompressionError::Unsupported(name.clone())),
        }
    }
}

/// Ciphertext and authentication tag produced by an authenticated
/// content encryption.
#[derive(Debug)]
pub struct AuthenticatedCiphertext {
    /// The encrypted content.
    pub ciphertext: Vec<u8>,
    /// The tag authenticating the ciphertext together with the
    /// additional authenticated data.
    pub tag: Vec<u8>,
}

/// Errors returned by the content encryption algorithms.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentEncryptionError {
    /// The Content Encryption Key has the wrong size for the algorithm.
    #[error("the content encryption key must be {expected} bytes for this algorithm but {actual} bytes were supplied")]
    InvalidKeyLength {
        /// The key size the algorithm requires.
        expected: usize,
        /// The size of the supplied key.
        actual: usize,
    },
    /// The initialization vector has the wrong size for the algorithm.
    #[error("the initialization vector must be {expected} bytes for this algorithm but {actual} bytes were supplied")]
    InvalidIvLength {
        /// The initialization vector size the algorithm requires.
        expected: usize,
        /// The size of the supplied initialization vector.
        actual: usize,
    },
    /// The ciphertext is not authentic. The authentication tag did not
    /// match, or the ciphertext is malformed.
    #[error("message authentication failed")]
    Authentication,
    /// The underlying implementation rejected the encryption operation,
    /// for example because the plaintext is too large.
    #[error("content encryption failed")]
    Encrypt,
    /// The algorithm is not supported by this crate.
    #[error("the `{0}` content encryption algorithm is not supported")]
    Unsupported(String),
}

/// Errors returned by the compression algorithms.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompressionError {
    /// The compressed data is malformed.
    #[error("the compressed data is malformed")]
    Malformed,
    /// The decompressed data would exceed the size limit.
    #[error("the decompressed data exceeds the size limit")]
    TooLarge,
    /// The algorithm is not supported by this crate.
    #[error("the `{0}` compression algorithm is not supported")]
    Unsupported(String),
}

/// Error returned by [`derive_algorithm`].
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeriveAlgorithmError {
    /// Neither the header nor the key carry an algorithm.
    #[error("neither the header nor the key specify an algorithm")]
    Missing,
    /// Header and key carry different algorithms.
    #[error("the `alg` header parameter and the algorithm of the key differ")]
    Mismatch,
}

/// Determines the algorithm to use from the `alg` header parameter of a
/// token and the `alg` member of the key that is meant to process it.
///
/// If both are present they must agree. If only one is present it wins.
///
/// # Errors
///
/// Returns an error if both are absent or if they disagree.
pub fn derive_algorithm(
    header: Option<&JsonWebAlgorithm>,
    key: Option<&JsonWebAlgorithm>,
) -> Result<JsonWebAlgorithm, DeriveAlgorithmError> {
    match (header, key) {
        (Some(h), Some(k)) if h == k => Ok(h.clone()),
        (Some(_), Some(_)) => Err(DeriveAlgorithmError::Mismatch),
        (Some(h), None) => Ok(h.clone()),
        (None, Some(k)) => Ok(k.clone()),
        (None, None) => Err(DeriveAlgorithmError::Missing),
    }
}

/// Unit error for a failed draw from the operating system random number
/// generator.
#[derive(Debug)]
pub(crate) struct RngError;

/// Draws `len` bytes from the operating system CSPRNG.
pub(crate) fn random_bytes(len: usize) -> Result<Vec<u8>, RngError> {
    use rand_core::RngCore as _;

    let mut buf = alloc::vec![0_u8; len];
    rand_core::OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|_| RngError)?;
    Ok(buf)
}

/// The `none` algorithm as defined in [section 3.6 of RFC 7518].
///
/// Signing produces an empty signature, verifying merely checks that the
/// signature is empty. Nothing protects the integrity of such a token,
/// so this type is never selected implicitly. Processing a token with
/// `"alg": "none"` requires an instance of this struct, and the
/// [`StandardPolicy`](crate::policy::StandardPolicy) refuses keys that
/// announce it.
///
/// [section 3.6 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-3.6>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoneAlgorithm;

impl Signer for NoneAlgorithm {
    fn sign(&self, _msg: &[u8]) -> Result<Vec<u8>, signature::Error> {
        Ok(Vec::new())
    }

    fn algorithm(&self) -> JsonWebSigningAlgorithm {
        JsonWebSigningAlgorithm::None
    }
}

impl Verifier for NoneAlgorithm {
    fn verify(&self, _msg: &[u8], signature: &[u8]) -> Result<(), VerifyError> {
        if signature.is_empty() {
            Ok(())
        } else {
            Err(VerifyError::InvalidSignature)
        }
    }

    fn algorithm(&self) -> JsonWebSigningAlgorithm {
        JsonWebSigningAlgorithm::None
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn test_others_not_stealing() {
        let jwa: JsonWebAlgorithm =
            serde_json::from_value(serde_json::Value::String("dir".to_string())).unwrap();
        assert!(matches!(
            jwa,
            JsonWebAlgorithm::Encryption(JsonWebEncryptionAlgorithm::Direct)
        ));
    }

    #[test]
    fn unknown_names_survive_round_trips() {
        let jwa: JsonWebAlgorithm =
            serde_json::from_value(serde_json::Value::String("X-CUSTOM".to_string())).unwrap();
        assert_eq!(jwa, JsonWebAlgorithm::Other("X-CUSTOM".to_string()));
        assert_eq!(serde_json::to_string(&jwa).unwrap(), r#""X-CUSTOM""#);
    }

    #[test]
    fn content_encryption_goes_to_the_jwk_algorithm() {
        let alg: JsonWebKeyAlgorithm =
            serde_json::from_value(serde_json::Value::String("A128GCM".to_string())).unwrap();
        assert!(matches!(
            alg,
            JsonWebKeyAlgorithm::ContentEncryption(JsonWebContentEncryptionAlgorithm::AesGcm(
                AesGcm::Aes128
            ))
        ));
        assert!(alg.into_jwa().is_none());
    }

    #[test]
    fn derive_algorithm_resolution() {
        let hs256 = JsonWebAlgorithm::Signing(JsonWebSigningAlgorithm::Hmac(Hmac::Hs256));
        let hs384 = JsonWebAlgorithm::Signing(JsonWebSigningAlgorithm::Hmac(Hmac::Hs384));

        assert_eq!(derive_algorithm(Some(&hs256), None), Ok(hs256.clone()));
        assert_eq!(derive_algorithm(None, Some(&hs256)), Ok(hs256.clone()));
        assert_eq!(
            derive_algorithm(Some(&hs256), Some(&hs256)),
            Ok(hs256.clone())
        );
        assert_eq!(
            derive_algorithm(Some(&hs256), Some(&hs384)),
            Err(DeriveAlgorithmError::Mismatch)
        );
        assert_eq!(derive_algorithm(None, None), Err(DeriveAlgorithmError::Missing));
    }
}
