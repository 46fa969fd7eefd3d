//! Implementation of JSON Web Key (JWK) as defined in [RFC 7517]
//!
//! [RFC 7517]: <https://www.rfc-editor.org/rfc/rfc7517.html>

mod ec;
mod okp;
mod rsa;
mod set;
mod symmetric;
mod thumbprint;

use alloc::{format, string::String, vec::Vec};

use hashbrown::HashSet;
use serde::{de::Error, Deserialize, Deserializer, Serialize};

pub use self::{
    ec::{
        EcJsonWebKey, EcPrivate, EcPublic, P256PrivateKey, P256PublicKey, P384PrivateKey,
        P384PublicKey, P521PrivateKey, P521PublicKey, Secp256k1PrivateKey, Secp256k1PublicKey,
    },
    okp::{Ed25519PrivateKey, Ed25519PublicKey, OkpJsonWebKey},
    rsa::RsaJsonWebKey,
    set::JsonWebKeySet,
    symmetric::{FromOctetSequenceError, OctetSequence, SymmetricJsonWebKey},
    thumbprint::Thumbprint,
};
use crate::{
    base64_url::Base64UrlString,
    jwa::JsonWebKeyAlgorithm,
    policy::{Checkable, Checked, Policy},
    sign::InvalidSigningAlgorithmError,
    uri::Uri,
};

/// A cryptographic key in the JSON representation defined by [RFC 7517].
///
/// Besides the key material itself (the [`JsonWebKeyType`]), a key carries
/// the optional metadata members of [section 4 of RFC 7517]: what the key
/// may be used for, a key id to select it from a [`JsonWebKeySet`], and the
/// X.509 members. The certificate members are carried as received and not
/// validated, this crate does no PKI.
///
/// A key deserialized from JSON can belong to a different family than the
/// code expects, so the conversions into the concrete signing and encryption
/// key types are fallible:
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use jwx::{
///     jwa::{Hmac, HmacKey, JsonWebSigningAlgorithm},
///     jwk::JsonWebKey,
///     FromKey,
/// };
///
/// let jwk: JsonWebKey = serde_json::from_str(
///     r#"{"kty":"oct","k":"AyM1SysPpbyDfgZld3umj1qzKObwVMkoqQ-EstJQLr_T-1qS0gZH75aKtMN3Yj0iPS4hcgUuTwjAzZr1Z9CAow"}"#,
/// )?;
/// let signer = HmacKey::from_key(&jwk, JsonWebSigningAlgorithm::Hmac(Hmac::Hs256))?;
/// # let _ = signer;
/// # Ok(())
/// # }
/// ```
///
/// [RFC 7517]: <https://datatracker.ietf.org/doc/html/rfc7517>
/// [section 4 of RFC 7517]: <https://datatracker.ietf.org/doc/html/rfc7517#section-4>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonWebKey {
    /// `kty` and the members specific to the key family, defined in
    /// [section 6 of RFC 7518]
    ///
    /// [section 6 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-6>
    #[serde(flatten)]
    key_type: JsonWebKeyType,
    /// `use` parameter, [section 4.2 of RFC 7517]
    ///
    /// [section 4.2 of RFC 7517]: <https://datatracker.ietf.org/doc/html/rfc7517#section-4.2>
    #[serde(
        rename = "use",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    key_use: Option<KeyUsage>,
    /// `key_ops` parameter, [section 4.3 of RFC 7517]
    ///
    /// [section 4.3 of RFC 7517]: <https://datatracker.ietf.org/doc/html/rfc7517#section-4.3>
    #[serde(
        default,
        deserialize_with = "deserialize_key_ops",
        skip_serializing_if = "Option::is_none"
    )]
    key_operations: Option<HashSet<KeyOperation>>,
    /// `alg` parameter, [section 4.4 of RFC 7517]
    ///
    /// [section 4.4 of RFC 7517]: <https://datatracker.ietf.org/doc/html/rfc7517#section-4.4>
    #[serde(rename = "alg", default, skip_serializing_if = "Option::is_none")]
    algorithm: Option<JsonWebKeyAlgorithm>,
    /// `kid` parameter, [section 4.5 of RFC 7517]
    ///
    /// [section 4.5 of RFC 7517]: <https://datatracker.ietf.org/doc/html/rfc7517#section-4.5>
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kid: Option<String>,
    /// `x5u` parameter, [section 4.6 of RFC 7517]
    ///
    /// [section 4.6 of RFC 7517]: <https://datatracker.ietf.org/doc/html/rfc7517#section-4.6>
    #[serde(rename = "x5u", default, skip_serializing_if = "Option::is_none")]
    x509_url: Option<Uri>,
    /// `x5c` parameter, [section 4.7 of RFC 7517]
    ///
    /// Each entry is one base64 (not base64url) encoded DER certificate.
    ///
    /// [section 4.7 of RFC 7517]: <https://datatracker.ietf.org/doc/html/rfc7517#section-4.7>
    #[serde(rename = "x5c", default, skip_serializing_if = "Option::is_none")]
    x509_certificate_chain: Option<Vec<String>>,
    /// `x5t` parameter, [section 4.8 of RFC 7517]
    ///
    /// [section 4.8 of RFC 7517]: <https://datatracker.ietf.org/doc/html/rfc7517#section-4.8>
    #[serde(rename = "x5t", default, skip_serializing_if = "Option::is_none")]
    x509_certificate_sha1_thumbprint: Option<Base64UrlString>,
    /// `x5t#S256` parameter, [section 4.9 of RFC 7517]
    ///
    /// [section 4.9 of RFC 7517]: <https://datatracker.ietf.org/doc/html/rfc7517#section-4.9>
    #[serde(rename = "x5t#S256", default, skip_serializing_if = "Option::is_none")]
    x509_certificate_sha256_thumbprint: Option<Base64UrlString>,
}

impl JsonWebKey {
    /// Create a key from its key material with all optional members unset.
    pub fn new(key_type: impl Into<JsonWebKeyType>) -> Self {
        Self {
            key_type: key_type.into(),
            key_use: None,
            key_operations: None,
            algorithm: None,
            kid: None,
            x509_url: None,
            x509_certificate_chain: None,
            x509_certificate_sha1_thumbprint: None,
            x509_certificate_sha256_thumbprint: None,
        }
    }

    /// Create a key from its key material together with the `alg` parameter.
    pub fn new_with_algorithm(
        key_type: impl Into<JsonWebKeyType>,
        algorithm: impl Into<JsonWebKeyAlgorithm>,
    ) -> Self {
        Self {
            algorithm: Some(algorithm.into()),
            ..Self::new(key_type)
        }
    }

    /// The key material of this key.
    pub fn key_type(&self) -> &JsonWebKeyType {
        &self.key_type
    }

    /// Turn this key back into its key material, dropping all metadata.
    pub fn into_key_type(self) -> JsonWebKeyType {
        self.key_type
    }

    /// The `use` parameter if it is present.
    pub fn key_usage(&self) -> Option<&KeyUsage> {
        self.key_use.as_ref()
    }

    /// The `key_ops` parameter if it is present.
    pub fn key_operations(&self) -> Option<&HashSet<KeyOperation>> {
        self.key_operations.as_ref()
    }

    /// The `alg` parameter if it is present.
    pub fn algorithm(&self) -> Option<&JsonWebKeyAlgorithm> {
        self.algorithm.as_ref()
    }

    /// The `kid` parameter if it is present.
    pub fn key_id(&self) -> Option<&str> {
        self.kid.as_deref()
    }

    /// The `x5u` parameter if it is present.
    pub fn x509_url(&self) -> Option<&Uri> {
        self.x509_url.as_ref()
    }

    /// The `x5c` parameter if it is present.
    ///
    /// Each entry is one base64 encoded DER certificate. The chain is
    /// carried as received and not validated.
    pub fn x509_certificate_chain(&self) -> Option<&[String]> {
        self.x509_certificate_chain.as_deref()
    }

    /// The `x5t` parameter if it is present.
    pub fn x509_certificate_sha1_thumbprint(&self) -> Option<&Base64UrlString> {
        self.x509_certificate_sha1_thumbprint.as_ref()
    }

    /// The `x5t#S256` parameter if it is present.
    pub fn x509_certificate_sha256_thumbprint(&self) -> Option<&Base64UrlString> {
        self.x509_certificate_sha256_thumbprint.as_ref()
    }

    /// Set the `use` parameter.
    #[must_use]
    pub fn with_key_usage(mut self, key_use: KeyUsage) -> Self {
        self.key_use = Some(key_use);
        self
    }

    /// Set the `key_ops` parameter.
    #[must_use]
    pub fn with_key_operations(mut self, key_operations: HashSet<KeyOperation>) -> Self {
        self.key_operations = Some(key_operations);
        self
    }

    /// Set the `kid` parameter.
    #[must_use]
    pub fn with_key_id(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// Set the `kid` parameter to the base64url encoded RFC 7638 SHA-256
    /// thumbprint of this key.
    #[must_use]
    pub fn with_thumbprint_as_key_id(mut self) -> Self {
        let digest = self.key_type.thumbprint_sha256();
        self.kid = Some(Base64UrlString::encode(digest).into_inner());
        self
    }
}

impl crate::sealed::Sealed for JsonWebKey {}
impl Thumbprint for JsonWebKey {
    fn thumbprint_prehashed(&self) -> String {
        self.key_type.thumbprint_prehashed()
    }
}

impl Checkable for JsonWebKey {
    fn check<P: Policy>(self, policy: P) -> Result<Checked<Self, P>, (Self, P::Error)> {
        if let Some(alg) = self.algorithm() {
            if let Err(e) = policy.algorithm(alg) {
                return Err((self, e));
            }
        }
        if let Err(e) = policy.compare_key_ops_and_use(self.key_usage(), self.key_operations()) {
            return Err((self, e));
        }
        Ok(Checked::new(self, policy))
    }
}

/// The key family and key material of a [`JsonWebKey`], one variant per
/// `kty` value of [section 6 of RFC 7518] plus the `OKP` type of [RFC 8037].
///
/// Serialization is driven by the `kty` member (and `crv` where there is
/// one), so a JSON object deserializes into exactly one family. Asymmetric
/// variants store either the private or the public half, a private half can
/// always produce its public counterpart.
///
/// [section 6 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-6>
/// [RFC 8037]: <https://datatracker.ietf.org/doc/html/rfc8037>
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonWebKeyType {
    /// `kty: oct`
    Symmetric(SymmetricJsonWebKey),
    /// `kty: EC`
    Ec(EcJsonWebKey),
    /// `kty: RSA`
    Rsa(RsaJsonWebKey),
    /// `kty: OKP`
    Okp(OkpJsonWebKey),
}

impl crate::sealed::Sealed for JsonWebKeyType {}
impl Thumbprint for JsonWebKeyType {
    fn thumbprint_prehashed(&self) -> String {
        match self {
            JsonWebKeyType::Symmetric(key) => key.thumbprint_prehashed(),
            JsonWebKeyType::Ec(key) => key.thumbprint_prehashed(),
            JsonWebKeyType::Rsa(key) => key.thumbprint_prehashed(),
            JsonWebKeyType::Okp(key) => key.thumbprint_prehashed(),
        }
    }
}

/// The `use` parameter of a [`JsonWebKey`] as defined in
/// [section 4.2 of RFC 7517]
///
/// [section 4.2 of RFC 7517]: <https://datatracker.ietf.org/doc/html/rfc7517#section-4.2>
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyUsage {
    /// The `sig` (signature) value
    Signing,
    /// The `enc` (encryption) value
    Encryption,
    /// Some other value that this implementation does not recognise
    Other(String),
}

impl_serde_jwa!(
    KeyUsage,
    [
        "sig" => Self::Signing; Self::Signing,
        "enc" => Self::Encryption; Self::Encryption,
    ]
);

/// One element of the `key_ops` parameter of a [`JsonWebKey`] as defined in
/// [section 4.3 of RFC 7517]
///
/// [section 4.3 of RFC 7517]: <https://datatracker.ietf.org/doc/html/rfc7517#section-4.3>
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyOperation {
    /// Compute digital signatures or MACs
    Sign,
    /// Verify digital signatures or MACs
    Verify,
    /// Encrypt content
    Encrypt,
    /// Decrypt content and validate the decryption
    Decrypt,
    /// Encrypt a key
    WrapKey,
    /// Decrypt a key
    UnwrapKey,
    /// Derive a key
    DeriveKey,
    /// Derive bits not to be used as a key
    DeriveBits,
    /// Some other operation that this implementation does not recognise
    Other(String),
}

impl_serde_jwa!(
    KeyOperation,
    [
        "sign" => Self::Sign; Self::Sign,
        "verify" => Self::Verify; Self::Verify,
        "encrypt" => Self::Encrypt; Self::Encrypt,
        "decrypt" => Self::Decrypt; Self::Decrypt,
        "wrapKey" => Self::WrapKey; Self::WrapKey,
        "unwrapKey" => Self::UnwrapKey; Self::UnwrapKey,
        "deriveKey" => Self::DeriveKey; Self::DeriveKey,
        "deriveBits" => Self::DeriveBits; Self::DeriveBits,
    ]
);

/// An error returned when a [`JsonWebKey`] could not be converted into one
/// of the concrete key types of the [`jwa`](crate::jwa) module.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum FromJsonWebKeyError {
    /// The requested algorithm does not belong to the family of the key
    #[error(transparent)]
    InvalidAlgorithm(#[from] InvalidSigningAlgorithmError),
    /// The key belongs to a different key family than the conversion target
    #[error("the key has a different key type than the requested operation supports")]
    WrongKeyType,
    /// The curve of the key does not match the curve of the requested
    /// algorithm
    #[error("the curve of the key does not match the requested algorithm")]
    CurveMismatch,
    /// A signing key was requested but the JWK only holds the public half
    #[error("the operation requires a private key but the key only holds the public part")]
    NoPrivateKey,
    /// The key is shorter than the requested algorithm permits
    #[error("the key is too short for the requested algorithm")]
    KeyTooShort,
    /// The key material itself is unusable, for example a scalar outside the
    /// valid range for its curve
    #[error("the key material is invalid for its declared key type")]
    InvalidKey,
}

impl From<signature::Error> for FromJsonWebKeyError {
    fn from(_: signature::Error) -> Self {
        Self::InvalidKey
    }
}

// `key_ops` is a JSON array, but RFC 7517 forbids duplicate values in it.
fn deserialize_key_ops<'de, D>(deserializer: D) -> Result<Option<HashSet<KeyOperation>>, D::Error>
where
    D: Deserializer<'de>,
{
    match <Option<Vec<KeyOperation>>>::deserialize(deserializer)? {
        Some(ops) => {
            let mut set = HashSet::with_capacity(ops.len());
            for op in ops {
                if let Some(duplicate) = set.replace(op) {
                    return Err(D::Error::custom(format!(
                        "found duplicate `{duplicate}` in `key_ops` parameter"
                    )));
                }
            }
            Ok(Some(set))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn key_ops_must_not_contain_duplicates() {
        let json = r#"{
            "kty": "oct",
            "k": "GawgguFyGrWKav7AX4VKUg",
            "key_ops": ["wrapKey", "unwrapKey", "wrapKey"]
        }"#;

        let error = serde_json::from_str::<JsonWebKey>(json)
            .expect_err("duplicate key_ops entries must be rejected");
        assert!(error.to_string().contains("key_ops"));
    }

    #[test]
    fn unknown_usage_and_operations_are_preserved() {
        let json = r#"{
            "kty": "oct",
            "k": "GawgguFyGrWKav7AX4VKUg",
            "use": "attest",
            "key_ops": ["attest"]
        }"#;

        let jwk: JsonWebKey = serde_json::from_str(json).expect("a valid key");
        assert_eq!(
            jwk.key_usage(),
            Some(&KeyUsage::Other("attest".to_string()))
        );
        assert!(jwk
            .key_operations()
            .expect("key_ops was present")
            .contains(&KeyOperation::Other("attest".to_string())));
    }

    #[test]
    fn metadata_survives_a_round_trip() {
        let json = r#"{
            "kty": "oct",
            "k": "GawgguFyGrWKav7AX4VKUg",
            "use": "enc",
            "kid": "HMAC key used in JWS spec Appendix A.1 example",
            "x5t": "7noOPq-hJ1_hCnvWh6IeYI2w9Q0"
        }"#;

        let jwk: JsonWebKey = serde_json::from_str(json).expect("a valid key");
        assert_eq!(jwk.key_usage(), Some(&KeyUsage::Encryption));
        assert_eq!(
            jwk.key_id(),
            Some("HMAC key used in JWS spec Appendix A.1 example")
        );

        let serialized = serde_json::to_value(&jwk).expect("serialization does not fail");
        let reparsed: JsonWebKey =
            serde_json::from_value(serialized).expect("serialized form parses again");
        assert_eq!(jwk, reparsed);
    }

    #[test]
    fn the_key_family_is_detected_from_kty() {
        let oct: JsonWebKey =
            serde_json::from_str(r#"{"kty":"oct","k":"GawgguFyGrWKav7AX4VKUg"}"#)
                .expect("a valid oct key");
        assert!(matches!(oct.key_type(), JsonWebKeyType::Symmetric(_)));

        let ec: JsonWebKey = serde_json::from_str(
            r#"{
                "kty": "EC",
                "crv": "P-256",
                "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
                "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0"
            }"#,
        )
        .expect("a valid EC key");
        assert!(matches!(ec.key_type(), JsonWebKeyType::Ec(_)));

        let okp: JsonWebKey = serde_json::from_str(
            r#"{
                "kty": "OKP",
                "crv": "Ed25519",
                "x": "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"
            }"#,
        )
        .expect("a valid OKP key");
        assert!(matches!(okp.key_type(), JsonWebKeyType::Okp(_)));
    }

    #[test]
    fn a_mislabeled_key_family_is_rejected() {
        // `kty` says RSA but the members are those of an oct key
        let error = serde_json::from_str::<JsonWebKey>(
            r#"{"kty":"RSA","k":"GawgguFyGrWKav7AX4VKUg"}"#,
        );
        assert!(error.is_err());
    }

    #[test]
    fn thumbprint_kid_matches_the_direct_computation() {
        let jwk: JsonWebKey =
            serde_json::from_str::<JsonWebKey>(r#"{"kty":"oct","k":"GawgguFyGrWKav7AX4VKUg"}"#)
                .expect("a valid oct key")
                .with_thumbprint_as_key_id();

        let expected =
            Base64UrlString::encode(jwk.key_type().thumbprint_sha256()).into_inner();
        assert_eq!(jwk.key_id(), Some(expected.as_str()));
    }

    #[test]
    fn private_keys_win_over_public_keys_in_untagged_resolution() {
        // an EC key with a `d` member must parse as the private variant even
        // though its public members alone would satisfy the public variant
        let jwk: JsonWebKey = serde_json::from_str(
            r#"{
                "kty": "EC",
                "crv": "P-256",
                "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
                "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0",
                "d": "jpsQnnGQmL-YBIffH1136cspYG6-0iY7X1fCE9-E9LI"
            }"#,
        )
        .expect("a valid private EC key");

        match jwk.key_type() {
            JsonWebKeyType::Ec(EcJsonWebKey::Private(_)) => {}
            other => panic!("expected a private EC key, got {other:?}"),
        }
    }

    #[test]
    fn x5c_stays_standard_base64() {
        // base64 with `+`, `/` and padding is not base64url and must pass
        // through unchanged
        let json = r#"{
            "kty": "oct",
            "k": "GawgguFyGrWKav7AX4VKUg",
            "x5c": ["MIIDQjCCAiqgAwIBAgIGATz/FuLiMA0GCSqGSIb3+/=="]
        }"#;

        let jwk: JsonWebKey = serde_json::from_str(json).expect("a valid key");
        let chain = jwk.x509_certificate_chain().expect("x5c was present");
        assert_eq!(chain.len(), 1);
        assert!(chain[0].ends_with("+/=="));

        let value = serde_json::to_value(&jwk).expect("serialization does not fail");
        assert_eq!(value["x5c"][0], chain[0]);
    }
}
