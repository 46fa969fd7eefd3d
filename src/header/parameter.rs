use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::Error;
use crate::{
    jwa::{JsonWebAlgorithm, JsonWebCompressionAlgorithm, JsonWebContentEncryptionAlgorithm},
    Base64UrlString, Uri,
};

/// Header parameter names that are defined by the JOSE specifications
/// and therefore must never appear in the `crit` list.
///
/// `b64` is absent because [RFC 7797] requires it to be listed there.
///
/// [RFC 7797]: <https://datatracker.ietf.org/doc/html/rfc7797#section-6>
pub(crate) const REGISTERED_NAMES: &[&str] = &[
    "alg", "jku", "jwk", "kid", "x5u", "x5c", "x5t", "x5t#S256", "typ", "cty", "crit", "enc",
    "zip", "epk", "apu", "apv", "iv", "tag", "p2s", "p2c",
];

/// A single member of a JOSE header: a name paired with a typed value.
///
/// Names registered in the IANA `JSON Web Signature and Encryption Header
/// Parameters` registry map to a dedicated variant. Everything else is
/// kept in [`Parameter::Other`] with its raw JSON value, so unknown
/// parameters survive a round trip untouched.
///
/// Values that carry Base64Url data (`x5t`, `apu`, `iv`, ...) are stored
/// as received and only decoded when some operation needs their bytes.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Parameter {
    /// `alg`: the algorithm used to secure the token
    /// ([section 4.1.1 of RFC 7515])
    ///
    /// [section 4.1.1 of RFC 7515]: <https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.1>
    Algorithm(JsonWebAlgorithm),
    /// `enc`: the algorithm used to encrypt the content of a JWE
    /// ([section 4.1.2 of RFC 7516])
    ///
    /// [section 4.1.2 of RFC 7516]: <https://datatracker.ietf.org/doc/html/rfc7516#section-4.1.2>
    ContentEncryption(JsonWebContentEncryptionAlgorithm),
    /// `zip`: the algorithm the plaintext of a JWE was compressed with
    /// before encryption ([section 4.1.3 of RFC 7516])
    ///
    /// [section 4.1.3 of RFC 7516]: <https://datatracker.ietf.org/doc/html/rfc7516#section-4.1.3>
    Compression(JsonWebCompressionAlgorithm),
    /// `jku`: a URI pointing to a set of JSON encoded public keys
    /// ([section 4.1.2 of RFC 7515])
    ///
    /// [section 4.1.2 of RFC 7515]: <https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.2>
    JwkSetUrl(Uri),
    /// `jwk`: the public key that secured the token, as a JSON Web Key
    /// ([section 4.1.3 of RFC 7515])
    ///
    /// The key is kept as its raw JSON object representation.
    JsonWebKey(Value),
    /// `kid`: a hint indicating which key was used
    /// ([section 4.1.4 of RFC 7515])
    ///
    /// [section 4.1.4 of RFC 7515]: <https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.4>
    KeyId(String),
    /// `x5u`: a URI pointing to the X.509 certificate of the key that
    /// secured the token ([section 4.1.5 of RFC 7515])
    ///
    /// [section 4.1.5 of RFC 7515]: <https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.5>
    X509Url(Uri),
    /// `x5c`: the certificate chain of the key that secured the token,
    /// each entry a standard base64 encoded DER certificate
    /// ([section 4.1.6 of RFC 7515])
    ///
    /// [section 4.1.6 of RFC 7515]: <https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.6>
    X509CertificateChain(Vec<String>),
    /// `x5t`: the SHA-1 thumbprint of the X.509 certificate of the key
    /// that secured the token ([section 4.1.7 of RFC 7515])
    ///
    /// [section 4.1.7 of RFC 7515]: <https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.7>
    X509Sha1Thumbprint(Base64UrlString),
    /// `x5t#S256`: the SHA-256 thumbprint of the X.509 certificate of the
    /// key that secured the token ([section 4.1.8 of RFC 7515])
    ///
    /// [section 4.1.8 of RFC 7515]: <https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.8>
    X509Sha256Thumbprint(Base64UrlString),
    /// `typ`: the media type of the complete token
    /// ([section 4.1.9 of RFC 7515])
    ///
    /// The raw string is kept so that abbreviated forms like `JWT` round
    /// trip unchanged. [`Header::typ`](super::Header::typ) resolves it
    /// into a full media type.
    ///
    /// [section 4.1.9 of RFC 7515]: <https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.9>
    Type(String),
    /// `cty`: the media type of the payload
    /// ([section 4.1.10 of RFC 7515])
    ///
    /// [section 4.1.10 of RFC 7515]: <https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.10>
    ContentType(String),
    /// `crit`: the names of header parameters that a receiver must
    /// understand to process the token ([section 4.1.11 of RFC 7515])
    ///
    /// [section 4.1.11 of RFC 7515]: <https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.11>
    Critical(Vec<String>),
    /// `b64`: whether the payload of a JWS is Base64Url encoded
    /// ([section 3 of RFC 7797])
    ///
    /// [section 3 of RFC 7797]: <https://datatracker.ietf.org/doc/html/rfc7797#section-3>
    Base64UrlEncodePayload(bool),
    /// `epk`: the ephemeral public key created by the originator of an
    /// ECDH key agreement ([section 4.6.1.1 of RFC 7518])
    ///
    /// The key is kept as its raw JSON object representation.
    ///
    /// [section 4.6.1.1 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.6.1.1>
    EphemeralPublicKey(Value),
    /// `apu`: agreement PartyUInfo of an ECDH key agreement
    /// ([section 4.6.1.2 of RFC 7518])
    ///
    /// [section 4.6.1.2 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.6.1.2>
    AgreementPartyUInfo(Base64UrlString),
    /// `apv`: agreement PartyVInfo of an ECDH key agreement
    /// ([section 4.6.1.3 of RFC 7518])
    ///
    /// [section 4.6.1.3 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.6.1.3>
    AgreementPartyVInfo(Base64UrlString),
    /// `iv`: the initialization vector used when wrapping a key with AES
    /// GCM ([section 4.7.1.1 of RFC 7518])
    ///
    /// [section 4.7.1.1 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.7.1.1>
    InitializationVector(Base64UrlString),
    /// `tag`: the authentication tag produced when wrapping a key with
    /// AES GCM ([section 4.7.1.2 of RFC 7518])
    ///
    /// [section 4.7.1.2 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.7.1.2>
    AuthenticationTag(Base64UrlString),
    /// `p2s`: the salt input of the PBES2 key derivation
    /// ([section 4.8.1.1 of RFC 7518])
    ///
    /// [section 4.8.1.1 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.8.1.1>
    Pbes2SaltInput(Base64UrlString),
    /// `p2c`: the iteration count of the PBES2 key derivation
    /// ([section 4.8.1.2 of RFC 7518])
    ///
    /// [section 4.8.1.2 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.8.1.2>
    Pbes2Count(u64),
    /// A header parameter this crate knows nothing about, holding its raw
    /// JSON value.
    Other(String, Value),
}

impl Parameter {
    /// Builds the parameter registered under `name` from its raw JSON
    /// value.
    ///
    /// Registered names get their typed representation. Unknown names end
    /// up as [`Parameter::Other`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not have the shape required for
    /// a registered name, e.g. a `p2c` that is not a non-negative integer
    /// or an empty `crit` list.
    pub fn from_name_and_value(name: impl Into<String>, value: Value) -> Result<Self, Error> {
        let name = name.into();

        Ok(match name.as_str() {
            "alg" => Self::Algorithm(typed(&name, value)?),
            "enc" => Self::ContentEncryption(typed(&name, value)?),
            "zip" => Self::Compression(typed(&name, value)?),
            "jku" => Self::JwkSetUrl(typed(&name, value)?),
            "jwk" => Self::JsonWebKey(object(&name, value)?),
            "kid" => Self::KeyId(typed(&name, value)?),
            "x5u" => Self::X509Url(typed(&name, value)?),
            "x5c" => Self::X509CertificateChain(typed(&name, value)?),
            "x5t" => Self::X509Sha1Thumbprint(typed(&name, value)?),
            "x5t#S256" => Self::X509Sha256Thumbprint(typed(&name, value)?),
            "typ" => Self::Type(typed(&name, value)?),
            "cty" => Self::ContentType(typed(&name, value)?),
            "crit" => {
                let names: Vec<String> = typed(&name, value)?;
                if names.is_empty() {
                    return Err(Error::EmptyCriticalHeaders);
                }
                Self::Critical(names)
            }
            "b64" => Self::Base64UrlEncodePayload(typed(&name, value)?),
            "epk" => Self::EphemeralPublicKey(object(&name, value)?),
            "apu" => Self::AgreementPartyUInfo(typed(&name, value)?),
            "apv" => Self::AgreementPartyVInfo(typed(&name, value)?),
            "iv" => Self::InitializationVector(typed(&name, value)?),
            "tag" => Self::AuthenticationTag(typed(&name, value)?),
            "p2s" => Self::Pbes2SaltInput(typed(&name, value)?),
            "p2c" => Self::Pbes2Count(typed(&name, value)?),
            _ => Self::Other(name, value),
        })
    }

    /// The registered name of this parameter.
    pub fn name(&self) -> &str {
        match self {
            Self::Algorithm(_) => "alg",
            Self::ContentEncryption(_) => "enc",
            Self::Compression(_) => "zip",
            Self::JwkSetUrl(_) => "jku",
            Self::JsonWebKey(_) => "jwk",
            Self::KeyId(_) => "kid",
            Self::X509Url(_) => "x5u",
            Self::X509CertificateChain(_) => "x5c",
            Self::X509Sha1Thumbprint(_) => "x5t",
            Self::X509Sha256Thumbprint(_) => "x5t#S256",
            Self::Type(_) => "typ",
            Self::ContentType(_) => "cty",
            Self::Critical(_) => "crit",
            Self::Base64UrlEncodePayload(_) => "b64",
            Self::EphemeralPublicKey(_) => "epk",
            Self::AgreementPartyUInfo(_) => "apu",
            Self::AgreementPartyVInfo(_) => "apv",
            Self::InitializationVector(_) => "iv",
            Self::AuthenticationTag(_) => "tag",
            Self::Pbes2SaltInput(_) => "p2s",
            Self::Pbes2Count(_) => "p2c",
            Self::Other(name, _) => name,
        }
    }

    /// The raw JSON value of this parameter, exactly as it would appear
    /// in a serialized header.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Algorithm(alg) => Value::String(alg.to_string()),
            Self::ContentEncryption(enc) => Value::String(enc.to_string()),
            Self::Compression(zip) => Value::String(zip.to_string()),
            Self::JwkSetUrl(uri) | Self::X509Url(uri) => Value::String(uri.to_string()),
            Self::JsonWebKey(value) | Self::EphemeralPublicKey(value) => value.clone(),
            Self::KeyId(s) | Self::Type(s) | Self::ContentType(s) => Value::String(s.clone()),
            Self::X509CertificateChain(certs) => {
                Value::Array(certs.iter().cloned().map(Value::String).collect())
            }
            Self::X509Sha1Thumbprint(b64)
            | Self::X509Sha256Thumbprint(b64)
            | Self::AgreementPartyUInfo(b64)
            | Self::AgreementPartyVInfo(b64)
            | Self::InitializationVector(b64)
            | Self::AuthenticationTag(b64)
            | Self::Pbes2SaltInput(b64) => Value::String(b64.to_string()),
            Self::Critical(names) => {
                Value::Array(names.iter().cloned().map(Value::String).collect())
            }
            Self::Base64UrlEncodePayload(b64) => Value::Bool(*b64),
            Self::Pbes2Count(count) => Value::from(*count),
            Self::Other(_, value) => value.clone(),
        }
    }

    /// Shorthand for building an `alg` parameter.
    pub fn algorithm(alg: impl Into<JsonWebAlgorithm>) -> Self {
        Self::Algorithm(alg.into())
    }

    /// Shorthand for building a `kid` parameter.
    pub fn key_id(kid: impl Into<String>) -> Self {
        Self::KeyId(kid.into())
    }

    /// Shorthand for building a `typ` parameter.
    pub fn typ(typ: impl Into<String>) -> Self {
        Self::Type(typ.into())
    }

    /// Shorthand for building a `cty` parameter.
    pub fn content_type(cty: impl Into<String>) -> Self {
        Self::ContentType(cty.into())
    }
}

/// Parse a typed parameter value, reporting the parameter name on error.
fn typed<T: DeserializeOwned>(name: &str, value: Value) -> Result<T, Error> {
    serde_json::from_value(value).map_err(|_| Error::InvalidValue {
        name: name.to_string(),
    })
}

/// Like [`typed`], but additionally requires the value to be a JSON
/// object.
fn object(name: &str, value: Value) -> Result<Value, Error> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(Error::InvalidValue {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::jwa::JsonWebSigningAlgorithm;

    #[test]
    fn registered_names_get_typed_values() {
        let alg = Parameter::from_name_and_value("alg", json!("HS256")).unwrap();
        assert_eq!(
            alg,
            Parameter::Algorithm(JsonWebAlgorithm::Signing(
                JsonWebSigningAlgorithm::Hmac(crate::jwa::Hmac::Hs256)
            ))
        );

        let count = Parameter::from_name_and_value("p2c", json!(4096)).unwrap();
        assert_eq!(count, Parameter::Pbes2Count(4096));
    }

    #[test]
    fn unknown_names_are_preserved() {
        let exp = Parameter::from_name_and_value("exp", json!(1300819380)).unwrap();
        assert_eq!(exp.name(), "exp");
        assert_eq!(exp.to_value(), json!(1300819380));
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        assert!(Parameter::from_name_and_value("p2c", json!("many")).is_err());
        assert!(Parameter::from_name_and_value("p2c", json!(-1)).is_err());
        assert!(Parameter::from_name_and_value("crit", json!("b64")).is_err());
        assert!(Parameter::from_name_and_value("jwk", json!("not an object")).is_err());
    }

    #[test]
    fn empty_crit_is_rejected() {
        assert!(matches!(
            Parameter::from_name_and_value("crit", json!([])),
            Err(Error::EmptyCriticalHeaders)
        ));
    }

    #[test]
    fn base64url_values_are_not_validated_eagerly() {
        let tag = Parameter::from_name_and_value("tag", json!("!!not-base64!!")).unwrap();
        match tag {
            Parameter::AuthenticationTag(b64) => assert!(b64.decode().is_err()),
            other => panic!("unexpected parameter {other:?}"),
        }
    }
}
