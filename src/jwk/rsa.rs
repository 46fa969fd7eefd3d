//! RSA keys, the `RSA` key type of [section 6.3 of RFC 7518]
//!
//! [section 6.3 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-6.3>

use alloc::{boxed::Box, format, string::String};
use core::fmt;

use rsa::{
    traits::{PrivateKeyParts as _, PublicKeyParts as _},
    BigUint, RsaPrivateKey, RsaPublicKey,
};
use serde::{de::Error as _, ser::Error as _, Deserialize, Serialize};

use super::{
    thumbprint::{self, Thumbprint},
    FromJsonWebKeyError, JsonWebKey, JsonWebKeyType,
};
use crate::{
    base64_url::Base64UrlBytes,
    jwa::{JsonWebSigningAlgorithm, RsaSigningKey, RsaVerifyingKey},
    sign::{FromKey, InvalidSigningAlgorithmError},
};

/// An RSA key, holding either the full key pair or only the public part.
///
/// The private representation carries the first CRT parameters (`p`, `q`,
/// `dp`, `dq`, `qi`) next to the private exponent as described in
/// [section 6.3.2 of RFC 7518]. Multi prime keys using the `oth` parameter
/// are not supported.
///
/// [section 6.3.2 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-6.3.2>
#[non_exhaustive]
#[derive(Clone, PartialEq, Eq)]
pub enum RsaJsonWebKey {
    /// A key pair that can create and verify signatures
    Private(Box<RsaPrivateKey>),
    /// A public key that can only verify signatures
    Public(RsaPublicKey),
}

impl RsaJsonWebKey {
    /// The public part of this key.
    ///
    /// For a key that only holds the public part, this is a copy of the
    /// key itself.
    pub fn to_public_key(&self) -> RsaPublicKey {
        match self {
            Self::Private(key) => key.to_public_key(),
            Self::Public(key) => key.clone(),
        }
    }
}

impl fmt::Debug for RsaJsonWebKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private(key) => f
                .debug_struct("RsaPrivateKey")
                .field("n", key.n())
                .field("e", key.e())
                .field("primes", &"[REDACTED]")
                .finish(),
            Self::Public(key) => f
                .debug_struct("RsaPublicKey")
                .field("n", key.n())
                .field("e", key.e())
                .finish(),
        }
    }
}

impl From<RsaPrivateKey> for RsaJsonWebKey {
    fn from(key: RsaPrivateKey) -> Self {
        Self::Private(Box::new(key))
    }
}

impl From<RsaPublicKey> for RsaJsonWebKey {
    fn from(key: RsaPublicKey) -> Self {
        Self::Public(key)
    }
}

impl From<RsaJsonWebKey> for JsonWebKeyType {
    fn from(key: RsaJsonWebKey) -> Self {
        Self::Rsa(key)
    }
}

impl From<RsaPrivateKey> for JsonWebKeyType {
    fn from(key: RsaPrivateKey) -> Self {
        Self::Rsa(key.into())
    }
}

impl From<RsaPublicKey> for JsonWebKeyType {
    fn from(key: RsaPublicKey) -> Self {
        Self::Rsa(key.into())
    }
}

impl crate::sealed::Sealed for RsaJsonWebKey {}
impl Thumbprint for RsaJsonWebKey {
    fn thumbprint_prehashed(&self) -> String {
        match self {
            // RFC 7638 hashes the required public members only, the
            // private members never contribute
            Self::Private(key) => {
                thumbprint::serialize_key_thumbprint(&Self::Public(key.to_public_key()))
            }
            Self::Public(_) => thumbprint::serialize_key_thumbprint(self),
        }
    }
}

impl Serialize for RsaJsonWebKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        struct PublicRepr {
            kty: &'static str,

            n: Base64UrlBytes,
            e: Base64UrlBytes,
        }

        #[derive(Serialize)]
        struct PrivateRepr {
            kty: &'static str,

            n: Base64UrlBytes,
            e: Base64UrlBytes,

            d: Base64UrlBytes,
            p: Base64UrlBytes,
            q: Base64UrlBytes,
            dp: Base64UrlBytes,
            dq: Base64UrlBytes,
            qi: Base64UrlBytes,
        }

        let uint = |x: &BigUint| Base64UrlBytes(x.to_bytes_be());

        match self {
            Self::Public(key) => PublicRepr {
                kty: "RSA",
                n: uint(key.n()),
                e: uint(key.e()),
            }
            .serialize(serializer),
            Self::Private(key) => {
                let [p, q] = match key.primes() {
                    [p, q] => [p, q],
                    _ => return Err(S::Error::custom("multi prime RSA keys are not supported")),
                };

                let (dp, dq) = match (key.dp(), key.dq()) {
                    (Some(dp), Some(dq)) => (dp, dq),
                    _ => {
                        return Err(S::Error::custom(
                            "the RSA private key is missing its precomputed values",
                        ))
                    }
                };
                let qi = key.crt_coefficient().ok_or_else(|| {
                    S::Error::custom("the prime factors of the RSA private key have no CRT \
                                      coefficient")
                })?;

                PrivateRepr {
                    kty: "RSA",
                    n: uint(key.n()),
                    e: uint(key.e()),
                    d: uint(key.d()),
                    p: uint(p),
                    q: uint(q),
                    dp: uint(dp),
                    dq: uint(dq),
                    qi: uint(&qi),
                }
                .serialize(serializer)
            }
        }
    }
}

impl<'de> Deserialize<'de> for RsaJsonWebKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Repr {
            kty: String,

            n: Base64UrlBytes,
            e: Base64UrlBytes,

            #[serde(default)]
            d: Option<Base64UrlBytes>,
            #[serde(default)]
            p: Option<Base64UrlBytes>,
            #[serde(default)]
            q: Option<Base64UrlBytes>,
            #[serde(default)]
            dp: Option<Base64UrlBytes>,
            #[serde(default)]
            dq: Option<Base64UrlBytes>,
            #[serde(default)]
            qi: Option<Base64UrlBytes>,
            #[serde(default)]
            oth: Option<serde_json::Value>,
        }

        let repr = Repr::deserialize(deserializer)?;

        if &*repr.kty != "RSA" {
            return Err(D::Error::custom("`kty` field is required to be `RSA`"));
        }

        let uint = |x: &Base64UrlBytes| BigUint::from_bytes_be(&x.0);
        let n = uint(&repr.n);
        let e = uint(&repr.e);

        let Some(d) = repr.d else {
            if repr.p.is_some()
                | repr.q.is_some()
                | repr.dp.is_some()
                | repr.dq.is_some()
                | repr.qi.is_some()
                | repr.oth.is_some()
            {
                return Err(D::Error::custom(
                    "the private members of an RSA key require `d`",
                ));
            }

            let key = RsaPublicKey::new(n, e).map_err(|e| {
                D::Error::custom(format!("failed to construct RSA public key: {e}"))
            })?;
            return Ok(Self::Public(key));
        };

        if repr.oth.is_some() {
            return Err(D::Error::custom(
                "RSA private keys with `oth` field set are not supported",
            ));
        }

        // RFC 7518 section 6.3.2: either all of the first CRT parameters
        // are present or none of them is
        let any_prime_present = repr.p.is_some()
            | repr.q.is_some()
            | repr.dp.is_some()
            | repr.dq.is_some()
            | repr.qi.is_some();

        let primes = if any_prime_present {
            let err = |field: &str| {
                D::Error::custom(format!(
                    "expected `{field}` to be present because all prime fields must be set if \
                     one of them is set"
                ))
            };

            let p = repr.p.ok_or_else(|| err("p"))?;
            let q = repr.q.ok_or_else(|| err("q"))?;
            repr.dp.ok_or_else(|| err("dp"))?;
            repr.dq.ok_or_else(|| err("dq"))?;
            repr.qi.ok_or_else(|| err("qi"))?;

            alloc::vec![uint(&p), uint(&q)]
        } else {
            // the rsa crate recovers `p` and `q` from the public key and `d`
            alloc::vec::Vec::new()
        };

        let fail =
            |e: rsa::Error| D::Error::custom(format!("failed to construct RSA private key: {e}"));

        let mut key = RsaPrivateKey::from_components(n, e, uint(&d), primes).map_err(fail)?;
        key.precompute().map_err(fail)?;
        key.validate()
            .map_err(|e| D::Error::custom(format!("the RSA private key is inconsistent: {e}")))?;

        Ok(Self::Private(Box::new(key)))
    }
}

impl FromKey<&JsonWebKey> for RsaSigningKey {
    type Error = FromJsonWebKeyError;

    fn from_key(jwk: &JsonWebKey, alg: JsonWebSigningAlgorithm) -> Result<Self, Self::Error> {
        let JsonWebSigningAlgorithm::Rsa(variant) = alg else {
            return Err(InvalidSigningAlgorithmError.into());
        };
        let key = match jwk.key_type() {
            JsonWebKeyType::Rsa(RsaJsonWebKey::Private(key)) => (**key).clone(),
            JsonWebKeyType::Rsa(RsaJsonWebKey::Public(_)) => {
                return Err(FromJsonWebKeyError::NoPrivateKey)
            }
            _ => return Err(FromJsonWebKeyError::WrongKeyType),
        };

        let key = RsaSigningKey::new(key, variant);
        Ok(match jwk.key_id() {
            Some(kid) => key.with_key_id(kid),
            None => key,
        })
    }
}

impl FromKey<&JsonWebKey> for RsaVerifyingKey {
    type Error = FromJsonWebKeyError;

    fn from_key(jwk: &JsonWebKey, alg: JsonWebSigningAlgorithm) -> Result<Self, Self::Error> {
        let JsonWebSigningAlgorithm::Rsa(variant) = alg else {
            return Err(InvalidSigningAlgorithmError.into());
        };
        // verification only needs the public half, which a private key can
        // provide as well
        let key = match jwk.key_type() {
            JsonWebKeyType::Rsa(key) => key.to_public_key(),
            _ => return Err(FromJsonWebKeyError::WrongKeyType),
        };

        Ok(RsaVerifyingKey::new(key, variant))
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;
    use crate::base64_url::Base64UrlString;

    // the public key from section 3.1 of RFC 7638
    const PUBLIC_JSON: &str = r#"{
        "kty": "RSA",
        "n": "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw",
        "e": "AQAB"
    }"#;

    // the key pair from appendix A.2 of RFC 7515
    const PRIVATE_JSON: &str = r#"{
        "kty": "RSA",
        "n": "ofgWCuLjybRlzo0tZWJjNiuSfb4p4fAkd_wWJcyQoTbji9k0l8W26mPddxHmfHQp-Vaw-4qPCJrcS2mJPMEzP1Pt0Bm4d4QlL-yRT-SFd2lZS-pCgNMsD1W_YpRPEwOWvG6b32690r2jZ47soMZo9wGzjb_7OMg0LOL-bSf63kpaSHSXndS5z5rexMdbBYUsLA9e-KXBdQOS-UTo7WTBEMa2R2CapHg665xsmtdVMTBQY4uDZlxvb3qCo5ZwKh9kG4LT6_I5IhlJH7aGhyxXFvUK-DWNmoudF8NAco9_h9iaGNj8q2ethFkMLs91kzk2PAcDTW9gb54h4FRWyuXpoQ",
        "e": "AQAB",
        "d": "Eq5xpGnNCivDflJsRQBXHx1hdR1k6Ulwe2JZD50LpXyWPEAeP88vLNO97IjlA7_GQ5sLKMgvfTeXZx9SE-7YwVol2NXOoAJe46sui395IW_GO-pWJ1O0BkTGoVEn2bKVRUCgu-GjBVaYLU6f3l9kJfFNS3E0QbVdxzubSu3Mkqzjkn439X0M_V51gfpRLI9JYanrC4D4qAdGcopV_0ZHHzQlBjudU2QvXt4ehNYTCBr6XCLQUShb1juUO1ZdiYoFaFQT5Tw8bGUl_x_jTj3ccPDVZFD9pIuhLhBOneufuBiB4cS98l2SR_RQyGWSeWjnczT0QU91p1DhOVRuOopznQ",
        "p": "4BzEEOtIpmVdVEZNCqS7baC4crd0pqnRH_5IB3jw3bcxGn6QLvnEtfdUdiYrqBdss1l58BQ3KhooKeQTa9AB0Hw_Py5PJdTJNPY8cQn7ouZ2KKDcmnPGBY5t7yLc1QlQ5xHdwW1VhvKn-nXqhJTBgIPgtldC-KDV5z-y2XDwGUc",
        "q": "uQPEfgmVtjL0Uyyx88GZFF1fOunH3-7cepKmtH4pxhtCoHqpWmT8YAmZxaewHgHAjLYsp1ZSe7zFYHj7C6ul7TjeLQeZD_YwD66t62wDmpe_HlB-TnBA-njbglfIsRLtXlnDzQkv5dTltRJ11BKBBypeeF6689rjcJIDEz9RWdc",
        "dp": "BwKfV3Akq5_MFZDFZCnW-wzl-CCo83WoZvnLQwCTeDv8uzluRSnm71I3QCLdhrqE2e9YkxvuxdBfpT_PI7Yz-FOKnu1R6HsJeDCjn12Sk3vmAktV2zb34MCdy7cpdTh_YVr7tss2u6vneTwrA86rZtu5Mbr1C1XsmvkxHQAdYo0",
        "dq": "h_96-mK1R_7glhsum81dZxjTnYynPbZpHziZjeeHcXYsXaaMwkOlODsWa7I9xXDoRwbKgB719rrmI2oKr6N3Do9U0ajaHF-NKJnwgjMd2w9cjz3_-kyNlxAr2v4IKhGNpmM5iIgOS1VZnOZ68m6_pbLBSp3nssTdlqvd0tIiTHU",
        "qi": "IYd7DHOhrWvxkwPQsRM2tOgrjbcrfvtQJipd-DlcxyVuuM9sQLdgjVk2oy26F0EmpScGLq2MowX7fhd_QJQ3ydy5cY7YIBi87w93IKLEdfnbJtoOPLUW0ITrJReOgo1cq9SbsxYawBgfp_gh6A5603k2-ZQwVK0JKSHuLFkuQ3U"
    }"#;

    #[test]
    fn the_rfc_7638_thumbprint_is_reproduced() {
        let key: RsaJsonWebKey = serde_json::from_str(PUBLIC_JSON).unwrap();

        // lexicographic member order per RFC 7638 section 3.2
        assert!(key.thumbprint_prehashed().starts_with(r#"{"e":"AQAB","kty":"RSA","n":"#));
        assert_eq!(
            Base64UrlString::encode(key.thumbprint_sha256()).as_str(),
            "NzbLsXh8uDCcd-6MNwXF4W_7noWXFZAfHkxZsRGC9Xs"
        );
    }

    #[test]
    fn a_private_key_round_trips() {
        let key: RsaJsonWebKey = serde_json::from_str(PRIVATE_JSON).unwrap();
        assert!(matches!(key, RsaJsonWebKey::Private(_)));

        let expected: serde_json::Value = serde_json::from_str(PRIVATE_JSON).unwrap();
        let value = serde_json::to_value(&key).unwrap();
        assert_eq!(value, expected);
    }

    #[test]
    fn a_private_key_without_primes_is_recovered() {
        let full: serde_json::Value = serde_json::from_str(PRIVATE_JSON).unwrap();
        let minimal = serde_json::json!({
            "kty": "RSA",
            "n": full["n"],
            "e": full["e"],
            "d": full["d"],
        });

        let key: RsaJsonWebKey = serde_json::from_value(minimal).unwrap();
        assert!(matches!(key, RsaJsonWebKey::Private(_)));

        // the recovered primes serialize again and describe the same key pair
        let reference: RsaJsonWebKey = serde_json::from_str(PRIVATE_JSON).unwrap();
        let value = serde_json::to_value(&key).unwrap();
        assert_eq!(value["d"], full["d"]);
        assert!(value["p"].is_string() && value["q"].is_string());
        assert_eq!(key.thumbprint_prehashed(), reference.thumbprint_prehashed());
    }

    #[test]
    fn the_kty_member_is_checked() {
        let json = PUBLIC_JSON.replace("RSA", "EC");
        let error = serde_json::from_str::<RsaJsonWebKey>(&json).unwrap_err();
        assert!(error.to_string().contains("`kty` field is required to be `RSA`"));
    }

    #[test]
    fn private_members_require_d() {
        let mut value: serde_json::Value = serde_json::from_str(PRIVATE_JSON).unwrap();
        value.as_object_mut().unwrap().remove("d");

        let error = serde_json::from_value::<RsaJsonWebKey>(value).unwrap_err();
        assert!(error.to_string().contains("require `d`"));
    }

    #[test]
    fn partial_crt_parameters_are_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(PRIVATE_JSON).unwrap();
        value.as_object_mut().unwrap().remove("dq");

        let error = serde_json::from_value::<RsaJsonWebKey>(value).unwrap_err();
        assert!(error.to_string().contains("expected `dq` to be present"));
    }

    #[test]
    fn multi_prime_keys_are_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(PRIVATE_JSON).unwrap();
        value
            .as_object_mut()
            .unwrap()
            .insert("oth".to_string(), serde_json::json!([]));

        let error = serde_json::from_value::<RsaJsonWebKey>(value).unwrap_err();
        assert!(error.to_string().contains("`oth`"));
    }

    #[test]
    fn inconsistent_key_pairs_are_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(PRIVATE_JSON).unwrap();
        let foreign: serde_json::Value = serde_json::from_str(PUBLIC_JSON).unwrap();
        value["n"] = foreign["n"].clone();

        assert!(serde_json::from_value::<RsaJsonWebKey>(value).is_err());
    }

    #[test]
    fn only_rsa_algorithms_convert() {
        use crate::jwa::{RsaSigning, RsassaPss};

        let jwk: JsonWebKey = serde_json::from_str(PRIVATE_JSON).unwrap();

        let signer = RsaSigningKey::from_key(
            &jwk,
            JsonWebSigningAlgorithm::Rsa(RsaSigning::Pss(RsassaPss::Ps256)),
        );
        assert!(signer.is_ok());

        let error = RsaSigningKey::from_key(&jwk, JsonWebSigningAlgorithm::EdDSA).unwrap_err();
        assert_eq!(
            error,
            FromJsonWebKeyError::InvalidAlgorithm(InvalidSigningAlgorithmError)
        );
    }

    #[test]
    fn a_public_key_cannot_sign_but_can_verify() {
        use crate::jwa::{RsaSigning, RsassaPkcs1V1_5};

        let jwk: JsonWebKey = serde_json::from_str(PUBLIC_JSON).unwrap();
        let alg = JsonWebSigningAlgorithm::Rsa(RsaSigning::RsPkcs1V1_5(RsassaPkcs1V1_5::Rs256));

        let error = RsaSigningKey::from_key(&jwk, alg.clone()).unwrap_err();
        assert_eq!(error, FromJsonWebKeyError::NoPrivateKey);

        assert!(RsaVerifyingKey::from_key(&jwk, alg).is_ok());
    }
}
