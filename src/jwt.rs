//! JSON Web Token: a JWS carrying a set of claims ([RFC 7519])
//!
//! A claim is a statement about a subject, a [`Claims`] value collects
//! them and a [`JsonWebToken`] is a [`JsonWebSignature`] whose payload
//! is such a collection. Verification is a two step affair: the JWS
//! layer checks the signature and a [`ValidationContext`] checks the
//! claims themselves.
//!
//! ```
//! use jwx::{
//!     jwa::{Hmac, HmacKey},
//!     jwt::{Claim, Claims, ClaimValidator, NumericDate, ValidationContext},
//!     JsonWebToken,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let key = HmacKey::new(*b"a key long enough for HMAC SHA-256", Hmac::Hs256);
//!
//! let claims = Claims::from_claims([
//!     Claim::issuer("https://auth.example"),
//!     Claim::expiration_time(1300819380u64),
//! ])?;
//! let token = JsonWebToken::issue(claims, &key)?.to_string();
//!
//! let context = ValidationContext::new()
//!     .with_reference_time(NumericDate::new(1300819000))
//!     .with_constraint("iss", ClaimValidator::Equals("https://auth.example".into()));
//! let verified = JsonWebToken::verify_and_validate(&token, &key, &context)?;
//!
//! assert_eq!(verified.payload().issuer(), Some("https://auth.example"));
//! # Ok(()) }
//! ```
//!
//! [RFC 7519]: <https://datatracker.ietf.org/doc/html/rfc7519>

use alloc::{borrow::ToOwned, string::String, vec::Vec};
use core::fmt;

use hashbrown::DefaultHashBuilder;
use indexmap::IndexMap;
use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::Value;
use thiserror::Error;

mod claim;
mod validation;

pub use self::{
    claim::{Audience, Claim, NumericDate},
    validation::{ClaimValidator, ValidationContext, ValidationError},
};

use crate::{
    header::{Header, Parameter},
    jws::{ParseError, SignError, Signed, Unverified, Verified},
    payload::{Payload, PayloadError},
    JsonWebSignature, Signer, Verifier, VerifyError,
};

/// Map from claim name to claim, preserving insertion order.
///
/// Serializing a claims set emits its members exactly in the order they
/// were supplied, just like a [`Header`] does with its parameters.
type ClaimMap = IndexMap<String, Claim, DefaultHashBuilder>;

/// An ordered collection of uniquely named [`Claim`]s, the payload of a
/// [`JsonWebToken`].
///
/// A claims set is immutable. Adding or overriding claims happens
/// through [`with_claims`](Self::with_claims), which leaves the
/// original untouched and returns the derived set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Claims {
    claims: ClaimMap,
}

impl Claims {
    /// Creates a claims set without any claims.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a claims set holding the given claims.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateClaim`] if two claims share a name.
    pub fn from_claims(claims: impl IntoIterator<Item = Claim>) -> Result<Self, Error> {
        let mut map = ClaimMap::default();

        for claim in claims {
            let name = claim.name().to_owned();
            if map.insert(name.clone(), claim).is_some() {
                return Err(Error::DuplicateClaim(name));
            }
        }

        Ok(Self { claims: map })
    }

    /// Returns a copy of this claims set with the given claims added.
    ///
    /// A claim whose name is already present replaces the existing one,
    /// keeping its position. New names are appended.
    #[must_use]
    pub fn with_claims(&self, claims: impl IntoIterator<Item = Claim>) -> Self {
        let mut map = self.claims.clone();

        for claim in claims {
            map.insert(claim.name().to_owned(), claim);
        }

        Self { claims: map }
    }

    /// Looks up a claim by name.
    pub fn get(&self, name: &str) -> Option<&Claim> {
        self.claims.get(name)
    }

    /// Returns `true` if a claim with the given name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.claims.contains_key(name)
    }

    /// Looks up a claim by name, turning its absence into an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingClaim`] if no such claim exists.
    pub fn require(&self, name: &str) -> Result<&Claim, Error> {
        self.get(name)
            .ok_or_else(|| Error::MissingClaim(name.to_owned()))
    }

    /// Iterates over the claims in their insertion order.
    pub fn claims(&self) -> impl Iterator<Item = &Claim> {
        self.claims.values()
    }

    /// The number of claims in this set.
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Returns `true` if this set has no claims.
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// The `iss` claim, if present.
    pub fn issuer(&self) -> Option<&str> {
        match self.get("iss") {
            Some(Claim::Issuer(iss)) => Some(iss),
            _ => None,
        }
    }

    /// The `sub` claim, if present.
    pub fn subject(&self) -> Option<&str> {
        match self.get("sub") {
            Some(Claim::Subject(sub)) => Some(sub),
            _ => None,
        }
    }

    /// The `aud` claim, if present.
    pub fn audience(&self) -> Option<&Audience> {
        match self.get("aud") {
            Some(Claim::Audience(aud)) => Some(aud),
            _ => None,
        }
    }

    /// The `exp` claim, if present.
    pub fn expiration_time(&self) -> Option<NumericDate> {
        match self.get("exp") {
            Some(Claim::ExpirationTime(exp)) => Some(*exp),
            _ => None,
        }
    }

    /// The `nbf` claim, if present.
    pub fn not_before(&self) -> Option<NumericDate> {
        match self.get("nbf") {
            Some(Claim::NotBefore(nbf)) => Some(*nbf),
            _ => None,
        }
    }

    /// The `iat` claim, if present.
    pub fn issued_at(&self) -> Option<NumericDate> {
        match self.get("iat") {
            Some(Claim::IssuedAt(iat)) => Some(*iat),
            _ => None,
        }
    }

    /// The `jti` claim, if present.
    pub fn jwt_id(&self) -> Option<&str> {
        match self.get("jti") {
            Some(Claim::JwtId(jti)) => Some(jti),
            _ => None,
        }
    }

    /// Parses a claims set from its JSON representation.
    ///
    /// The empty string is accepted and produces an empty set, the
    /// inverse of [`to_json`](Self::to_json).
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a JSON object, holds
    /// duplicate member names or a registered claim has a value of the
    /// wrong shape.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        if json.is_empty() {
            return Ok(Self::new());
        }

        serde_json::from_str(json).map_err(Error::from)
    }

    /// Serializes this claims set to JSON.
    ///
    /// A set without claims produces the empty string rather than `{}`.
    ///
    /// # Errors
    ///
    /// Returns an error if a claim value cannot be serialized.
    pub fn to_json(&self) -> Result<String, Error> {
        if self.claims.is_empty() {
            return Ok(String::new());
        }

        serde_json::to_string(self).map_err(Error::from)
    }
}

impl Serialize for Claims {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.claims.len()))?;

        for claim in self.claims.values() {
            map.serialize_entry(claim.name(), &claim.to_value())?;
        }

        map.end()
    }
}

impl<'de> Deserialize<'de> for Claims {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ClaimsVisitor;

        impl<'de> Visitor<'de> for ClaimsVisitor {
            type Value = Claims;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a JSON object holding claims")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                use serde::de::Error as _;

                let mut claims = ClaimMap::default();

                while let Some((name, value)) = map.next_entry::<String, Value>()? {
                    let claim =
                        Claim::from_name_and_value(name, value).map_err(A::Error::custom)?;
                    let name = claim.name().to_owned();

                    if claims.insert(name.clone(), claim).is_some() {
                        return Err(A::Error::custom(Error::DuplicateClaim(name)));
                    }
                }

                Ok(Claims { claims })
            }
        }

        deserializer.deserialize_map(ClaimsVisitor)
    }
}

/// A claims set travels through its JSON representation, so any
/// [`JsonWebSignature`] over [`Claims`] is a JWT. An empty set becomes
/// an empty payload, matching the empty string a claims set serializes
/// to.
impl Payload for Claims {
    type Buf = Vec<u8>;

    fn to_bytes(&self) -> Result<Self::Buf, PayloadError> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        Ok(serde_json::to_vec(self)?)
    }

    fn from_bytes(bytes: Vec<u8>) -> Result<Self, PayloadError> {
        if bytes.is_empty() {
            return Ok(Self::new());
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// A JSON Web Token: a [`JsonWebSignature`] whose payload is a set of
/// [`Claims`] ([section 7.1 of RFC 7519]).
///
/// [section 7.1 of RFC 7519]: <https://datatracker.ietf.org/doc/html/rfc7519#section-7.1>
pub type JsonWebToken = JsonWebSignature<Claims>;

impl JsonWebToken {
    /// Signs `claims` into a compact JWT.
    ///
    /// The signer contributes the `alg` header parameter (and `kid` if
    /// it carries a key id), and the token advertises the `JWT` media
    /// type through `typ`, as recommended by [section 5.1 of RFC 7519].
    /// Use [`JsonWebSignature::new_with_header`] and
    /// [`sign`](JsonWebSignature::sign) directly for full control over
    /// the header.
    ///
    /// # Errors
    ///
    /// Fails if the claims cannot be serialized or the signing
    /// operation itself fails.
    ///
    /// [section 5.1 of RFC 7519]: <https://datatracker.ietf.org/doc/html/rfc7519#section-5.1>
    pub fn issue<S: Signer>(claims: Claims, signer: &S) -> Result<Signed<Claims>, SignError> {
        let header = Header::from_parameters([Parameter::typ("JWT")])?;
        JsonWebSignature::new_with_header(header, claims).sign(signer)
    }

    /// Decodes a compact JWT, checks its signature and validates its
    /// claims, in that order.
    ///
    /// The claims are only looked at after the signature verified, so a
    /// validation error means the token is authentic but not (or no
    /// longer) acceptable.
    ///
    /// # Errors
    ///
    /// Fails if the token is malformed, the signature does not verify
    /// or the claims do not satisfy `context`.
    pub fn verify_and_validate<V: Verifier>(
        token: &str,
        verifier: &V,
        context: &ValidationContext,
    ) -> Result<Verified<Claims>, TokenError> {
        let verified = token.parse::<Unverified<Claims>>()?.verify(verifier)?;
        context.validate(verified.payload())?;

        Ok(verified)
    }
}

/// Errors that may occur while working with [`Claims`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Two claims with the same name were supplied while constructing a
    /// claims set.
    #[error("encountered two claims named `{0}`")]
    DuplicateClaim(String),
    /// A registered claim holds a value of the wrong shape, e.g. a
    /// string where a numeric date is required.
    #[error("invalid value for the `{name}` claim")]
    InvalidValue {
        /// The name of the offending claim.
        name: String,
    },
    /// A claim that was required to be present is missing.
    #[error("the required `{0}` claim is missing")]
    MissingClaim(String),
    /// A JSON deserialization error, see [`serde_json::Error`] for
    /// details.
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
}

/// The reasons [`verify_and_validate`](JsonWebToken::verify_and_validate)
/// refuses a compact JWT.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TokenError {
    /// The compact serialization is malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The signature does not verify or the header is inconsistent.
    #[error(transparent)]
    Verify(#[from] VerifyError),
    /// The claims do not satisfy the validation context.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use serde_json::json;

    use super::*;
    use crate::jwa::{Hmac, HmacKey};

    fn claim(name: &str, value: Value) -> Claim {
        Claim::from_name_and_value(name, value).unwrap()
    }

    #[test]
    fn duplicate_claims_are_rejected() {
        let claims = [claim("iss", json!("joe")), claim("iss", json!("jane"))];
        assert!(matches!(
            Claims::from_claims(claims),
            Err(Error::DuplicateClaim(name)) if name == "iss"
        ));

        assert!(Claims::from_json(r#"{"iss":"joe","iss":"jane"}"#).is_err());
    }

    #[test]
    fn with_claims_overrides_without_mutating() {
        let base = Claims::from_claims([
            Claim::issuer("joe"),
            Claim::expiration_time(1300819380u64),
        ])
        .unwrap();

        let derived = base.with_claims([Claim::issuer("jane")]);

        assert_eq!(base.issuer(), Some("joe"));
        assert_eq!(derived.issuer(), Some("jane"));
        assert_eq!(derived.len(), 2);
    }

    #[test]
    fn serialization_preserves_claim_order() {
        let claims = Claims::from_claims([
            Claim::issuer("joe"),
            Claim::expiration_time(1300819380u64),
            claim("http://example.com/is_root", json!(true)),
        ])
        .unwrap();

        assert_eq!(
            claims.to_json().unwrap(),
            r#"{"iss":"joe","exp":1300819380,"http://example.com/is_root":true}"#
        );
    }

    #[test]
    fn an_empty_set_round_trips_through_the_empty_string() {
        let claims = Claims::new();
        assert_eq!(claims.to_json().unwrap(), "");
        assert_eq!(Claims::from_json("").unwrap(), claims);
        assert_eq!(claims.to_bytes().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn the_rfc_7519_example_claims_parse() {
        // the claims set of section 3.1, in compact form
        let claims = Claims::from_json(
            r#"{"iss":"joe","exp":1300819380,"http://example.com/is_root":true}"#,
        )
        .unwrap();

        assert_eq!(claims.issuer(), Some("joe"));
        assert_eq!(
            claims.expiration_time(),
            Some(NumericDate::new(1300819380))
        );
        assert_eq!(
            claims
                .require("http://example.com/is_root")
                .unwrap()
                .to_value(),
            json!(true)
        );
        assert!(matches!(
            claims.require("sub"),
            Err(Error::MissingClaim(name)) if name == "sub"
        ));
    }

    #[test]
    fn issuing_sets_the_media_type_and_algorithm() {
        let key = HmacKey::new(*b"secret", Hmac::Hs256);
        let claims = Claims::from_claims([Claim::subject("1234567890")]).unwrap();

        let signed = JsonWebToken::issue(claims, &key).unwrap();
        let header = signed.value().header();

        assert_eq!(
            header.typ().unwrap().unwrap().to_string(),
            "application/jwt"
        );
        assert!(header.algorithm().is_some());
    }

    #[test]
    fn a_token_survives_the_full_round_trip() {
        let key = HmacKey::new(*b"secret", Hmac::Hs256);
        let claims = Claims::from_claims([
            Claim::issuer("joe"),
            Claim::expiration_time(1300819380u64),
        ])
        .unwrap();

        let token = JsonWebToken::issue(claims.clone(), &key)
            .unwrap()
            .to_string();

        let context = ValidationContext::new()
            .with_reference_time(NumericDate::new(1300819000))
            .with_constraint("iss", ClaimValidator::Equals(json!("joe")));
        let verified = JsonWebToken::verify_and_validate(&token, &key, &context).unwrap();

        assert_eq!(verified.payload(), &claims);
    }

    #[test]
    fn validation_happens_after_verification() {
        let key = HmacKey::new(*b"secret", Hmac::Hs256);
        let claims = Claims::from_claims([Claim::expiration_time(1300819380u64)]).unwrap();
        let token = JsonWebToken::issue(claims, &key).unwrap().to_string();

        // authentic but expired
        let context = ValidationContext::new().with_reference_time(NumericDate::new(1300819381));
        let err = JsonWebToken::verify_and_validate(&token, &key, &context).unwrap_err();
        assert!(matches!(
            err,
            TokenError::Validation(ValidationError::Expired { .. })
        ));

        // tampered tokens never reach validation
        let wrong_key = HmacKey::new(*b"wrong", Hmac::Hs256);
        let err = JsonWebToken::verify_and_validate(&token, &wrong_key, &context).unwrap_err();
        assert!(matches!(
            err,
            TokenError::Verify(VerifyError::InvalidSignature)
        ));
    }
}
