//! The JOSE header and its parameters ([section 4 of RFC 7515])
//!
//! [section 4 of RFC 7515]: <https://datatracker.ietf.org/doc/html/rfc7515#section-4>

use alloc::{
    borrow::{Cow, ToOwned},
    string::String,
    vec::Vec,
};
use core::fmt;

use hashbrown::DefaultHashBuilder;
use indexmap::IndexMap;
use mediatype::MediaTypeBuf;
use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::Value;

mod error;
mod parameter;

pub use self::{error::Error, parameter::Parameter};

use crate::{
    jwa::{JsonWebAlgorithm, JsonWebCompressionAlgorithm, JsonWebContentEncryptionAlgorithm},
    Base64UrlString,
};

/// Map from parameter name to parameter, preserving insertion order.
///
/// The order matters for reproducibility: serializing a header emits its
/// parameters exactly in the order they were supplied.
type ParameterMap = IndexMap<String, Parameter, DefaultHashBuilder>;

/// An ordered collection of uniquely named [`Parameter`]s.
///
/// A header is immutable. Adding or overriding parameters happens through
/// [`with_parameters`](Self::with_parameters), which leaves the original
/// untouched and returns the derived header.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Header {
    parameters: ParameterMap,
}

impl Header {
    /// Creates a header without any parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a header holding the given parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateHeader`] if two parameters share a name.
    pub fn from_parameters(
        parameters: impl IntoIterator<Item = Parameter>,
    ) -> Result<Self, Error> {
        let mut map = ParameterMap::default();

        for parameter in parameters {
            let name = parameter.name().to_owned();
            if map.insert(name.clone(), parameter).is_some() {
                return Err(Error::DuplicateHeader(name));
            }
        }

        Ok(Self { parameters: map })
    }

    /// Returns a copy of this header with the given parameters added.
    ///
    /// A parameter whose name is already present replaces the existing
    /// one, keeping its position. New names are appended.
    #[must_use]
    pub fn with_parameters(&self, parameters: impl IntoIterator<Item = Parameter>) -> Self {
        let mut map = self.parameters.clone();

        for parameter in parameters {
            map.insert(parameter.name().to_owned(), parameter);
        }

        Self { parameters: map }
    }

    /// Looks up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    /// Returns `true` if a parameter with the given name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    /// Looks up a parameter by name, turning its absence into an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingHeader`] if no such parameter exists.
    pub fn require(&self, name: &str) -> Result<&Parameter, Error> {
        self.get(name)
            .ok_or_else(|| Error::MissingHeader(name.to_owned()))
    }

    /// Iterates over the parameters in their insertion order.
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.values()
    }

    /// The number of parameters in this header.
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Returns `true` if this header has no parameters.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// The `alg` parameter, if present.
    pub fn algorithm(&self) -> Option<&JsonWebAlgorithm> {
        match self.get("alg") {
            Some(Parameter::Algorithm(alg)) => Some(alg),
            _ => None,
        }
    }

    /// The `enc` parameter, if present.
    pub fn content_encryption_algorithm(&self) -> Option<&JsonWebContentEncryptionAlgorithm> {
        match self.get("enc") {
            Some(Parameter::ContentEncryption(enc)) => Some(enc),
            _ => None,
        }
    }

    /// The `zip` parameter, if present.
    pub fn compression_algorithm(&self) -> Option<&JsonWebCompressionAlgorithm> {
        match self.get("zip") {
            Some(Parameter::Compression(zip)) => Some(zip),
            _ => None,
        }
    }

    /// The `kid` parameter, if present.
    pub fn key_id(&self) -> Option<&str> {
        match self.get("kid") {
            Some(Parameter::KeyId(kid)) => Some(kid),
            _ => None,
        }
    }

    /// The `crit` parameter, if present.
    pub fn critical(&self) -> Option<&[String]> {
        match self.get("crit") {
            Some(Parameter::Critical(names)) => Some(names),
            _ => None,
        }
    }

    /// Whether the payload of a JWS is Base64Url encoded, as controlled
    /// by the `b64` parameter ([section 3 of RFC 7797]).
    ///
    /// Defaults to `true` if the parameter is absent.
    ///
    /// [section 3 of RFC 7797]: <https://datatracker.ietf.org/doc/html/rfc7797#section-3>
    pub fn base64url_encode_payload(&self) -> bool {
        match self.get("b64") {
            Some(Parameter::Base64UrlEncodePayload(b64)) => *b64,
            _ => true,
        }
    }

    /// The `typ` parameter resolved into a media type.
    ///
    /// A value without a `/` is interpreted as `application/<value>`, as
    /// required by [section 4.1.9 of RFC 7515]. `Ok(None)` means the
    /// parameter is absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMediaType`] if the value cannot be parsed
    /// as a media type.
    ///
    /// [section 4.1.9 of RFC 7515]: <https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.9>
    pub fn typ(&self) -> Result<Option<MediaTypeBuf>, Error> {
        match self.get("typ") {
            Some(Parameter::Type(typ)) => media_type(typ, "typ").map(Some),
            _ => Ok(None),
        }
    }

    /// The `cty` parameter resolved into a media type, with the same
    /// `application/` rule as [`typ`](Self::typ).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMediaType`] if the value cannot be parsed
    /// as a media type.
    pub fn content_type(&self) -> Result<Option<MediaTypeBuf>, Error> {
        match self.get("cty") {
            Some(Parameter::ContentType(cty)) => media_type(cty, "cty").map(Some),
            _ => Ok(None),
        }
    }

    /// Parses a header from its JSON representation.
    ///
    /// The empty string is accepted and produces an empty header, the
    /// inverse of [`to_json`](Self::to_json).
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a JSON object, holds
    /// duplicate member names or a registered parameter has a value of
    /// the wrong shape.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        if json.is_empty() {
            return Ok(Self::new());
        }

        serde_json::from_str(json).map_err(Error::from)
    }

    /// Serializes this header to JSON.
    ///
    /// A header without parameters produces the empty string rather than
    /// `{}`.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter value cannot be serialized.
    pub fn to_json(&self) -> Result<String, Error> {
        if self.parameters.is_empty() {
            return Ok(String::new());
        }

        serde_json::to_string(self).map_err(Error::from)
    }

    /// Checks the structural rules around the `crit` parameter that apply
    /// to producers and consumers alike ([section 4.1.11 of RFC 7515],
    /// [section 6 of RFC 7797]).
    ///
    /// [section 4.1.11 of RFC 7515]: <https://datatracker.ietf.org/doc/html/rfc7515#section-4.1.11>
    /// [section 6 of RFC 7797]: <https://datatracker.ietf.org/doc/html/rfc7797#section-6>
    pub(crate) fn validate_critical(&self) -> Result<(), Error> {
        if let Some(names) = self.critical() {
            if names.is_empty() {
                return Err(Error::EmptyCriticalHeaders);
            }

            for name in names {
                if parameter::REGISTERED_NAMES.contains(&name.as_str()) {
                    return Err(Error::ForbiddenCriticalHeader(name.clone()));
                }
                if !self.contains(name) {
                    return Err(Error::MissingCriticalHeader(name.clone()));
                }
            }
        }

        if self.contains("b64") && !self.critical().is_some_and(|c| c.iter().any(|n| n == "b64")) {
            return Err(Error::Base64NotCritical);
        }

        Ok(())
    }

    /// Checks that every critical extension is in `understood`. Receivers
    /// must reject tokens with critical extensions they cannot honor.
    pub(crate) fn check_critical_understood(&self, understood: &[&str]) -> Result<(), Error> {
        if let Some(names) = self.critical() {
            for name in names {
                if !understood.contains(&name.as_str()) {
                    return Err(Error::UnknownCriticalHeader(name.clone()));
                }
            }
        }

        Ok(())
    }
}

impl Serialize for Header {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.parameters.len()))?;

        for parameter in self.parameters.values() {
            map.serialize_entry(parameter.name(), &parameter.to_value())?;
        }

        map.end()
    }
}

impl<'de> Deserialize<'de> for Header {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct HeaderVisitor;

        impl<'de> Visitor<'de> for HeaderVisitor {
            type Value = Header;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a JSON object holding header parameters")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                use serde::de::Error as _;

                let mut parameters = ParameterMap::default();

                while let Some((name, value)) = map.next_entry::<String, Value>()? {
                    let parameter =
                        Parameter::from_name_and_value(name, value).map_err(A::Error::custom)?;
                    let name = parameter.name().to_owned();

                    if parameters.insert(name.clone(), parameter).is_some() {
                        return Err(A::Error::custom(Error::DuplicateHeader(name)));
                    }
                }

                Ok(Header { parameters })
            }
        }

        deserializer.deserialize_map(HeaderVisitor)
    }
}

/// The union of the headers that apply to one JOSE value
/// ([section 4 of RFC 7515]).
///
/// In the compact serialization there is only the protected header, but
/// key management algorithms look their parameters up through this view
/// so that other serializations can feed them from multiple headers. The
/// underlying headers stay untouched.
///
/// [section 4 of RFC 7515]: <https://datatracker.ietf.org/doc/html/rfc7515#section-4>
#[derive(Debug, Clone)]
pub struct JoseHeader<'a> {
    headers: Vec<&'a Header>,
}

impl<'a> JoseHeader<'a> {
    /// Creates the union of the given headers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotDisjoint`] if two headers share a parameter
    /// name, as forbidden by [section 7.2.1 of RFC 7515].
    ///
    /// [section 7.2.1 of RFC 7515]: <https://datatracker.ietf.org/doc/html/rfc7515#section-7.2.1>
    pub fn new(headers: impl IntoIterator<Item = &'a Header>) -> Result<Self, Error> {
        let headers: Vec<&'a Header> = headers.into_iter().collect();

        let mut seen = alloc::collections::BTreeSet::new();
        for header in &headers {
            for parameter in header.parameters() {
                if !seen.insert(parameter.name()) {
                    return Err(Error::NotDisjoint(parameter.name().to_owned()));
                }
            }
        }

        Ok(Self { headers })
    }

    /// Looks up a parameter by name across all headers.
    pub fn get(&self, name: &str) -> Option<&'a Parameter> {
        self.headers.iter().find_map(|header| header.get(name))
    }

    /// Returns `true` if any header holds a parameter with the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Looks up a parameter by name, turning its absence into an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingHeader`] if no header holds the parameter.
    pub fn require(&self, name: &str) -> Result<&'a Parameter, Error> {
        self.get(name)
            .ok_or_else(|| Error::MissingHeader(name.to_owned()))
    }

    /// The `alg` parameter, if present.
    pub fn algorithm(&self) -> Option<&'a JsonWebAlgorithm> {
        match self.get("alg") {
            Some(Parameter::Algorithm(alg)) => Some(alg),
            _ => None,
        }
    }

    /// The `enc` parameter, if present.
    pub fn content_encryption_algorithm(&self) -> Option<&'a JsonWebContentEncryptionAlgorithm> {
        match self.get("enc") {
            Some(Parameter::ContentEncryption(enc)) => Some(enc),
            _ => None,
        }
    }

    /// The `epk` parameter, if present, as its raw JSON object.
    pub fn ephemeral_public_key(&self) -> Option<&'a Value> {
        match self.get("epk") {
            Some(Parameter::EphemeralPublicKey(epk)) => Some(epk),
            _ => None,
        }
    }

    /// The `apu` parameter, if present.
    pub fn agreement_party_u_info(&self) -> Option<&'a Base64UrlString> {
        match self.get("apu") {
            Some(Parameter::AgreementPartyUInfo(apu)) => Some(apu),
            _ => None,
        }
    }

    /// The `apv` parameter, if present.
    pub fn agreement_party_v_info(&self) -> Option<&'a Base64UrlString> {
        match self.get("apv") {
            Some(Parameter::AgreementPartyVInfo(apv)) => Some(apv),
            _ => None,
        }
    }

    /// The `iv` parameter, if present.
    pub fn initialization_vector(&self) -> Option<&'a Base64UrlString> {
        match self.get("iv") {
            Some(Parameter::InitializationVector(iv)) => Some(iv),
            _ => None,
        }
    }

    /// The `tag` parameter, if present.
    pub fn authentication_tag(&self) -> Option<&'a Base64UrlString> {
        match self.get("tag") {
            Some(Parameter::AuthenticationTag(tag)) => Some(tag),
            _ => None,
        }
    }

    /// The `p2s` parameter, if present.
    pub fn pbes2_salt_input(&self) -> Option<&'a Base64UrlString> {
        match self.get("p2s") {
            Some(Parameter::Pbes2SaltInput(p2s)) => Some(p2s),
            _ => None,
        }
    }

    /// The `p2c` parameter, if present.
    pub fn pbes2_count(&self) -> Option<u64> {
        match self.get("p2c") {
            Some(Parameter::Pbes2Count(p2c)) => Some(*p2c),
            _ => None,
        }
    }
}

/// Resolves a `typ`/`cty` value into a media type, prepending
/// `application/` to values without a slash.
fn media_type(value: &str, name: &'static str) -> Result<MediaTypeBuf, Error> {
    let full: Cow<'_, str> = if value.contains('/') {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(alloc::format!("application/{value}"))
    };

    MediaTypeBuf::from_string(full.into_owned()).map_err(|_| Error::InvalidMediaType { name })
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use serde_json::json;

    use super::*;
    use crate::jwa::JsonWebSigningAlgorithm;

    fn parameter(name: &str, value: Value) -> Parameter {
        Parameter::from_name_and_value(name, value).unwrap()
    }

    #[test]
    fn duplicate_parameters_are_rejected() {
        let parameters = [
            parameter("typ", json!("JWT")),
            parameter("typ", json!("JOSE")),
        ];
        assert!(matches!(
            Header::from_parameters(parameters),
            Err(Error::DuplicateHeader(name)) if name == "typ"
        ));

        let parameters = [parameter("typ", json!("JWT")), parameter("cty", json!("JWT"))];
        assert!(Header::from_parameters(parameters).is_ok());
    }

    #[test]
    fn duplicate_members_in_json_are_rejected() {
        assert!(Header::from_json(r#"{"typ":"JWT","typ":"JOSE"}"#).is_err());
    }

    #[test]
    fn with_parameters_overrides_without_mutating() {
        let base = Header::from_parameters([
            parameter("alg", json!("HS256")),
            parameter("kid", json!("a")),
        ])
        .unwrap();

        let derived = base.with_parameters([parameter("kid", json!("b"))]);

        assert_eq!(base.key_id(), Some("a"));
        assert_eq!(derived.key_id(), Some("b"));
        assert_eq!(derived.len(), 2);
    }

    #[test]
    fn serialization_preserves_parameter_order() {
        let header = Header::from_parameters([
            parameter("typ", json!("JWT")),
            parameter("alg", json!("HS256")),
            parameter("x-seq", json!(17)),
        ])
        .unwrap();

        assert_eq!(
            header.to_json().unwrap(),
            r#"{"typ":"JWT","alg":"HS256","x-seq":17}"#
        );
    }

    #[test]
    fn empty_header_round_trips_through_the_empty_string() {
        let header = Header::new();
        assert_eq!(header.to_json().unwrap(), "");
        assert_eq!(Header::from_json("").unwrap(), header);
    }

    #[test]
    fn unknown_parameters_round_trip() {
        let json = r#"{"alg":"ES256","x-order":["b","a"]}"#;
        let header = Header::from_json(json).unwrap();

        assert_eq!(
            header.algorithm(),
            Some(&JsonWebAlgorithm::Signing(JsonWebSigningAlgorithm::EcDSA(
                crate::jwa::EcDSA::Es256
            )))
        );
        assert_eq!(header.to_json().unwrap(), json);
    }

    #[test]
    fn abbreviated_media_types_resolve_against_application() {
        let jwt = MediaTypeBuf::from_string("application/jwt".to_string()).unwrap();

        let header = Header::from_json(r#"{"typ":"JWT"}"#).unwrap();
        assert_eq!(header.typ().unwrap(), Some(jwt.clone()));

        // a full media type passes through untouched
        let header = Header::from_json(r#"{"typ":"application/jwt"}"#).unwrap();
        assert_eq!(header.typ().unwrap(), Some(jwt));

        let header = Header::from_json(r#"{"cty":"application/json"}"#).unwrap();
        let cty = header.content_type().unwrap().unwrap();
        assert_eq!(cty.to_string(), "application/json");
    }

    #[test]
    fn critical_rules() {
        // registered names must not appear in crit
        let header = Header::from_json(r#"{"alg":"HS256","crit":["alg"]}"#).unwrap();
        assert!(matches!(
            header.validate_critical(),
            Err(Error::ForbiddenCriticalHeader(name)) if name == "alg"
        ));

        // listed names must exist
        let header = Header::from_json(r#"{"alg":"HS256","crit":["x-exp"]}"#).unwrap();
        assert!(matches!(
            header.validate_critical(),
            Err(Error::MissingCriticalHeader(name)) if name == "x-exp"
        ));

        // b64 must be listed in crit
        let header = Header::from_json(r#"{"alg":"HS256","b64":false}"#).unwrap();
        assert!(matches!(
            header.validate_critical(),
            Err(Error::Base64NotCritical)
        ));

        let header =
            Header::from_json(r#"{"alg":"HS256","b64":false,"crit":["b64"]}"#).unwrap();
        assert!(header.validate_critical().is_ok());

        // receivers reject extensions they do not understand
        let header =
            Header::from_json(r#"{"alg":"HS256","crit":["x-exp"],"x-exp":123}"#).unwrap();
        assert!(header.validate_critical().is_ok());
        assert!(matches!(
            header.check_critical_understood(&["b64"]),
            Err(Error::UnknownCriticalHeader(name)) if name == "x-exp"
        ));
    }

    #[test]
    fn jose_header_must_be_disjoint() {
        let protected = Header::from_parameters([parameter("alg", json!("HS256"))]).unwrap();
        let unprotected = Header::from_parameters([parameter("kid", json!("a"))]).unwrap();

        let merged = JoseHeader::new([&protected, &unprotected]).unwrap();
        assert!(merged.algorithm().is_some());
        assert_eq!(
            merged.get("kid").map(|p| p.name()),
            Some("kid")
        );

        let clashing = Header::from_parameters([parameter("alg", json!("HS384"))]).unwrap();
        assert!(matches!(
            JoseHeader::new([&protected, &clashing]),
            Err(Error::NotDisjoint(name)) if name == "alg"
        ));
    }
}
