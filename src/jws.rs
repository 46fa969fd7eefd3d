//! Implementation of JSON Web Signature (JWS) as defined in [RFC 7515]
//!
//! [RFC 7515]: <https://www.rfc-editor.org/rfc/rfc7515.html>

use alloc::{borrow::ToOwned, vec::Vec};
use core::{fmt, ops::Deref, str::FromStr};

use thiserror::Error;

use crate::{
    base64_url::Base64UrlString,
    format::Compact,
    header::{self, Header, Parameter},
    jwa::JsonWebAlgorithm,
    payload::{Payload, PayloadError},
    sign::Signer,
    verify::{Verifier, VerifyError},
};

/// A JSON Web Signature object before signing or after successful
/// verification: a payload together with the header parameters that
/// describe it.
///
/// Signing consumes this type and produces a [`Signed`] token. Verifying
/// an [`Unverified`] token hands it back, wrapped in [`Verified`]:
///
/// ```
/// use jwx::{
///     jwa::{Hmac, HmacKey},
///     jws::{JsonWebSignature, Unverified},
/// };
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let key = HmacKey::new(b"a secret at least 32 bytes long!", Hmac::Hs256);
///
/// let token = JsonWebSignature::new(String::from("hello"))
///     .sign(&key)?
///     .to_string();
///
/// let verified = token.parse::<Unverified<String>>()?.verify(&key)?;
/// assert_eq!(verified.payload(), "hello");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JsonWebSignature<T = Vec<u8>> {
    header: Header,
    payload: T,
}

impl<T> JsonWebSignature<T> {
    /// Creates a new JWS around `payload` with an empty header.
    ///
    /// The `alg` parameter is filled in by [`sign`](Self::sign) from the
    /// signer.
    pub fn new(payload: T) -> Self {
        Self {
            header: Header::new(),
            payload,
        }
    }

    /// Creates a new JWS around `payload` carrying additional `header`
    /// parameters, for example a media type or critical extensions.
    pub fn new_with_header(header: Header, payload: T) -> Self {
        Self { header, payload }
    }

    /// The header parameters of this JWS.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The payload of this JWS.
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Turns this JWS back into its payload.
    pub fn into_payload(self) -> T {
        self.payload
    }
}

impl<T: Payload> JsonWebSignature<T> {
    /// Signs this JWS with `signer`.
    ///
    /// The `alg` header parameter is taken from the signer and overrides
    /// any value set on the header beforehand. If the header carries
    /// `b64: false`, the payload enters the signing input raw instead of
    /// base64url encoded, as specified by [RFC 7797].
    ///
    /// # Errors
    ///
    /// Fails if the payload cannot be serialized, the header is
    /// inconsistent, or the signing operation itself fails. With
    /// `b64: false` the payload must be valid UTF-8 without any period,
    /// because it appears verbatim as the second segment of the token.
    ///
    /// [RFC 7797]: <https://datatracker.ietf.org/doc/html/rfc7797>
    pub fn sign<S: Signer>(self, signer: &S) -> Result<Signed<T>, SignError> {
        let mut parameters = alloc::vec![Parameter::Algorithm(signer.algorithm().into())];
        if let Some(kid) = signer.key_id() {
            parameters.push(Parameter::KeyId(kid.to_owned()));
        }

        let header = self.header.with_parameters(parameters);
        header.validate_critical()?;

        let payload = self.payload.to_bytes()?;
        let payload_segment = if header.base64url_encode_payload() {
            Base64UrlString::encode(&payload)
        } else {
            let text = core::str::from_utf8(payload.as_ref())
                .map_err(|_| SignError::UnencodedPayloadNotUtf8)?;
            if text.contains('.') {
                return Err(SignError::UnencodedPayloadHasPeriod);
            }
            Base64UrlString::from(text)
        };

        // The header is serialized exactly once. Its base64url form is
        // both the first segment of the token and the first half of the
        // signing input, so the two can never disagree.
        let raw_header = Base64UrlString::encode(header.to_json()?);
        let msg = signing_input(&raw_header, &payload_segment);
        let signature = signer.sign(&msg)?;

        let mut encoded = Compact::with_capacity(3);
        encoded.push_base64url(raw_header);
        encoded.push_base64url(payload_segment);
        encoded.push(&signature);

        Ok(Signed {
            value: JsonWebSignature {
                header,
                payload: self.payload,
            },
            encoded,
        })
    }
}

impl<T> From<T> for JsonWebSignature<T>
where
    T: Payload,
{
    fn from(payload: T) -> Self {
        Self::new(payload)
    }
}

/// The signing input of a JWS: the first two segments of the token
/// joined by a period.
fn signing_input(raw_header: &Base64UrlString, payload_segment: &Base64UrlString) -> Vec<u8> {
    let mut msg =
        Vec::with_capacity(raw_header.as_str().len() + payload_segment.as_str().len() + 1);
    msg.extend_from_slice(raw_header.as_str().as_bytes());
    msg.push(b'.');
    msg.extend_from_slice(payload_segment.as_str().as_bytes());
    msg
}

/// A successfully signed JWS together with its compact serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Signed<T> {
    value: JsonWebSignature<T>,
    encoded: Compact,
}

impl<T> Signed<T> {
    /// The signed value, with the header as it was serialized into the
    /// token.
    pub fn value(&self) -> &JsonWebSignature<T> {
        &self.value
    }

    /// The compact serialization of this token.
    pub fn encoded(&self) -> &Compact {
        &self.encoded
    }

    /// Turns this token into its compact serialization.
    pub fn into_encoded(self) -> Compact {
        self.encoded
    }
}

impl<T> fmt::Display for Signed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.encoded.fmt(f)
    }
}

/// A parsed JWS whose signature has not been checked yet.
///
/// Nothing about this token is trustworthy until [`verify`](Self::verify)
/// succeeded, including the header parameters exposed through
/// [`header`](Self::header).
#[derive(Debug, Clone, PartialEq)]
pub struct Unverified<T> {
    value: JsonWebSignature<T>,
    signature: Vec<u8>,
    /// The signing input as received, kept verbatim because the
    /// signature covers the received bytes, not a re-serialization.
    msg: Vec<u8>,
}

impl<T: Payload> Unverified<T> {
    /// Parses the three dot separated segments of `value` into their
    /// decoded parts.
    ///
    /// Whether the payload segment is base64url decoded depends on the
    /// `b64` header parameter of the token itself.
    ///
    /// # Errors
    ///
    /// Fails if the number of segments is not three, a segment is not
    /// valid base64url, or the first segment does not hold a valid
    /// header.
    pub fn decode(value: Compact) -> Result<Self, ParseError> {
        if value.len() != 3 {
            return Err(ParseError::InvalidFormat(value.len()));
        }
        let (Some(raw_header), Some(raw_payload), Some(signature)) =
            (value.part(0), value.part(1), value.part(2))
        else {
            return Err(ParseError::InvalidFormat(value.len()));
        };

        let header = raw_header
            .decode()
            .map_err(|_| ParseError::InvalidEncoding("header"))?;
        let header = core::str::from_utf8(&header).map_err(|_| ParseError::Utf8)?;
        let header = Header::from_json(header)?;

        let payload = if header.base64url_encode_payload() {
            raw_payload
                .decode()
                .map_err(|_| ParseError::InvalidEncoding("payload"))?
        } else {
            raw_payload.as_str().as_bytes().to_vec()
        };
        let signature = signature
            .decode()
            .map_err(|_| ParseError::InvalidEncoding("signature"))?;

        let msg = signing_input(raw_header, raw_payload);
        let payload = T::from_bytes(payload)?;

        Ok(Self {
            value: JsonWebSignature { header, payload },
            signature,
            msg,
        })
    }
}

impl<T> Unverified<T> {
    /// The header parameters of this token.
    ///
    /// These are unauthenticated until [`verify`](Self::verify)
    /// succeeded. They are exposed anyway because selecting the right
    /// key usually requires looking at `kid` or `alg` first.
    pub fn header(&self) -> &Header {
        &self.value.header
    }

    /// Checks the signature of this token with `verifier`.
    ///
    /// The `alg` header parameter must match the algorithm of the
    /// verifier before any cryptography runs. Tokens carrying critical
    /// extensions other than `b64` are rejected.
    ///
    /// # Errors
    ///
    /// Fails if the header is inconsistent, if the verifier does not
    /// match the token, or if the signature is invalid.
    pub fn verify<V: Verifier>(self, verifier: &V) -> Result<Verified<T>, VerifyError> {
        let header = &self.value.header;
        header.validate_critical()?;
        header.check_critical_understood(&["b64"])?;

        let alg = header
            .algorithm()
            .ok_or_else(|| header::Error::MissingHeader("alg".to_owned()))?;
        if *alg != JsonWebAlgorithm::Signing(verifier.algorithm()) {
            return Err(VerifyError::AlgorithmMismatch {
                header: alg.clone(),
                key: verifier.algorithm(),
            });
        }

        verifier.verify(&self.msg, &self.signature)?;

        Ok(Verified(self.value))
    }
}

impl<T: Payload> FromStr for Unverified<T> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(Compact::from(s))
    }
}

/// A JWS whose signature has been checked.
///
/// Dereferences to the [`JsonWebSignature`] it wraps.
#[derive(Debug, Clone, PartialEq)]
pub struct Verified<T>(JsonWebSignature<T>);

impl<T> Verified<T> {
    /// Unwraps the verified JWS.
    pub fn into_inner(self) -> JsonWebSignature<T> {
        self.0
    }
}

impl<T> Deref for Verified<T> {
    type Target = JsonWebSignature<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Errors that can occur while signing a JWS.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SignError {
    /// The payload could not be converted into bytes.
    #[error(transparent)]
    Payload(#[from] PayloadError),
    /// The header is inconsistent, for example an invalid `crit` list.
    #[error(transparent)]
    Header(#[from] header::Error),
    /// The signing operation itself failed.
    #[error(transparent)]
    Signature(#[from] signature::Error),
    /// The header disables payload encoding but the payload is not
    /// valid UTF-8.
    #[error("the unencoded payload is not valid UTF-8")]
    UnencodedPayloadNotUtf8,
    /// The header disables payload encoding but the payload contains a
    /// period, which the compact serialization cannot represent.
    #[error("the unencoded payload contains a period")]
    UnencodedPayloadHasPeriod,
}

/// Errors that can occur while parsing an [`Unverified`] token from its
/// compact serialization.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The token does not consist of three segments.
    #[error("expected 3 parts in the compact serialization but found {0}")]
    InvalidFormat(usize),
    /// A segment holds characters outside the base64url alphabet.
    #[error("the `{0}` segment is not valid Base64Url")]
    InvalidEncoding(&'static str),
    /// The protected header decoded to bytes that are not UTF-8.
    #[error("the protected header is not valid UTF-8")]
    Utf8,
    /// The protected header is not a valid JSON object.
    #[error(transparent)]
    Header(#[from] header::Error),
    /// The payload could not be parsed into the payload type.
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};

    use super::*;
    use crate::jwa::NoneAlgorithm;

    #[test]
    fn a_token_needs_three_parts() {
        let err = "a.b".parse::<Unverified<String>>().unwrap_err();
        assert!(matches!(err, ParseError::InvalidFormat(2)));
    }

    #[test]
    fn an_unsigned_token_round_trips() {
        let signed = JsonWebSignature::new(String::from("abc"))
            .sign(&NoneAlgorithm)
            .unwrap();
        assert_eq!(signed.to_string(), "eyJhbGciOiJub25lIn0.YWJj.");

        let verified = signed
            .to_string()
            .parse::<Unverified<String>>()
            .unwrap()
            .verify(&NoneAlgorithm)
            .unwrap();
        assert_eq!(verified.payload(), "abc");
    }

    #[test]
    fn an_unencoded_payload_must_not_contain_a_period() {
        let header = Header::from_parameters([
            Parameter::Base64UrlEncodePayload(false),
            Parameter::Critical(alloc::vec![String::from("b64")]),
        ])
        .unwrap();

        let err = JsonWebSignature::new_with_header(header, String::from("$.02"))
            .sign(&NoneAlgorithm)
            .unwrap_err();
        assert!(matches!(err, SignError::UnencodedPayloadHasPeriod));
    }
}
