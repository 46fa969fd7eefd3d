use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::{
    fmt,
    ops::{Add, Sub},
    time::Duration,
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::Error;

/// A single member of a set of [`Claims`](super::Claims): a name paired
/// with a typed value.
///
/// Names registered in [section 4.1 of RFC 7519] map to a dedicated
/// variant. Everything else is kept in [`Claim::Other`] with its raw
/// JSON value, so unknown claims survive a round trip untouched.
///
/// [section 4.1 of RFC 7519]: <https://datatracker.ietf.org/doc/html/rfc7519#section-4.1>
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Claim {
    /// `iss`: the principal that issued the token
    /// ([section 4.1.1 of RFC 7519])
    ///
    /// [section 4.1.1 of RFC 7519]: <https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.1>
    Issuer(String),
    /// `sub`: the principal that is the subject of the token
    /// ([section 4.1.2 of RFC 7519])
    ///
    /// [section 4.1.2 of RFC 7519]: <https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.2>
    Subject(String),
    /// `aud`: the recipients the token is intended for
    /// ([section 4.1.3 of RFC 7519])
    ///
    /// [section 4.1.3 of RFC 7519]: <https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.3>
    Audience(Audience),
    /// `exp`: the time on or after which the token must not be accepted
    /// ([section 4.1.4 of RFC 7519])
    ///
    /// [section 4.1.4 of RFC 7519]: <https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.4>
    ExpirationTime(NumericDate),
    /// `nbf`: the time before which the token must not be accepted
    /// ([section 4.1.5 of RFC 7519])
    ///
    /// [section 4.1.5 of RFC 7519]: <https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.5>
    NotBefore(NumericDate),
    /// `iat`: the time at which the token was issued
    /// ([section 4.1.6 of RFC 7519])
    ///
    /// [section 4.1.6 of RFC 7519]: <https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.6>
    IssuedAt(NumericDate),
    /// `jti`: a unique identifier for the token
    /// ([section 4.1.7 of RFC 7519])
    ///
    /// [section 4.1.7 of RFC 7519]: <https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.7>
    JwtId(String),
    /// A claim this crate knows nothing about, holding its raw JSON
    /// value.
    Other(String, Value),
}

impl Claim {
    /// Builds the claim registered under `name` from its raw JSON value.
    ///
    /// Registered names get their typed representation. Unknown names
    /// end up as [`Claim::Other`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not have the shape required
    /// for a registered name, e.g. an `exp` that is not a non-negative
    /// integer.
    pub fn from_name_and_value(name: impl Into<String>, value: Value) -> Result<Self, Error> {
        let name = name.into();

        Ok(match name.as_str() {
            "iss" => Self::Issuer(typed(&name, value)?),
            "sub" => Self::Subject(typed(&name, value)?),
            "aud" => Self::Audience(typed(&name, value)?),
            "exp" => Self::ExpirationTime(typed(&name, value)?),
            "nbf" => Self::NotBefore(typed(&name, value)?),
            "iat" => Self::IssuedAt(typed(&name, value)?),
            "jti" => Self::JwtId(typed(&name, value)?),
            _ => Self::Other(name, value),
        })
    }

    /// The registered name of this claim.
    pub fn name(&self) -> &str {
        match self {
            Self::Issuer(_) => "iss",
            Self::Subject(_) => "sub",
            Self::Audience(_) => "aud",
            Self::ExpirationTime(_) => "exp",
            Self::NotBefore(_) => "nbf",
            Self::IssuedAt(_) => "iat",
            Self::JwtId(_) => "jti",
            Self::Other(name, _) => name,
        }
    }

    /// The raw JSON value of this claim, exactly as it would appear in a
    /// serialized claims set.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Issuer(s) | Self::Subject(s) | Self::JwtId(s) => Value::String(s.clone()),
            Self::Audience(Audience::One(aud)) => Value::String(aud.clone()),
            Self::Audience(Audience::Many(auds)) => {
                Value::Array(auds.iter().cloned().map(Value::String).collect())
            }
            Self::ExpirationTime(date) | Self::NotBefore(date) | Self::IssuedAt(date) => {
                Value::from(date.secs())
            }
            Self::Other(_, value) => value.clone(),
        }
    }

    /// Shorthand for building an `iss` claim.
    pub fn issuer(iss: impl Into<String>) -> Self {
        Self::Issuer(iss.into())
    }

    /// Shorthand for building a `sub` claim.
    pub fn subject(sub: impl Into<String>) -> Self {
        Self::Subject(sub.into())
    }

    /// Shorthand for building an `aud` claim.
    pub fn audience(aud: impl Into<Audience>) -> Self {
        Self::Audience(aud.into())
    }

    /// Shorthand for building an `exp` claim.
    pub fn expiration_time(exp: impl Into<NumericDate>) -> Self {
        Self::ExpirationTime(exp.into())
    }

    /// Shorthand for building an `nbf` claim.
    pub fn not_before(nbf: impl Into<NumericDate>) -> Self {
        Self::NotBefore(nbf.into())
    }

    /// Shorthand for building an `iat` claim.
    pub fn issued_at(iat: impl Into<NumericDate>) -> Self {
        Self::IssuedAt(iat.into())
    }

    /// Shorthand for building a `jti` claim.
    pub fn jwt_id(jti: impl Into<String>) -> Self {
        Self::JwtId(jti.into())
    }
}

/// The value of an `aud` claim: one or many case sensitive strings
/// ([section 4.1.3 of RFC 7519]).
///
/// In the special case of a single audience the claim may be serialized
/// as a plain string instead of an array, and both spellings are kept
/// apart so they round trip unchanged.
///
/// [section 4.1.3 of RFC 7519]: <https://datatracker.ietf.org/doc/html/rfc7519#section-4.1.3>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// A single audience, serialized as a plain string.
    One(String),
    /// A list of audiences.
    Many(Vec<String>),
}

impl Audience {
    /// Returns `true` if `audience` is one of the audiences of this
    /// claim.
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Self::One(aud) => aud == audience,
            Self::Many(auds) => auds.iter().any(|aud| aud == audience),
        }
    }

    /// Iterates over the audiences of this claim.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        match self {
            Self::One(aud) => core::slice::from_ref(aud),
            Self::Many(auds) => auds.as_slice(),
        }
        .iter()
        .map(String::as_str)
    }
}

impl From<String> for Audience {
    fn from(aud: String) -> Self {
        Self::One(aud)
    }
}

impl From<&str> for Audience {
    fn from(aud: &str) -> Self {
        Self::One(aud.to_string())
    }
}

impl From<Vec<String>> for Audience {
    fn from(auds: Vec<String>) -> Self {
        Self::Many(auds)
    }
}

/// The number of seconds from 1970-01-01T00:00:00Z UTC until the
/// specified UTC date/time, ignoring leap seconds
/// ([section 2 of RFC 7519]).
///
/// [section 2 of RFC 7519]: <https://datatracker.ietf.org/doc/html/rfc7519#section-2>
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct NumericDate(u64);

impl NumericDate {
    /// Creates a date from the number of seconds since the epoch.
    pub const fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// The number of seconds since the epoch.
    pub const fn secs(self) -> u64 {
        self.0
    }

    /// The current time, read from the system clock.
    ///
    /// A clock set before the epoch counts as the epoch itself.
    #[cfg(feature = "std")]
    pub fn now() -> Self {
        match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
            Ok(elapsed) => Self(elapsed.as_secs()),
            Err(_) => Self(0),
        }
    }
}

impl fmt::Display for NumericDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NumericDate {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

impl Add<Duration> for NumericDate {
    type Output = Self;

    /// Moves this date into the future, saturating at the numeric
    /// maximum.
    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs.as_secs()))
    }
}

impl Sub<Duration> for NumericDate {
    type Output = Self;

    /// Moves this date into the past, saturating at the epoch.
    fn sub(self, rhs: Duration) -> Self {
        Self(self.0.saturating_sub(rhs.as_secs()))
    }
}

/// Parse a typed claim value, reporting the claim name on error.
fn typed<T: DeserializeOwned>(name: &str, value: Value) -> Result<T, Error> {
    serde_json::from_value(value).map_err(|_| Error::InvalidValue {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn registered_names_get_typed_values() {
        let iss = Claim::from_name_and_value("iss", json!("joe")).unwrap();
        assert_eq!(iss, Claim::Issuer("joe".to_string()));

        let exp = Claim::from_name_and_value("exp", json!(1300819380)).unwrap();
        assert_eq!(exp, Claim::ExpirationTime(NumericDate::new(1300819380)));
    }

    #[test]
    fn unknown_names_are_preserved() {
        let claim =
            Claim::from_name_and_value("http://example.com/is_root", json!(true)).unwrap();
        assert_eq!(claim.name(), "http://example.com/is_root");
        assert_eq!(claim.to_value(), json!(true));
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        assert!(Claim::from_name_and_value("exp", json!("tomorrow")).is_err());
        assert!(Claim::from_name_and_value("exp", json!(-1)).is_err());
        assert!(Claim::from_name_and_value("iss", json!(42)).is_err());
        assert!(Claim::from_name_and_value("aud", json!(42)).is_err());
    }

    #[test]
    fn an_audience_may_be_one_or_many() {
        let one = Claim::from_name_and_value("aud", json!("s6BhdRkqt3")).unwrap();
        assert_eq!(one.to_value(), json!("s6BhdRkqt3"));

        let many = Claim::from_name_and_value("aud", json!(["a", "b"])).unwrap();
        match many {
            Claim::Audience(ref aud) => {
                assert!(aud.contains("a"));
                assert!(aud.contains("b"));
                assert!(!aud.contains("c"));
                assert_eq!(aud.iter().count(), 2);
            }
            ref other => panic!("unexpected claim {other:?}"),
        }
        assert_eq!(many.to_value(), json!(["a", "b"]));
    }

    #[test]
    fn dates_saturate_at_their_bounds() {
        let date = NumericDate::new(5);
        assert_eq!(date - Duration::from_secs(10), NumericDate::new(0));
        assert_eq!(
            NumericDate::new(u64::MAX) + Duration::from_secs(1),
            NumericDate::new(u64::MAX)
        );
        assert_eq!(date + Duration::from_secs(10), NumericDate::new(15));
    }
}
