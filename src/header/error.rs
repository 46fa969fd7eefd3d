use alloc::string::String;

use thiserror::Error;

/// Errors that may occur while working with a [`Header`](super::Header).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Two parameters with the same name were supplied while constructing
    /// a header.
    #[error("encountered two header parameters named `{0}`")]
    DuplicateHeader(String),
    /// The headers that form a JOSE header share members with the same
    /// name.
    #[error("the headers forming a JOSE header share a parameter named `{0}`")]
    NotDisjoint(String),
    /// A registered header parameter holds a value of the wrong shape,
    /// e.g. a string where a number is required.
    #[error("invalid value for the `{name}` header parameter")]
    InvalidValue {
        /// The name of the offending parameter.
        name: String,
    },
    /// A REQUIRED header is missing (e.g. the `alg` header).
    #[error("the required `{0}` header parameter is missing")]
    MissingHeader(String),
    /// The `crit` header is present but an empty list (`[]`).
    #[error("the `crit` header parameter is present but empty")]
    EmptyCriticalHeaders,
    /// The `crit` header lists a name that is defined by the JOSE
    /// specifications themselves, which is forbidden as per [section
    /// 4.1.11 of RFC 7515].
    ///
    /// [section 4.1.11 of RFC 7515]: <https://www.rfc-editor.org/rfc/rfc7515.html#section-4.1.11>
    #[error("the `{0}` header parameter must not appear in `crit`")]
    ForbiddenCriticalHeader(String),
    /// The `crit` header lists a name that does not appear in the header.
    #[error("the `crit` header parameter lists `{0}` but no such parameter is present")]
    MissingCriticalHeader(String),
    /// The `crit` header lists an extension this implementation (or the
    /// calling application) does not understand.
    #[error("the critical `{0}` header parameter is not understood")]
    UnknownCriticalHeader(String),
    /// The `b64` header parameter appears without being listed in `crit`,
    /// violating [section 6 of RFC 7797].
    ///
    /// [section 6 of RFC 7797]: <https://datatracker.ietf.org/doc/html/rfc7797#section-6>
    #[error("the `b64` header parameter must be listed in the `crit` header")]
    Base64NotCritical,
    /// The `typ` or `cty` parameter does not hold a valid media type.
    #[error("the `{name}` header parameter is not a valid media type")]
    InvalidMediaType {
        /// The name of the offending parameter.
        name: &'static str,
    },
    /// A JSON deserialization error, see [`serde_json::Error`] for details.
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
}
