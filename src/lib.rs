//! An implementation of the JSON Object Signing and Encryption (JOSE)
//! family of specifications, namely JSON Web Signature ([RFC 7515]),
//! JSON Web Encryption ([RFC 7516]), JSON Web Algorithms ([RFC 7518]),
//! JSON Web Key ([RFC 7517]) and JSON Web Token ([RFC 7519]).
//!
//! Only the compact serialization of JWS and JWE is implemented.
//!
//! This crate is `#![no_std]` but requires an allocator. The `std`
//! feature enables the system clock as the default reference time for
//! claim validation.
//!
//! [RFC 7515]: <https://datatracker.ietf.org/doc/html/rfc7515>
//! [RFC 7516]: <https://datatracker.ietf.org/doc/html/rfc7516>
//! [RFC 7517]: <https://datatracker.ietf.org/doc/html/rfc7517>
//! [RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518>
//! [RFC 7519]: <https://datatracker.ietf.org/doc/html/rfc7519>
#![warn(
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    explicit_outlives_requirements,
    clippy::missing_const_for_fn,
    clippy::missing_errors_doc
)]
#![deny(
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    macro_use_extern_crate,
    non_ascii_idents,
    elided_lifetimes_in_paths
)]
#![forbid(unsafe_code)]
#![no_std]

extern crate alloc;
#[cfg(any(feature = "std", test))]
extern crate std;

#[macro_use]
mod macros;

mod sign;
pub use sign::*;

mod verify;
pub use verify::*;

mod base64_url;
mod payload;
mod sealed;
mod uri;

pub mod format;
pub mod header;
pub mod jwa;
pub mod jwe;
pub mod jwk;
pub mod jws;
pub mod jwt;
pub mod policy;

#[doc(inline)]
pub use self::{
    base64_url::{Base64UrlString, NoBase64UrlString},
    header::{Header, JoseHeader, Parameter},
    jwe::JsonWebEncryption,
    jwk::JsonWebKey,
    jws::JsonWebSignature,
    jwt::{Claims, JsonWebToken},
    payload::{Payload, PayloadError},
    uri::Uri,
};

/// Type alias to make `JsonWebSignature` easier to access.
pub type JWS<T> = JsonWebSignature<T>;

/// Type alias to make `JsonWebEncryption` easier to access.
pub type JWE<T> = JsonWebEncryption<T>;

/// Type alias to make `JsonWebToken` easier to access.
pub type JWT = JsonWebToken;
