//! Helpers for base64 urlsafe encoded stuff

use alloc::{borrow::ToOwned, string::String, vec::Vec};
use core::{fmt, ops::Deref};

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{de::Error, Deserialize, Deserializer, Serialize};
use thiserror::Error;
use zeroize::Zeroize;

/// Error type indicating that a string was expected to hold
/// unpadded Base64Url data but does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the string is not a valid Base64Url representation")]
pub struct NoBase64UrlString;

/// A wrapper around a [`String`] that is supposed to hold Base64Url data.
///
/// The inner string is not validated on construction. Validation happens
/// when [`decode`](Self::decode) is called, so a value that is carried
/// around but never looked at can hold anything. This mirrors how
/// a serialized header or token travels: the raw characters are what gets
/// signed and compared, the decoded bytes only matter once someone reads
/// them.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Default)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Base64UrlString(String);

impl<'de> Deserialize<'de> for Base64UrlString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Ok(Base64UrlString(inner))
    }
}

impl fmt::Display for Base64UrlString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<String> for Base64UrlString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Base64UrlString {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl Base64UrlString {
    /// Creates a new, empty Base64Url string.
    #[inline]
    pub const fn new() -> Self {
        Self(String::new())
    }

    /// Encode the given bytes using Base64Url format.
    #[inline]
    pub fn encode(x: impl AsRef<[u8]>) -> Self {
        Base64UrlString(Base64UrlUnpadded::encode_string(x.as_ref()))
    }

    /// Decodes this string into its raw byte representation.
    ///
    /// # Errors
    ///
    /// Returns [`NoBase64UrlString`] if the inner string turns out not to
    /// be valid unpadded Base64Url.
    #[inline]
    pub fn decode(&self) -> Result<Vec<u8>, NoBase64UrlString> {
        Base64UrlUnpadded::decode_vec(&self.0).map_err(|_| NoBase64UrlString)
    }

    /// Returns the Base64Url characters as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Deref for Base64UrlString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Byte buffer that serializes as an unpadded Base64Url string.
///
/// Unlike [`Base64UrlString`] this decodes eagerly, because it backs key
/// material that must be valid before a key can be constructed from it.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Zeroize)]
pub(crate) struct Base64UrlBytes(pub(crate) Vec<u8>);

impl Serialize for Base64UrlBytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let encoded = Base64UrlUnpadded::encode_string(&self.0);
        encoded.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Base64UrlBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;

        let decoded = Base64UrlUnpadded::decode_vec(&encoded)
            .map_err(|_| D::Error::custom("encountered invalid Base64Url string"))?;

        Ok(Self(decoded))
    }
}

impl From<&[u8]> for Base64UrlBytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}
