use alloc::{
    string::{FromUtf8Error, String},
    vec::Vec,
};

use thiserror::Error;

/// Everything that can be carried as the payload of a token.
///
/// The payload travels as raw bytes, so a type has to say how it turns
/// into bytes and how it is rebuilt from them. [`Vec<u8>`] and [`String`]
/// carry themselves, [`Claims`](crate::Claims) goes through its JSON
/// representation.
pub trait Payload: Sized {
    /// The type holding the raw byte representation.
    ///
    /// Exists to avoid allocations where a borrow suffices.
    type Buf: AsRef<[u8]>;

    /// Turns `self` into the raw bytes that get signed or encrypted.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    fn to_bytes(&self) -> Result<Self::Buf, PayloadError>;

    /// Rebuilds the payload from the raw bytes of a received token.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes do not form a valid payload of this
    /// type.
    fn from_bytes(bytes: Vec<u8>) -> Result<Self, PayloadError>;
}

/// Errors that may occur while converting a [`Payload`] to or from its
/// raw bytes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PayloadError {
    /// The payload could not be serialized to or deserialized from JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// The payload was expected to be UTF-8 but is not.
    #[error("the payload is not valid UTF-8")]
    Utf8(#[from] FromUtf8Error),
}

impl Payload for Vec<u8> {
    type Buf = Vec<u8>;

    fn to_bytes(&self) -> Result<Self::Buf, PayloadError> {
        Ok(self.clone())
    }

    fn from_bytes(bytes: Vec<u8>) -> Result<Self, PayloadError> {
        Ok(bytes)
    }
}

impl Payload for String {
    type Buf = Vec<u8>;

    fn to_bytes(&self) -> Result<Self::Buf, PayloadError> {
        Ok(self.as_bytes().to_vec())
    }

    fn from_bytes(bytes: Vec<u8>) -> Result<Self, PayloadError> {
        Ok(String::from_utf8(bytes)?)
    }
}
