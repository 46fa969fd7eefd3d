use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::fmt;

use secrecy::{ExposeSecret, SecretSlice};
use thiserror::Error;

use crate::{
    header::{JoseHeader, Parameter},
    jwa::{JsonWebContentEncryptionAlgorithm, JsonWebEncryptionAlgorithm},
};

/// The symmetric key a single token's payload is encrypted with
/// ([section 2 of RFC 7516]).
///
/// A fresh one is generated for every token unless the key management
/// algorithm dictates it (`dir` and `ECDH-ES` in direct mode). The raw
/// bytes are zeroized when the key is dropped and kept out of [`Debug`]
/// output.
///
/// [section 2 of RFC 7516]: <https://datatracker.ietf.org/doc/html/rfc7516#section-2>
#[derive(Clone)]
pub struct ContentEncryptionKey {
    bytes: SecretSlice<u8>,
}

impl ContentEncryptionKey {
    /// Wraps the given raw key bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: SecretSlice::from(bytes.into()),
        }
    }

    /// The raw key bytes.
    pub fn expose(&self) -> &[u8] {
        self.bytes.expose_secret()
    }

    /// The key length in bytes.
    pub fn len(&self) -> usize {
        self.expose().len()
    }

    /// Returns `true` if the key is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ContentEncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentEncryptionKey")
            .field("bytes", &"[redacted]")
            .finish()
    }
}

/// Everything a key management algorithm contributes to one token.
#[derive(Debug)]
pub struct ProvidedCek {
    /// The key the payload will be encrypted with.
    pub cek: ContentEncryptionKey,
    /// The second segment of the token. Empty for algorithms that do not
    /// transport a key (`dir`, `ECDH-ES` in direct mode).
    pub encrypted_key: Vec<u8>,
    /// Parameters the algorithm needs the receiving side to see, e.g.
    /// `epk` for ECDH-ES or `p2s`/`p2c` for PBES2. They are merged into
    /// the protected header.
    pub parameters: Vec<Parameter>,
}

/// A key for one of the key management algorithms of
/// [section 4.1 of RFC 7518].
///
/// Implementations cover both directions where the key material allows
/// it. An asymmetric key constructed from only the public part reports
/// [`KeyManagementError::NoPrivateKey`] when asked to decrypt.
///
/// [section 4.1 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.1>
pub trait KeyManagement {
    /// The algorithm this key manages content encryption keys with. Ends
    /// up as the `alg` header parameter.
    fn algorithm(&self) -> JsonWebEncryptionAlgorithm;

    /// An identifier for this key, put into the `kid` header parameter
    /// if present.
    fn key_id(&self) -> Option<&str> {
        None
    }

    /// Comes up with the content encryption key for a new token, along
    /// with its encrypted form and any header parameters the receiving
    /// side needs to undo the operation.
    ///
    /// Generation and wrapping happen in one step because some
    /// algorithms derive the key instead of generating it, and ECDH-ES
    /// with key wrapping must wrap with an ephemeral secret that only
    /// lives for the duration of this call.
    ///
    /// # Errors
    ///
    /// Returns an error if the key does not fit the algorithm or the
    /// wrapping operation fails.
    fn provide_cek(
        &self,
        enc: &JsonWebContentEncryptionAlgorithm,
    ) -> Result<ProvidedCek, KeyManagementError>;

    /// Recovers the content encryption key of a received token from its
    /// encrypted key segment and the header parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if required header parameters are missing or the
    /// encrypted key cannot be decrypted with this key.
    fn decrypt_cek(
        &self,
        encrypted_key: &[u8],
        enc: &JsonWebContentEncryptionAlgorithm,
        header: &JoseHeader<'_>,
    ) -> Result<ContentEncryptionKey, KeyManagementError>;
}

/// Errors returned by [`KeyManagement`] implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KeyManagementError {
    /// A header parameter the algorithm requires is missing.
    #[error("the required `{0}` header parameter is missing")]
    MissingParameter(&'static str),
    /// A header parameter the algorithm requires holds an unusable
    /// value.
    #[error("the `{0}` header parameter is invalid")]
    InvalidParameter(&'static str),
    /// The supplied or recovered key has the wrong length for the
    /// algorithm it is used with.
    #[error("expected a key of {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// The length the algorithm requires.
        expected: usize,
        /// The length that was supplied.
        actual: usize,
    },
    /// The content encryption key could not be decrypted. Deliberately
    /// carries no detail about what went wrong.
    #[error("failed to decrypt the content encryption key")]
    Unwrap,
    /// The content encryption key could not be encrypted.
    #[error("failed to encrypt the content encryption key")]
    Wrap,
    /// The `p2c` count of a received token exceeds what this key is
    /// willing to spend on PBKDF2.
    #[error("refusing the PBES2 iteration count {0}")]
    IterationLimit(u64),
    /// The algorithm does not transport a key but the token carries a
    /// non-empty encrypted key segment.
    #[error("the algorithm does not use an encrypted key but the token carries one")]
    UnexpectedEncryptedKey,
    /// The content encryption algorithm is not supported, so the
    /// required key size is unknown.
    #[error("unsupported content encryption algorithm `{0}`")]
    UnsupportedEncryption(String),
    /// The operating system failed to produce random bytes.
    #[error("failed to get randomness from the operating system")]
    Rng,
    /// An RSA operation failed while encrypting.
    #[error("{0}")]
    Rsa(rsa::Error),
    /// The key holds no private part, so it can only encrypt.
    #[error("the key has no private part to decrypt with")]
    NoPrivateKey,
}

/// The key size the given content encryption algorithm requires.
pub(crate) fn expected_cek_size(
    enc: &JsonWebContentEncryptionAlgorithm,
) -> Result<usize, KeyManagementError> {
    enc.key_size()
        .ok_or_else(|| KeyManagementError::UnsupportedEncryption(enc.to_string()))
}

/// Checks a recovered content encryption key against the size the
/// content encryption algorithm requires.
pub(crate) fn check_cek_size(
    enc: &JsonWebContentEncryptionAlgorithm,
    cek: &[u8],
) -> Result<(), KeyManagementError> {
    let expected = expected_cek_size(enc)?;
    if cek.len() != expected {
        return Err(KeyManagementError::InvalidKeyLength {
            expected,
            actual: cek.len(),
        });
    }
    Ok(())
}
