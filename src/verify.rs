use thiserror::Error;

use crate::jwa::{JsonWebAlgorithm, JsonWebSigningAlgorithm};

/// Error type returned for the `verify` operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VerifyError {
    /// Indicating that the signature does not correspond to the message.
    #[error("invalid signature")]
    InvalidSignature,
    /// The `alg` header parameter of the token names a different
    /// algorithm than the key that is supposed to verify it.
    ///
    /// The comparison happens before any cryptography runs, so a token
    /// claiming `HS256` can never trick an RSA public key into acting as
    /// an HMAC secret.
    #[error("the token is protected with `{header}` but the key implements `{key}`")]
    AlgorithmMismatch {
        /// The algorithm from the `alg` header parameter.
        header: JsonWebAlgorithm,
        /// The algorithm of the verifying key.
        key: JsonWebSigningAlgorithm,
    },
    /// The header of the token is inconsistent, for example a missing
    /// `alg` parameter or a critical extension this implementation does
    /// not understand.
    #[error(transparent)]
    Header(#[from] crate::header::Error),
    /// Failed to verify message because of unexpected reason.
    ///
    /// This may occurr when communication to a HSM fails.
    #[error(transparent)]
    Other(signature::Error),
}

/// This trait represents anything that can be used to verify a JWS.
pub trait Verifier {
    /// The `verify` operation.
    ///
    /// If the message is valid, returns `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::InvalidSignature`] if the signature did not
    /// match, or [`VerifyError::Other`] if communication to an external
    /// verifier failed, or some other error occurred.
    fn verify(&self, msg: &[u8], signature: &[u8]) -> Result<(), VerifyError>;

    /// Return the type of signing algorithm this verifier checks
    /// signatures of.
    fn algorithm(&self) -> JsonWebSigningAlgorithm;
}

/// A trait to turn something into a [`Verifier`].
///
/// The counterpart of [`IntoSigner`](crate::IntoSigner) for the
/// verifying side.
pub trait IntoVerifier<T>
where
    T: Verifier,
{
    /// The error returned if the conversion failed
    type Error;

    /// Turn `self` into the [`Verifier`] `T`
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion failed
    fn into_verifier(self, alg: JsonWebSigningAlgorithm) -> Result<T, Self::Error>;
}

impl<A, T> IntoVerifier<T> for A
where
    T: crate::sign::FromKey<A> + Verifier,
{
    type Error = <T as crate::sign::FromKey<A>>::Error;

    fn into_verifier(self, alg: JsonWebSigningAlgorithm) -> Result<T, Self::Error> {
        T::from_key(self, alg)
    }
}
