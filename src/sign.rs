use alloc::vec::Vec;

use thiserror::Error;

use crate::jwa::JsonWebSigningAlgorithm;

/// This trait represents anything that can be used to sign a JWS.
///
/// To be able to be used as a [`Signer`], one must provide the [sign
/// operation] itself, and also needs to [specify the algorithm] used for
/// signing. The algorithm will be used as the value for the `alg` header
/// parameter of the signed token.
///
/// [sign operation]: Signer::sign
/// [specify the algorithm]: Signer::algorithm
pub trait Signer {
    /// Sign the given bytestring using this signer and return the
    /// signature.
    ///
    /// # Errors
    ///
    /// Returns an error if the signing operation fails. An error usually
    /// only appears when communicating with external signers.
    fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, signature::Error>;

    /// Return the type of signing algorithm used by this signer.
    fn algorithm(&self) -> JsonWebSigningAlgorithm;

    /// JsonWebSignatures *can* contain a key id which is specified
    /// by this method.
    fn key_id(&self) -> Option<&str> {
        None
    }
}

/// An error used if [`FromKey`], [`IntoSigner`] or
/// [`IntoVerifier`](crate::IntoVerifier) expected a different algorithm
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid algorithm")]
pub struct InvalidSigningAlgorithmError;

/// A trait for keys that can be turned into a [`Signer`] or a
/// [`Verifier`](crate::Verifier) once the algorithm is known
pub trait FromKey<K>: Sized {
    /// The error returned if the conversion failed
    type Error;

    /// Turn `K` into this key type, set up for `alg`.
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion failed
    fn from_key(value: K, alg: JsonWebSigningAlgorithm) -> Result<Self, Self::Error>;
}

/// A trait to turn something into a [`Signer`].
///
/// Some key types like the RSA keys need to know which
/// [algorithm](JsonWebSigningAlgorithm) to use.
pub trait IntoSigner<T>
where
    T: Signer,
{
    /// The error returned if the conversion failed
    type Error;

    /// Turn `self` into the [`Signer`] `T`
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion failed
    fn into_signer(self, alg: JsonWebSigningAlgorithm) -> Result<T, Self::Error>;
}

impl<A, T> IntoSigner<T> for A
where
    T: FromKey<A> + Signer,
{
    type Error = <T as FromKey<A>>::Error;

    fn into_signer(self, alg: JsonWebSigningAlgorithm) -> Result<T, Self::Error> {
        T::from_key(self, alg)
    }
}
