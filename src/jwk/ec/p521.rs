//! Key types for the P-521 curve
use elliptic_curve::{PublicKey, SecretKey};
use p521::NistP521;

/// A P-521 public key used to verify signatures and/or encrypt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct P521PublicKey(PublicKey<NistP521>);

/// A P-521 private key used to create signatures and/or decrypt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct P521PrivateKey(SecretKey<NistP521>);

impl_serde_ec!(P521PublicKey, P521PrivateKey, "P-521", "EC", NistP521, P521);
