use hashbrown::HashSet;
use thiserror::Error;

use super::Policy;
use crate::{
    jwa::{JsonWebEncryptionAlgorithm, JsonWebKeyAlgorithm, JsonWebSigningAlgorithm},
    jwk::{KeyOperation, KeyUsage},
};

/// Reasons a [`StandardPolicy`] can deny a JWK.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum StandardPolicyFail {
    /// The `alg` field contains a content encryption algorithm. Content
    /// encryption keys are used once per token and are not meant to be
    /// stored in a JWK.
    #[error("`alg` field contains a content encryption algorithm")]
    ContentEncryptionKey,
    /// The [`JsonWebSigningAlgorithm::None`] algorithm is not allowed as
    /// this indicates an unverified JWS.
    #[error("`none` algorithm is not allowed")]
    NoneAlgorithm,
    /// [`KeyUsage::Other`] can not be verified by the standard policy,
    /// thus it is simply declined and the user needs to use a custom
    /// policy to check it.
    #[error("`use` contained custom usage which can't be checked")]
    OtherKeyUsage,
    /// [`KeyOperation::Other`] can not be verified by the standard policy,
    /// thus it is simply declined and the user needs to use a custom
    /// policy to check it.
    #[error("`key_ops` contained custom operation which can't be checked")]
    OtherKeyOperation,
    /// The `alg` parameter carries a value that is not understood by this
    /// implementation.
    ///
    /// If you use custom [`Signer`](crate::sign::Signer) implementations
    /// with their own algorithm identifiers, provide your own [`Policy`]
    /// that compares the `Other` variants against the values your
    /// implementation understands.
    #[error("`alg` parameter contains an unknown value")]
    OtherAlgorithm,
    /// The `use` and `key_ops` parameters are both present but convey
    /// contradicting information, which [section 4.3 of RFC 7517] forbids.
    ///
    /// [section 4.3 of RFC 7517]: <https://datatracker.ietf.org/doc/html/rfc7517#section-4.3>
    #[error("the `use` and `key_ops` parameters are inconsistent with each other")]
    InconsistentProperties,
}

/// A [`Policy`] with reasonable rules. Use this struct if you want to have
/// some secure defaults.
///
/// # Included checks
///
/// - [`JsonWebSigningAlgorithm::None`] is not allowed
/// - unknown (`Other`) algorithms, usages and key operations are not
///   allowed because they can't be verified
/// - content encryption algorithms are not allowed in the `alg` parameter
///   of a key
/// - `use` and `key_ops` must convey consistent information if both are
///   present
#[non_exhaustive]
#[derive(Debug, Default, Clone)]
pub struct StandardPolicy;

impl StandardPolicy {
    /// Create a [`StandardPolicy`]
    pub const fn new() -> Self {
        Self
    }
}

impl Policy for StandardPolicy {
    type Error = StandardPolicyFail;

    fn algorithm(&self, alg: &JsonWebKeyAlgorithm) -> Result<(), Self::Error> {
        match alg {
            JsonWebKeyAlgorithm::Other(_)
            | JsonWebKeyAlgorithm::Signing(JsonWebSigningAlgorithm::Other(_))
            | JsonWebKeyAlgorithm::Encryption(JsonWebEncryptionAlgorithm::Other(_)) => {
                Err(StandardPolicyFail::OtherAlgorithm)
            }

            JsonWebKeyAlgorithm::ContentEncryption(_) => {
                Err(StandardPolicyFail::ContentEncryptionKey)
            }

            JsonWebKeyAlgorithm::Signing(JsonWebSigningAlgorithm::None) => {
                Err(StandardPolicyFail::NoneAlgorithm)
            }
            _ => Ok(()),
        }
    }

    fn compare_key_ops_and_use(
        &self,
        key_use: Option<&KeyUsage>,
        key_ops: Option<&HashSet<KeyOperation>>,
    ) -> Result<(), Self::Error> {
        if matches!(key_use, Some(KeyUsage::Other(..))) {
            return Err(StandardPolicyFail::OtherKeyUsage);
        }

        if let Some(key_ops) = key_ops {
            if key_ops.iter().any(|o| matches!(o, KeyOperation::Other(..))) {
                return Err(StandardPolicyFail::OtherKeyOperation);
            }
        }

        // RFC 7517 section 4.3: when both parameters are present, the
        // information they convey must be consistent
        if let (Some(key_use), Some(key_ops)) = (key_use, key_ops) {
            let allowed = |op: &KeyOperation| match key_use {
                KeyUsage::Signing => matches!(op, KeyOperation::Sign | KeyOperation::Verify),
                KeyUsage::Encryption => matches!(
                    op,
                    KeyOperation::Encrypt
                        | KeyOperation::Decrypt
                        | KeyOperation::WrapKey
                        | KeyOperation::UnwrapKey
                        | KeyOperation::DeriveKey
                        | KeyOperation::DeriveBits
                ),
                KeyUsage::Other(..) => false,
            };

            if !key_ops.iter().all(allowed) {
                return Err(StandardPolicyFail::InconsistentProperties);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        jwa::{AesCbcHs, Hmac, JsonWebContentEncryptionAlgorithm},
        jwk::JsonWebKey,
        policy::Checkable,
    };

    #[test]
    fn the_none_algorithm_is_refused() {
        let policy = StandardPolicy::new();
        assert_eq!(
            policy.algorithm(&JsonWebKeyAlgorithm::Signing(JsonWebSigningAlgorithm::None)),
            Err(StandardPolicyFail::NoneAlgorithm)
        );
    }

    #[test]
    fn content_encryption_algorithms_are_no_key_algorithms() {
        let policy = StandardPolicy::new();
        let alg = JsonWebKeyAlgorithm::ContentEncryption(
            JsonWebContentEncryptionAlgorithm::AesCbcHs(AesCbcHs::Aes128CbcHs256),
        );
        assert_eq!(
            policy.algorithm(&alg),
            Err(StandardPolicyFail::ContentEncryptionKey)
        );
    }

    #[test]
    fn unknown_algorithms_are_refused() {
        use alloc::string::String;

        let policy = StandardPolicy::new();
        let alg =
            JsonWebKeyAlgorithm::Signing(JsonWebSigningAlgorithm::Other(String::from("ML-DSA")));
        assert_eq!(
            policy.algorithm(&alg),
            Err(StandardPolicyFail::OtherAlgorithm)
        );

        let alg = JsonWebKeyAlgorithm::Signing(JsonWebSigningAlgorithm::Hmac(Hmac::Hs256));
        assert_eq!(policy.algorithm(&alg), Ok(()));
    }

    #[test]
    fn use_and_key_ops_must_agree() {
        let policy = StandardPolicy::new();

        let signing_ops =
            HashSet::from_iter([KeyOperation::Sign, KeyOperation::Verify]);
        assert_eq!(
            policy.compare_key_ops_and_use(Some(&KeyUsage::Signing), Some(&signing_ops)),
            Ok(())
        );
        assert_eq!(
            policy.compare_key_ops_and_use(Some(&KeyUsage::Encryption), Some(&signing_ops)),
            Err(StandardPolicyFail::InconsistentProperties)
        );

        let wrapping_ops =
            HashSet::from_iter([KeyOperation::WrapKey, KeyOperation::UnwrapKey]);
        assert_eq!(
            policy.compare_key_ops_and_use(Some(&KeyUsage::Encryption), Some(&wrapping_ops)),
            Ok(())
        );

        assert_eq!(policy.compare_key_ops_and_use(None, None), Ok(()));
    }

    #[test]
    fn custom_usages_and_operations_are_refused() {
        use alloc::string::String;

        let policy = StandardPolicy::new();
        assert_eq!(
            policy.compare_key_ops_and_use(Some(&KeyUsage::Other(String::from("attest"))), None),
            Err(StandardPolicyFail::OtherKeyUsage)
        );

        let ops = HashSet::from_iter([KeyOperation::Other(String::from("attest"))]);
        assert_eq!(
            policy.compare_key_ops_and_use(None, Some(&ops)),
            Err(StandardPolicyFail::OtherKeyOperation)
        );
    }

    #[test]
    fn keys_are_checked_against_the_policy() {
        let jwk: JsonWebKey = serde_json::from_str(
            r#"{"kty": "oct", "k": "AAECAwQFBgcICQoLDA0ODw", "use": "sig", "alg": "HS256"}"#,
        )
        .unwrap();
        let checked = jwk.check(StandardPolicy::new()).unwrap();
        assert_eq!(checked.key_id(), None);

        let jwk: JsonWebKey = serde_json::from_str(
            r#"{"kty": "oct", "k": "AAECAwQFBgcICQoLDA0ODw", "alg": "none"}"#,
        )
        .unwrap();
        let (_, error) = jwk.check(StandardPolicy::new()).unwrap_err();
        assert_eq!(error, StandardPolicyFail::NoneAlgorithm);
    }
}
