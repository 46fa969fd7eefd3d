use alloc::{string::String, vec::Vec};

use rand_core::OsRng;
use rsa::{Oaep, Pkcs1v15Encrypt, Pkcs1v15Sign, Pss, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256, Sha384, Sha512};

use super::{JsonWebEncryptionAlgorithm, JsonWebSigningAlgorithm};
use crate::{
    jwe::{expected_cek_size, ContentEncryptionKey, KeyManagement, KeyManagementError, ProvidedCek},
    sign::Signer,
    verify::{Verifier, VerifyError},
};

/// The RSA based signing algorithms, covering both padding schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RsaSigning {
    /// RSASSA-PSS
    Pss(RsassaPss),
    /// RSASSA-PKCS1-v1_5
    RsPkcs1V1_5(RsassaPkcs1V1_5),
}

impl From<RsaSigning> for super::JsonWebSigningAlgorithm {
    fn from(x: RsaSigning) -> Self {
        Self::Rsa(x)
    }
}

impl From<RsaSigning> for super::JsonWebAlgorithm {
    fn from(x: RsaSigning) -> Self {
        Self::Signing(super::JsonWebSigningAlgorithm::Rsa(x))
    }
}

/// Digital Signature with RSASSA-PKCS1-v1_5 as defined in [section 3.3 of RFC
/// 7518]
///
/// [section 3.3 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-3.3>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RsassaPkcs1V1_5 {
    /// RSASSA-PKCS1-v1_5 using SHA-256
    Rs256,
    /// RSASSA-PKCS1-v1_5 using SHA-384
    Rs384,
    /// RSASSA-PKCS1-v1_5 using SHA-512
    Rs512,
}

/// Digital Signature with RSASSA-PSS as defined in [section 3.5 of RFC 7518]
///
/// [section 3.5 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-3.5>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RsassaPss {
    /// RSASSA-PSS using SHA-256 and MGF1 with SHA-256
    Ps256,
    /// RSASSA-PSS using SHA-384 and MGF1 with SHA-384
    Ps384,
    /// RSASSA-PSS using SHA-512 and MGF1 with SHA-512
    Ps512,
}

/// Key Encryption with RSAES OAEP as defined in [section 4.3 of RFC 7518]
///
/// [section 4.3 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.3>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RsaesOaep {
    /// RSAES OAEP using default parameters
    RsaesOaep,
    /// RSAES OAEP using SHA-256 and MGF1 with SHA-256
    RsaesOaep256,
}

/// The RSA based key management algorithms a [`RsaEncryptionKey`] can
/// perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RsaEncryption {
    /// RSAES-PKCS1-v1_5 as defined in [section 4.2 of RFC 7518]
    ///
    /// [section 4.2 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.2>
    Pkcs1_5,
    /// RSAES OAEP with the given digest
    Oaep(RsaesOaep),
}

impl From<RsaEncryption> for JsonWebEncryptionAlgorithm {
    fn from(x: RsaEncryption) -> Self {
        match x {
            RsaEncryption::Pkcs1_5 => Self::Rsa1_5,
            RsaEncryption::Oaep(oaep) => Self::RsaesOaep(oaep),
        }
    }
}

/// A private RSA key for the [`RsaSigning`] family of algorithms.
#[derive(Debug, Clone)]
pub struct RsaSigningKey {
    key: RsaPrivateKey,
    variant: RsaSigning,
    key_id: Option<String>,
}

impl RsaSigningKey {
    /// Creates a signing key from an RSA private key.
    pub fn new(key: RsaPrivateKey, variant: RsaSigning) -> Self {
        Self {
            key,
            variant,
            key_id: None,
        }
    }

    /// Attaches a key id that will end up in the `kid` header parameter
    /// of tokens signed with this key.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    /// The public half of this key.
    pub fn verifying_key(&self) -> RsaVerifyingKey {
        RsaVerifyingKey {
            key: self.key.to_public_key(),
            variant: self.variant,
        }
    }
}

impl Signer for RsaSigningKey {
    fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, signature::Error> {
        let signature = match self.variant {
            RsaSigning::RsPkcs1V1_5(digest) => {
                let (scheme, hashed) = match digest {
                    RsassaPkcs1V1_5::Rs256 => (
                        Pkcs1v15Sign::new::<Sha256>(),
                        Sha256::digest(msg).to_vec(),
                    ),
                    RsassaPkcs1V1_5::Rs384 => (
                        Pkcs1v15Sign::new::<Sha384>(),
                        Sha384::digest(msg).to_vec(),
                    ),
                    RsassaPkcs1V1_5::Rs512 => (
                        Pkcs1v15Sign::new::<Sha512>(),
                        Sha512::digest(msg).to_vec(),
                    ),
                };
                self.key.sign_with_rng(&mut OsRng, scheme, &hashed)
            }
            RsaSigning::Pss(digest) => match digest {
                RsassaPss::Ps256 => self.key.sign_with_rng(
                    &mut OsRng,
                    Pss::new::<Sha256>(),
                    &Sha256::digest(msg),
                ),
                RsassaPss::Ps384 => self.key.sign_with_rng(
                    &mut OsRng,
                    Pss::new::<Sha384>(),
                    &Sha384::digest(msg),
                ),
                RsassaPss::Ps512 => self.key.sign_with_rng(
                    &mut OsRng,
                    Pss::new::<Sha512>(),
                    &Sha512::digest(msg),
                ),
            },
        };
        signature.map_err(|_| signature::Error::new())
    }

    fn algorithm(&self) -> JsonWebSigningAlgorithm {
        JsonWebSigningAlgorithm::Rsa(self.variant)
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }
}

/// A public RSA key for the [`RsaSigning`] family of algorithms.
#[derive(Debug, Clone)]
pub struct RsaVerifyingKey {
    key: RsaPublicKey,
    variant: RsaSigning,
}

impl RsaVerifyingKey {
    /// Creates a verifying key from an RSA public key.
    pub fn new(key: RsaPublicKey, variant: RsaSigning) -> Self {
        Self { key, variant }
    }
}

impl Verifier for RsaVerifyingKey {
    fn verify(&self, msg: &[u8], signature: &[u8]) -> Result<(), VerifyError> {
        let verified = match self.variant {
            RsaSigning::RsPkcs1V1_5(digest) => match digest {
                RsassaPkcs1V1_5::Rs256 => self.key.verify(
                    Pkcs1v15Sign::new::<Sha256>(),
                    &Sha256::digest(msg),
                    signature,
                ),
                RsassaPkcs1V1_5::Rs384 => self.key.verify(
                    Pkcs1v15Sign::new::<Sha384>(),
                    &Sha384::digest(msg),
                    signature,
                ),
                RsassaPkcs1V1_5::Rs512 => self.key.verify(
                    Pkcs1v15Sign::new::<Sha512>(),
                    &Sha512::digest(msg),
                    signature,
                ),
            },
            RsaSigning::Pss(digest) => match digest {
                RsassaPss::Ps256 => {
                    self.key
                        .verify(Pss::new::<Sha256>(), &Sha256::digest(msg), signature)
                }
                RsassaPss::Ps384 => {
                    self.key
                        .verify(Pss::new::<Sha384>(), &Sha384::digest(msg), signature)
                }
                RsassaPss::Ps512 => {
                    self.key
                        .verify(Pss::new::<Sha512>(), &Sha512::digest(msg), signature)
                }
            },
        };
        verified.map_err(|_| VerifyError::InvalidSignature)
    }

    fn algorithm(&self) -> JsonWebSigningAlgorithm {
        JsonWebSigningAlgorithm::Rsa(self.variant)
    }
}

/// An RSA key for the `RSA1_5`, `RSA-OAEP` and `RSA-OAEP-256` key
/// management algorithms.
///
/// A key built from only the public half can encrypt new tokens but will
/// refuse to decrypt.
#[derive(Debug, Clone)]
pub struct RsaEncryptionKey {
    public: RsaPublicKey,
    private: Option<RsaPrivateKey>,
    variant: RsaEncryption,
    key_id: Option<String>,
}

impl RsaEncryptionKey {
    /// Creates a key that can both encrypt and decrypt.
    pub fn new(key: RsaPrivateKey, variant: RsaEncryption) -> Self {
        Self {
            public: key.to_public_key(),
            private: Some(key),
            variant,
            key_id: None,
        }
    }

    /// Creates a key from only the public half. Such a key encrypts new
    /// tokens but cannot decrypt received ones.
    pub fn encrypt_only(key: RsaPublicKey, variant: RsaEncryption) -> Self {
        Self {
            public: key,
            private: None,
            variant,
            key_id: None,
        }
    }

    /// Attaches a key id that will end up in the `kid` header parameter
    /// of tokens encrypted with this key.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

impl KeyManagement for RsaEncryptionKey {
    fn algorithm(&self) -> JsonWebEncryptionAlgorithm {
        self.variant.into()
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn provide_cek(
        &self,
        enc: &super::JsonWebContentEncryptionAlgorithm,
    ) -> Result<ProvidedCek, KeyManagementError> {
        let cek = super::random_bytes(expected_cek_size(enc)?)
            .map_err(|_| KeyManagementError::Rng)?;

        let encrypted_key = match self.variant {
            RsaEncryption::Pkcs1_5 => self.public.encrypt(&mut OsRng, Pkcs1v15Encrypt, &cek),
            RsaEncryption::Oaep(RsaesOaep::RsaesOaep) => {
                self.public.encrypt(&mut OsRng, Oaep::new::<sha1::Sha1>(), &cek)
            }
            RsaEncryption::Oaep(RsaesOaep::RsaesOaep256) => {
                self.public.encrypt(&mut OsRng, Oaep::new::<Sha256>(), &cek)
            }
        }
        .map_err(KeyManagementError::Rsa)?;

        Ok(ProvidedCek {
            cek: ContentEncryptionKey::new(cek),
            encrypted_key,
            parameters: Vec::new(),
        })
    }

    fn decrypt_cek(
        &self,
        encrypted_key: &[u8],
        enc: &super::JsonWebContentEncryptionAlgorithm,
        _header: &crate::header::JoseHeader<'_>,
    ) -> Result<ContentEncryptionKey, KeyManagementError> {
        let key = self
            .private
            .as_ref()
            .ok_or(KeyManagementError::NoPrivateKey)?;

        // a padding failure must not be distinguishable from any other
        // decryption failure
        let cek = match self.variant {
            RsaEncryption::Pkcs1_5 => key.decrypt(Pkcs1v15Encrypt, encrypted_key),
            RsaEncryption::Oaep(RsaesOaep::RsaesOaep) => {
                key.decrypt(Oaep::new::<sha1::Sha1>(), encrypted_key)
            }
            RsaEncryption::Oaep(RsaesOaep::RsaesOaep256) => {
                key.decrypt(Oaep::new::<Sha256>(), encrypted_key)
            }
        }
        .map_err(|_| KeyManagementError::Unwrap)?;

        if cek.len() != expected_cek_size(enc)? {
            return Err(KeyManagementError::Unwrap);
        }

        Ok(ContentEncryptionKey::new(cek))
    }
}
