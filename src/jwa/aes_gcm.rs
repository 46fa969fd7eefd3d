use alloc::{string::String, vec::Vec};

use aead::{Aead, Key, KeyInit, Nonce, Payload};
use aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm as AesGcmCipher};
use secrecy::{ExposeSecret, SecretSlice};
use typenum::consts::U12;

use super::{AuthenticatedCiphertext, ContentEncryptionError, JsonWebEncryptionAlgorithm};
use crate::{
    header::Parameter,
    jwe::{
        check_cek_size, expected_cek_size, ContentEncryptionKey, KeyManagement,
        KeyManagementError, ProvidedCek,
    },
    Base64UrlString,
};

type Aes192Gcm = AesGcmCipher<Aes192, U12>;

const IV_SIZE: usize = 12;
const TAG_SIZE: usize = 16;

/// The AES Galois/Counter Mode variants from the tables in [section 4.7]
/// and [section 5.3 of RFC 7518].
///
/// The same three variants serve two separate jobs. As the `enc` header
/// parameter they encrypt the content of a JWE, and suffixed with `KW` as
/// the `alg` header parameter they wrap the content encryption key.
///
/// [section 4.7]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.7>
/// [section 5.3 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-5.3>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AesGcm {
    /// AES GCM using 128-bit key
    Aes128,
    /// AES GCM using 192-bit key
    Aes192,
    /// AES GCM using 256-bit key
    Aes256,
}

impl AesGcm {
    /// The size in bytes of the key this variant uses.
    pub(crate) fn key_size(self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Aes256 => 32,
        }
    }

    fn check_lengths(self, key: &[u8], iv: &[u8]) -> Result<(), ContentEncryptionError> {
        let expected = self.key_size();
        if key.len() != expected {
            return Err(ContentEncryptionError::InvalidKeyLength {
                expected,
                actual: key.len(),
            });
        }
        if iv.len() != IV_SIZE {
            return Err(ContentEncryptionError::InvalidIvLength {
                expected: IV_SIZE,
                actual: iv.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn encrypt_content(
        self,
        key: &[u8],
        iv: &[u8],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<AuthenticatedCiphertext, ContentEncryptionError> {
        self.check_lengths(key, iv)?;
        match self {
            Self::Aes128 => seal::<Aes128Gcm>(key, iv, plaintext, aad),
            Self::Aes192 => seal::<Aes192Gcm>(key, iv, plaintext, aad),
            Self::Aes256 => seal::<Aes256Gcm>(key, iv, plaintext, aad),
        }
    }

    pub(crate) fn decrypt_content(
        self,
        key: &[u8],
        iv: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>, ContentEncryptionError> {
        self.check_lengths(key, iv)?;
        if tag.len() != TAG_SIZE {
            return Err(ContentEncryptionError::Authentication);
        }
        match self {
            Self::Aes128 => open::<Aes128Gcm>(key, iv, ciphertext, tag, aad),
            Self::Aes192 => open::<Aes192Gcm>(key, iv, ciphertext, tag, aad),
            Self::Aes256 => open::<Aes256Gcm>(key, iv, ciphertext, tag, aad),
        }
    }
}

fn seal<A>(
    key: &[u8],
    iv: &[u8],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<AuthenticatedCiphertext, ContentEncryptionError>
where
    A: Aead + KeyInit,
{
    let cipher = A::new(Key::<A>::from_slice(key));
    let payload = Payload {
        msg: plaintext,
        aad,
    };
    let mut out = cipher
        .encrypt(Nonce::<A>::from_slice(iv), payload)
        .map_err(|_| ContentEncryptionError::Encrypt)?;
    // the aead crate appends the tag to the ciphertext, JOSE carries it
    // in its own segment
    let tag = out.split_off(out.len() - TAG_SIZE);
    Ok(AuthenticatedCiphertext {
        ciphertext: out,
        tag,
    })
}

fn open<A>(
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, ContentEncryptionError>
where
    A: Aead + KeyInit,
{
    let cipher = A::new(Key::<A>::from_slice(key));
    let mut msg = Vec::with_capacity(ciphertext.len() + tag.len());
    msg.extend_from_slice(ciphertext);
    msg.extend_from_slice(tag);
    let payload = Payload { msg: &msg, aad };
    cipher
        .decrypt(Nonce::<A>::from_slice(iv), payload)
        .map_err(|_| ContentEncryptionError::Authentication)
}

/// A symmetric key for the `A128GCMKW`, `A192GCMKW` and `A256GCMKW` key
/// management algorithms from [section 4.7 of RFC 7518].
///
/// Every wrap operation draws a fresh 96-bit initialization vector and
/// publishes it in the `iv` header parameter, with the authentication tag
/// in the `tag` header parameter.
///
/// [section 4.7 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.7>
pub struct AesGcmKwKey {
    key: SecretSlice<u8>,
    variant: AesGcm,
    key_id: Option<String>,
}

impl core::fmt::Debug for AesGcmKwKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AesGcmKwKey")
            .field("key", &"[redacted]")
            .field("variant", &self.variant)
            .field("key_id", &self.key_id)
            .finish()
    }
}

impl AesGcmKwKey {
    /// Creates a key for the given AES GCM variant.
    ///
    /// # Errors
    ///
    /// Fails if the key length does not match the variant.
    pub fn new(key: impl Into<Vec<u8>>, variant: AesGcm) -> Result<Self, KeyManagementError> {
        let key = key.into();
        let expected = variant.key_size();
        if key.len() != expected {
            return Err(KeyManagementError::InvalidKeyLength {
                expected,
                actual: key.len(),
            });
        }
        Ok(Self {
            key: SecretSlice::from(key),
            variant,
            key_id: None,
        })
    }

    /// Attaches a key id that will end up in the `kid` header parameter
    /// of tokens encrypted with this key.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

impl KeyManagement for AesGcmKwKey {
    fn algorithm(&self) -> JsonWebEncryptionAlgorithm {
        JsonWebEncryptionAlgorithm::AesGcmKw(self.variant)
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
        let iv = super::random_bytes(IV_SIZE).map_err(|_| KeyManagementError::Rng)?;

        // the AAD of a key wrap is the empty octet string
        let sealed = self
            .variant
            .encrypt_content(self.key.expose_secret(), &iv, &cek, b"")
            .map_err(|_| KeyManagementError::Wrap)?;

        Ok(ProvidedCek {
            cek: ContentEncryptionKey::new(cek),
            encrypted_key: sealed.ciphertext,
            parameters: alloc::vec![
                Parameter::InitializationVector(Base64UrlString::encode(iv)),
                Parameter::AuthenticationTag(Base64UrlString::encode(sealed.tag)),
            ],
        })
    }

    fn decrypt_cek(
        &self,
        encrypted_key: &[u8],
        enc: &super::JsonWebContentEncryptionAlgorithm,
        header: &crate::header::JoseHeader<'_>,
    ) -> Result<ContentEncryptionKey, KeyManagementError> {
        let iv = header
            .initialization_vector()
            .ok_or(KeyManagementError::MissingParameter("iv"))?
            .decode()
            .map_err(|_| KeyManagementError::InvalidParameter("iv"))?;
        let tag = header
            .authentication_tag()
            .ok_or(KeyManagementError::MissingParameter("tag"))?
            .decode()
            .map_err(|_| KeyManagementError::InvalidParameter("tag"))?;

        let cek = self
            .variant
            .decrypt_content(self.key.expose_secret(), &iv, encrypted_key, &tag, b"")
            .map_err(|_| KeyManagementError::Unwrap)?;
        check_cek_size(enc, &cek)?;
        Ok(ContentEncryptionKey::new(cek))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        header::{Header, JoseHeader},
        jwa::JsonWebContentEncryptionAlgorithm,
    };

    #[test]
    fn content_encryption_round_trips() {
        let key = [0x42_u8; 16];
        let iv = [7_u8; 12];
        let sealed = AesGcm::Aes128
            .encrypt_content(&key, &iv, b"secret content", b"visible aad")
            .unwrap();
        assert_eq!(sealed.tag.len(), 16);

        let opened = AesGcm::Aes128
            .decrypt_content(&key, &iv, &sealed.ciphertext, &sealed.tag, b"visible aad")
            .unwrap();
        assert_eq!(opened, b"secret content");
    }

    #[test]
    fn a_changed_aad_is_detected() {
        let key = [0x42_u8; 16];
        let iv = [7_u8; 12];
        let sealed = AesGcm::Aes128
            .encrypt_content(&key, &iv, b"secret content", b"visible aad")
            .unwrap();
        assert!(matches!(
            AesGcm::Aes128.decrypt_content(&key, &iv, &sealed.ciphertext, &sealed.tag, b"other"),
            Err(ContentEncryptionError::Authentication)
        ));
    }

    #[test]
    fn key_lengths_are_checked() {
        assert!(matches!(
            AesGcm::Aes256.encrypt_content(&[0; 16], &[0; 12], b"", b""),
            Err(ContentEncryptionError::InvalidKeyLength {
                expected: 32,
                actual: 16,
            })
        ));
        assert!(matches!(
            AesGcm::Aes128.encrypt_content(&[0; 16], &[0; 16], b"", b""),
            Err(ContentEncryptionError::InvalidIvLength {
                expected: 12,
                actual: 16,
            })
        ));
    }

    #[test]
    fn wrapped_ceks_round_trip_through_header_parameters() {
        let key = AesGcmKwKey::new([9_u8; 32], AesGcm::Aes256).unwrap();
        let enc = JsonWebContentEncryptionAlgorithm::AesGcm(AesGcm::Aes128);
        let provided = key.provide_cek(&enc).unwrap();
        assert_eq!(provided.parameters.len(), 2);

        let header = Header::from_parameters(provided.parameters.clone()).unwrap();
        let view = JoseHeader::new([&header]).unwrap();
        let cek = key
            .decrypt_cek(&provided.encrypted_key, &enc, &view)
            .unwrap();
        assert_eq!(cek.expose(), provided.cek.expose());
    }

    #[test]
    fn unwrap_requires_the_iv_and_tag_parameters() {
        let key = AesGcmKwKey::new([9_u8; 16], AesGcm::Aes128).unwrap();
        let enc = JsonWebContentEncryptionAlgorithm::AesGcm(AesGcm::Aes128);
        let header = Header::new();
        let view = JoseHeader::new([&header]).unwrap();
        assert!(matches!(
            key.decrypt_cek(b"", &enc, &view),
            Err(KeyManagementError::MissingParameter("iv"))
        ));
    }
}
