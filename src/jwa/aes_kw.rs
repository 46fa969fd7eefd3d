use alloc::{string::String, vec::Vec};

use aes::{cipher::Key, Aes128, Aes192, Aes256};
use aes_kw::Kek;
use secrecy::{ExposeSecret, SecretSlice};

use super::JsonWebEncryptionAlgorithm;
use crate::jwe::{
    check_cek_size, expected_cek_size, ContentEncryptionKey, KeyManagement, KeyManagementError,
    ProvidedCek,
};

/// Key Wrapping with AES Key Wrap as defined in [section 4.4 of RFC 7518]
///
/// [section 4.4 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.4>
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash)]
pub enum AesKw {
    /// AES Key Wrap with default initial value using 128-bit key
    Aes128,
    /// AES Key Wrap with default initial value using 192-bit key
    Aes192,
    /// AES Key Wrap with default initial value using 256-bit key
    Aes256,
}

impl From<AesKw> for super::JsonWebEncryptionAlgorithm {
    fn from(x: AesKw) -> Self {
        Self::AesKw(x)
    }
}

impl From<AesKw> for super::JsonWebAlgorithm {
    fn from(x: AesKw) -> Self {
        Self::Encryption(super::JsonWebEncryptionAlgorithm::AesKw(x))
    }
}

impl AesKw {
    /// The size in bytes of the key encryption key this variant uses.
    pub(crate) fn key_size(self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Aes256 => 32,
        }
    }
}

fn check_kek(variant: AesKw, kek: &[u8]) -> Result<(), KeyManagementError> {
    let expected = variant.key_size();
    if kek.len() != expected {
        return Err(KeyManagementError::InvalidKeyLength {
            expected,
            actual: kek.len(),
        });
    }
    Ok(())
}

pub(crate) fn wrap(
    variant: AesKw,
    kek: &[u8],
    cek: &[u8],
) -> Result<Vec<u8>, KeyManagementError> {
    check_kek(variant, kek)?;
    match variant {
        AesKw::Aes128 => Kek::<Aes128>::new(Key::<Aes128>::from_slice(kek)).wrap_vec(cek),
        AesKw::Aes192 => Kek::<Aes192>::new(Key::<Aes192>::from_slice(kek)).wrap_vec(cek),
        AesKw::Aes256 => Kek::<Aes256>::new(Key::<Aes256>::from_slice(kek)).wrap_vec(cek),
    }
    .map_err(|_| KeyManagementError::Wrap)
}

pub(crate) fn unwrap(
    variant: AesKw,
    kek: &[u8],
    wrapped: &[u8],
) -> Result<Vec<u8>, KeyManagementError> {
    check_kek(variant, kek)?;
    match variant {
        AesKw::Aes128 => Kek::<Aes128>::new(Key::<Aes128>::from_slice(kek)).unwrap_vec(wrapped),
        AesKw::Aes192 => Kek::<Aes192>::new(Key::<Aes192>::from_slice(kek)).unwrap_vec(wrapped),
        AesKw::Aes256 => Kek::<Aes256>::new(Key::<Aes256>::from_slice(kek)).unwrap_vec(wrapped),
    }
    .map_err(|_| KeyManagementError::Unwrap)
}

/// A symmetric key for the `A128KW`, `A192KW` and `A256KW` key management
/// algorithms.
pub struct AesKwKey {
    key: SecretSlice<u8>,
    variant: AesKw,
    key_id: Option<String>,
}

impl core::fmt::Debug for AesKwKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AesKwKey")
            .field("key", &"[redacted]")
            .field("variant", &self.variant)
            .field("key_id", &self.key_id)
            .finish()
    }
}

impl AesKwKey {
    /// Creates a key for the given AES Key Wrap variant.
    ///
    /// # Errors
    ///
    /// Fails if the key length does not match the variant.
    pub fn new(key: impl Into<Vec<u8>>, variant: AesKw) -> Result<Self, KeyManagementError> {
        let key = key.into();
        check_kek(variant, &key)?;
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

impl KeyManagement for AesKwKey {
    fn algorithm(&self) -> JsonWebEncryptionAlgorithm {
        JsonWebEncryptionAlgorithm::AesKw(self.variant)
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
        let encrypted_key = wrap(self.variant, self.key.expose_secret(), &cek)?;
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
        let cek = unwrap(self.variant, self.key.expose_secret(), encrypted_key)?;
        check_cek_size(enc, &cek)?;
        Ok(ContentEncryptionKey::new(cek))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwa::{AesCbcHs, JsonWebContentEncryptionAlgorithm};
    use crate::Base64UrlString;

    // A.3 of RFC 7516 wraps this exact CEK under this exact KEK
    const A3_KEK: &str = "GawgguFyGrWKav7AX4VKUg";
    const A3_ENCRYPTED_KEY: &str = "6KB707dM9YTIgHtLvtgWQ8mKwboJW3of9locizkDTHzBC2IlrT1oOQ";
    const A3_CEK: [u8; 32] = [
        4, 211, 31, 197, 84, 157, 252, 254, 11, 100, 157, 250, 63, 170, 106, 206, 107, 124, 212,
        45, 111, 107, 9, 219, 200, 177, 0, 240, 143, 156, 44, 207,
    ];

    #[test]
    fn unwraps_the_rfc_7516_a3_key() {
        let kek = Base64UrlString::from(A3_KEK).decode().unwrap();
        let wrapped = Base64UrlString::from(A3_ENCRYPTED_KEY).decode().unwrap();
        let cek = unwrap(AesKw::Aes128, &kek, &wrapped).unwrap();
        assert_eq!(cek, A3_CEK);
    }

    #[test]
    fn wraps_the_rfc_7516_a3_key() {
        let kek = Base64UrlString::from(A3_KEK).decode().unwrap();
        let wrapped = wrap(AesKw::Aes128, &kek, &A3_CEK).unwrap();
        assert_eq!(
            Base64UrlString::encode(wrapped).as_str(),
            A3_ENCRYPTED_KEY
        );
    }

    #[test]
    fn a_wrong_kek_fails_to_unwrap() {
        let mut kek = Base64UrlString::from(A3_KEK).decode().unwrap();
        kek[3] ^= 0x01;
        let wrapped = Base64UrlString::from(A3_ENCRYPTED_KEY).decode().unwrap();
        assert!(matches!(
            unwrap(AesKw::Aes128, &kek, &wrapped),
            Err(KeyManagementError::Unwrap)
        ));
    }

    #[test]
    fn the_kek_length_is_checked() {
        assert!(matches!(
            AesKwKey::new([0_u8; 16], AesKw::Aes256),
            Err(KeyManagementError::InvalidKeyLength {
                expected: 32,
                actual: 16,
            })
        ));
    }

    #[test]
    fn provided_ceks_round_trip() {
        let key = AesKwKey::new([7_u8; 16], AesKw::Aes128).unwrap();
        let enc = JsonWebContentEncryptionAlgorithm::AesCbcHs(AesCbcHs::Aes128CbcHs256);
        let provided = key.provide_cek(&enc).unwrap();
        assert_eq!(provided.encrypted_key.len(), 32 + 8);

        let header = crate::header::Header::new();
        let view = crate::header::JoseHeader::new([&header]).unwrap();
        let cek = key
            .decrypt_cek(&provided.encrypted_key, &enc, &view)
            .unwrap();
        assert_eq!(cek.expose(), provided.cek.expose());
    }
}
