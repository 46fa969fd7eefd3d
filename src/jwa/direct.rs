use alloc::{string::String, vec::Vec};

use super::JsonWebEncryptionAlgorithm;
use crate::jwe::{
    expected_cek_size, ContentEncryptionKey, KeyManagement, KeyManagementError, ProvidedCek,
};

/// A pre-shared content encryption key for the `dir` algorithm from
/// [section 4.5 of RFC 7518].
///
/// Both parties already hold the key the content is encrypted with, so
/// the token carries an empty encrypted key segment. The key length has
/// to match the content encryption algorithm exactly.
#[derive(Debug, Clone)]
pub struct DirectKey {
    key: ContentEncryptionKey,
    key_id: Option<String>,
}

impl DirectKey {
    /// Creates a key from the raw key bytes.
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: ContentEncryptionKey::new(key),
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

    fn checked_key(
        &self,
        enc: &super::JsonWebContentEncryptionAlgorithm,
    ) -> Result<ContentEncryptionKey, KeyManagementError> {
        let expected = expected_cek_size(enc)?;
        if self.key.len() != expected {
            return Err(KeyManagementError::InvalidKeyLength {
                expected,
                actual: self.key.len(),
            });
        }
        Ok(self.key.clone())
    }
}

impl KeyManagement for DirectKey {
    fn algorithm(&self) -> JsonWebEncryptionAlgorithm {
        JsonWebEncryptionAlgorithm::Direct
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn provide_cek(
        &self,
        enc: &super::JsonWebContentEncryptionAlgorithm,
    ) -> Result<ProvidedCek, KeyManagementError> {
        Ok(ProvidedCek {
            cek: self.checked_key(enc)?,
            encrypted_key: Vec::new(),
            parameters: Vec::new(),
        })
    }

    fn decrypt_cek(
        &self,
        encrypted_key: &[u8],
        enc: &super::JsonWebContentEncryptionAlgorithm,
        _header: &crate::header::JoseHeader<'_>,
    ) -> Result<ContentEncryptionKey, KeyManagementError> {
        if !encrypted_key.is_empty() {
            return Err(KeyManagementError::UnexpectedEncryptedKey);
        }
        self.checked_key(enc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        header::{Header, JoseHeader},
        jwa::{AesGcm, JsonWebContentEncryptionAlgorithm},
    };

    #[test]
    fn the_key_is_handed_out_unchanged() {
        let enc = JsonWebContentEncryptionAlgorithm::AesGcm(AesGcm::Aes256);
        let key = DirectKey::new([0x42; 32]);
        let provided = key.provide_cek(&enc).unwrap();
        assert_eq!(provided.cek.expose(), &[0x42; 32]);
        assert!(provided.encrypted_key.is_empty());
        assert!(provided.parameters.is_empty());
    }

    #[test]
    fn the_key_length_must_match_the_content_encryption() {
        let enc = JsonWebContentEncryptionAlgorithm::AesGcm(AesGcm::Aes256);
        let key = DirectKey::new([0x42; 31]);
        assert!(matches!(
            key.provide_cek(&enc),
            Err(KeyManagementError::InvalidKeyLength {
                expected: 32,
                actual: 31,
            })
        ));
    }

    #[test]
    fn an_encrypted_key_segment_is_rejected() {
        let enc = JsonWebContentEncryptionAlgorithm::AesGcm(AesGcm::Aes128);
        let key = DirectKey::new([0x42; 16]);
        let header = Header::from_parameters([]).unwrap();
        let view = JoseHeader::new([&header]).unwrap();
        assert!(matches!(
            key.decrypt_cek(b"sneaky", &enc, &view),
            Err(KeyManagementError::UnexpectedEncryptedKey)
        ));
    }
}
