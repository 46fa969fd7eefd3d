use alloc::vec::Vec;

use aes::{Aes128, Aes192, Aes256};
use cbc::{Decryptor, Encryptor};
use cipher::{
    block_padding::Pkcs7, BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit,
};
use hmac::{Mac, SimpleHmac};
use sha2::{digest::core_api::BlockSizeUser, Digest, Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

use super::{AuthenticatedCiphertext, ContentEncryptionError};

const IV_SIZE: usize = 16;

/// Authenticated encryption algorithms built using a composition of AES in
/// Cipher Block Chaining (CBC) mode and HMAC as defined in [section 5.2 of RFC
/// 7518]
///
/// [section 5.2 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-5.2>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AesCbcHs {
    /// AES_128_CBC_HMAC_SHA_256 authenticated encryption as defined in [section
    /// 5.2.3]
    ///
    /// [section 5.2.3]: <https://datatracker.ietf.org/doc/html/rfc7518#section-5.2.3>
    Aes128CbcHs256,
    /// AES_192_CBC_HMAC_SHA_384 authenticated encryption algorithm as defined
    /// in [section 5.2.4]
    ///
    /// [section 5.2.4]: <https://datatracker.ietf.org/doc/html/rfc7518#section-5.2.4>
    Aes192CbcHs384,
    /// AES_256_CBC_HMAC_SHA_512 authenticated encryption algorithm as defined
    /// in [section 5.2.5]
    ///
    /// [section 5.2.5]: <https://datatracker.ietf.org/doc/html/rfc7518#section-5.2.5>
    Aes256CbcHs512,
}

impl AesCbcHs {
    /// The size in bytes of the composite key. The first half keys the
    /// MAC, the second half keys the cipher.
    pub(crate) fn key_size(self) -> usize {
        match self {
            Self::Aes128CbcHs256 => 32,
            Self::Aes192CbcHs384 => 48,
            Self::Aes256CbcHs512 => 64,
        }
    }

    fn tag_size(self) -> usize {
        self.key_size() / 2
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

    pub(crate) fn encrypt(
        self,
        key: &[u8],
        iv: &[u8],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<AuthenticatedCiphertext, ContentEncryptionError> {
        self.check_lengths(key, iv)?;
        let (mac_key, enc_key) = key.split_at(key.len() / 2);
        match self {
            Self::Aes128CbcHs256 => {
                seal::<Aes128, Sha256>(mac_key, enc_key, iv, plaintext, aad, self.tag_size())
            }
            Self::Aes192CbcHs384 => {
                seal::<Aes192, Sha384>(mac_key, enc_key, iv, plaintext, aad, self.tag_size())
            }
            Self::Aes256CbcHs512 => {
                seal::<Aes256, Sha512>(mac_key, enc_key, iv, plaintext, aad, self.tag_size())
            }
        }
    }

    pub(crate) fn decrypt(
        self,
        key: &[u8],
        iv: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>, ContentEncryptionError> {
        self.check_lengths(key, iv)?;
        let (mac_key, enc_key) = key.split_at(key.len() / 2);
        match self {
            Self::Aes128CbcHs256 => {
                open::<Aes128, Sha256>(mac_key, enc_key, iv, ciphertext, tag, aad, self.tag_size())
            }
            Self::Aes192CbcHs384 => {
                open::<Aes192, Sha384>(mac_key, enc_key, iv, ciphertext, tag, aad, self.tag_size())
            }
            Self::Aes256CbcHs512 => {
                open::<Aes256, Sha512>(mac_key, enc_key, iv, ciphertext, tag, aad, self.tag_size())
            }
        }
    }
}

/// The MAC covers the additional data, the initialization vector, the
/// ciphertext and the bit length of the additional data as a 64 bit big
/// endian integer. Only the leading half of the HMAC output becomes the
/// tag.
fn compute_tag<D>(
    mac_key: &[u8],
    aad: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    tag_size: usize,
) -> Result<Vec<u8>, digest::InvalidLength>
where
    D: Digest + BlockSizeUser,
{
    let mut mac = <SimpleHmac<D> as Mac>::new_from_slice(mac_key)?;
    mac.update(aad);
    mac.update(iv);
    mac.update(ciphertext);
    let aad_bits = (aad.len() as u64) * 8;
    mac.update(&aad_bits.to_be_bytes());

    let mut tag = mac.finalize().into_bytes().to_vec();
    tag.truncate(tag_size);
    Ok(tag)
}

fn seal<C, D>(
    mac_key: &[u8],
    enc_key: &[u8],
    iv: &[u8],
    plaintext: &[u8],
    aad: &[u8],
    tag_size: usize,
) -> Result<AuthenticatedCiphertext, ContentEncryptionError>
where
    C: BlockCipher + BlockEncryptMut + KeyInit,
    D: Digest + BlockSizeUser,
{
    let cipher = Encryptor::<C>::new_from_slices(enc_key, iv)
        .map_err(|_| ContentEncryptionError::Encrypt)?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    let tag = compute_tag::<D>(mac_key, aad, iv, &ciphertext, tag_size)
        .map_err(|_| ContentEncryptionError::Encrypt)?;
    Ok(AuthenticatedCiphertext { ciphertext, tag })
}

fn open<C, D>(
    mac_key: &[u8],
    enc_key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
    aad: &[u8],
    tag_size: usize,
) -> Result<Vec<u8>, ContentEncryptionError>
where
    C: BlockCipher + BlockDecryptMut + KeyInit,
    D: Digest + BlockSizeUser,
{
    let expected = compute_tag::<D>(mac_key, aad, iv, ciphertext, tag_size)
        .map_err(|_| ContentEncryptionError::Authentication)?;
    if !bool::from(expected.as_slice().ct_eq(tag)) {
        return Err(ContentEncryptionError::Authentication);
    }

    let cipher = Decryptor::<C>::new_from_slices(enc_key, iv)
        .map_err(|_| ContentEncryptionError::Authentication)?;
    // the tag was checked above, so a padding failure here means a broken
    // peer rather than an attack, but it reports the same way
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| ContentEncryptionError::Authentication)
}
