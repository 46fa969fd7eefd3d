use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::fmt;

use pbkdf2::pbkdf2_hmac;
use secrecy::{ExposeSecret, SecretSlice};
use sha2::{Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use super::{aes_kw, AesKw, JsonWebEncryptionAlgorithm};
use crate::{
    header::Parameter,
    jwe::{
        check_cek_size, expected_cek_size, ContentEncryptionKey, KeyManagement,
        KeyManagementError, ProvidedCek,
    },
    Base64UrlString,
};

/// A variant of Key Encryption with PBES2 as defined in the table of [section
/// 4.8 of RFC 7518]
///
/// [section 4.8 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.8>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pbes2 {
    /// PBES2 with HMAC SHA-256 and "A128KW" wrapping
    Hs256Aes128,
    /// PBES2 with HMAC SHA-384 and "A192KW" wrapping
    Hs384Aes192,
    /// PBES2 with HMAC SHA-512 and "A256KW" wrapping
    Hs512Aes256,
}

impl From<Pbes2> for super::JsonWebEncryptionAlgorithm {
    fn from(x: Pbes2) -> Self {
        Self::Pbes2(x)
    }
}

impl From<Pbes2> for super::JsonWebAlgorithm {
    fn from(x: Pbes2) -> Self {
        Self::Encryption(super::JsonWebEncryptionAlgorithm::Pbes2(x))
    }
}

impl Pbes2 {
    fn wrapping(self) -> AesKw {
        match self {
            Self::Hs256Aes128 => AesKw::Aes128,
            Self::Hs384Aes192 => AesKw::Aes192,
            Self::Hs512Aes256 => AesKw::Aes256,
        }
    }
}

/// The number of random bytes in the `p2s` salt input of a fresh token.
const SALT_INPUT_SIZE: usize = 16;

/// The iteration count used when encrypting, unless overridden.
const DEFAULT_ITERATIONS: u32 = 100_000;

/// The highest `p2c` count accepted during decryption, unless
/// overridden. Larger counts are rejected before any derivation work is
/// done.
const DEFAULT_MAX_ITERATIONS: u64 = 1_000_000;

/// A password for the `PBES2` family of key management algorithms from
/// [section 4.8 of RFC 7518].
///
/// The key encryption key is derived from the password with PBKDF2, using
/// a fresh random salt input and the configured iteration count, both of
/// which travel in the `p2s` and `p2c` header parameters.
///
/// [section 4.8 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.8>
#[derive(Clone)]
pub struct Pbes2Key {
    password: SecretSlice<u8>,
    variant: Pbes2,
    iterations: u32,
    max_iterations: u64,
    key_id: Option<String>,
}

impl fmt::Debug for Pbes2Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pbes2Key")
            .field("password", &"[redacted]")
            .field("variant", &self.variant)
            .field("iterations", &self.iterations)
            .field("max_iterations", &self.max_iterations)
            .field("key_id", &self.key_id)
            .finish()
    }
}

impl Pbes2Key {
    /// Creates a key from the raw password bytes.
    pub fn new(password: impl Into<Vec<u8>>, variant: Pbes2) -> Self {
        Self {
            password: SecretSlice::from(password.into()),
            variant,
            iterations: DEFAULT_ITERATIONS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            key_id: None,
        }
    }

    /// Sets the PBKDF2 iteration count used when encrypting.
    ///
    /// [Section 4.8.1.2 of RFC 7518] recommends at least 1000. A count of
    /// zero is rejected when the key is used.
    ///
    /// [Section 4.8.1.2 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.8.1.2>
    #[must_use]
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the highest `p2c` count this key accepts during decryption.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Attaches a key id that will end up in the `kid` header parameter
    /// of tokens encrypted with this key.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    /// Runs PBKDF2 over the password. The salt is the algorithm name, a
    /// zero byte and the salt input, as required by [section 4.8.1.1 of
    /// RFC 7518].
    ///
    /// [section 4.8.1.1 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.8.1.1>
    fn derive_kek(&self, salt_input: &[u8], rounds: u32) -> Zeroizing<Vec<u8>> {
        let alg_name = JsonWebEncryptionAlgorithm::Pbes2(self.variant).to_string();
        let mut salt = Vec::with_capacity(alg_name.len() + 1 + salt_input.len());
        salt.extend_from_slice(alg_name.as_bytes());
        salt.push(0x00);
        salt.extend_from_slice(salt_input);

        let password = self.password.expose_secret();
        let mut kek = Zeroizing::new(alloc::vec![0u8; self.variant.wrapping().key_size()]);
        match self.variant {
            Pbes2::Hs256Aes128 => pbkdf2_hmac::<Sha256>(password, &salt, rounds, &mut kek),
            Pbes2::Hs384Aes192 => pbkdf2_hmac::<Sha384>(password, &salt, rounds, &mut kek),
            Pbes2::Hs512Aes256 => pbkdf2_hmac::<Sha512>(password, &salt, rounds, &mut kek),
        }
        kek
    }
}

impl KeyManagement for Pbes2Key {
    fn algorithm(&self) -> JsonWebEncryptionAlgorithm {
        JsonWebEncryptionAlgorithm::Pbes2(self.variant)
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn provide_cek(
        &self,
        enc: &super::JsonWebContentEncryptionAlgorithm,
    ) -> Result<ProvidedCek, KeyManagementError> {
        if self.iterations == 0 {
            return Err(KeyManagementError::InvalidParameter("p2c"));
        }

        let salt_input =
            super::random_bytes(SALT_INPUT_SIZE).map_err(|_| KeyManagementError::Rng)?;
        let kek = self.derive_kek(&salt_input, self.iterations);

        let cek =
            super::random_bytes(expected_cek_size(enc)?).map_err(|_| KeyManagementError::Rng)?;
        let encrypted_key = aes_kw::wrap(self.variant.wrapping(), &kek, &cek)?;

        Ok(ProvidedCek {
            cek: ContentEncryptionKey::new(cek),
            encrypted_key,
            parameters: alloc::vec![
                Parameter::Pbes2SaltInput(Base64UrlString::encode(salt_input)),
                Parameter::Pbes2Count(u64::from(self.iterations)),
            ],
        })
    }

    fn decrypt_cek(
        &self,
        encrypted_key: &[u8],
        enc: &super::JsonWebContentEncryptionAlgorithm,
        header: &crate::header::JoseHeader<'_>,
    ) -> Result<ContentEncryptionKey, KeyManagementError> {
        let salt_input = header
            .pbes2_salt_input()
            .ok_or(KeyManagementError::MissingParameter("p2s"))?
            .decode()
            .map_err(|_| KeyManagementError::InvalidParameter("p2s"))?;
        let count = header
            .pbes2_count()
            .ok_or(KeyManagementError::MissingParameter("p2c"))?;

        if count == 0 {
            return Err(KeyManagementError::InvalidParameter("p2c"));
        }
        if count > self.max_iterations {
            return Err(KeyManagementError::IterationLimit(count));
        }
        let rounds = u32::try_from(count).map_err(|_| KeyManagementError::IterationLimit(count))?;

        let kek = self.derive_kek(&salt_input, rounds);
        let cek = aes_kw::unwrap(self.variant.wrapping(), &kek, encrypted_key)?;
        check_cek_size(enc, &cek)?;
        Ok(ContentEncryptionKey::new(cek))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        header::{Header, JoseHeader},
        jwa::{AesGcm, JsonWebContentEncryptionAlgorithm},
    };

    const PASSWORD: &[u8] = b"Thus from my lips, by yours, my sin is purged.";

    fn round_trip(variant: Pbes2) {
        let enc = JsonWebContentEncryptionAlgorithm::AesGcm(AesGcm::Aes256);
        // a low count to keep the test fast
        let key = Pbes2Key::new(PASSWORD, variant).with_iterations(1000);
        let provided = key.provide_cek(&enc).unwrap();

        let header = Header::from_parameters(provided.parameters.clone()).unwrap();
        let view = JoseHeader::new([&header]).unwrap();
        let cek = key
            .decrypt_cek(&provided.encrypted_key, &enc, &view)
            .unwrap();
        assert_eq!(cek.expose(), provided.cek.expose());
    }

    #[test]
    fn all_variants_round_trip() {
        round_trip(Pbes2::Hs256Aes128);
        round_trip(Pbes2::Hs384Aes192);
        round_trip(Pbes2::Hs512Aes256);
    }

    #[test]
    fn derives_the_rfc_7517_appendix_c_key() {
        let salt_input = Base64UrlString::from("2WCTcJZ1Rvd_CJuJripQ1w")
            .decode()
            .unwrap();
        let key = Pbes2Key::new(PASSWORD, Pbes2::Hs256Aes128);
        let kek = key.derive_kek(&salt_input, 4096);
        assert_eq!(
            &*kek,
            &[110, 171, 169, 92, 129, 92, 109, 117, 233, 242, 116, 233, 170, 14, 24, 75]
        );
    }

    #[test]
    fn the_wrong_password_fails_to_unwrap() {
        let enc = JsonWebContentEncryptionAlgorithm::AesGcm(AesGcm::Aes128);
        let key = Pbes2Key::new(PASSWORD, Pbes2::Hs256Aes128).with_iterations(1000);
        let provided = key.provide_cek(&enc).unwrap();

        let header = Header::from_parameters(provided.parameters).unwrap();
        let view = JoseHeader::new([&header]).unwrap();
        let other = Pbes2Key::new(*b"hunter2", Pbes2::Hs256Aes128);
        assert!(matches!(
            other.decrypt_cek(&provided.encrypted_key, &enc, &view),
            Err(KeyManagementError::Unwrap)
        ));
    }

    #[test]
    fn counts_above_the_cap_are_rejected_before_deriving() {
        let enc = JsonWebContentEncryptionAlgorithm::AesGcm(AesGcm::Aes128);
        let key = Pbes2Key::new(PASSWORD, Pbes2::Hs256Aes128).with_iterations(5000);
        let provided = key.provide_cek(&enc).unwrap();

        let header = Header::from_parameters(provided.parameters).unwrap();
        let view = JoseHeader::new([&header]).unwrap();
        let strict = Pbes2Key::new(PASSWORD, Pbes2::Hs256Aes128).with_max_iterations(1000);
        assert!(matches!(
            strict.decrypt_cek(&provided.encrypted_key, &enc, &view),
            Err(KeyManagementError::IterationLimit(5000))
        ));
    }

    #[test]
    fn a_zero_count_is_invalid() {
        let enc = JsonWebContentEncryptionAlgorithm::AesGcm(AesGcm::Aes128);
        let key = Pbes2Key::new(PASSWORD, Pbes2::Hs256Aes128).with_iterations(0);
        assert!(matches!(
            key.provide_cek(&enc),
            Err(KeyManagementError::InvalidParameter("p2c"))
        ));
    }

    #[test]
    fn a_missing_salt_input_is_reported() {
        let enc = JsonWebContentEncryptionAlgorithm::AesGcm(AesGcm::Aes128);
        let key = Pbes2Key::new(PASSWORD, Pbes2::Hs256Aes128).with_iterations(1000);
        let provided = key.provide_cek(&enc).unwrap();

        let header = Header::from_parameters(
            provided
                .parameters
                .into_iter()
                .filter(|p| p.name() != "p2s"),
        )
        .unwrap();
        let view = JoseHeader::new([&header]).unwrap();
        assert!(matches!(
            key.decrypt_cek(&provided.encrypted_key, &enc, &view),
            Err(KeyManagementError::MissingParameter("p2s"))
        ));
    }
}
