use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use elliptic_curve::{
    ecdh::{diffie_hellman, EphemeralSecret},
    sec1::{FromEncodedPoint, ModulusSize, ToEncodedPoint},
    CurveArithmetic, FieldBytesSize, PublicKey, SecretKey,
};
use rand_core::OsRng;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
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

/// Different modes ECDH-ES can be used as defined in [section 4.6 of RFC 7518]
///
/// [section 4.6 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.6>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcDhES {
    /// Using ECDH-ES directly without any wrapping
    Direct,
    /// ECDH-ES using Concat KDF and CEK wrapped with one variant of [AesKw]
    AesKw(AesKw),
}

impl From<EcDhES> for super::JsonWebEncryptionAlgorithm {
    fn from(x: EcDhES) -> Self {
        Self::EcDhES(x)
    }
}

impl From<EcDhES> for super::JsonWebAlgorithm {
    fn from(x: EcDhES) -> Self {
        Self::Encryption(super::JsonWebEncryptionAlgorithm::EcDhES(x))
    }
}

#[derive(Debug, Clone)]
enum Inner {
    P256Public(p256::PublicKey),
    P256Secret(p256::SecretKey),
    P384Public(p384::PublicKey),
    P384Secret(p384::SecretKey),
    P521Public(p521::PublicKey),
    P521Secret(p521::SecretKey),
}

impl Inner {
    fn crv(&self) -> &'static str {
        match self {
            Self::P256Public(..) | Self::P256Secret(..) => "P-256",
            Self::P384Public(..) | Self::P384Secret(..) => "P-384",
            Self::P521Public(..) | Self::P521Secret(..) => "P-521",
        }
    }
}

/// A key for the `ECDH-ES` family of key management algorithms from
/// [section 4.6 of RFC 7518].
///
/// The encrypting party holds the public key of the recipient and this
/// type generates a fresh ephemeral key pair for every token, publishing
/// its public half in the `epk` header parameter. The recipient holds the
/// matching secret key.
///
/// Only the three NIST curves JOSE registers for ECDH-ES are supported.
///
/// [section 4.6 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.6>
#[derive(Debug, Clone)]
pub struct EcdhEsKey {
    inner: Inner,
    variant: EcDhES,
    apu: Option<Vec<u8>>,
    apv: Option<Vec<u8>>,
    key_id: Option<String>,
}

impl EcdhEsKey {
    fn new(inner: Inner, variant: EcDhES) -> Self {
        Self {
            inner,
            variant,
            apu: None,
            apv: None,
            key_id: None,
        }
    }

    /// Creates a key that encrypts to the given P-256 public key.
    pub fn encrypt_to_p256(recipient: p256::PublicKey, variant: EcDhES) -> Self {
        Self::new(Inner::P256Public(recipient), variant)
    }

    /// Creates a key that encrypts to the given P-384 public key.
    pub fn encrypt_to_p384(recipient: p384::PublicKey, variant: EcDhES) -> Self {
        Self::new(Inner::P384Public(recipient), variant)
    }

    /// Creates a key that encrypts to the given P-521 public key.
    pub fn encrypt_to_p521(recipient: p521::PublicKey, variant: EcDhES) -> Self {
        Self::new(Inner::P521Public(recipient), variant)
    }

    /// Creates a key that decrypts with the given P-256 secret key.
    pub fn decrypt_with_p256(secret: p256::SecretKey, variant: EcDhES) -> Self {
        Self::new(Inner::P256Secret(secret), variant)
    }

    /// Creates a key that decrypts with the given P-384 secret key.
    pub fn decrypt_with_p384(secret: p384::SecretKey, variant: EcDhES) -> Self {
        Self::new(Inner::P384Secret(secret), variant)
    }

    /// Creates a key that decrypts with the given P-521 secret key.
    pub fn decrypt_with_p521(secret: p521::SecretKey, variant: EcDhES) -> Self {
        Self::new(Inner::P521Secret(secret), variant)
    }

    /// Information about the producer, fed into the key derivation and
    /// published in the `apu` header parameter.
    #[must_use]
    pub fn with_party_u_info(mut self, apu: impl Into<Vec<u8>>) -> Self {
        self.apu = Some(apu.into());
        self
    }

    /// Information about the recipient, fed into the key derivation and
    /// published in the `apv` header parameter.
    #[must_use]
    pub fn with_party_v_info(mut self, apv: impl Into<Vec<u8>>) -> Self {
        self.apv = Some(apv.into());
        self
    }

    /// Attaches a key id that will end up in the `kid` header parameter
    /// of tokens encrypted with this key.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    /// The name and output length the Concat KDF is parameterized with.
    /// In direct mode both come from the content encryption algorithm,
    /// with key wrapping they come from the wrapping algorithm.
    fn kdf_parameters(
        &self,
        enc: &super::JsonWebContentEncryptionAlgorithm,
    ) -> Result<(usize, String), KeyManagementError> {
        Ok(match self.variant {
            EcDhES::Direct => (expected_cek_size(enc)?, enc.to_string()),
            EcDhES::AesKw(kw) => (
                kw.key_size(),
                JsonWebEncryptionAlgorithm::EcDhES(self.variant).to_string(),
            ),
        })
    }
}

impl KeyManagement for EcdhEsKey {
    fn algorithm(&self) -> JsonWebEncryptionAlgorithm {
        JsonWebEncryptionAlgorithm::EcDhES(self.variant)
    }

    fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    fn provide_cek(
        &self,
        enc: &super::JsonWebContentEncryptionAlgorithm,
    ) -> Result<ProvidedCek, KeyManagementError> {
        let crv = self.inner.crv();
        let (z, epk) = match &self.inner {
            Inner::P256Public(pk) => ephemeral_agree::<p256::NistP256>(pk, crv)?,
            Inner::P256Secret(sk) => ephemeral_agree::<p256::NistP256>(&sk.public_key(), crv)?,
            Inner::P384Public(pk) => ephemeral_agree::<p384::NistP384>(pk, crv)?,
            Inner::P384Secret(sk) => ephemeral_agree::<p384::NistP384>(&sk.public_key(), crv)?,
            Inner::P521Public(pk) => ephemeral_agree::<p521::NistP521>(pk, crv)?,
            Inner::P521Secret(sk) => ephemeral_agree::<p521::NistP521>(&sk.public_key(), crv)?,
        };

        let (kek_len, alg_name) = self.kdf_parameters(enc)?;
        let apu = self.apu.as_deref().unwrap_or(&[]);
        let apv = self.apv.as_deref().unwrap_or(&[]);
        let derived = concat_kdf(&z, &alg_name, apu, apv, kek_len);

        let mut parameters = alloc::vec![Parameter::EphemeralPublicKey(epk)];
        if let Some(apu) = &self.apu {
            parameters.push(Parameter::AgreementPartyUInfo(Base64UrlString::encode(apu)));
        }
        if let Some(apv) = &self.apv {
            parameters.push(Parameter::AgreementPartyVInfo(Base64UrlString::encode(apv)));
        }

        match self.variant {
            EcDhES::Direct => Ok(ProvidedCek {
                cek: ContentEncryptionKey::new(derived.to_vec()),
                encrypted_key: Vec::new(),
                parameters,
            }),
            EcDhES::AesKw(kw) => {
                let cek = super::random_bytes(expected_cek_size(enc)?)
                    .map_err(|_| KeyManagementError::Rng)?;
                let encrypted_key = aes_kw::wrap(kw, &derived, &cek)?;
                Ok(ProvidedCek {
                    cek: ContentEncryptionKey::new(cek),
                    encrypted_key,
                    parameters,
                })
            }
        }
    }

    fn decrypt_cek(
        &self,
        encrypted_key: &[u8],
        enc: &super::JsonWebContentEncryptionAlgorithm,
        header: &crate::header::JoseHeader<'_>,
    ) -> Result<ContentEncryptionKey, KeyManagementError> {
        let epk = header
            .ephemeral_public_key()
            .ok_or(KeyManagementError::MissingParameter("epk"))?;

        let crv = self.inner.crv();
        let z = match &self.inner {
            Inner::P256Secret(sk) => agree_static::<p256::NistP256>(sk, epk, crv)?,
            Inner::P384Secret(sk) => agree_static::<p384::NistP384>(sk, epk, crv)?,
            Inner::P521Secret(sk) => agree_static::<p521::NistP521>(sk, epk, crv)?,
            Inner::P256Public(..) | Inner::P384Public(..) | Inner::P521Public(..) => {
                return Err(KeyManagementError::NoPrivateKey)
            }
        };

        let apu = decode_party_info(header.agreement_party_u_info(), "apu")?;
        let apv = decode_party_info(header.agreement_party_v_info(), "apv")?;
        let (kek_len, alg_name) = self.kdf_parameters(enc)?;
        let derived = concat_kdf(&z, &alg_name, &apu, &apv, kek_len);

        match self.variant {
            EcDhES::Direct => {
                if !encrypted_key.is_empty() {
                    return Err(KeyManagementError::UnexpectedEncryptedKey);
                }
                Ok(ContentEncryptionKey::new(derived.to_vec()))
            }
            EcDhES::AesKw(kw) => {
                let cek = aes_kw::unwrap(kw, &derived, encrypted_key)?;
                check_cek_size(enc, &cek)?;
                Ok(ContentEncryptionKey::new(cek))
            }
        }
    }
}

fn decode_party_info(
    value: Option<&Base64UrlString>,
    name: &'static str,
) -> Result<Vec<u8>, KeyManagementError> {
    match value {
        Some(b64) => b64
            .decode()
            .map_err(|_| KeyManagementError::InvalidParameter(name)),
        None => Ok(Vec::new()),
    }
}

/// The shape of the `epk` header parameter, a public `EC` JSON Web Key.
#[derive(Deserialize)]
struct EpkRepr {
    kty: String,
    crv: String,
    x: Base64UrlString,
    y: Base64UrlString,
}

fn ephemeral_agree<C>(
    recipient: &PublicKey<C>,
    crv: &str,
) -> Result<(Zeroizing<Vec<u8>>, Value), KeyManagementError>
where
    C: CurveArithmetic,
    FieldBytesSize<C>: ModulusSize,
    elliptic_curve::AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
{
    let ephemeral = EphemeralSecret::<C>::random(&mut OsRng);
    let shared = ephemeral.diffie_hellman(recipient);
    let z = Zeroizing::new(shared.raw_secret_bytes().to_vec());

    let point = ephemeral.public_key().to_encoded_point(false);
    let (x, y) = match (point.x(), point.y()) {
        (Some(x), Some(y)) => (x.to_vec(), y.to_vec()),
        _ => return Err(KeyManagementError::Wrap),
    };
    let epk = json!({
        "kty": "EC",
        "crv": crv,
        "x": Base64UrlString::encode(x).into_inner(),
        "y": Base64UrlString::encode(y).into_inner(),
    });
    Ok((z, epk))
}

fn agree_static<C>(
    secret: &SecretKey<C>,
    epk: &Value,
    crv: &str,
) -> Result<Zeroizing<Vec<u8>>, KeyManagementError>
where
    C: CurveArithmetic,
    FieldBytesSize<C>: ModulusSize,
    elliptic_curve::AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
{
    let repr =
        EpkRepr::deserialize(epk).map_err(|_| KeyManagementError::InvalidParameter("epk"))?;
    if repr.kty != "EC" || repr.crv != crv {
        return Err(KeyManagementError::InvalidParameter("epk"));
    }
    let x = repr
        .x
        .decode()
        .map_err(|_| KeyManagementError::InvalidParameter("epk"))?;
    let y = repr
        .y
        .decode()
        .map_err(|_| KeyManagementError::InvalidParameter("epk"))?;

    let mut sec1 = Vec::with_capacity(1 + x.len() + y.len());
    sec1.push(0x04);
    sec1.extend_from_slice(&x);
    sec1.extend_from_slice(&y);
    let public = PublicKey::<C>::from_sec1_bytes(&sec1)
        .map_err(|_| KeyManagementError::InvalidParameter("epk"))?;

    let shared = diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
    Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
}

/// The Concat KDF from [section 4.6.2 of RFC 7518], which is the NIST
/// SP 800-56A KDF fixed to SHA-256.
///
/// [section 4.6.2 of RFC 7518]: <https://datatracker.ietf.org/doc/html/rfc7518#section-4.6.2>
fn concat_kdf(z: &[u8], alg: &str, apu: &[u8], apv: &[u8], key_len: usize) -> Zeroizing<Vec<u8>> {
    let mut out = Zeroizing::new(Vec::with_capacity(key_len.div_ceil(32) * 32));
    for counter in 1..=(key_len.div_ceil(32) as u32) {
        let mut hasher = Sha256::new();
        hasher.update(counter.to_be_bytes());
        hasher.update(z);
        hasher.update((alg.len() as u32).to_be_bytes());
        hasher.update(alg.as_bytes());
        hasher.update((apu.len() as u32).to_be_bytes());
        hasher.update(apu);
        hasher.update((apv.len() as u32).to_be_bytes());
        hasher.update(apv);
        hasher.update(((key_len * 8) as u32).to_be_bytes());
        out.extend_from_slice(&hasher.finalize());
    }
    out.truncate(key_len);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        header::{Header, JoseHeader},
        jwa::{AesGcm, JsonWebContentEncryptionAlgorithm},
    };

    #[test]
    fn derives_the_rfc_7518_appendix_c_key() {
        // Z, apu, apv and the derived key from appendix C of RFC 7518
        let z = [
            158, 86, 217, 29, 129, 113, 53, 211, 114, 131, 66, 131, 191, 132, 38, 156, 251, 49,
            110, 163, 218, 128, 106, 72, 246, 218, 167, 121, 140, 254, 144, 196,
        ];
        let derived = concat_kdf(&z, "A128GCM", b"Alice", b"Bob", 16);
        assert_eq!(
            Base64UrlString::encode(&*derived).as_str(),
            "VqqN6vgjbSBcIijNcacQGg"
        );
    }

    fn round_trip(variant: EcDhES) {
        let enc = JsonWebContentEncryptionAlgorithm::AesGcm(AesGcm::Aes128);
        let secret = p256::SecretKey::random(&mut OsRng);

        let sender = EcdhEsKey::encrypt_to_p256(secret.public_key(), variant)
            .with_party_u_info(*b"Alice")
            .with_party_v_info(*b"Bob");
        let provided = sender.provide_cek(&enc).unwrap();

        let header = Header::from_parameters(provided.parameters.clone()).unwrap();
        let view = JoseHeader::new([&header]).unwrap();
        let receiver = EcdhEsKey::decrypt_with_p256(secret, variant);
        let cek = receiver
            .decrypt_cek(&provided.encrypted_key, &enc, &view)
            .unwrap();
        assert_eq!(cek.expose(), provided.cek.expose());
    }

    #[test]
    fn direct_mode_round_trips() {
        round_trip(EcDhES::Direct);
    }

    #[test]
    fn key_wrapping_mode_round_trips() {
        round_trip(EcDhES::AesKw(AesKw::Aes128));
    }

    #[test]
    fn direct_mode_must_not_carry_an_encrypted_key() {
        let enc = JsonWebContentEncryptionAlgorithm::AesGcm(AesGcm::Aes128);
        let secret = p256::SecretKey::random(&mut OsRng);
        let sender = EcdhEsKey::encrypt_to_p256(secret.public_key(), EcDhES::Direct);
        let provided = sender.provide_cek(&enc).unwrap();
        assert!(provided.encrypted_key.is_empty());

        let header = Header::from_parameters(provided.parameters).unwrap();
        let view = JoseHeader::new([&header]).unwrap();
        let receiver = EcdhEsKey::decrypt_with_p256(secret, EcDhES::Direct);
        assert!(matches!(
            receiver.decrypt_cek(b"bogus", &enc, &view),
            Err(KeyManagementError::UnexpectedEncryptedKey)
        ));
    }

    #[test]
    fn a_wrong_party_info_changes_the_wrapping_key() {
        let enc = JsonWebContentEncryptionAlgorithm::AesGcm(AesGcm::Aes128);
        let secret = p256::SecretKey::random(&mut OsRng);
        let sender = EcdhEsKey::encrypt_to_p256(secret.public_key(), EcDhES::AesKw(AesKw::Aes128))
            .with_party_v_info(*b"Bob");
        let provided = sender.provide_cek(&enc).unwrap();

        // strip the apv parameter, so the receiver derives without it
        let header = Header::from_parameters(
            provided
                .parameters
                .into_iter()
                .filter(|p| p.name() != "apv"),
        )
        .unwrap();
        let view = JoseHeader::new([&header]).unwrap();
        let receiver = EcdhEsKey::decrypt_with_p256(secret, EcDhES::AesKw(AesKw::Aes128));
        assert!(matches!(
            receiver.decrypt_cek(&provided.encrypted_key, &enc, &view),
            Err(KeyManagementError::Unwrap)
        ));
    }

    #[test]
    fn a_public_key_cannot_decrypt() {
        let enc = JsonWebContentEncryptionAlgorithm::AesGcm(AesGcm::Aes128);
        let secret = p256::SecretKey::random(&mut OsRng);
        let sender = EcdhEsKey::encrypt_to_p256(secret.public_key(), EcDhES::Direct);
        let provided = sender.provide_cek(&enc).unwrap();

        let header = Header::from_parameters(provided.parameters).unwrap();
        let view = JoseHeader::new([&header]).unwrap();
        assert!(matches!(
            sender.decrypt_cek(&provided.encrypted_key, &enc, &view),
            Err(KeyManagementError::NoPrivateKey)
        ));
    }
}
