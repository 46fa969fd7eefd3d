//! Implementation of JSON Web Encryption (JWE) as defined in [RFC 7516]
//!
//! [RFC 7516]: <https://www.rfc-editor.org/rfc/rfc7516.html>

use alloc::{borrow::ToOwned, string::ToString, vec::Vec};
use core::{fmt, str::FromStr};

use thiserror::Error;

use crate::{
    base64_url::Base64UrlString,
    format::Compact,
    header::{self, Header, JoseHeader, Parameter},
    jwa::{
        random_bytes, CompressionError, ContentEncryptionError, JsonWebAlgorithm,
        JsonWebContentEncryptionAlgorithm, JsonWebEncryptionAlgorithm,
    },
    payload::{Payload, PayloadError},
};

mod key_management;

pub use self::key_management::{
    ContentEncryptionKey, KeyManagement, KeyManagementError, ProvidedCek,
};
pub(crate) use self::key_management::{check_cek_size, expected_cek_size};

/// A JSON Web Encryption object before encryption or after successful
/// decryption: a payload together with the header parameters that
/// describe it.
///
/// Encrypting consumes this type and produces an [`Encrypted`] token.
/// Decrypting an [`Encrypted`] token hands it back:
///
/// ```
/// use jwx::{
///     jwa::{AesGcm, JsonWebContentEncryptionAlgorithm},
///     jwe::JsonWebEncryption,
/// };
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let key = jwx::jwa::DirectKey::new([0x42; 32]);
///
/// let token = JsonWebEncryption::new(b"top secret".to_vec())
///     .encrypt(
///         &key,
///         JsonWebContentEncryptionAlgorithm::AesGcm(AesGcm::Aes256),
///     )?
///     .to_string();
///
/// let decrypted: JsonWebEncryption<Vec<u8>> = token.parse::<jwx::jwe::Encrypted>()?.decrypt(&key)?;
/// assert_eq!(decrypted.payload(), &b"top secret".to_vec());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JsonWebEncryption<T = Vec<u8>> {
    header: Header,
    payload: T,
}

impl<T> JsonWebEncryption<T> {
    /// Creates a new JWE around `payload` with an empty header.
    ///
    /// The `alg` and `enc` parameters are filled in by
    /// [`encrypt`](Self::encrypt) from the key and the chosen content
    /// encryption algorithm.
    pub fn new(payload: T) -> Self {
        Self {
            header: Header::new(),
            payload,
        }
    }

    /// Creates a new JWE around `payload` carrying additional `header`
    /// parameters, for example a media type or critical extensions.
    pub fn new_with_header(header: Header, payload: T) -> Self {
        Self { header, payload }
    }

    /// The header parameters of this JWE.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The payload of this JWE.
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Turns this JWE back into its payload.
    pub fn into_payload(self) -> T {
        self.payload
    }
}

impl<T: Payload> JsonWebEncryption<T> {
    /// Encrypts this JWE for the holder of `key`, protecting the payload
    /// with the content encryption algorithm `enc`.
    ///
    /// The `alg` and `enc` header parameters are taken from the
    /// arguments and override any value set on the header beforehand,
    /// together with everything else the key management algorithm needs
    /// the receiving side to see (`epk`, `p2s`, ...). If the header
    /// carries a `zip` parameter, the payload is compressed before
    /// encryption.
    ///
    /// # Errors
    ///
    /// Fails if the key does not fit the chosen algorithms, if the
    /// header is inconsistent, or if no randomness is available for the
    /// initialization vector.
    pub fn encrypt<K: KeyManagement>(
        self,
        key: &K,
        enc: JsonWebContentEncryptionAlgorithm,
    ) -> Result<Encrypted, EncryptError> {
        let iv_size = enc
            .iv_size()
            .ok_or_else(|| KeyManagementError::UnsupportedEncryption(enc.to_string()))?;
        let provided = key.provide_cek(&enc)?;

        let mut parameters = alloc::vec![
            Parameter::Algorithm(key.algorithm().into()),
            Parameter::ContentEncryption(enc.clone()),
        ];
        if let Some(kid) = key.key_id() {
            parameters.push(Parameter::KeyId(kid.to_owned()));
        }
        parameters.extend(provided.parameters);

        let header = self.header.with_parameters(parameters);
        header.validate_critical()?;

        let payload = self.payload.to_bytes()?;
        let plaintext = match header.compression_algorithm() {
            Some(zip) => zip.compress(payload.as_ref())?,
            None => payload.as_ref().to_vec(),
        };

        // the encoded header is both the first token segment and the
        // additional authenticated data
        let raw_header = Base64UrlString::encode(header.to_json()?);
        let iv = random_bytes(iv_size).map_err(|_| EncryptError::Rng)?;
        let sealed = enc.encrypt(
            provided.cek.expose(),
            &iv,
            &plaintext,
            raw_header.as_str().as_bytes(),
        )?;

        Ok(Encrypted {
            header,
            raw_header,
            encrypted_key: provided.encrypted_key,
            iv,
            ciphertext: sealed.ciphertext,
            tag: sealed.tag,
        })
    }
}

impl<T> From<T> for JsonWebEncryption<T>
where
    T: Payload,
{
    fn from(payload: T) -> Self {
        Self::new(payload)
    }
}

/// An encrypted JWE in its five segment compact form, either freshly
/// produced by [`JsonWebEncryption::encrypt`] or parsed from a received
/// token.
///
/// Parsing only checks the shape of the token. Nothing about it is
/// trustworthy until [`decrypt`](Self::decrypt) succeeded, including the
/// header parameters exposed through [`header`](Self::header).
#[derive(Debug, Clone, PartialEq)]
pub struct Encrypted {
    header: Header,
    /// The protected header exactly as it appeared on the wire. The
    /// authentication tag covers this string, so decryption must feed
    /// the received bytes back in, not a re-serialization.
    raw_header: Base64UrlString,
    encrypted_key: Vec<u8>,
    iv: Vec<u8>,
    ciphertext: Vec<u8>,
    tag: Vec<u8>,
}

impl Encrypted {
    /// Parses the five dot separated segments of `value` into their
    /// decoded parts.
    ///
    /// # Errors
    ///
    /// Fails if the number of segments is not five, a segment is not
    /// valid base64url, or the first segment does not hold a valid
    /// header.
    pub fn decode(value: Compact) -> Result<Self, ParseError> {
        if value.len() != 5 {
            return Err(ParseError::InvalidFormat(value.len()));
        }
        let (Some(raw_header), Some(encrypted_key), Some(iv), Some(ciphertext), Some(tag)) = (
            value.part(0),
            value.part(1),
            value.part(2),
            value.part(3),
            value.part(4),
        ) else {
            return Err(ParseError::InvalidFormat(value.len()));
        };

        let header = raw_header
            .decode()
            .map_err(|_| ParseError::InvalidEncoding("header"))?;
        let header = core::str::from_utf8(&header).map_err(|_| ParseError::Utf8)?;
        let header = Header::from_json(header)?;

        let encrypted_key = encrypted_key
            .decode()
            .map_err(|_| ParseError::InvalidEncoding("encrypted key"))?;
        let iv = iv
            .decode()
            .map_err(|_| ParseError::InvalidEncoding("initialization vector"))?;
        let ciphertext = ciphertext
            .decode()
            .map_err(|_| ParseError::InvalidEncoding("ciphertext"))?;
        let tag = tag
            .decode()
            .map_err(|_| ParseError::InvalidEncoding("authentication tag"))?;

        Ok(Self {
            header,
            raw_header: raw_header.clone(),
            encrypted_key,
            iv,
            ciphertext,
            tag,
        })
    }

    /// Encodes this token into its compact serialization.
    pub fn encode(&self) -> Compact {
        let mut compact = Compact::with_capacity(5);
        compact.push_base64url(self.raw_header.clone());
        compact.push(&self.encrypted_key);
        compact.push(&self.iv);
        compact.push(&self.ciphertext);
        compact.push(&self.tag);
        compact
    }

    /// The header parameters of this token.
    ///
    /// These are unauthenticated until [`decrypt`](Self::decrypt)
    /// succeeded. They are exposed anyway because selecting the right
    /// key usually requires looking at `kid` or `alg` first.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Decrypts this token with `key` and parses the plaintext into `T`.
    ///
    /// The `alg` header parameter must match the algorithm of `key`
    /// before any cryptography runs. If the header carries a `zip`
    /// parameter, the plaintext is decompressed, but only after its
    /// authentication tag has been verified.
    ///
    /// # Errors
    ///
    /// Fails if the header is inconsistent or carries critical
    /// extensions this implementation does not know, if the key does not
    /// match the token, or if decryption itself fails.
    pub fn decrypt<T, K>(self, key: &K) -> Result<JsonWebEncryption<T>, DecryptError>
    where
        T: Payload,
        K: KeyManagement,
    {
        self.header.validate_critical()?;
        self.header.check_critical_understood(&[])?;

        let alg = self
            .header
            .algorithm()
            .ok_or_else(|| header::Error::MissingHeader("alg".to_owned()))?;
        if *alg != JsonWebAlgorithm::Encryption(key.algorithm()) {
            return Err(DecryptError::AlgorithmMismatch {
                header: alg.clone(),
                key: key.algorithm(),
            });
        }
        let enc = self
            .header
            .content_encryption_algorithm()
            .ok_or_else(|| header::Error::MissingHeader("enc".to_owned()))?;

        let view = JoseHeader::new([&self.header])?;
        let cek = key.decrypt_cek(&self.encrypted_key, enc, &view)?;

        let plaintext = enc.decrypt(
            cek.expose(),
            &self.iv,
            &self.ciphertext,
            &self.tag,
            self.raw_header.as_str().as_bytes(),
        )?;
        let plaintext = match self.header.compression_algorithm() {
            Some(zip) => zip.decompress(&plaintext)?,
            None => plaintext,
        };
        let payload = T::from_bytes(plaintext)?;

        Ok(JsonWebEncryption {
            header: self.header,
            payload,
        })
    }
}

impl FromStr for Encrypted {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(Compact::from(s))
    }
}

impl fmt::Display for Encrypted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.encode().fmt(f)
    }
}

/// Errors that can occur while encrypting a JWE.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EncryptError {
    /// The key management algorithm could not provide a content
    /// encryption key.
    #[error(transparent)]
    KeyManagement(#[from] KeyManagementError),
    /// The payload could not be encrypted.
    #[error(transparent)]
    ContentEncryption(#[from] ContentEncryptionError),
    /// The payload could not be compressed.
    #[error(transparent)]
    Compression(#[from] CompressionError),
    /// The payload could not be converted into bytes.
    #[error(transparent)]
    Payload(#[from] PayloadError),
    /// The header is inconsistent, for example an invalid `crit` list.
    #[error(transparent)]
    Header(#[from] header::Error),
    /// No randomness was available for the initialization vector.
    #[error("failed to get randomness from the operating system")]
    Rng,
}

/// Errors that can occur while decrypting an [`Encrypted`] token.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecryptError {
    /// The `alg` header parameter names a different algorithm than the
    /// supplied key implements.
    ///
    /// The comparison runs before any cryptography, so a token cannot
    /// steer a key into an operation it was not meant for.
    #[error("the token is encrypted with `{header}` but the key implements `{key}`")]
    AlgorithmMismatch {
        /// The algorithm from the `alg` header parameter.
        header: JsonWebAlgorithm,
        /// The algorithm the key implements.
        key: JsonWebEncryptionAlgorithm,
    },
    /// The header is missing a required parameter or is inconsistent.
    #[error(transparent)]
    Header(#[from] header::Error),
    /// The content encryption key could not be recovered.
    #[error(transparent)]
    KeyManagement(#[from] KeyManagementError),
    /// The ciphertext could not be decrypted or failed authentication.
    #[error(transparent)]
    ContentEncryption(#[from] ContentEncryptionError),
    /// The plaintext could not be decompressed.
    #[error(transparent)]
    Compression(#[from] CompressionError),
    /// The plaintext could not be parsed into the payload type.
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// Errors that can occur while parsing an [`Encrypted`] token from its
/// compact serialization.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The token does not consist of five segments.
    #[error("expected 5 parts in the compact serialization but found {0}")]
    InvalidFormat(usize),
    /// A segment holds characters outside the base64url alphabet.
    #[error("the `{0}` segment is not valid Base64Url")]
    InvalidEncoding(&'static str),
    /// The protected header decoded to bytes that are not UTF-8.
    #[error("the protected header is not valid UTF-8")]
    Utf8,
    /// The protected header is not a valid JSON object.
    #[error(transparent)]
    Header(#[from] header::Error),
}
