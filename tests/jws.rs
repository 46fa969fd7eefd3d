//! Signing and verification against the appendix examples of RFC 7515
//! and RFC 8037.

mod common;

use common::TestResult;
use jwx::{
    jwa::{
        EcDSA, EcdsaSigningKey, EcdsaVerifyingKey, Ed25519SigningKey, Ed25519VerifyingKey, Hmac,
        HmacKey, JsonWebAlgorithm, JsonWebSigningAlgorithm, RsaSigning, RsaSigningKey,
        RsaVerifyingKey, RsassaPkcs1V1_5,
    },
    jws::{JsonWebSignature, ParseError, Unverified},
    jwt::{Claim, NumericDate},
    Base64UrlString, Claims, FromKey, Header, Parameter, VerifyError,
};

// the HS256 example token from appendix A.1 of RFC 7515, with the
// carriage returns and spaces of the example JSON preserved inside the
// encoded segments
const RFC7515_A1_TOKEN: &str = concat!(
    "eyJ0eXAiOiJKV1QiLA0KICJhbGciOiJIUzI1NiJ9",
    ".eyJpc3MiOiJqb2UiLA0KICJleHAiOjEzMDA4MTkzODAsDQogImh0dHA6Ly9leGFtcGxlLmNvbS9pc19yb290Ijp0cnVlfQ",
    ".dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"
);

#[test]
fn the_rfc_7515_a1_token_verifies() -> TestResult {
    let jwk = common::read_jwk("rfc7515-a1-hmac")?;
    let key = HmacKey::from_key(&jwk, JsonWebSigningAlgorithm::Hmac(Hmac::Hs256))?;

    let verified = RFC7515_A1_TOKEN
        .parse::<Unverified<Claims>>()?
        .verify(&key)?;

    assert_eq!(
        verified.header().algorithm(),
        Some(&JsonWebAlgorithm::Signing(JsonWebSigningAlgorithm::Hmac(
            Hmac::Hs256
        )))
    );
    assert_eq!(verified.payload().issuer(), Some("joe"));
    assert_eq!(
        verified.payload().expiration_time(),
        Some(NumericDate::new(1300819380))
    );
    assert!(matches!(
        verified.payload().get("http://example.com/is_root"),
        Some(Claim::Other(_, serde_json::Value::Bool(true)))
    ));

    Ok(())
}

#[test]
fn tampering_with_the_payload_is_detected() -> TestResult {
    let jwk = common::read_jwk("rfc7515-a1-hmac")?;
    let key = HmacKey::from_key(&jwk, JsonWebSigningAlgorithm::Hmac(Hmac::Hs256))?;

    // flip the first character of the payload segment
    let tampered = RFC7515_A1_TOKEN.replacen(".eyJpc3Mi", ".fyJpc3Mi", 1);

    let err = tampered
        .parse::<Unverified<Vec<u8>>>()?
        .verify(&key)
        .unwrap_err();
    assert!(matches!(err, VerifyError::InvalidSignature));

    Ok(())
}

#[test]
fn an_hs256_token_has_the_documented_shape() -> TestResult {
    let key = HmacKey::new(*b"SECRETKEY", Hmac::Hs256);
    let token = JsonWebSignature::new(String::from("PAYLOAD"))
        .sign(&key)?
        .to_string();

    let parts: Vec<&str> = token.split('.').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "eyJhbGciOiJIUzI1NiJ9");
    assert_eq!(
        Base64UrlString::from(parts[0]).decode()?,
        br#"{"alg":"HS256"}"#
    );

    let verified = token.parse::<Unverified<String>>()?.verify(&key)?;
    assert_eq!(verified.payload(), "PAYLOAD");

    let wrong = HmacKey::new(*b"WRONGKEY", Hmac::Hs256);
    let err = token
        .parse::<Unverified<String>>()?
        .verify(&wrong)
        .unwrap_err();
    assert!(matches!(err, VerifyError::InvalidSignature));

    Ok(())
}

#[test]
fn the_algorithm_is_checked_before_the_signature() -> TestResult {
    let key = HmacKey::new(*b"a secret at least 32 bytes long!", Hmac::Hs256);
    let token = JsonWebSignature::new(String::from("hello"))
        .sign(&key)?
        .to_string();

    // same key material, different algorithm
    let other = HmacKey::new(*b"a secret at least 32 bytes long!", Hmac::Hs384);
    let err = token
        .parse::<Unverified<String>>()?
        .verify(&other)
        .unwrap_err();
    assert!(matches!(err, VerifyError::AlgorithmMismatch { .. }));

    Ok(())
}

#[test]
fn rs256_round_trips_with_the_rfc_7515_a2_key() -> TestResult {
    let jwk = common::read_jwk("rfc7515-a2-rsa")?;
    let alg = JsonWebSigningAlgorithm::Rsa(RsaSigning::RsPkcs1V1_5(RsassaPkcs1V1_5::Rs256));
    let signer = RsaSigningKey::from_key(&jwk, alg.clone())?;
    let verifier = RsaVerifyingKey::from_key(&jwk, alg)?;

    let token = JsonWebSignature::new(String::from("sample text"))
        .sign(&signer)?
        .to_string();
    let verified = token.parse::<Unverified<String>>()?.verify(&verifier)?;
    assert_eq!(verified.payload(), "sample text");

    Ok(())
}

#[test]
fn es256_round_trips_with_the_rfc_7515_a3_key() -> TestResult {
    let jwk = common::read_jwk("rfc7515-a3-ec")?;
    let alg = JsonWebSigningAlgorithm::EcDSA(EcDSA::Es256);
    let signer = EcdsaSigningKey::from_key(&jwk, alg.clone())?;
    let verifier = EcdsaVerifyingKey::from_key(&jwk, alg)?;

    let token = JsonWebSignature::new(String::from("sample text"))
        .sign(&signer)?
        .to_string();
    let verified = token.parse::<Unverified<String>>()?.verify(&verifier)?;
    assert_eq!(verified.payload(), "sample text");

    Ok(())
}

#[test]
fn the_rfc_8037_ed25519_token_is_reproduced() -> TestResult {
    let jwk = common::read_jwk("rfc8037-a-ed25519")?;
    let signer = Ed25519SigningKey::from_key(&jwk, JsonWebSigningAlgorithm::EdDSA)?;

    // Ed25519 signatures are deterministic, so the token from appendix
    // A.4 of RFC 8037 comes out byte for byte
    let token = JsonWebSignature::new(String::from("Example of Ed25519 signing"))
        .sign(&signer)?
        .to_string();
    assert_eq!(
        token,
        concat!(
            "eyJhbGciOiJFZERTQSJ9",
            ".RXhhbXBsZSBvZiBFZDI1NTE5IHNpZ25pbmc",
            ".hgyY0il_MGCjP0JzlnLWG1PPOt7-09PGcvMg3AIbQR6dWbhijcNR4ki4iylGjg5BhVsPt9g7sVvpAr_MuM0KAg"
        )
    );

    let verifier = Ed25519VerifyingKey::from_key(&jwk, JsonWebSigningAlgorithm::EdDSA)?;
    let verified = token.parse::<Unverified<String>>()?.verify(&verifier)?;
    assert_eq!(verified.payload(), "Example of Ed25519 signing");

    Ok(())
}

#[test]
fn an_unencoded_payload_travels_raw() -> TestResult {
    let key = HmacKey::new(*b"a secret at least 32 bytes long!", Hmac::Hs256);
    let header = Header::from_parameters([
        Parameter::Base64UrlEncodePayload(false),
        Parameter::Critical(vec![String::from("b64")]),
    ])?;

    let token = JsonWebSignature::new_with_header(header, String::from("hello world"))
        .sign(&key)?
        .to_string();
    assert_eq!(token.split('.').nth(1), Some("hello world"));

    let verified = token.parse::<Unverified<String>>()?.verify(&key)?;
    assert_eq!(verified.payload(), "hello world");

    Ok(())
}

#[test]
fn duplicate_header_parameters_are_rejected() {
    let raw = Base64UrlString::encode(br#"{"alg":"none","typ":"JWT","typ":"JWT"}"#);
    let token = format!("{raw}.YWJj.");

    let err = token.parse::<Unverified<String>>().unwrap_err();
    assert!(matches!(err, ParseError::Header(_)));
    assert!(err
        .to_string()
        .contains("encountered two header parameters named `typ`"));
}

#[test]
fn unknown_critical_extensions_are_rejected() -> TestResult {
    let key = HmacKey::new(*b"a secret at least 32 bytes long!", Hmac::Hs256);
    let header = Header::from_parameters([
        Parameter::Critical(vec![String::from("exp")]),
        Parameter::Other(String::from("exp"), serde_json::json!(1300819380)),
    ])?;

    let token = JsonWebSignature::new_with_header(header, String::from("x"))
        .sign(&key)?
        .to_string();

    let err = token
        .parse::<Unverified<String>>()?
        .verify(&key)
        .unwrap_err();
    assert!(matches!(err, VerifyError::Header(_)));

    Ok(())
}
