//! Common test helpers.

use jwx::JsonWebKey;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Reads a key file from the `tests/keys` directory.
pub fn read_jwk(name: &str) -> TestResult<JsonWebKey> {
    let json = std::fs::read_to_string(format!(
        "{}/tests/keys/{name}.json",
        env!("CARGO_MANIFEST_DIR"),
    ))?;
    let key: JsonWebKey = serde_json::from_str(&json)?;

    Ok(key)
}
