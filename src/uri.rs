use alloc::string::String;
use core::{fmt, ops::Deref, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string could not be parsed into a [`Uri`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the string is not a valid URI")]
pub struct InvalidUri;

/// A serializable URI type implemented using [`serde`] and [`fluent_uri`].
///
/// This is a thin wrapper around a [`fluent_uri::Uri<String>`] that
/// implements [`Serialize`] and [`Deserialize`].
#[derive(Debug, Clone, Default)]
pub struct Uri(fluent_uri::Uri<String>);

impl Uri {
    /// Turns this URI into the underlying [`fluent_uri::Uri<String>`].
    pub fn into_inner(self) -> fluent_uri::Uri<String> {
        self.0
    }
}

impl PartialEq for Uri {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str().eq(other.0.as_str())
    }
}
impl Eq for Uri {}

impl Deref for Uri {
    type Target = fluent_uri::Uri<String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<fluent_uri::Uri<String>> for Uri {
    fn from(uri: fluent_uri::Uri<String>) -> Self {
        Self(uri)
    }
}

impl FromStr for Uri {
    type Err = InvalidUri;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fluent_uri::Uri::parse(String::from(s))
            .map(Uri)
            .map_err(|_| InvalidUri)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Uri {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Uri {
    fn deserialize<D>(deserializer: D) -> Result<Uri, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let uri = String::deserialize(deserializer)?;

        Ok(Uri(
            fluent_uri::Uri::parse(uri).map_err(|e| serde::de::Error::custom(e))?
        ))
    }
}
