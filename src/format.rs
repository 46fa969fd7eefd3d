//! Serialization formats for JOSE values.
//!
//! Only the compact serialization is implemented. It is the format used
//! in `Authorization` headers and everywhere else a token travels as a
//! single opaque string.

use alloc::vec::Vec;
use core::fmt;

use crate::Base64UrlString;

/// The compact representation is essentially a list of Base64Url
/// strings that are separated by `.`.
///
/// The parts are kept exactly as received. Whether a part actually holds
/// valid Base64Url data is only checked when it is decoded.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Compact {
    parts: Vec<Base64UrlString>,
}

impl Compact {
    pub(crate) fn with_capacity(cap: usize) -> Self {
        Compact {
            parts: Vec::with_capacity(cap),
        }
    }

    pub(crate) fn push_base64url(&mut self, part: Base64UrlString) {
        self.parts.push(part);
    }

    pub(crate) fn push(&mut self, part: impl AsRef<[u8]>) {
        self.parts.push(Base64UrlString::encode(part));
    }

    /// Returns the part at `idx`, if there is one.
    pub fn part(&self, idx: usize) -> Option<&Base64UrlString> {
        self.parts.get(idx)
    }

    /// The number of parts in this compact representation.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns `true` if there are no parts.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl From<&str> for Compact {
    /// Splits the string at every `.` into its parts.
    ///
    /// Never fails. Parts that hold invalid Base64Url data are reported
    /// when the relevant part is first decoded.
    fn from(s: &str) -> Self {
        let parts = s.split('.').map(Base64UrlString::from).collect();
        Self { parts }
    }
}

impl fmt::Display for Compact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.parts.len();

        for (idx, part) in self.parts.iter().enumerate() {
            fmt::Display::fmt(&part, f)?;

            if idx != len - 1 {
                f.write_str(".")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_rejoins_without_touching_parts() {
        let raw = "eyJhbGciOiJub25lIn0.YWJj.";
        let compact = Compact::from(raw);

        assert_eq!(compact.len(), 3);
        assert_eq!(compact.part(2).map(|p| &**p), Some(""));
        assert_eq!(alloc::string::ToString::to_string(&compact), raw);
    }
}
