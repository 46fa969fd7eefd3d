//! This module contains the JWK Set implementation.

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use super::JsonWebKey;

/// A list of [`JsonWebKey`] objects, parsed according to [section 5 of
/// RFC 7517].
///
/// Members of the set other than `keys` are ignored. The keys themselves
/// are not checked against any policy when the set is parsed. Check each
/// key with [`Checkable::check`](crate::policy::Checkable::check) before
/// using it.
///
/// [section 5 of RFC 7517]: <https://datatracker.ietf.org/doc/html/rfc7517#section-5>
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct JsonWebKeySet {
    keys: Vec<JsonWebKey>,
}

impl JsonWebKeySet {
    /// Tries to find the JWK with the given key ID parameter set.
    ///
    /// If several keys carry the same `kid`, the first one wins.
    pub fn find_by_key_id(&self, key_id: &str) -> Option<&JsonWebKey> {
        self.keys
            .iter()
            .find(|key| key.key_id().is_some_and(|id| id == key_id))
    }

    /// Returns an iterator over all the JWKs in this set.
    pub fn iter(&self) -> impl Iterator<Item = &JsonWebKey> {
        self.keys.iter()
    }

    /// Returns an iterator that allows modifying each JWK.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut JsonWebKey> {
        self.keys.iter_mut()
    }

    /// The number of keys in this set.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether this set contains no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<'a> IntoIterator for &'a JsonWebKeySet {
    type IntoIter = core::slice::Iter<'a, JsonWebKey>;
    type Item = &'a JsonWebKey;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

impl<'a> IntoIterator for &'a mut JsonWebKeySet {
    type IntoIter = core::slice::IterMut<'a, JsonWebKey>;
    type Item = &'a mut JsonWebKey;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter_mut()
    }
}

impl IntoIterator for JsonWebKeySet {
    type IntoIter = alloc::vec::IntoIter<Self::Item>;
    type Item = JsonWebKey;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter()
    }
}

impl From<Vec<JsonWebKey>> for JsonWebKeySet {
    fn from(keys: Vec<JsonWebKey>) -> Self {
        Self { keys }
    }
}

impl FromIterator<JsonWebKey> for JsonWebKeySet {
    fn from_iter<T: IntoIterator<Item = JsonWebKey>>(iter: T) -> Self {
        let keys = iter.into_iter().collect();
        Self { keys }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwk::JsonWebKeyType;

    // the example JWK set from appendix A.1 of RFC 7517
    const JSON: &str = r#"{
        "keys": [
            {
                "kty": "EC",
                "crv": "P-256",
                "x": "MKBCTNIcKUSDii11ySs3526iDZ8AiTo7Tu6KPAqv7D4",
                "y": "4Etl6SRW2YiLUrN5vfvVHuhp7x8PxltmWWlbbM4IFyM",
                "use": "enc",
                "kid": "1"
            },
            {
                "kty": "RSA",
                "n": "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw",
                "e": "AQAB",
                "alg": "RS256",
                "kid": "2011-04-29"
            }
        ]
    }"#;

    #[test]
    fn the_rfc_7517_example_set_parses() {
        let set: JsonWebKeySet = serde_json::from_str(JSON).unwrap();
        assert_eq!(set.len(), 2);

        let ec = set.find_by_key_id("1").unwrap();
        assert!(matches!(ec.key_type(), JsonWebKeyType::Ec(_)));

        let rsa = set.find_by_key_id("2011-04-29").unwrap();
        assert!(matches!(rsa.key_type(), JsonWebKeyType::Rsa(_)));

        assert!(set.find_by_key_id("missing").is_none());
    }

    #[test]
    fn a_set_survives_a_round_trip() {
        let set: JsonWebKeySet = serde_json::from_str(JSON).unwrap();
        let json = serde_json::to_string(&set).unwrap();
        let reparsed: JsonWebKeySet = serde_json::from_str(&json).unwrap();

        assert_eq!(set, reparsed);
    }

    #[test]
    fn unknown_set_members_are_ignored() {
        let set: JsonWebKeySet =
            serde_json::from_str(r#"{"keys": [], "revision": 3}"#).unwrap();
        assert!(set.is_empty());
    }
}
