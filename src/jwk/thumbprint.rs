use alloc::{collections::BTreeMap, string::String, vec::Vec};

use serde::Serialize;
use sha2::{Digest as _, Sha256, Sha384, Sha512};

use crate::sealed::Sealed;

/// This trait is implemented by all key types, and can be used to compute
/// the [RFC 7638] thumbprint of any private, public or symmetric key.
///
/// The thumbprint of a private key is the thumbprint of its public key.
/// Private key members never go into the hash.
///
/// If you want to use a custom hashing function, call the
/// [`Self::thumbprint_prehashed`] method and hash the result yourself.
///
/// [RFC 7638]: <https://datatracker.ietf.org/doc/html/rfc7638>
pub trait Thumbprint: Sealed {
    /// Compute the thumbprint JSON string of this key.
    ///
    /// This method does not perform any hashing. It returns the
    /// constructed JSON string, the required members of the key in
    /// lexicographic order with no whitespace, so that it can be hashed
    /// with some hashing algorithm that is not supported natively by this
    /// crate.
    ///
    /// For common hashing methods have a look at these methods:
    ///
    /// - SHA256 - [`thumbprint_sha256`](Self::thumbprint_sha256)
    /// - SHA384 - [`thumbprint_sha384`](Self::thumbprint_sha384)
    /// - SHA512 - [`thumbprint_sha512`](Self::thumbprint_sha512)
    fn thumbprint_prehashed(&self) -> String;

    /// Computes the SHA256-hashed thumbprint of this key.
    fn thumbprint_sha256(&self) -> Vec<u8> {
        let msg = self.thumbprint_prehashed();
        Sha256::digest(msg.as_bytes()).to_vec()
    }

    /// Computes the SHA384-hashed thumbprint of this key.
    fn thumbprint_sha384(&self) -> Vec<u8> {
        let msg = self.thumbprint_prehashed();
        Sha384::digest(msg.as_bytes()).to_vec()
    }

    /// Computes the SHA512-hashed thumbprint of this key.
    fn thumbprint_sha512(&self) -> Vec<u8> {
        let msg = self.thumbprint_prehashed();
        Sha512::digest(msg.as_bytes()).to_vec()
    }
}

pub(crate) fn serialize_key_thumbprint<T: Serialize>(key: &T) -> String {
    let obj = serde_json::to_value(key).expect("serialization of a key type can not fail");

    let map = match obj {
        serde_json::Value::Object(map) => BTreeMap::from_iter(map),
        _ => unreachable!("all keytypes must serialize to structs"),
    };

    serde_json::to_string(&map).expect("BTreeMap serialization can not fail")
}
