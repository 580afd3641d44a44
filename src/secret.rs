//! Per-user secrets and their derivation.
//!
//! One reserved username maps to a fixed well-known secret so the system
//! stays usable before any user registry is wired up; every other
//! username maps to a secret derived by hashing the name. Secrets are
//! held in memory only and zeroized on drop.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Username that resolves to the fixed well-known secret.
pub const WELL_KNOWN_USERNAME: &str = "random";

/// Length in bytes of every secret: an 8-byte stamp prefix plus 128
/// bytes of key material. The prefix is overwritten with the time
/// window before hashing, so its initial value never matters.
pub const SECRET_LEN: usize = 136;

/// Key material behind [`WELL_KNOWN_USERNAME`], stamp prefix included.
const WELL_KNOWN_SECRET: [u8; SECRET_LEN] = [
    0, 0, 0, 0, 0, 0, 0, 0, //
    164, 250, 78, 53, 177, 183, 209, 55, 136, 39, //
    18, 220, 194, 13, 206, 65, 75, 81, 33, 122, 79, //
    124, 34, 253, 148, 151, 106, 229, 150, 172, //
    120, 158, 237, 59, 221, 112, 174, 28, 154, //
    54, 31, 40, 116, 184, 132, 38, 193, 61, 7, 74, //
    69, 64, 35, 123, 50, 215, 159, 125, 133, 88, 105, //
    204, 9, 87, 96, 189, 44, 49, 51, 239, 201, 62, 95, //
    227, 127, 228, 68, 225, 211, 210, 207, 161, 73, //
    0, 36, 170, 52, 109, 107, 180, 169, 140, 216, //
    128, 90, 241, 187, 197, 238, 178, 101, 254, 142, //
    121, 231, 185, 135, 43, 110, 19, 66, 83, 226, 160, //
    181, 244, 240, 17, 129, 173, 1, 156, 42, 117, //
    16, 141, 5, 111,
];

/// Opaque secret byte sequence bound to one username.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Secret {
    bytes: Vec<u8>,
}

impl core::fmt::Debug for Secret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Secret({} bytes)", self.bytes.len())
    }
}

impl Secret {
    /// The fixed well-known secret, also the fallback when no user has
    /// been selected yet. Documented permissive default, not an error.
    pub fn well_known() -> Self {
        Self {
            bytes: WELL_KNOWN_SECRET.to_vec(),
        }
    }

    /// Derive the secret for `username`.
    ///
    /// The reserved username returns the well-known secret; anything
    /// else goes through [`Secret::for_username`].
    pub fn derive(username: &str) -> Self {
        if username == WELL_KNOWN_USERNAME {
            Self::well_known()
        } else {
            Self::for_username(username)
        }
    }

    /// Derive a secret by hashing `username`, bypassing the reserved
    /// name. The name is encoded as UTF-16LE (fixed-width units) and
    /// hashed with SHA-256; the digest lands after the stamp prefix.
    pub fn for_username(username: &str) -> Self {
        let mut encoded = Vec::with_capacity(username.len() * 2);
        for unit in username.encode_utf16() {
            encoded.extend_from_slice(&unit.to_le_bytes());
        }
        let digest: [u8; 32] = Sha256::digest(&encoded).into();
        encoded.zeroize();
        Self::from_digest(&digest)
    }

    /// Build a secret from 32 bytes of key material, placed after the
    /// 8-byte stamp prefix in an otherwise zeroed buffer.
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        let mut bytes = Vec::new();
        bytes.resize(SECRET_LEN, 0u8);
        bytes[8..40].copy_from_slice(digest);
        Self { bytes }
    }

    /// Raw secret bytes, stamp prefix first.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Derive per-user key material from a master key and context using
/// HKDF-SHA256, for deployments that provision secrets from a vault
/// instead of hashing usernames.
///
/// Feed the result to [`Secret::from_digest`].
pub fn derive_user_secret(master_key: &[u8], context: &[u8]) -> [u8; 32] {
    use hkdf::Hkdf;

    let hk = Hkdf::<Sha256>::new(None, master_key);
    let mut output = [0u8; 32];
    hk.expand(context, &mut output)
        .expect("32 bytes is a valid output length for HKDF-SHA256");
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_secret_layout() {
        let secret = Secret::well_known();
        assert_eq!(secret.as_bytes().len(), SECRET_LEN);
        assert_eq!(&secret.as_bytes()[..8], &[0u8; 8]);
        assert_eq!(secret.as_bytes()[8], 164);
        assert_eq!(secret.as_bytes()[SECRET_LEN - 1], 111);
    }

    #[test]
    fn reserved_username_gets_well_known_secret() {
        assert_eq!(Secret::derive("random"), Secret::well_known());
        assert_ne!(Secret::derive("alice"), Secret::well_known());
    }

    #[test]
    fn derived_secret_embeds_digest_after_prefix() {
        let secret = Secret::for_username("alice");
        let bytes = secret.as_bytes();
        assert_eq!(bytes.len(), SECRET_LEN);
        assert_eq!(&bytes[..8], &[0u8; 8]);
        assert_ne!(&bytes[8..40], &[0u8; 32]);
        assert_eq!(&bytes[40..], &[0u8; SECRET_LEN - 40]);
    }

    #[test]
    fn derivation_is_deterministic_per_username() {
        assert_eq!(Secret::derive("alice"), Secret::derive("alice"));
        assert_ne!(Secret::derive("alice"), Secret::derive("bob"));
    }

    #[test]
    fn username_hash_uses_utf16_units() {
        let mut encoded = Vec::new();
        for unit in "alice".encode_utf16() {
            encoded.extend_from_slice(&unit.to_le_bytes());
        }
        let expected: [u8; 32] = Sha256::digest(&encoded).into();
        let secret = Secret::for_username("alice");
        assert_eq!(&secret.as_bytes()[8..40], &expected);
    }

    #[test]
    fn derive_user_secret_separates_contexts() {
        let master = [7u8; 32];
        let a = derive_user_secret(&master, b"door-1");
        let b = derive_user_secret(&master, b"door-2");
        assert_ne!(a, b);
        let secret = Secret::from_digest(&a);
        assert_eq!(&secret.as_bytes()[8..40], &a);
    }
}
