//! Message hashing. A VAA is identified by the Keccak-256 hash of its body, and guardians sign
//! the Keccak-256 hash of that hash.

use sha3::{Digest as Sha3Digest, Keccak256};

use crate::{Error, Result};

/// Digest data for a VAA body.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest {
    /// Guardians don't sign the VAA body directly, instead they hash the body and sign the hash.
    /// This single hash is what identifies a VAA.
    pub hash: [u8; 32],

    /// The hash of `hash`. secp256k1 signing hashes its input before signing, so this is the
    /// value that signatures are actually made over and the prehash that recovery expects.
    pub secp256k_hash: [u8; 32],
}

/// Calculates the digest of a serialized VAA body (`timestamp` through `payload`).
pub fn digest(body: &[u8]) -> Digest {
    let hash: [u8; 32] = Keccak256::digest(body).into();

    // Hash `hash` again to get the secp256k internal hash, see `Digest` for details.
    let secp256k_hash: [u8; 32] = Keccak256::digest(hash).into();

    Digest {
        hash,
        secp256k_hash,
    }
}

/// Digest for an arbitrary message signed by guardians outside of a VAA.
///
/// `prefix` domain-separates the message and must be at least 32 bytes long so that it can
/// never be confused with the body of a VAA.
pub fn message_signing_digest(prefix: &[u8], data: &[u8]) -> Result<[u8; 32]> {
    if prefix.len() < 32 {
        return Err(Error::PrefixTooShort(prefix.len()));
    }

    let mut h = Keccak256::new();
    h.update(prefix);
    h.update(data);
    Ok(h.finalize().into())
}
