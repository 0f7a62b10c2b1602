//! Quorum verification of guardian signatures.
//!
//! Verification never writes to storage. It reads the referenced guardian set once, together
//! with the current set pointer, and checks the VAA against that copy.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    digest::message_signing_digest,
    guardian_set::{GuardianSet, GuardianSetRegistry},
    recover::Recoverer,
    storage::Storage,
    Address, Chain, EmitterId, Error, GuardianAddress, Result, Signature, Vaa,
};

/// The fields of a VAA whose signatures met quorum.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct VerifiedMessage {
    pub guardian_set_index: u32,
    pub timestamp: u32,
    pub nonce: u32,
    pub emitter_chain: Chain,
    pub emitter_address: Address,
    pub sequence: u64,
    pub consistency_level: u8,
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,

    /// Keccak-256 of the body, the identity of the VAA.
    #[serde(with = "crate::serde_hex")]
    pub hash: [u8; 32],
}

impl VerifiedMessage {
    pub fn emitter(&self) -> EmitterId {
        EmitterId {
            chain: self.emitter_chain,
            address: self.emitter_address,
        }
    }

    pub fn message_id(&self) -> String {
        crate::vaa::message_id(self.emitter(), self.sequence)
    }
}

/// Checks that `vaa` carries a quorum of valid signatures from the guardian set it references.
///
/// Checks run in this order and the first failure is returned:
///
/// 1. The guardian set exists and has not expired at `now`.
/// 2. There are at least `quorum` signatures.
/// 3. For each signature, in order: a signer can be recovered, the guardian index is inside the
///    set, the index is strictly greater than the previous one, and the signer is the guardian at
///    that index.
pub fn verify<S, R>(
    vaa: &Vaa,
    registry: &GuardianSetRegistry<S>,
    recoverer: &R,
    now: u32,
) -> Result<VerifiedMessage>
where
    S: Storage + ?Sized,
    R: Recoverer + ?Sized,
{
    let set = registry.verification_set(vaa.guardian_set_index, now)?;

    let quorum = set.quorum();
    if vaa.signatures.len() < quorum {
        return Err(Error::InsufficientSignatures {
            actual: vaa.signatures.len(),
            quorum,
        });
    }

    let digest = vaa.digest();
    check_signatures(
        &vaa.signatures,
        &digest.secp256k_hash,
        &set.addresses,
        recoverer,
    )?;

    Ok(VerifiedMessage {
        guardian_set_index: vaa.guardian_set_index,
        timestamp: vaa.timestamp,
        nonce: vaa.nonce,
        emitter_chain: vaa.emitter_chain,
        emitter_address: vaa.emitter_address,
        sequence: vaa.sequence,
        consistency_level: vaa.consistency_level,
        payload: vaa.payload.clone(),
        hash: digest.hash,
    })
}

/// Checks a single guardian signature over `prefix || data`, for messages guardians sign
/// outside of VAAs.
pub fn verify_message_signature<R>(
    prefix: &[u8],
    data: &[u8],
    signature: &Signature,
    set: &GuardianSet,
    recoverer: &R,
) -> Result<()>
where
    R: Recoverer + ?Sized,
{
    let digest = message_signing_digest(prefix, data)?;
    check_signatures(
        std::slice::from_ref(signature),
        &digest,
        &set.addresses,
        recoverer,
    )
}

fn check_signatures<R>(
    signatures: &[Signature],
    digest: &[u8; 32],
    guardians: &[GuardianAddress],
    recoverer: &R,
) -> Result<()>
where
    R: Recoverer + ?Sized,
{
    let mut last_index: Option<u8> = None;

    for sig in signatures {
        let index = sig.guardian_index;

        let signer = recoverer
            .recover(digest, &sig.r, &sig.s, sig.recovery_id)
            .map_err(|e| {
                debug!(index, error = %e, "signature recovery failed");
                Error::BadSignature { index }
            })?;

        let guardian = guardians
            .get(usize::from(index))
            .ok_or(Error::GuardianIndexOutOfRange {
                index,
                len: guardians.len(),
            })?;

        if let Some(previous) = last_index {
            if index <= previous {
                return Err(Error::GuardianIndexNotAscending { index, previous });
            }
        }

        if signer != *guardian {
            return Err(Error::SignerMismatch { index });
        }

        last_index = Some(index);
    }

    Ok(())
}
