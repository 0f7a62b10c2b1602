//! Replay protection.
//!
//! A VAA is redeemed at most once per destination. Redemption writes a claim record under a key
//! built from the destination and the message's `(emitter_chain, emitter_address, sequence)`.
//! The write only succeeds if the record is absent, so a second redemption of the same message
//! fails with [`Error::AlreadyRedeemed`] no matter how the attempts interleave.
//!
//! The outbound side tracks a sequence number per emitter, so that every message an emitter
//! publishes gets a distinct `(emitter, sequence)` pair.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    storage::{self, namespaced, Storage, CLAIM_KEY, SEQUENCE_KEY},
    Address, Chain, Error, Result,
};

/// Length of the claim key after its namespace prefix: destination (32), emitter chain (2),
/// emitter address (32) and sequence (8).
pub const CLAIM_KEY_LEN: usize = 32 + 2 + 32 + 8;

/// Storage key of a claim record.
///
/// The fields are fixed width and concatenated without hashing, so distinct inputs always give
/// distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClaimKey(Vec<u8>);

impl ClaimKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for ClaimKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

pub fn derive_claim_key(
    destination: &Address,
    emitter_chain: Chain,
    emitter_address: &Address,
    sequence: u64,
) -> ClaimKey {
    let mut key = Vec::with_capacity(CLAIM_KEY_LEN);
    key.extend_from_slice(&destination.0);
    key.extend_from_slice(&u16::from(emitter_chain).to_be_bytes());
    key.extend_from_slice(&emitter_address.0);
    key.extend_from_slice(&sequence.to_be_bytes());

    ClaimKey(namespaced(CLAIM_KEY, &key))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
struct ClaimRecord {
    claimed: bool,
}

/// Next sequence number an emitter will use.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SequenceTracker {
    pub emitter: Address,
    pub sequence: u64,
}

/// Claims inbound messages and hands out outbound sequence numbers for one destination.
pub struct ReplayGuard<'a, S: ?Sized> {
    storage: &'a S,
    destination: Address,
}

impl<'a, S: Storage + ?Sized> ReplayGuard<'a, S> {
    pub fn new(storage: &'a S, destination: Address) -> Self {
        ReplayGuard {
            storage,
            destination,
        }
    }

    pub fn claim_key(
        &self,
        emitter_chain: Chain,
        emitter_address: &Address,
        sequence: u64,
    ) -> ClaimKey {
        derive_claim_key(&self.destination, emitter_chain, emitter_address, sequence)
    }

    pub fn is_redeemed(&self, key: &ClaimKey) -> bool {
        self.storage.get(key.as_bytes()).is_some()
    }

    /// Records the claim, or fails with [`Error::AlreadyRedeemed`] if it exists.
    pub fn consume_or_reject(&self, key: &ClaimKey) -> Result<()> {
        let record = storage::to_vec(&ClaimRecord { claimed: true })?;
        if !self.storage.insert_if_absent(key.as_bytes(), &record) {
            return Err(Error::AlreadyRedeemed);
        }

        debug!(key = %hex::encode(key.as_bytes()), "claim recorded");
        Ok(())
    }

    /// Sequence number the next message from `emitter` will get, without allocating it.
    pub fn sequence(&self, emitter: &Address) -> Result<u64> {
        let key = sequence_key(emitter);
        let tracker: Option<SequenceTracker> = storage::load(self.storage, &key)?;
        Ok(tracker.map_or(0, |t| t.sequence))
    }

    /// Allocates the next sequence number for `emitter`. The first message of an emitter gets 0
    /// and every later one the previous number plus 1.
    pub fn next_sequence(&self, emitter: &Address) -> Result<u64> {
        let key = sequence_key(emitter);

        loop {
            let raw = self.storage.get(&key);
            let current = storage::decode::<SequenceTracker>(&key, raw.as_deref())?
                .map_or(0, |t| t.sequence);

            let next = SequenceTracker {
                emitter: *emitter,
                sequence: current
                    .checked_add(1)
                    .ok_or(Error::SequenceExhausted(*emitter))?,
            };

            if self
                .storage
                .compare_and_swap(&key, raw.as_deref(), &storage::to_vec(&next)?)
            {
                debug!(%emitter, sequence = current, "sequence allocated");
                return Ok(current);
            }
        }
    }
}

fn sequence_key(emitter: &Address) -> Vec<u8> {
    namespaced(SEQUENCE_KEY, &emitter.0)
}
