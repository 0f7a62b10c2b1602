use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    storage::{self, namespaced, Storage, CURRENT_GUARDIAN_SET_KEY, GUARDIAN_SET_KEY},
    Error, GuardianAddress, Result,
};

/// Guardian indices in signatures are a single byte.
pub const MAX_GUARDIANS: usize = 256;

/// A `GuardianSet` is a versioned set of keys that can sign VAAs.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct GuardianSet {
    pub index: u32,

    /// Guardian addresses, in signing order.
    pub addresses: Vec<GuardianAddress>,

    /// When the set was activated, in seconds since UNIX epoch.
    pub creation_time: u32,

    /// When the set stops being accepted once superseded. 0 until it is superseded. Whether a
    /// set is current is decided by the registry, never by this field.
    pub expiration_time: u32,
}

impl GuardianSet {
    pub fn new(index: u32, addresses: Vec<GuardianAddress>) -> Self {
        GuardianSet {
            index,
            addresses,
            creation_time: 0,
            expiration_time: 0,
        }
    }

    /// Number of signatures required: more than two thirds of the guardians.
    pub fn quorum(&self) -> usize {
        (self.addresses.len() * 2) / 3 + 1
    }

    pub fn validate(&self) -> Result<()> {
        if self.addresses.is_empty() {
            return Err(Error::InvalidGuardianSet("no guardians"));
        }

        if self.addresses.len() > MAX_GUARDIANS {
            return Err(Error::InvalidGuardianSet("more than 256 guardians"));
        }

        let unique = self.addresses.iter().collect::<BTreeSet<_>>();
        if unique.len() != self.addresses.len() {
            return Err(Error::InvalidGuardianSet("duplicate guardian address"));
        }

        Ok(())
    }
}

/// Stores guardian sets by index and moves the current set forward.
///
/// Sets are never deleted. Activating a new set stamps the previous one with an expiration time
/// `guardian_set_expiration` seconds in the future, during which both sets verify.
pub struct GuardianSetRegistry<'a, S: ?Sized> {
    storage: &'a S,
    guardian_set_expiration: u32,
}

impl<'a, S: Storage + ?Sized> GuardianSetRegistry<'a, S> {
    pub fn new(storage: &'a S, guardian_set_expiration: u32) -> Self {
        GuardianSetRegistry {
            storage,
            guardian_set_expiration,
        }
    }

    pub fn get(&self, index: u32) -> Result<GuardianSet> {
        storage::load(self.storage, &guardian_set_key(index))?
            .ok_or(Error::UnknownGuardianSet(index))
    }

    /// Index of the current set, or `None` before the first activation.
    pub fn current_index(&self) -> Result<Option<u32>> {
        storage::load(self.storage, &current_key())
    }

    pub fn current(&self) -> Result<GuardianSet> {
        match self.current_index()? {
            Some(index) => self.get(index),
            None => Err(Error::UnknownGuardianSet(0)),
        }
    }

    /// Makes `new_set` the current set as of `now`.
    ///
    /// The first set must have index 0 and every later one the current index plus 1. Nothing is
    /// written unless every record involved could be read and encoded.
    pub fn activate(&self, mut new_set: GuardianSet, now: u32) -> Result<()> {
        new_set.validate()?;

        let current_key = current_key();
        let current_raw = self.storage.get(&current_key);
        let current: Option<u32> = storage::decode(&current_key, current_raw.as_deref())?;
        let expected = match current {
            None => Some(0),
            Some(index) => index.checked_add(1),
        };
        if expected != Some(new_set.index) {
            return Err(Error::InvalidGuardianSetIndex {
                expected: expected.unwrap_or(u32::MAX),
                actual: new_set.index,
            });
        }

        new_set.creation_time = now;
        new_set.expiration_time = 0;
        let record = storage::to_vec(&new_set)?;
        let pointer = storage::to_vec(&new_set.index)?;

        let superseded = match current {
            Some(index) => {
                let mut old = self.get(index)?;
                old.expiration_time = now.saturating_add(self.guardian_set_expiration);
                Some(old)
            }
            None => None,
        };
        let superseded_record = superseded.as_ref().map(storage::to_vec).transpose()?;

        // The old set gets its expiration before the pointer leaves it, so it never looks
        // superseded without a grace period.
        if let (Some(old), Some(raw)) = (&superseded, &superseded_record) {
            self.storage.set(&guardian_set_key(old.index), raw);
        }

        // Moving the pointer claims the index. A concurrent activation that moved it first wins.
        if !self
            .storage
            .compare_and_swap(&current_key, current_raw.as_deref(), &pointer)
        {
            return Err(Error::InvalidGuardianSetIndex {
                expected: new_set.index.saturating_add(1),
                actual: new_set.index,
            });
        }

        self.storage.set(&guardian_set_key(new_set.index), &record);

        if let Some(old) = &superseded {
            info!(
                index = old.index,
                expiration_time = old.expiration_time,
                "guardian set superseded"
            );
        }

        info!(
            index = new_set.index,
            guardians = new_set.addresses.len(),
            quorum = new_set.quorum(),
            "guardian set activated"
        );

        Ok(())
    }

    /// Returns set `index` if it may verify signatures at `now`: it is the current set, or a
    /// superseded set whose expiration time is still ahead of `now`.
    pub fn verification_set(&self, index: u32, now: u32) -> Result<GuardianSet> {
        let set = self.get(index)?;
        if self.current_index()? == Some(index) || now < set.expiration_time {
            Ok(set)
        } else {
            Err(Error::GuardianSetExpired(index))
        }
    }

    /// Whether the set exists and is the current set or a superseded set still within its grace
    /// period.
    pub fn is_valid_for_verification(&self, index: u32, now: u32) -> Result<bool> {
        match self.verification_set(index, now) {
            Ok(_) => Ok(true),
            Err(Error::UnknownGuardianSet(_) | Error::GuardianSetExpired(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn guardian_set_key(index: u32) -> Vec<u8> {
    namespaced(GUARDIAN_SET_KEY, &index.to_be_bytes())
}

fn current_key() -> Vec<u8> {
    namespaced(CURRENT_GUARDIAN_SET_KEY, &[])
}
