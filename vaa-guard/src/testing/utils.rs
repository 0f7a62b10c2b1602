use crate::{
    recover::{RecoverError, Recoverer},
    Address, Body, Chain, Config, GuardianAddress, GuardianSet, GuardianSetRegistry, Header,
    MemoryStorage, Signature, Vaa, VaaProcessor,
};

pub const EXPIRATION: u32 = 100;
pub const DESTINATION: Address = Address([0xcc; 32]);

/// Deterministic stand-in for secp256k1 recovery. A fixture signature carries the signer's
/// address in `r` and the signed digest in `s`.
pub struct FixtureRecoverer;

impl Recoverer for FixtureRecoverer {
    fn recover(
        &self,
        digest: &[u8; 32],
        r: &[u8; 32],
        s: &[u8; 32],
        recovery_id: u8,
    ) -> Result<GuardianAddress, RecoverError> {
        if recovery_id > 3 {
            return Err(RecoverError::InvalidRecoveryId(recovery_id));
        }

        if s != digest {
            return Err(RecoverError::CannotRecoverKey);
        }

        let mut addr = [0u8; 20];
        addr.copy_from_slice(&r[..20]);
        Ok(GuardianAddress(addr))
    }
}

pub fn fixture_sign(signer: &GuardianAddress, guardian_index: u8, digest: &[u8; 32]) -> Signature {
    let mut r = [0u8; 32];
    r[..20].copy_from_slice(&signer.0);

    Signature {
        guardian_index,
        r,
        s: *digest,
        recovery_id: 0,
    }
}

pub fn guardians(n: usize) -> Vec<GuardianAddress> {
    (0..n)
        .map(|i| {
            let mut addr = [0x47u8; 20];
            addr[..8].copy_from_slice(&(i as u64).to_be_bytes());
            GuardianAddress(addr)
        })
        .collect()
}

pub fn config() -> Config {
    Config {
        chain_id: Chain::Terra2,
        contract: DESTINATION,
        guardian_set_expiration: EXPIRATION,
    }
}

pub fn processor(storage: &MemoryStorage) -> VaaProcessor<'_, MemoryStorage, FixtureRecoverer> {
    VaaProcessor::new(storage, config(), FixtureRecoverer)
}

pub fn activate(storage: &MemoryStorage, index: u32, addresses: Vec<GuardianAddress>, now: u32) {
    GuardianSetRegistry::new(storage, EXPIRATION)
        .activate(GuardianSet::new(index, addresses), now)
        .unwrap();
}

pub fn create_body(sequence: u64, payload: &[u8]) -> Body {
    Body {
        timestamp: 1_700_000_000,
        nonce: 42,
        emitter_chain: Chain::Ethereum,
        emitter_address: Address([0; 32]),
        sequence,
        consistency_level: 1,
        payload: payload.to_vec(),
    }
}

/// Signs `body` with the guardians at `indices`, in the order given.
pub fn sign_vaa(
    body: Body,
    guardian_set_index: u32,
    addresses: &[GuardianAddress],
    indices: &[u8],
) -> Vaa {
    let digest = body.digest();
    let signatures = indices
        .iter()
        .map(|&i| fixture_sign(&addresses[usize::from(i)], i, &digest.secp256k_hash))
        .collect();

    let header = Header {
        version: 1,
        guardian_set_index,
        signatures,
    };

    (header, body).into()
}

pub fn all_indices(n: usize) -> Vec<u8> {
    (0..n).map(|i| i as u8).collect()
}
