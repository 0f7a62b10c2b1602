#![allow(dead_code)]

use k256::ecdsa::SigningKey;
use vaa_guard::{
    recover::guardian_address, Address, Body, Chain, Config, GuardianAddress, GuardianSet,
    GuardianSetRegistry, Header, MemoryStorage, Secp256k1Recoverer, Signature, Vaa, VaaProcessor,
};

pub const EXPIRATION: u32 = 86_400;

/// Deterministic devnet guardian keys.
pub fn default_guardian_keys() -> [SigningKey; 7] {
    [
        [
            93, 217, 189, 224, 168, 81, 157, 93, 238, 38, 143, 8, 182, 94, 69, 77, 232, 199, 238,
            206, 15, 135, 221, 58, 43, 74, 0, 129, 54, 198, 62, 226,
        ],
        [
            150, 48, 135, 223, 194, 186, 243, 139, 177, 8, 126, 32, 210, 57, 42, 28, 29, 102, 196,
            201, 106, 136, 40, 149, 218, 150, 240, 213, 192, 128, 161, 245,
        ],
        [
            121, 51, 199, 93, 237, 227, 62, 220, 128, 129, 195, 4, 190, 163, 254, 12, 212, 224,
            188, 76, 141, 242, 229, 121, 192, 5, 161, 176, 136, 99, 83, 53,
        ],
        [
            224, 180, 4, 114, 215, 161, 184, 12, 218, 96, 20, 141, 154, 242, 46, 230, 167, 165, 54,
            141, 108, 64, 146, 27, 193, 89, 251, 139, 234, 132, 124, 30,
        ],
        [
            69, 1, 17, 179, 19, 47, 56, 47, 255, 219, 143, 89, 115, 54, 242, 209, 163, 131, 225,
            30, 59, 195, 217, 141, 167, 253, 6, 95, 252, 52, 7, 223,
        ],
        [
            181, 3, 165, 125, 15, 200, 155, 56, 157, 204, 105, 221, 203, 149, 215, 175, 220, 228,
            200, 37, 169, 39, 68, 127, 132, 196, 203, 232, 155, 55, 67, 253,
        ],
        [
            72, 81, 175, 107, 23, 108, 178, 66, 32, 53, 14, 117, 233, 33, 114, 102, 68, 89, 83,
            201, 129, 57, 56, 130, 214, 212, 172, 16, 23, 22, 234, 160,
        ],
    ]
    .map(|bytes| SigningKey::from_slice(&bytes).unwrap())
}

pub fn addresses(keys: &[SigningKey]) -> Vec<GuardianAddress> {
    keys.iter()
        .map(|k| guardian_address(k.verifying_key()))
        .collect()
}

pub fn sign(key: &SigningKey, guardian_index: u8, body: &Body) -> Signature {
    let digest = body.digest();
    let (sig, recovery_id) = key
        .sign_prehash_recoverable(&digest.secp256k_hash)
        .unwrap();

    let mut rsv = [0u8; 65];
    rsv[..64].copy_from_slice(&sig.to_bytes());
    rsv[64] = recovery_id.to_byte();

    Signature::from_rsv(guardian_index, &rsv)
}

/// Signs `body` with `keys[i]` for every `i` in `indices`, in the order given.
pub fn sign_vaa(body: Body, guardian_set_index: u32, keys: &[SigningKey], indices: &[u8]) -> Vaa {
    let signatures = indices
        .iter()
        .map(|&i| sign(&keys[usize::from(i)], i, &body))
        .collect();

    (
        Header {
            version: 1,
            guardian_set_index,
            signatures,
        },
        body,
    )
        .into()
}

pub fn create_body(sequence: u64, payload: &[u8]) -> Body {
    Body {
        timestamp: 1_700_000_000,
        nonce: 7,
        emitter_chain: Chain::Ethereum,
        emitter_address: Address([0; 32]),
        sequence,
        consistency_level: 1,
        payload: payload.to_vec(),
    }
}

pub fn config() -> Config {
    Config::from_json(
        r#"{
            "chain_id": 3104,
            "contract": "0x00000000000000000000000000000000000000000000000000000000deadbeef"
        }"#,
    )
    .unwrap()
}

pub fn processor(storage: &MemoryStorage) -> VaaProcessor<'_, MemoryStorage, Secp256k1Recoverer> {
    VaaProcessor::new(storage, config(), Secp256k1Recoverer)
}

pub fn activate(storage: &MemoryStorage, index: u32, addresses: Vec<GuardianAddress>, now: u32) {
    GuardianSetRegistry::new(storage, EXPIRATION)
        .activate(GuardianSet::new(index, addresses), now)
        .unwrap();
}
