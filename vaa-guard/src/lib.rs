//! Verification and replay protection for Verified Action Approvals (VAAs).
//!
//! A VAA is a message observed on an emitter chain and signed by a versioned set of guardians.
//! This crate provides the pieces a destination needs to act on one safely:
//!
//! - The VAA wire codec and the double Keccak-256 body digest that guardians sign.
//! - A guardian set registry that handles rotation and the grace period of superseded sets.
//! - Quorum verification over an injected signature [`Recoverer`].
//! - Replay protection through deterministic claim keys, plus outbound sequence tracking.
//! - A [`VaaProcessor`] composing the above into verify-and-consume and publish flows.
//!
//! All state lives behind the [`Storage`] trait and is passed in explicitly.

#![deny(unused_results)]

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

mod byte_utils;
pub mod claim;
pub mod config;
pub mod digest;
pub mod error;
pub mod guardian_set;
pub mod processor;
pub mod recover;
mod serde_hex;
pub mod storage;
pub mod vaa;
pub mod verify;

#[cfg(test)]
mod testing;

pub use claim::{ClaimKey, ReplayGuard};
pub use config::Config;
pub use digest::{digest, Digest};
pub use error::{Error, MalformedKind, MalformedVaa, Result, VaaField};
pub use guardian_set::{GuardianSet, GuardianSetRegistry};
pub use processor::VaaProcessor;
pub use recover::{Recoverer, Secp256k1Recoverer};
pub use storage::{MemoryStorage, Storage};
pub use vaa::{Body, Header, Signature, Vaa};
pub use vaa_guard_chains::Chain;
pub use verify::{verify, VerifiedMessage};

/// The last 20 bytes of the Keccak-256 hash of a guardian's uncompressed secp256k1 public key.
#[derive(
    Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct GuardianAddress(#[serde(with = "serde_hex")] pub [u8; 20]);

impl fmt::Display for GuardianAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Addresses are 32 bytes on the wire. Addresses that are shorter, for example 20 byte
/// Ethereum addresses, are left zero padded to 32.
#[derive(
    Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Address(#[serde(with = "serde_hex")] pub [u8; 32]);

impl Address {
    /// Normalizes a chain-native address of up to 32 bytes by left padding it with zeros.
    pub fn from_native(native: &[u8]) -> Result<Address> {
        if native.len() > 32 {
            return Err(Error::InvalidAddressLength(native.len()));
        }

        let mut addr = [0u8; 32];
        addr[32 - native.len()..].copy_from_slice(native);
        Ok(Address(addr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }

        Ok(())
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|_| Error::InvalidAddress(s.into()))?;
        Address::from_native(&bytes)
    }
}

/// An emitter address tagged with the chain it lives on.
#[derive(
    Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct EmitterId {
    pub chain: Chain,
    pub address: Address,
}

impl fmt::Display for EmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", u16::from(self.chain), self.address)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn native_addresses_are_left_padded() {
        let eth = hex_literal::hex!("f19a2a01b70519f67adb309a994ec8c69a967e8b");
        let addr = Address::from_native(&eth).unwrap();

        assert_eq!([0u8; 12], addr.0[..12]);
        assert_eq!(eth, addr.0[12..]);
        assert_eq!(
            "000000000000000000000000f19a2a01b70519f67adb309a994ec8c69a967e8b",
            addr.to_string()
        );
        assert_eq!(addr, addr.to_string().parse().unwrap());
        assert_eq!(addr, "0xf19a2a01b70519f67adb309a994ec8c69a967e8b".parse().unwrap());
    }

    #[test]
    fn oversized_native_address() {
        let err = Address::from_native(&[1u8; 33]).unwrap_err();
        assert!(matches!(err, Error::InvalidAddressLength(33)));

        assert!(matches!(
            "0xnothex".parse::<Address>(),
            Err(Error::InvalidAddress(_))
        ));
    }

    #[test]
    fn emitter_id_display() {
        let emitter = EmitterId {
            chain: Chain::Solana,
            address: Address([0xab; 32]),
        };

        assert_eq!(format!("1/{}", "ab".repeat(32)), emitter.to_string());
    }

    #[test]
    fn addresses_serialize_as_hex() {
        let addr = GuardianAddress(hex_literal::hex!(
            "befa429d57cd18b7f8a4d91a2da9ab4af05d0fbe"
        ));
        let json = serde_json::to_string(&addr).unwrap();

        assert_eq!("\"befa429d57cd18b7f8a4d91a2da9ab4af05d0fbe\"", json);
        assert_eq!(addr, serde_json::from_str(&json).unwrap());
    }
}
