//! Signer recovery. Verification only needs "which guardian address produced this signature",
//! so the curve arithmetic sits behind the [`Recoverer`] trait.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest as Sha3Digest, Keccak256};
use thiserror::Error;

use crate::GuardianAddress;

#[derive(Debug, Error)]
pub enum RecoverError {
    #[error("invalid recovery id {0}")]
    InvalidRecoveryId(u8),

    #[error("cannot decode signature")]
    CannotDecodeSignature,

    #[error("cannot recover public key")]
    CannotRecoverKey,
}

/// Recovers the address that produced a signature over a 32 byte digest.
pub trait Recoverer {
    fn recover(
        &self,
        digest: &[u8; 32],
        r: &[u8; 32],
        s: &[u8; 32],
        recovery_id: u8,
    ) -> Result<GuardianAddress, RecoverError>;
}

impl<R: Recoverer + ?Sized> Recoverer for &R {
    fn recover(
        &self,
        digest: &[u8; 32],
        r: &[u8; 32],
        s: &[u8; 32],
        recovery_id: u8,
    ) -> Result<GuardianAddress, RecoverError> {
        (**self).recover(digest, r, s, recovery_id)
    }
}

/// secp256k1 public key recovery, as done by `ecrecover`. Only low-S signatures are accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct Secp256k1Recoverer;

impl Recoverer for Secp256k1Recoverer {
    fn recover(
        &self,
        digest: &[u8; 32],
        r: &[u8; 32],
        s: &[u8; 32],
        recovery_id: u8,
    ) -> Result<GuardianAddress, RecoverError> {
        let id =
            RecoveryId::from_byte(recovery_id).ok_or(RecoverError::InvalidRecoveryId(recovery_id))?;

        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(r);
        rs[32..].copy_from_slice(s);
        let signature =
            Signature::from_slice(&rs).map_err(|_| RecoverError::CannotDecodeSignature)?;

        let key = VerifyingKey::recover_from_prehash(digest, &signature, id)
            .map_err(|_| RecoverError::CannotRecoverKey)?;

        Ok(guardian_address(&key))
    }
}

/// The address of a guardian key: the last 20 bytes of the Keccak-256 hash of the uncompressed
/// public key without its `0x04` tag.
pub fn guardian_address(key: &VerifyingKey) -> GuardianAddress {
    let point = key.to_encoded_point(false);
    let hash = Keccak256::digest(&point.as_bytes()[1..]);

    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..]);
    GuardianAddress(addr)
}

#[cfg(test)]
mod test {
    use hex_literal::hex;

    use super::*;
    use crate::Vaa;

    // Guardian set upgrade from the mainnet genesis set, signed by the single genesis guardian.
    const MAINNET_UPGRADE_VAA: &str = "010000000001007ac31b282c2aeeeb37f3385ee0de5f8e421d30b9e5ae8ba3d4375c1c77a86e77159bb697d9c456d6f8c02d22a94b1279b65b0d6a9957e7d3857423845ac758e300610ac1d2000000030001000000000000000000000000000000000000000000000000000000000000000400000000000005390000000000000000000000000000000000000000000000000000000000436f7265020000000000011358cc3ae5c097b213ce3c81979e1b9f9570746aa5ff6cb952589bde862c25ef4392132fb9d4a42157114de8460193bdf3a2fcf81f86a09765f4762fd1107a0086b32d7a0977926a205131d8731d39cbeb8c82b2fd82faed2711d59af0f2499d16e726f6b211b39756c042441be6d8650b69b54ebe715e234354ce5b4d348fb74b958e8966e2ec3dbd4958a7cdeb5f7389fa26941519f0863349c223b73a6ddee774a3bf913953d695260d88bc1aa25a4eee363ef0000ac0076727b35fbea2dac28fee5ccb0fea768eaf45ced136b9d9e24903464ae889f5c8a723fc14f93124b7c738843cbb89e864c862c38cddcccf95d2cc37a4dc036a8d232b48f62cdd4731412f4890da798f6896a3331f64b48c12d1d57fd9cbe7081171aa1be1d36cafe3867910f99c09e347899c19c38192b6e7387ccd768277c17dab1b7a5027c0b3cf178e21ad2e77ae06711549cfbb1f9c7a9d8096e85e1487f35515d02a92753504a8d75471b9f49edb6fbebc898f403e4773e95feb15e80c9a99c8348d";

    #[test]
    fn recovers_mainnet_guardian() {
        let vaa = Vaa::decode(&hex::decode(MAINNET_UPGRADE_VAA).unwrap()).unwrap();
        let d = vaa.digest();
        assert_eq!(
            hex!("ed3a5600d44b9dcc889daf0178dd69ab1e9356308194ba3628a7b720ae48a8d5"),
            d.secp256k_hash
        );

        let sig = &vaa.signatures[0];
        let addr = Secp256k1Recoverer
            .recover(&d.secp256k_hash, &sig.r, &sig.s, sig.recovery_id)
            .unwrap();

        assert_eq!(
            GuardianAddress(hex!("58cc3ae5c097b213ce3c81979e1b9f9570746aa5")),
            addr
        );
    }

    #[test]
    fn wrong_digest_recovers_someone_else() {
        let vaa = Vaa::decode(&hex::decode(MAINNET_UPGRADE_VAA).unwrap()).unwrap();
        let sig = &vaa.signatures[0];

        // Signing the single hash instead of the double hash is a different message.
        let recovered =
            Secp256k1Recoverer.recover(&vaa.digest().hash, &sig.r, &sig.s, sig.recovery_id);
        assert_ne!(
            Some(GuardianAddress(hex!("58cc3ae5c097b213ce3c81979e1b9f9570746aa5"))),
            recovered.ok()
        );
    }

    #[test]
    fn rejects_invalid_recovery_id() {
        let err = Secp256k1Recoverer
            .recover(&[1; 32], &[1; 32], &[1; 32], 27)
            .unwrap_err();
        assert!(matches!(err, RecoverError::InvalidRecoveryId(27)));
    }

    #[test]
    fn rejects_zero_scalars() {
        let err = Secp256k1Recoverer
            .recover(&[1; 32], &[0; 32], &[0; 32], 0)
            .unwrap_err();
        assert!(matches!(err, RecoverError::CannotDecodeSignature));
    }
}
