//! Inbound and outbound VAA flows for one destination.

use tracing::{debug, info, warn};

use crate::{
    claim::ReplayGuard,
    guardian_set::GuardianSetRegistry,
    recover::Recoverer,
    storage::Storage,
    vaa::SUPPORTED_VAA_VERSION,
    verify::{verify, VerifiedMessage},
    Address, Body, Config, Digest, Header, Result, Signature, Vaa,
};

/// Ties the registry, verifier and replay guard to one storage and one destination.
pub struct VaaProcessor<'a, S: ?Sized, R> {
    storage: &'a S,
    recoverer: R,
    config: Config,
}

impl<'a, S, R> VaaProcessor<'a, S, R>
where
    S: Storage + ?Sized,
    R: Recoverer,
{
    pub fn new(storage: &'a S, config: Config, recoverer: R) -> Self {
        VaaProcessor {
            storage,
            recoverer,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> GuardianSetRegistry<'a, S> {
        GuardianSetRegistry::new(self.storage, self.config.guardian_set_expiration)
    }

    pub fn replay_guard(&self) -> ReplayGuard<'a, S> {
        ReplayGuard::new(self.storage, self.config.contract)
    }

    /// Decodes and verifies a signed VAA without redeeming it.
    pub fn parse_and_verify(&self, data: &[u8], now: u32) -> Result<VerifiedMessage> {
        let vaa = Vaa::decode(data)?;
        verify(&vaa, &self.registry(), &self.recoverer, now)
    }

    /// Decodes, verifies and redeems a signed VAA.
    ///
    /// The claim is only recorded once verification has fully succeeded. Redeeming the same
    /// message again fails with [`crate::Error::AlreadyRedeemed`].
    pub fn verify_and_consume(&self, data: &[u8], now: u32) -> Result<VerifiedMessage> {
        let msg = self.parse_and_verify(data, now).map_err(|e| {
            warn!(error = %e, "VAA rejected");
            e
        })?;

        let guard = self.replay_guard();
        let key = guard.claim_key(msg.emitter_chain, &msg.emitter_address, msg.sequence);
        if let Err(e) = guard.consume_or_reject(&key) {
            warn!(message_id = %msg.message_id(), "VAA already redeemed");
            return Err(e);
        }

        info!(
            message_id = %msg.message_id(),
            guardian_set_index = msg.guardian_set_index,
            "VAA redeemed"
        );

        Ok(msg)
    }

    /// Allocates the next sequence of `emitter` and builds the body guardians will sign.
    pub fn publish(
        &self,
        emitter: Address,
        nonce: u32,
        consistency_level: u8,
        payload: Vec<u8>,
        timestamp: u32,
    ) -> Result<(Body, Digest)> {
        let sequence = self.replay_guard().next_sequence(&emitter)?;

        let body = Body {
            timestamp,
            nonce,
            emitter_chain: self.config.chain_id,
            emitter_address: emitter,
            sequence,
            consistency_level,
            payload,
        };
        let digest = body.digest();

        info!(
            message_id = %body.message_id(),
            hash = %hex::encode(digest.hash),
            "message published"
        );

        Ok((body, digest))
    }

    /// Assembles a signed VAA from a published body and the signatures collected for it.
    /// Signatures are put in guardian index order.
    pub fn seal(
        &self,
        guardian_set_index: u32,
        mut signatures: Vec<Signature>,
        body: Body,
    ) -> Result<Vec<u8>> {
        signatures.sort_by_key(|s| s.guardian_index);

        let vaa = Vaa::from((
            Header {
                version: SUPPORTED_VAA_VERSION,
                guardian_set_index,
                signatures,
            },
            body,
        ));
        let data = vaa.encode()?;

        debug!(
            message_id = %vaa.message_id(),
            guardian_set_index,
            signatures = vaa.signatures.len(),
            "VAA sealed"
        );

        Ok(data)
    }
}
