//! VAAs represent a collection of guardian signatures combined with a message and its metadata.
//! They are used as a form of proof: by submitting a VAA to a destination, the receiver can
//! trust that the message was emitted on the source chain.
//!
//! Wire format, all integers big-endian:
//!
//! ```markdown
//! header (length 6):
//! 0   u8      version (0x01)
//! 1   u32     guardian set index
//! 5   u8      number of signatures
//!
//! per signature (length 66):
//! 0   u8      index of the signer in the guardian set
//! 1   [32]u8  r
//! 33  [32]u8  s
//! 65  u8      recovery id
//!
//! body (length 51 + payload):
//! 0   u32     timestamp (unix seconds)
//! 4   u32     nonce
//! 8   u16     emitter chain
//! 10  [32]u8  emitter address
//! 42  u64     sequence
//! 50  u8      consistency level
//! 51  []u8    payload
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    byte_utils::ByteReader,
    digest::{digest, Digest},
    error::{MalformedKind, MalformedVaa, VaaField},
    Address, Chain, EmitterId,
};

pub const SUPPORTED_VAA_VERSION: u8 = 1;
pub const HEADER_LEN: usize = 6;
pub const SIGNATURE_LEN: usize = 66;
pub const BODY_MIN_LEN: usize = 51;
pub const MIN_VAA_LEN: usize = HEADER_LEN + BODY_MIN_LEN;

/// A guardian's ECDSA signature over the body digest, prefixed with the guardian's position in
/// the guardian set.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signature {
    pub guardian_index: u8,
    #[serde(with = "crate::serde_hex")]
    pub r: [u8; 32],
    #[serde(with = "crate::serde_hex")]
    pub s: [u8; 32],
    pub recovery_id: u8,
}

impl Signature {
    /// Splits a 65 byte `r || s || v` signature.
    pub fn from_rsv(guardian_index: u8, rsv: &[u8; 65]) -> Signature {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&rsv[..32]);
        s.copy_from_slice(&rsv[32..64]);

        Signature {
            guardian_index,
            r,
            s,
            recovery_id: rsv[64],
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.guardian_index);
        out.extend_from_slice(&self.r);
        out.extend_from_slice(&self.s);
        out.push(self.recovery_id);
    }

    fn decode_from(r: &mut ByteReader, pos: usize) -> Result<Signature, MalformedVaa> {
        let field = VaaField::Signature(pos);
        Ok(Signature {
            guardian_index: r.get_u8(field)?,
            r: r.get_const_bytes(field)?,
            s: r.get_const_bytes(field)?,
            recovery_id: r.get_u8(field)?,
        })
    }
}

/// A complete signed VAA.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Vaa {
    // The header and body fields are duplicated here rather than embedded so the struct mirrors
    // the flat wire layout. Use the `From` conversions to split it into `(Header, Body)`.
    pub version: u8,
    pub guardian_set_index: u32,
    pub signatures: Vec<Signature>,
    pub timestamp: u32,
    pub nonce: u32,
    pub emitter_chain: Chain,
    pub emitter_address: Address,
    pub sequence: u64,
    pub consistency_level: u8,
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
}

/// The header for a VAA.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Header {
    pub version: u8,
    pub guardian_set_index: u32,
    pub signatures: Vec<Signature>,
}

/// The body for a VAA. This is the part guardians sign.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Body {
    /// Seconds since UNIX epoch.
    pub timestamp: u32,
    pub nonce: u32,
    pub emitter_chain: Chain,
    pub emitter_address: Address,
    pub sequence: u64,
    pub consistency_level: u8,
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
}

impl Vaa {
    /// Parses a signed VAA.
    ///
    /// The declared signature count is checked against the input length before any signature is
    /// read, and a full body must follow the signatures.
    pub fn decode(data: &[u8]) -> Result<Vaa, MalformedVaa> {
        let mut r = ByteReader::new(data);

        let version = r.get_u8(VaaField::Version)?;
        if version != SUPPORTED_VAA_VERSION {
            return Err(MalformedVaa {
                field: VaaField::Version,
                kind: MalformedKind::UnsupportedVersion(version),
            });
        }

        let guardian_set_index = r.get_u32(VaaField::GuardianSetIndex)?;
        let len_signers = r.get_u8(VaaField::SignatureCount)?;

        let sigs_len = usize::from(len_signers) * SIGNATURE_LEN;
        if r.remaining() < sigs_len {
            return Err(MalformedVaa {
                field: VaaField::SignatureCount,
                kind: MalformedKind::SignatureCountMismatch {
                    declared: len_signers,
                    available: r.remaining(),
                },
            });
        }

        let signatures = (0..usize::from(len_signers))
            .map(|pos| Signature::decode_from(&mut r, pos))
            .collect::<Result<Vec<_>, _>>()?;

        let body = Body::decode_from(r)?;

        Ok((
            Header {
                version,
                guardian_set_index,
                signatures,
            },
            body,
        )
            .into())
    }

    /// Serializes the VAA. Fails only when there are more signatures than the count byte holds.
    pub fn encode(&self) -> Result<Vec<u8>, MalformedVaa> {
        let len_signers = u8::try_from(self.signatures.len()).map_err(|_| MalformedVaa {
            field: VaaField::SignatureCount,
            kind: MalformedKind::TooManySignatures(self.signatures.len()),
        })?;

        let mut out = Vec::with_capacity(
            HEADER_LEN + self.signatures.len() * SIGNATURE_LEN + BODY_MIN_LEN + self.payload.len(),
        );
        out.push(self.version);
        out.extend_from_slice(&self.guardian_set_index.to_be_bytes());
        out.push(len_signers);
        for sig in &self.signatures {
            sig.encode_into(&mut out);
        }

        encode_body_fields(
            &mut out,
            self.timestamp,
            self.nonce,
            self.emitter_chain,
            &self.emitter_address,
            self.sequence,
            self.consistency_level,
            &self.payload,
        );

        Ok(out)
    }

    /// Serialized body, the bytes guardians sign.
    pub fn body_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(BODY_MIN_LEN + self.payload.len());
        encode_body_fields(
            &mut out,
            self.timestamp,
            self.nonce,
            self.emitter_chain,
            &self.emitter_address,
            self.sequence,
            self.consistency_level,
            &self.payload,
        );
        out
    }

    pub fn digest(&self) -> Digest {
        digest(&self.body_bytes())
    }

    pub fn emitter(&self) -> EmitterId {
        EmitterId {
            chain: self.emitter_chain,
            address: self.emitter_address,
        }
    }

    /// Identifies the message as `<chain id>/<emitter address>/<sequence>`.
    pub fn message_id(&self) -> String {
        message_id(self.emitter(), self.sequence)
    }
}

impl Body {
    /// Parses a body that is not preceded by a header, e.g. one handed out for signing.
    pub fn decode(data: &[u8]) -> Result<Body, MalformedVaa> {
        Body::decode_from(ByteReader::new(data))
    }

    fn decode_from(mut r: ByteReader) -> Result<Body, MalformedVaa> {
        Ok(Body {
            timestamp: r.get_u32(VaaField::Timestamp)?,
            nonce: r.get_u32(VaaField::Nonce)?,
            emitter_chain: r.get_u16(VaaField::EmitterChain)?.into(),
            emitter_address: Address(r.get_const_bytes(VaaField::EmitterAddress)?),
            sequence: r.get_u64(VaaField::Sequence)?,
            consistency_level: r.get_u8(VaaField::ConsistencyLevel)?,
            payload: r.rest().to_vec(),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(BODY_MIN_LEN + self.payload.len());
        encode_body_fields(
            &mut out,
            self.timestamp,
            self.nonce,
            self.emitter_chain,
            &self.emitter_address,
            self.sequence,
            self.consistency_level,
            &self.payload,
        );
        out
    }

    /// Body digest components, see [`Digest`].
    pub fn digest(&self) -> Digest {
        digest(&self.encode())
    }

    pub fn emitter(&self) -> EmitterId {
        EmitterId {
            chain: self.emitter_chain,
            address: self.emitter_address,
        }
    }

    pub fn message_id(&self) -> String {
        message_id(self.emitter(), self.sequence)
    }
}

pub(crate) fn message_id(emitter: EmitterId, sequence: u64) -> String {
    format!("{emitter}/{sequence}")
}

#[allow(clippy::too_many_arguments)]
fn encode_body_fields(
    out: &mut Vec<u8>,
    timestamp: u32,
    nonce: u32,
    emitter_chain: Chain,
    emitter_address: &Address,
    sequence: u64,
    consistency_level: u8,
    payload: &[u8],
) {
    out.extend_from_slice(&timestamp.to_be_bytes());
    out.extend_from_slice(&nonce.to_be_bytes());
    out.extend_from_slice(&u16::from(emitter_chain).to_be_bytes());
    out.extend_from_slice(&emitter_address.0);
    out.extend_from_slice(&sequence.to_be_bytes());
    out.push(consistency_level);
    out.extend_from_slice(payload);
}

impl From<Vaa> for (Header, Body) {
    fn from(v: Vaa) -> Self {
        (
            Header {
                version: v.version,
                guardian_set_index: v.guardian_set_index,
                signatures: v.signatures,
            },
            Body {
                timestamp: v.timestamp,
                nonce: v.nonce,
                emitter_chain: v.emitter_chain,
                emitter_address: v.emitter_address,
                sequence: v.sequence,
                consistency_level: v.consistency_level,
                payload: v.payload,
            },
        )
    }
}

impl From<(Header, Body)> for Vaa {
    fn from((hdr, body): (Header, Body)) -> Self {
        Vaa {
            version: hdr.version,
            guardian_set_index: hdr.guardian_set_index,
            signatures: hdr.signatures,
            timestamp: body.timestamp,
            nonce: body.nonce,
            emitter_chain: body.emitter_chain,
            emitter_address: body.emitter_address,
            sequence: body.sequence,
            consistency_level: body.consistency_level,
            payload: body.payload,
        }
    }
}
