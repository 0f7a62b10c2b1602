use std::fmt;

use thiserror::Error;

/// A VAA field, named so that decode failures point at exactly what was wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VaaField {
    Version,
    GuardianSetIndex,
    SignatureCount,
    /// The signature entry at this position in the signature list.
    Signature(usize),
    Timestamp,
    Nonce,
    EmitterChain,
    EmitterAddress,
    Sequence,
    ConsistencyLevel,
}

impl fmt::Display for VaaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Version => f.write_str("version"),
            Self::GuardianSetIndex => f.write_str("guardian_set_index"),
            Self::SignatureCount => f.write_str("signature_count"),
            Self::Signature(pos) => write!(f, "signatures[{pos}]"),
            Self::Timestamp => f.write_str("timestamp"),
            Self::Nonce => f.write_str("nonce"),
            Self::EmitterChain => f.write_str("emitter_chain"),
            Self::EmitterAddress => f.write_str("emitter_address"),
            Self::Sequence => f.write_str("sequence"),
            Self::ConsistencyLevel => f.write_str("consistency_level"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum MalformedKind {
    #[error("input ends before the field")]
    Truncated,

    #[error("unsupported version {0}")]
    UnsupportedVersion(u8),

    #[error("{declared} signatures declared but only {available} bytes follow the header")]
    SignatureCountMismatch { declared: u8, available: usize },

    #[error("{0} signatures do not fit in a u8 count")]
    TooManySignatures(usize),
}

/// The input could not be decoded (or encoded) as a VAA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("malformed VAA at {field}: {kind}")]
pub struct MalformedVaa {
    pub field: VaaField,
    pub kind: MalformedKind,
}

impl MalformedVaa {
    pub(crate) fn truncated(field: VaaField) -> Self {
        MalformedVaa {
            field,
            kind: MalformedKind::Truncated,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// The VAA bytes do not follow the wire format
    #[error(transparent)]
    MalformedVaa(#[from] MalformedVaa),

    /// No guardian set is stored under this index
    #[error("unknown guardian set {0}")]
    UnknownGuardianSet(u32),

    /// The guardian set was superseded and its grace period has elapsed
    #[error("guardian set {0} has expired")]
    GuardianSetExpired(u32),

    /// Fewer signatures than the guardian set quorum
    #[error("{actual} signatures present but quorum is {quorum}")]
    InsufficientSignatures { actual: usize, quorum: usize },

    /// No signer could be recovered from the signature
    #[error("cannot recover signer of signature for guardian {index}")]
    BadSignature { index: u8 },

    /// Signature references a guardian the set does not have
    #[error("guardian index {index} out of range for a set of {len}")]
    GuardianIndexOutOfRange { index: u8, len: usize },

    /// Signatures must be ordered by strictly ascending guardian index
    #[error("guardian index {index} does not follow {previous}")]
    GuardianIndexNotAscending { index: u8, previous: u8 },

    /// Recovered signer is not the guardian at the claimed index
    #[error("signature for guardian {index} was not produced by that guardian")]
    SignerMismatch { index: u8 },

    /// The message was consumed before
    #[error("VAA already redeemed")]
    AlreadyRedeemed,

    /// Guardian sets must be activated in steps of 1
    #[error("guardian set index {actual} is not the expected {expected}")]
    InvalidGuardianSetIndex { expected: u32, actual: u32 },

    /// Guardian set is empty, has duplicates, or has more members than a u8 index can address
    #[error("invalid guardian set: {0}")]
    InvalidGuardianSet(&'static str),

    /// Address string is not hex
    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    /// Native address wider than 32 bytes
    #[error("address of {0} bytes cannot be normalized to 32 bytes")]
    InvalidAddressLength(usize),

    /// Signing prefixes must be at least 32 bytes so they cannot collide with VAA bodies
    #[error("message prefix of {0} bytes is shorter than 32 bytes")]
    PrefixTooShort(usize),

    /// The emitter has used up all of its sequence numbers
    #[error("sequence for emitter {0} is exhausted")]
    SequenceExhausted(crate::Address),

    /// A record could not be serialized
    #[error("failed to serialize record")]
    Serialize(#[from] serde_json::Error),

    /// A stored record could not be decoded
    #[error("corrupt record under {key}")]
    CorruptRecord {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Whether this is a replay rejection rather than a verification failure.
    pub fn is_already_redeemed(&self) -> bool {
        matches!(self, Error::AlreadyRedeemed)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
