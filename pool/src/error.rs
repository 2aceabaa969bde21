//! Error taxonomy for the shielded payment core
//!
//! Local validation is advisory; the on-chain verifier and the replayed
//! event log are the only sources of truth. Errors are split so callers can
//! tell a bad input (fix and retry) from stale state (re-sync and retry)
//! from an authoritative rejection (do not retry).

use thiserror::Error;

use crate::circuit::ConstraintViolation;
use crate::crypto::field::{Element, FieldParseError};
use crate::crypto::stealth::StealthError;
use crate::ports::{ProviderError, ProverError, StoreError};

#[derive(Debug, Error)]
pub enum PoolError {
    /// Precondition failure: malformed key material, addresses, or field
    /// encodings. Never silently coerced.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The note's commitment is absent from the replayed leaf set. The note
    /// was never deposited, or the scanned range is incomplete. Distinct
    /// from a root mismatch.
    #[error("commitment not found in the replayed deposit log")]
    CommitmentNotFound,

    /// The locally rebuilt root disagrees with the authoritative on-chain
    /// root. The leaf set is stale or wrong; re-sync and retry. Proof
    /// generation must not proceed.
    #[error("rebuilt merkle root {local} does not match on-chain root {onchain}")]
    RootMismatch { local: Element, onchain: Element },

    /// The tree has reached its fixed capacity of 2^20 leaves.
    #[error("merkle tree is full")]
    TreeFull,

    /// Advisory pre-check: the chain already lists this nullifier hash as
    /// spent. The on-chain verifier remains the arbiter.
    #[error("note nullifier is already marked spent on-chain")]
    NoteAlreadySpent,

    /// Leaf index outside the current leaf set.
    #[error("leaf index {index} out of range for {len} leaves")]
    LeafOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Field(#[from] FieldParseError),

    #[error(transparent)]
    Stealth(#[from] StealthError),

    #[error(transparent)]
    Constraint(#[from] ConstraintViolation),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Prover(#[from] ProverError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
