//! Capability ports
//!
//! The core never talks to a chain, a disk, or a proving backend directly.
//! Each external collaborator is reached through one of the traits below,
//! and every implementation is injected by the caller; there is no
//! ambient state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::circuit::{ConstraintViolation, Proof, PublicInputs, WithdrawWitness};
use crate::crypto::field::Element;
use crate::crypto::stealth::Address;

/// An inclusive range of log positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRange {
    pub from: u64,
    pub to: u64,
}

impl LogRange {
    pub fn new(from: u64, to: u64) -> Self {
        Self { from, to }
    }

    pub fn len(&self) -> u64 {
        self.to.saturating_sub(self.from).saturating_add(1)
    }

    pub fn is_empty(&self) -> bool {
        self.to < self.from
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The queried range exceeds the provider's limit. Recoverable: the
    /// caller shrinks the chunk and retries.
    #[error("query range of {requested} positions exceeds the provider limit of {limit}")]
    RangeTooLarge { requested: u64, limit: u64 },

    /// Transient transport failure. Retried a bounded number of times.
    #[error("provider transport error: {0}")]
    Transport(String),

    /// The provider cannot serve the request at all.
    #[error("provider error: {0}")]
    Unavailable(String),
}

/// Ordered leaf-insertion event from the pool contract. The sole source of
/// truth for rebuilding the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositEvent {
    pub commitment: Element,
    pub leaf_index: u32,
    pub position: u64,
    pub timestamp: i64,
}

/// Stealth payment announcement. The scanner's sole input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealthPaymentEvent {
    pub stealth_address: Address,
    #[serde(with = "crate::encoding::hex_array")]
    pub ephemeral_pubkey: [u8; 32],
    pub view_hint: u8,
    pub index_k: u32,
    pub amount: u64,
    #[serde(with = "crate::encoding::hex_array")]
    pub token: [u8; 32],
    pub position: u64,
}

/// Read access to the pool's on-chain state and event log.
pub trait ChainReader {
    /// Highest log position the provider has seen.
    fn latest_position(&self) -> Result<u64, ProviderError>;

    /// Deposit events within the range, ordered by leaf index.
    fn deposits(&self, range: LogRange) -> Result<Vec<DepositEvent>, ProviderError>;

    /// Stealth payment announcements within the range.
    fn stealth_payments(&self, range: LogRange)
        -> Result<Vec<StealthPaymentEvent>, ProviderError>;

    /// The authoritative current tree root.
    fn current_root(&self) -> Result<Element, ProviderError>;

    /// Whether a nullifier hash is already in the spent set.
    fn is_spent(&self, nullifier_hash: &Element) -> Result<bool, ProviderError>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("checkpoint store io: {0}")]
    Io(String),

    #[error("checkpoint store encoding: {0}")]
    Encoding(String),
}

/// A persisted scan position. Safe to discard at the cost of a full
/// re-scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub last_scanned: u64,
    pub updated_at: i64,
}

/// Injected key/value storage for scan checkpoints.
pub trait CheckpointStore {
    fn get(&self, key: &str) -> Result<Option<Checkpoint>, StoreError>;
    fn set(&mut self, key: &str, checkpoint: &Checkpoint) -> Result<(), StoreError>;
}

#[derive(Debug, Error)]
pub enum ProverError {
    /// The witness does not satisfy the relation. Fix the inputs; the
    /// proving backend was never invoked.
    #[error("unsatisfiable witness: {0}")]
    Unsatisfiable(#[from] ConstraintViolation),

    #[error("proof generation failed: {0}")]
    Backend(String),
}

/// Proof generation and verification for the withdrawal relation.
///
/// Proving is one blocking unit of work per note. Requests for different
/// notes are independent and may run in parallel; a second concurrent
/// attempt for the same note is wasted work, not a correctness hazard,
/// since the on-chain verifier arbitrates double spends.
pub trait Prover {
    fn prove(
        &self,
        witness: &WithdrawWitness,
        publics: &PublicInputs,
    ) -> Result<Proof, ProverError>;

    fn verify(&self, proof: &Proof, publics: &PublicInputs) -> bool;
}
