//! In-memory pool contract
//!
//! Simulates the on-chain collaborators for tests and demos: the ordered
//! deposit log, root history, spent-nullifier set, stealth payment
//! announcements, and the authoritative withdrawal boundary. The boundary
//! recomputes `ext_data_hash` from its own view of the cleartext
//! parameters, exactly as the real contract does, so relayer tampering is
//! caught here too.

use std::collections::HashMap;
use std::collections::HashSet;

use thiserror::Error;

use crate::circuit::PublicInputs;
use crate::crypto::field::Element;
use crate::crypto::stealth::StealthPayment;
use crate::merkle::{MerkleTree, TREE_DEPTH};
use crate::ports::{
    ChainReader, Checkpoint, CheckpointStore, DepositEvent, LogRange, Prover, ProviderError,
    StealthPaymentEvent, StoreError,
};
use crate::withdraw::WithdrawalBundle;

/// Rejections at the simulated verifier boundary. Authoritative: callers
/// surface these as "withdrawal invalid" and never blindly retry.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("unknown merkle root")]
    UnknownRoot,

    #[error("nullifier already spent")]
    NullifierSpent,

    #[error("withdrawal rejected: {0}")]
    VerifierRejected(String),

    #[error("pool is full")]
    PoolFull,
}

pub struct MemoryChain {
    tree: MerkleTree,
    deposits: Vec<DepositEvent>,
    payments: Vec<StealthPaymentEvent>,
    known_roots: Vec<Element>,
    spent: HashSet<[u8; 32]>,
    next_position: u64,
    denomination: u64,
    max_query_range: Option<u64>,
    verifier: Box<dyn Prover>,
}

impl MemoryChain {
    pub fn new(verifier: Box<dyn Prover>, denomination: u64) -> Self {
        let tree = MerkleTree::new(TREE_DEPTH);
        let known_roots = vec![tree.root()];
        Self {
            tree,
            deposits: Vec::new(),
            payments: Vec::new(),
            known_roots,
            spent: HashSet::new(),
            next_position: 1,
            denomination,
            max_query_range: None,
            verifier,
        }
    }

    /// Cap the number of positions a single range query may cover,
    /// modelling an RPC provider limit.
    pub fn with_max_query_range(mut self, limit: u64) -> Self {
        self.max_query_range = Some(limit);
        self
    }

    pub fn denomination(&self) -> u64 {
        self.denomination
    }

    /// Accept one fixed-denomination deposit and append its commitment.
    pub fn deposit(&mut self, commitment: Element) -> Result<DepositEvent, ChainError> {
        let leaf_index = self
            .tree
            .insert(commitment)
            .map_err(|_| ChainError::PoolFull)?;
        self.known_roots.push(self.tree.root());

        let event = DepositEvent {
            commitment,
            leaf_index,
            position: self.next_position,
            timestamp: chrono::Utc::now().timestamp(),
        };
        self.next_position += 1;
        self.deposits.push(event);
        Ok(event)
    }

    /// Publish a stealth payment announcement.
    pub fn announce(
        &mut self,
        payment: &StealthPayment,
        amount: u64,
        token: [u8; 32],
    ) -> StealthPaymentEvent {
        let event = StealthPaymentEvent {
            stealth_address: payment.stealth_address,
            ephemeral_pubkey: payment.ephemeral_pubkey,
            view_hint: payment.view_hint,
            index_k: payment.index_k,
            amount,
            token,
            position: self.next_position,
        };
        self.next_position += 1;
        self.payments.push(event);
        event
    }

    /// The authoritative withdrawal boundary.
    ///
    /// Recomputes the ext-data binding from the supplied cleartext
    /// parameters, checks root knowledge and nullifier freshness, verifies
    /// the proof, then marks the nullifier spent and announces the stealth
    /// payout. Exactly one of two racing withdrawals for the same
    /// nullifier can succeed.
    pub fn withdraw(&mut self, bundle: &WithdrawalBundle) -> Result<StealthPaymentEvent, ChainError> {
        let recomputed = bundle.ext_data.hash();
        if recomputed != bundle.ext_data_hash {
            return Err(ChainError::VerifierRejected(
                "ext data hash does not match the withdrawal parameters".into(),
            ));
        }

        if !self.known_roots.contains(&bundle.root) {
            return Err(ChainError::UnknownRoot);
        }

        let nullifier_key = bundle.nullifier_hash.to_be_bytes();
        if self.spent.contains(&nullifier_key) {
            return Err(ChainError::NullifierSpent);
        }

        let publics = PublicInputs {
            root: bundle.root,
            nullifier_hash: bundle.nullifier_hash,
            ext_data_hash: recomputed,
        };
        if !self.verifier.verify(&bundle.proof, &publics) {
            return Err(ChainError::VerifierRejected("proof verification failed".into()));
        }

        self.spent.insert(nullifier_key);
        let payout = self.denomination.saturating_sub(bundle.ext_data.relayer_fee);
        Ok(self.announce(&bundle.ext_data.recipient, payout, bundle.ext_data.token))
    }

    /// Export the full event log in the file format `JsonLogReader`
    /// consumes.
    pub fn export_log(&self, chain_id: u64, contract: &str) -> crate::adapters::json_log::EventLogFile {
        crate::adapters::json_log::EventLogFile {
            chain_id,
            contract: contract.to_string(),
            current_root: self.tree.root(),
            deposits: self.deposits.clone(),
            stealth_payments: self.payments.clone(),
        }
    }

    fn check_range(&self, range: LogRange) -> Result<(), ProviderError> {
        if let Some(limit) = self.max_query_range {
            if range.len() > limit {
                return Err(ProviderError::RangeTooLarge {
                    requested: range.len(),
                    limit,
                });
            }
        }
        Ok(())
    }
}

impl ChainReader for MemoryChain {
    fn latest_position(&self) -> Result<u64, ProviderError> {
        Ok(self.next_position.saturating_sub(1))
    }

    fn deposits(&self, range: LogRange) -> Result<Vec<DepositEvent>, ProviderError> {
        self.check_range(range)?;
        Ok(self
            .deposits
            .iter()
            .filter(|e| e.position >= range.from && e.position <= range.to)
            .copied()
            .collect())
    }

    fn stealth_payments(
        &self,
        range: LogRange,
    ) -> Result<Vec<StealthPaymentEvent>, ProviderError> {
        self.check_range(range)?;
        Ok(self
            .payments
            .iter()
            .filter(|e| e.position >= range.from && e.position <= range.to)
            .copied()
            .collect())
    }

    fn current_root(&self) -> Result<Element, ProviderError> {
        Ok(self.tree.root())
    }

    fn is_spent(&self, nullifier_hash: &Element) -> Result<bool, ProviderError> {
        Ok(self.spent.contains(&nullifier_hash.to_be_bytes()))
    }
}

/// Checkpoint store backed by a plain map, for tests.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    entries: HashMap<String, Checkpoint>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn get(&self, key: &str) -> Result<Option<Checkpoint>, StoreError> {
        Ok(self.entries.get(key).copied())
    }

    fn set(&mut self, key: &str, checkpoint: &Checkpoint) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), *checkpoint);
        Ok(())
    }
}
