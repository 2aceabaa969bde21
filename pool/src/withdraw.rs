//! Withdrawal preparation
//!
//! Rebuilds the accumulator from the deposit log, proves membership of the
//! note being spent, and binds the withdrawal parameters into the proof.
//! Every check here is advisory (the verifying contract is authoritative),
//! but a stale root or missing commitment aborts before the proving
//! backend is ever invoked, because a proof built from stale state can
//! never verify.

use serde::{Deserialize, Serialize};

use crate::circuit::{ExtData, Proof, PublicInputs, WithdrawWitness};
use crate::crypto::field::Element;
use crate::error::PoolError;
use crate::merkle::{MerkleTree, TREE_DEPTH};
use crate::note::Note;
use crate::ports::{ChainReader, DepositEvent, LogRange, Prover, ProviderError};

/// Initial deposit-replay chunk, halved on provider range limits.
const REPLAY_CHUNK: u64 = 1024;
const MIN_REPLAY_CHUNK: u64 = 16;
const REPLAY_RETRIES: u32 = 3;

/// Everything the withdrawal call needs: the proof, its public signals,
/// and the cleartext parameters the contract re-hashes into
/// `ext_data_hash` on its side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalBundle {
    pub proof: Proof,
    pub root: Element,
    pub nullifier_hash: Element,
    pub ext_data_hash: Element,
    pub ext_data: ExtData,
    pub leaf_index: u32,
}

impl WithdrawalBundle {
    pub fn public_inputs(&self) -> PublicInputs {
        PublicInputs {
            root: self.root,
            nullifier_hash: self.nullifier_hash,
            ext_data_hash: self.ext_data_hash,
        }
    }
}

/// Replay the full deposit log in provider-sized chunks.
pub fn replay_deposits<R: ChainReader>(reader: &R) -> Result<Vec<DepositEvent>, ProviderError> {
    let latest = reader.latest_position()?;
    let mut events = Vec::new();
    let mut chunk = REPLAY_CHUNK;
    let mut retries = 0u32;
    let mut from = 0u64;

    while from <= latest {
        let to = latest.min(from + chunk - 1);
        match reader.deposits(LogRange::new(from, to)) {
            Ok(batch) => {
                events.extend(batch);
                from = to + 1;
                retries = 0;
            }
            Err(ProviderError::RangeTooLarge { .. }) if chunk > MIN_REPLAY_CHUNK => {
                chunk = (chunk / 2).max(MIN_REPLAY_CHUNK);
            }
            Err(err) => {
                retries += 1;
                if retries > REPLAY_RETRIES {
                    return Err(err);
                }
            }
        }
    }

    Ok(events)
}

/// Rebuild the commitment tree from replayed events.
///
/// The log is the only source of truth for leaf order; a gap or disorder
/// means the replay is incomplete and the attempt must not continue.
pub fn rebuild_tree(events: &[DepositEvent]) -> Result<MerkleTree, PoolError> {
    let mut leaves = Vec::with_capacity(events.len());
    for (i, event) in events.iter().enumerate() {
        if event.leaf_index as usize != i {
            return Err(PoolError::InvalidInput(format!(
                "deposit log out of order: expected leaf {} at position {}, got {}",
                i, event.position, event.leaf_index
            )));
        }
        leaves.push(event.commitment);
    }
    MerkleTree::with_leaves(TREE_DEPTH, leaves)
}

/// Prepare a withdrawal proof for a note.
///
/// Flow: replay deposits, locate the commitment, rebuild the tree, compare
/// the rebuilt root to the authoritative on-chain root, build the path,
/// assemble the witness, prove. Fails fast on stale state; a
/// `RootMismatch` means the caller must re-sync leaves and retry.
pub fn prepare_withdrawal<R: ChainReader, P: Prover>(
    reader: &R,
    note: &Note,
    ext_data: &ExtData,
    prover: &P,
) -> Result<WithdrawalBundle, PoolError> {
    if reader.is_spent(&note.nullifier_hash)? {
        return Err(PoolError::NoteAlreadySpent);
    }

    let events = replay_deposits(reader)?;
    let tree = rebuild_tree(&events)?;

    let leaf_index = tree
        .find_leaf_index(&note.commitment)
        .ok_or(PoolError::CommitmentNotFound)?;

    let local_root = tree.root();
    let onchain_root = reader.current_root()?;
    if local_root != onchain_root {
        return Err(PoolError::RootMismatch {
            local: local_root,
            onchain: onchain_root,
        });
    }

    let path = tree.path(leaf_index)?;
    let publics = PublicInputs {
        root: local_root,
        nullifier_hash: note.nullifier_hash,
        ext_data_hash: ext_data.hash(),
    };
    let witness = WithdrawWitness::new(note, &path);
    let proof = prover.prove(&witness, &publics)?;

    Ok(WithdrawalBundle {
        proof,
        root: publics.root,
        nullifier_hash: publics.nullifier_hash,
        ext_data_hash: publics.ext_data_hash,
        ext_data: ext_data.clone(),
        leaf_index: leaf_index as u32,
    })
}
