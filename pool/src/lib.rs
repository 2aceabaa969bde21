//! Veilpool shielded payment core
//!
//! The cryptographic heart of a cross-chain privacy pool:
//!
//! - a commitment/nullifier note scheme over a fixed-depth incremental
//!   Merkle tree ([`note`], [`merkle`]),
//! - the zero-knowledge withdrawal relation binding membership, spend
//!   authorization, and the withdrawal parameters ([`circuit`],
//!   [`withdraw`]),
//! - a dual-key stealth address engine with 1-byte view hints
//!   ([`crypto::stealth`]),
//! - a resumable, chunked payment scanner ([`scanner`]).
//!
//! On-chain contracts, wallets, and bridges are external collaborators
//! reached through the capability traits in [`ports`]; the in-memory and
//! file-backed implementations live in [`adapters`].

pub mod adapters;
pub mod circuit;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod merkle;
pub mod note;
pub mod ports;
pub mod scanner;
pub mod withdraw;

pub use circuit::{ExtData, Proof, PublicInputs, WithdrawWitness};
pub use crypto::field::Element;
pub use crypto::mimc::MimcSponge;
pub use crypto::stealth::{
    derive_payment, Address, StealthKeys, StealthMetaAddress, StealthPayment, StealthSigner,
    ViewKey,
};
pub use error::PoolError;
pub use merkle::{MerklePath, MerkleTree, TREE_DEPTH};
pub use note::Note;
pub use scanner::{ScanControl, ScanProgress, ScanState, Scanner, ScannerConfig, VerifiedPayment};
pub use withdraw::{prepare_withdrawal, WithdrawalBundle};
