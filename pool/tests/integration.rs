//! End-to-end flows across the deposit, withdrawal, and scanning
//! boundaries, driven through the in-memory chain adapter.

use std::cell::Cell;

use veilpool::adapters::{
    ChainError, EventLogFile, JsonLogReader, MemoryChain, MemoryCheckpointStore, MockProver,
};
use veilpool::circuit::{ExtData, Proof, PublicInputs, WithdrawWitness};
use veilpool::crypto::stealth::derive_payment;
use veilpool::ports::{Prover, ProverError};
use veilpool::{
    prepare_withdrawal, MimcSponge, Note, PoolError, ScanState, Scanner, ScannerConfig,
    StealthKeys, StealthMetaAddress, StealthSigner,
};

const DENOMINATION: u64 = 1_000_000;
const TOKEN: [u8; 32] = [0x11u8; 32];

fn new_chain() -> MemoryChain {
    MemoryChain::new(Box::new(MockProver::new()), DENOMINATION)
}

fn ext_data_paying(meta: &StealthMetaAddress, fee: u64) -> ExtData {
    let derivation = derive_payment(meta, 0).unwrap();
    ExtData {
        destination_chain: 42161,
        recipient: derivation.payment,
        relayer_fee: fee,
        token: TOKEN,
        bridge: "0x00000000000000000000000000000000000000bb".parse().unwrap(),
    }
}

#[test]
fn deposit_withdraw_scan_round_trip() {
    let sponge = MimcSponge::new();
    let recipient = StealthKeys::generate();
    let mut chain = new_chain();

    // Depositor funds the pool
    let note = Note::generate(&sponge);
    chain.deposit(note.commitment).unwrap();

    // Relayer prepares and submits the withdrawal
    let ext_data = ext_data_paying(&recipient.meta_address(), 1_000);
    let prover = MockProver::new();
    let bundle = prepare_withdrawal(&chain, &note, &ext_data, &prover).unwrap();
    let payout = chain.withdraw(&bundle).unwrap();
    assert_eq!(payout.amount, DENOMINATION - 1_000);

    // Recipient discovers the payout by scanning
    let mut scanner = Scanner::new(chain, MemoryCheckpointStore::new(), ScannerConfig::new(1, "0xpool"));
    let matches = scanner.run(&recipient.view_key()).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].amount, DENOMINATION - 1_000);

    // ...and the derived spending key controls the paid address
    let found = matches[0];
    let spending = recipient
        .derive_spending_key(&found.ephemeral_pubkey, found.index_k)
        .unwrap();
    let signer = StealthSigner::from_secret(&spending).unwrap();
    assert_eq!(signer.address(), found.stealth_address);
}

#[test]
fn scanner_has_no_false_negatives() {
    // Scaled-down version of the 1000/10000 sweep; the full-size run is
    // `scanner_has_no_false_negatives_full` below.
    scan_sweep(100, 1_000);
}

#[test]
#[ignore = "full-size sweep, slow in debug builds"]
fn scanner_has_no_false_negatives_full() {
    scan_sweep(1_000, 10_000);
}

fn scan_sweep(genuine: usize, unrelated: usize) {
    let recipient = StealthKeys::generate();
    let strangers: Vec<StealthKeys> = (0..4).map(|_| StealthKeys::generate()).collect();
    let mut chain = new_chain();

    let mut expected_positions = Vec::new();
    let total = genuine + unrelated;
    for i in 0..total {
        // Interleave genuine payments through the noise
        if i % (total / genuine) == 0 && expected_positions.len() < genuine {
            let derivation = derive_payment(&recipient.meta_address(), (i % 5) as u32).unwrap();
            let event = chain.announce(&derivation.payment, DENOMINATION, TOKEN);
            expected_positions.push(event.position);
        } else {
            let stranger = &strangers[i % strangers.len()];
            let derivation = derive_payment(&stranger.meta_address(), 0).unwrap();
            chain.announce(&derivation.payment, DENOMINATION, TOKEN);
        }
    }
    assert_eq!(expected_positions.len(), genuine);

    let mut scanner = Scanner::new(chain, MemoryCheckpointStore::new(), ScannerConfig::new(1, "0xpool"));
    let matches = scanner.run(&recipient.view_key()).unwrap();

    let mut found: Vec<u64> = matches.iter().map(|m| m.position).collect();
    found.sort_unstable();
    assert_eq!(found, expected_positions, "every genuine payment must be found");
    assert_eq!(*scanner.state(), ScanState::Done);
}

/// Prover wrapper that counts invocations, to assert stale state aborts
/// before proving starts.
struct CountingProver {
    inner: MockProver,
    calls: Cell<usize>,
}

impl CountingProver {
    fn new() -> Self {
        Self {
            inner: MockProver::new(),
            calls: Cell::new(0),
        }
    }
}

impl Prover for CountingProver {
    fn prove(
        &self,
        witness: &WithdrawWitness,
        publics: &PublicInputs,
    ) -> Result<Proof, ProverError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.prove(witness, publics)
    }

    fn verify(&self, proof: &Proof, publics: &PublicInputs) -> bool {
        self.inner.verify(proof, publics)
    }
}

#[test]
fn stale_root_aborts_before_proving() {
    let sponge = MimcSponge::new();
    let recipient = StealthKeys::generate();
    let mut chain = new_chain();

    let note = Note::generate(&sponge);
    chain.deposit(note.commitment).unwrap();

    // Snapshot the log, then a concurrent deposit advances the real root
    let mut stale_log: EventLogFile = chain.export_log(1, "0xpool");
    let other = Note::generate(&sponge);
    chain.deposit(other.commitment).unwrap();
    stale_log.current_root = chain.export_log(1, "0xpool").current_root;

    let stale_reader = JsonLogReader::new(stale_log);
    let prover = CountingProver::new();
    let ext_data = ext_data_paying(&recipient.meta_address(), 0);

    let err = prepare_withdrawal(&stale_reader, &note, &ext_data, &prover).unwrap_err();
    assert!(matches!(err, PoolError::RootMismatch { .. }));
    assert_eq!(prover.calls.get(), 0, "proving must not start on stale state");
}

#[test]
fn missing_commitment_is_distinct_from_root_mismatch() {
    let sponge = MimcSponge::new();
    let recipient = StealthKeys::generate();
    let mut chain = new_chain();

    chain.deposit(Note::generate(&sponge).commitment).unwrap();

    // This note was never deposited
    let foreign = Note::generate(&sponge);
    let ext_data = ext_data_paying(&recipient.meta_address(), 0);
    let err = prepare_withdrawal(&chain, &foreign, &ext_data, &MockProver::new()).unwrap_err();
    assert!(matches!(err, PoolError::CommitmentNotFound));
}

#[test]
fn same_nullifier_accepted_exactly_once() {
    let sponge = MimcSponge::new();
    let recipient = StealthKeys::generate();
    let mut chain = new_chain();

    let note = Note::generate(&sponge);
    chain.deposit(note.commitment).unwrap();

    // Two independently prepared withdrawals for the same note
    let prover = MockProver::new();
    let first = prepare_withdrawal(
        &chain,
        &note,
        &ext_data_paying(&recipient.meta_address(), 0),
        &prover,
    )
    .unwrap();
    let second = prepare_withdrawal(
        &chain,
        &note,
        &ext_data_paying(&recipient.meta_address(), 500),
        &prover,
    )
    .unwrap();

    let outcomes = [chain.withdraw(&first), chain.withdraw(&second)];
    let accepted = outcomes.iter().filter(|o| o.is_ok()).count();
    assert_eq!(accepted, 1, "exactly one withdrawal may succeed");
    assert!(matches!(
        outcomes[1],
        Err(ChainError::NullifierSpent)
    ));
}

#[test]
fn relayer_cannot_alter_bound_parameters() {
    let sponge = MimcSponge::new();
    let recipient = StealthKeys::generate();
    let mallory = StealthKeys::generate();
    let mut chain = new_chain();

    let note = Note::generate(&sponge);
    chain.deposit(note.commitment).unwrap();

    let ext_data = ext_data_paying(&recipient.meta_address(), 100);
    let bundle = prepare_withdrawal(&chain, &note, &ext_data, &MockProver::new()).unwrap();

    // Redirect the payout without re-proving
    let mut tampered = bundle.clone();
    tampered.ext_data.recipient = derive_payment(&mallory.meta_address(), 0).unwrap().payment;
    assert!(matches!(
        chain.withdraw(&tampered),
        Err(ChainError::VerifierRejected(_))
    ));

    // Bump the fee without re-proving
    let mut greedy = bundle.clone();
    greedy.ext_data.relayer_fee = DENOMINATION;
    assert!(matches!(
        chain.withdraw(&greedy),
        Err(ChainError::VerifierRejected(_))
    ));

    // The untampered bundle still goes through
    assert!(chain.withdraw(&bundle).is_ok());
}

#[test]
fn spent_note_rejected_at_preparation() {
    let sponge = MimcSponge::new();
    let recipient = StealthKeys::generate();
    let mut chain = new_chain();

    let note = Note::generate(&sponge);
    chain.deposit(note.commitment).unwrap();

    let prover = MockProver::new();
    let bundle = prepare_withdrawal(
        &chain,
        &note,
        &ext_data_paying(&recipient.meta_address(), 0),
        &prover,
    )
    .unwrap();
    chain.withdraw(&bundle).unwrap();

    // Advisory pre-check sees the spent nullifier
    let err = prepare_withdrawal(
        &chain,
        &note,
        &ext_data_paying(&recipient.meta_address(), 0),
        &prover,
    )
    .unwrap_err();
    assert!(matches!(err, PoolError::NoteAlreadySpent));
}

#[test]
fn exported_log_supports_full_withdrawal_flow() {
    let sponge = MimcSponge::new();
    let recipient = StealthKeys::generate();
    let mut chain = new_chain();

    let note = Note::generate(&sponge);
    chain.deposit(note.commitment).unwrap();
    chain.deposit(Note::generate(&sponge).commitment).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");
    chain.export_log(1, "0xpool").save(&path).unwrap();

    let reader = JsonLogReader::from_file(&path).unwrap();
    let bundle = prepare_withdrawal(
        &reader,
        &note,
        &ext_data_paying(&recipient.meta_address(), 0),
        &MockProver::new(),
    )
    .unwrap();

    assert!(chain.withdraw(&bundle).is_ok());
}
