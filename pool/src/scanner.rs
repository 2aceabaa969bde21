//! Payment scanner
//!
//! Walks the stealth payment log in bounded chunks, filters with the
//! 1-byte view hint, and fully re-derives the expected address for every
//! hint match before reporting it. Progress is resumable through an
//! injected checkpoint store keyed by (chain, contract, viewer), with a
//! small re-scan margin to tolerate reorganizations. Matches near the
//! resume boundary can therefore repeat across runs, and callers should
//! key on the event position.
//!
//! The scan is an explicit state machine, `Idle -> Scanning -> Done` with
//! `Failed` on exhausted provider retries; cancellation is the single
//! `Stop` transition returned from the progress callback.

use thiserror::Error;

use crate::crypto::stealth::{Address, ViewKey};
use crate::ports::{
    ChainReader, Checkpoint, CheckpointStore, LogRange, ProviderError, StoreError,
};

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub chain_id: u64,
    pub contract: String,
    /// Starting chunk size; halved on provider range limits.
    pub chunk_size: u64,
    /// Floor for adaptive halving.
    pub min_chunk: u64,
    /// Transient-error retries before the scan fails.
    pub max_retries: u32,
    /// Positions re-scanned below the checkpoint to tolerate reorgs.
    pub reorg_margin: u64,
}

impl ScannerConfig {
    pub fn new(chain_id: u64, contract: impl Into<String>) -> Self {
        Self {
            chain_id,
            contract: contract.into(),
            chunk_size: 256,
            min_chunk: 16,
            max_retries: 3,
            reorg_margin: 12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanProgress {
    pub scanned_through: u64,
    pub target: u64,
    pub matches: usize,
}

impl ScanProgress {
    /// Scan completion in [0, 1].
    pub fn fraction(&self) -> f64 {
        if self.target == 0 {
            1.0
        } else {
            (self.scanned_through as f64 / self.target as f64).min(1.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanState {
    Idle,
    Scanning { progress: ScanProgress },
    Done,
    Failed { reason: String },
}

/// Returned from the progress callback to continue or cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanControl {
    Continue,
    Stop,
}

/// A payment that passed both the hint filter and full re-derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedPayment {
    pub stealth_address: Address,
    pub ephemeral_pubkey: [u8; 32],
    pub index_k: u32,
    pub amount: u64,
    pub token: [u8; 32],
    pub position: u64,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("provider failed after retries: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Scanner<R, S> {
    reader: R,
    store: S,
    config: ScannerConfig,
    state: ScanState,
}

impl<R: ChainReader, S: CheckpointStore> Scanner<R, S> {
    pub fn new(reader: R, store: S, config: ScannerConfig) -> Self {
        Self {
            reader,
            store,
            config,
            state: ScanState::Idle,
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Checkpoint key for a viewer: one independent scan position per
    /// (chain, contract, viewing identity).
    pub fn checkpoint_key(&self, view: &ViewKey) -> String {
        format!(
            "veilpool/{}/{}/{}",
            self.config.chain_id,
            self.config.contract,
            view.fingerprint()
        )
    }

    /// Scan to the log head, reporting every verified payment.
    pub fn run(&mut self, view: &ViewKey) -> Result<Vec<VerifiedPayment>, ScanError> {
        self.run_with(view, |_| ScanControl::Continue)
    }

    /// Scan with a progress callback that can cancel between chunks.
    pub fn run_with<F>(
        &mut self,
        view: &ViewKey,
        mut on_progress: F,
    ) -> Result<Vec<VerifiedPayment>, ScanError>
    where
        F: FnMut(&ScanProgress) -> ScanControl,
    {
        let key = self.checkpoint_key(view);
        let resume = match self.store.get(&key) {
            Ok(checkpoint) => checkpoint,
            Err(err) => return Err(self.fail(err.into())),
        };

        let target = match self.reader.latest_position() {
            Ok(position) => position,
            Err(err) => return Err(self.fail(err.into())),
        };

        let mut from = resume
            .map(|c| (c.last_scanned + 1).saturating_sub(self.config.reorg_margin))
            .unwrap_or(0);
        let mut chunk = self.config.chunk_size.max(self.config.min_chunk);
        let mut retries = 0u32;
        let mut matches = Vec::new();

        self.state = ScanState::Scanning {
            progress: ScanProgress {
                scanned_through: from.saturating_sub(1),
                target,
                matches: 0,
            },
        };

        while from <= target {
            let to = target.min(from + chunk - 1);

            let events = match self.reader.stealth_payments(LogRange::new(from, to)) {
                Ok(events) => events,
                Err(ProviderError::RangeTooLarge { .. }) if chunk > self.config.min_chunk => {
                    chunk = (chunk / 2).max(self.config.min_chunk);
                    continue;
                }
                Err(err) => {
                    retries += 1;
                    if retries > self.config.max_retries {
                        return Err(self.fail(err.into()));
                    }
                    continue;
                }
            };
            retries = 0;

            for event in events {
                // Cheap filter first; 1/256 of unrelated payments pass it
                match view.expected_hint(&event.ephemeral_pubkey) {
                    Some(hint) if hint == event.view_hint => {}
                    _ => continue,
                }

                // Hint matches are only candidates until the address is
                // re-derived in full
                if view.matches(&event.ephemeral_pubkey, event.index_k, &event.stealth_address) {
                    matches.push(VerifiedPayment {
                        stealth_address: event.stealth_address,
                        ephemeral_pubkey: event.ephemeral_pubkey,
                        index_k: event.index_k,
                        amount: event.amount,
                        token: event.token,
                        position: event.position,
                    });
                }
            }

            let checkpoint = Checkpoint {
                last_scanned: to,
                updated_at: chrono::Utc::now().timestamp(),
            };
            if let Err(err) = self.store.set(&key, &checkpoint) {
                return Err(self.fail(err.into()));
            }

            let progress = ScanProgress {
                scanned_through: to,
                target,
                matches: matches.len(),
            };
            self.state = ScanState::Scanning { progress };
            from = to + 1;

            if on_progress(&progress) == ScanControl::Stop && from <= target {
                self.state = ScanState::Idle;
                return Ok(matches);
            }
        }

        self.state = ScanState::Done;
        Ok(matches)
    }

    fn fail(&mut self, err: ScanError) -> ScanError {
        self.state = ScanState::Failed {
            reason: err.to_string(),
        };
        err
    }
}
