//! Stand-in proving backend
//!
//! Enforces the full withdrawal relation on the witness, then emits a
//! digest that binds the public signals. The output is NOT zero-knowledge
//! and must not ship to a production verifier; it exists so every flow and
//! boundary check can run end-to-end. A pairing-based backend implements
//! the same `Prover` port without touching protocol code.

use crate::circuit::{check_witness, Proof, PublicInputs, WithdrawWitness};
use crate::crypto::mimc::MimcSponge;
use crate::ports::{Prover, ProverError};

pub struct MockProver {
    sponge: MimcSponge,
}

impl MockProver {
    pub fn new() -> Self {
        Self {
            sponge: MimcSponge::new(),
        }
    }
}

impl Default for MockProver {
    fn default() -> Self {
        Self::new()
    }
}

impl Prover for MockProver {
    fn prove(
        &self,
        witness: &WithdrawWitness,
        publics: &PublicInputs,
    ) -> Result<Proof, ProverError> {
        check_witness(witness, publics, &self.sponge)?;
        Ok(Proof::bind(publics))
    }

    fn verify(&self, proof: &Proof, publics: &PublicInputs) -> bool {
        *proof == Proof::bind(publics)
    }
}
