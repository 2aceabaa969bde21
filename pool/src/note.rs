//! Notes: the right to spend one fixed-denomination deposit
//!
//! A note is a `(nullifier, secret)` pair drawn from OS entropy, plus the
//! two digests derived from it. Possession of the pair is ownership of the
//! deposited value; the commitment is published on deposit, the nullifier
//! hash is revealed on withdrawal. Whether a nullifier hash has been spent
//! is an on-chain question answered through the `ChainReader` port.

use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::crypto::field::{Element, FieldParseError, SecretElement};
use crate::crypto::mimc::MimcSponge;

/// A spendable note. Secret halves zeroize on drop; `Clone` is not derived
/// so copies of the spending material stay deliberate.
pub struct Note {
    nullifier: SecretElement,
    secret: SecretElement,
    pub commitment: Element,
    pub nullifier_hash: Element,
}

impl Note {
    /// Draw a fresh note from OS entropy.
    pub fn generate(sponge: &MimcSponge) -> Self {
        let mut rng = OsRng;
        let nullifier = Element::random(&mut rng);
        let secret = Element::random(&mut rng);
        Self::from_parts(&nullifier, &secret, sponge)
    }

    /// Rebuild a note from its two secrets.
    ///
    /// commitment = hash2(nullifier, secret)
    /// nullifier_hash = hash2(nullifier, 0)
    pub fn from_parts(nullifier: &Element, secret: &Element, sponge: &MimcSponge) -> Self {
        let commitment = sponge.hash2(nullifier, secret);
        let nullifier_hash = sponge.hash2(nullifier, &Element::zero());
        Self {
            nullifier: SecretElement::from_element(nullifier),
            secret: SecretElement::from_element(secret),
            commitment,
            nullifier_hash,
        }
    }

    pub(crate) fn nullifier(&self) -> Element {
        self.nullifier.to_element()
    }

    pub(crate) fn secret(&self) -> Element {
        self.secret.to_element()
    }

    /// Export as a storable record. Handle with the same care as the note.
    pub fn to_record(&self) -> NoteRecord {
        NoteRecord {
            nullifier: self.nullifier.to_element().to_hex(),
            secret: self.secret.to_element().to_hex(),
            commitment: self.commitment.to_hex(),
        }
    }
}

/// Serialized note file format (hex fields).
#[derive(Serialize, Deserialize)]
pub struct NoteRecord {
    pub nullifier: String,
    pub secret: String,
    pub commitment: String,
}

impl NoteRecord {
    pub fn into_note(self, sponge: &MimcSponge) -> Result<Note, FieldParseError> {
        let nullifier = Element::from_hex(&self.nullifier)?;
        let secret = Element::from_hex(&self.secret)?;
        Ok(Note::from_parts(&nullifier, &secret, sponge))
    }
}

impl Drop for NoteRecord {
    fn drop(&mut self) {
        self.nullifier.zeroize();
        self.secret.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commitment_deterministic() {
        let sponge = MimcSponge::new();
        let nullifier = Element::from_u64(11);
        let secret = Element::from_u64(13);

        let a = Note::from_parts(&nullifier, &secret, &sponge);
        let b = Note::from_parts(&nullifier, &secret, &sponge);
        assert_eq!(a.commitment, b.commitment);
        assert_eq!(a.nullifier_hash, b.nullifier_hash);
    }

    #[test]
    fn test_nullifier_hash_differs_from_commitment() {
        let sponge = MimcSponge::new();
        for _ in 0..20 {
            let note = Note::generate(&sponge);
            assert_ne!(note.commitment, note.nullifier_hash);
        }
    }

    #[test]
    fn test_generated_notes_unique() {
        let sponge = MimcSponge::new();
        let a = Note::generate(&sponge);
        let b = Note::generate(&sponge);
        assert_ne!(a.commitment, b.commitment);
        assert_ne!(a.nullifier_hash, b.nullifier_hash);
    }

    #[test]
    fn test_record_round_trip() {
        let sponge = MimcSponge::new();
        let note = Note::generate(&sponge);
        let record = note.to_record();

        let json = serde_json::to_string(&record).unwrap();
        let parsed: NoteRecord = serde_json::from_str(&json).unwrap();
        let restored = parsed.into_note(&sponge).unwrap();

        assert_eq!(restored.commitment, note.commitment);
        assert_eq!(restored.nullifier_hash, note.nullifier_hash);
    }

    #[test]
    fn test_record_rejects_bad_hex() {
        let sponge = MimcSponge::new();
        let record = NoteRecord {
            nullifier: "0xnot-hex".into(),
            secret: "0x00".into(),
            commitment: String::new(),
        };
        assert!(record.into_note(&sponge).is_err());
    }
}
