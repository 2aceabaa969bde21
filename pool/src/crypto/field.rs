//! BN254 scalar field elements
//!
//! Every hash input/output and circuit signal in the pool is an element of
//! the BN254 scalar field. This module wraps the arkworks backend behind a
//! narrow interface (`reduce`, `add`, `mul`, byte round-trips) so the curve
//! backend can be swapped without touching protocol logic.

use ark_bn254::Fr;
use ark_ff::{BigInteger, One, PrimeField, Zero};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use zeroize::Zeroize;

/// Decimal string of the field prime, kept for display/diagnostics.
///
/// p = 21888242871839275222246405745257275088548364400416034343698204186575808495617
pub const MODULUS_DECIMAL: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

#[derive(Debug, Error)]
pub enum FieldParseError {
    #[error("invalid hex encoding: {0}")]
    Hex(String),

    #[error("invalid element length: expected at most 32 bytes, got {0}")]
    Length(usize),
}

/// A canonical element of the BN254 scalar field.
///
/// Invariant: the wrapped value is always fully reduced, `0 <= v < p`.
/// All constructors canonicalize; out-of-range inputs are reduced, never
/// truncated.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Element(Fr);

impl Element {
    pub fn zero() -> Self {
        Self(Fr::zero())
    }

    pub fn one() -> Self {
        Self(Fr::one())
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Fr::from(value))
    }

    /// Canonicalize an arbitrary-length big-endian byte string into the field.
    pub fn reduce(bytes: &[u8]) -> Self {
        Self(Fr::from_be_bytes_mod_order(bytes))
    }

    pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        Self::reduce(bytes)
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let repr = self.0.into_bigint().to_bytes_be();
        let mut out = [0u8; 32];
        out[32 - repr.len()..].copy_from_slice(&repr);
        out
    }

    pub fn add(&self, other: &Element) -> Element {
        Element(self.0 + other.0)
    }

    pub fn sub(&self, other: &Element) -> Element {
        Element(self.0 - other.0)
    }

    pub fn mul(&self, other: &Element) -> Element {
        Element(self.0 * other.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Draw a uniformly-distributed element from a cryptographically secure
    /// source. 64 bytes are reduced so the modulo bias is negligible.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut wide = [0u8; 64];
        rng.fill_bytes(&mut wide);
        let element = Self::reduce(&wide);
        wide.zeroize();
        element
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_be_bytes()))
    }

    pub fn from_hex(input: &str) -> Result<Self, FieldParseError> {
        let stripped = input.strip_prefix("0x").unwrap_or(input);
        let bytes = hex::decode(stripped).map_err(|e| FieldParseError::Hex(e.to_string()))?;
        if bytes.len() > 32 {
            return Err(FieldParseError::Length(bytes.len()));
        }
        Ok(Self::reduce(&bytes))
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Element({})", self.to_hex())
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Element::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

/// A field element that zeroizes its byte representation on drop.
///
/// Used for note secrets. The canonical big-endian bytes are held directly
/// so cleanup wipes the real material, not a copy.
#[derive(Clone)]
pub struct SecretElement {
    bytes: [u8; 32],
}

impl SecretElement {
    pub fn from_element(element: &Element) -> Self {
        Self {
            bytes: element.to_be_bytes(),
        }
    }

    pub fn to_element(&self) -> Element {
        Element::from_be_bytes(&self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

impl Drop for SecretElement {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_reduce_is_canonical() {
        // 2^256 - 1 reduces strictly below the modulus
        let max = [0xFFu8; 32];
        let reduced = Element::from_be_bytes(&max);
        let round_trip = Element::from_be_bytes(&reduced.to_be_bytes());
        assert_eq!(reduced, round_trip);
    }

    #[test]
    fn test_byte_round_trip() {
        let mut rng = OsRng;
        for _ in 0..50 {
            let element = Element::random(&mut rng);
            assert_eq!(element, Element::from_be_bytes(&element.to_be_bytes()));
        }
    }

    #[test]
    fn test_hex_round_trip() {
        let element = Element::from_u64(0xdead_beef);
        let parsed = Element::from_hex(&element.to_hex()).unwrap();
        assert_eq!(element, parsed);

        // Without the 0x prefix
        let parsed = Element::from_hex(element.to_hex().trim_start_matches("0x")).unwrap();
        assert_eq!(element, parsed);
    }

    #[test]
    fn test_hex_rejects_garbage() {
        assert!(Element::from_hex("0xzz").is_err());
        assert!(Element::from_hex(&"ab".repeat(40)).is_err());
    }

    #[test]
    fn test_arithmetic_identities() {
        let mut rng = OsRng;
        let a = Element::random(&mut rng);

        assert_eq!(a.add(&Element::zero()), a);
        assert_eq!(a.mul(&Element::one()), a);
        assert_eq!(a.sub(&a), Element::zero());
        assert!(a.mul(&Element::zero()).is_zero());
    }

    #[test]
    fn test_random_elements_distinct() {
        let mut rng = OsRng;
        let a = Element::random(&mut rng);
        let b = Element::random(&mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn test_secret_element_round_trip() {
        let mut rng = OsRng;
        let element = Element::random(&mut rng);
        let secret = SecretElement::from_element(&element);
        assert_eq!(secret.to_element(), element);
    }
}
