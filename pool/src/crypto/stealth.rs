//! Dual-key stealth address engine
//!
//! ## Protocol
//!
//! ### Recipient setup
//! 1. Generate viewing key pair: (v, V) where V = v·G
//! 2. Generate spend key pair: (b, B) where B = b·G
//! 3. Publish meta-address: (B, V)
//!
//! ### Sender, for payment index k
//! 1. Generate ephemeral key pair: (r, R) where R = r·G
//! 2. Shared secret: ss = r·V (compressed encoding)
//! 3. Tweak: t = H(domain || ss || be32(k)) as a scalar
//! 4. Stealth pubkey: P = B + t·G; address = last 20 bytes of SHA-256(P)
//! 5. Publish (address, R, view hint ss[0], k) with the payment
//!
//! ### Recipient scanning
//! 1. ss = v·R (equal to the sender's by ECDH symmetry)
//! 2. Hint filter on ss[0], then full re-derivation of the address
//! 3. Spending key: p = b + t, which controls P
//!
//! The 1-byte hint has a 1/256 false-positive rate by design and is never
//! trusted without the full address check.

use curve25519_dalek::{
    constants::ED25519_BASEPOINT_POINT,
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar,
};
use ed25519_dalek::{ExpandedSecretKey, PublicKey as DalekPublicKey, Signature};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::Zeroize;

/// Domain separator for the tweak derivation.
const TWEAK_DOMAIN: &[u8] = b"veilpool/stealth-tweak-v1";

/// Domain separator for deterministic signing nonces.
const NONCE_DOMAIN: &[u8] = b"veilpool/stealth-nonce-v1";

/// Prefix on encoded meta-addresses.
const META_ADDRESS_PREFIX: &str = "veil:";

#[derive(Debug, Error)]
pub enum StealthError {
    #[error("invalid meta-address: {0}")]
    InvalidMetaAddress(String),

    #[error("not a valid curve point")]
    InvalidPoint,

    #[error("derived stealth private key is zero; retry with a different ephemeral key or index")]
    DegenerateKey,

    #[error("invalid key material: {0}")]
    KeyMaterial(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("signer construction failed: {0}")]
    Signer(String),
}

// ============================================================================
// Zeroizing scalar wrapper
// ============================================================================

/// A curve scalar that zeroizes its contents on drop.
#[derive(Clone)]
pub struct SecretScalar {
    bytes: [u8; 32],
}

impl SecretScalar {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    pub fn from_scalar(scalar: &Scalar) -> Self {
        Self {
            bytes: scalar.to_bytes(),
        }
    }

    pub fn to_scalar(&self) -> Scalar {
        Scalar::from_bytes_mod_order(self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

impl Drop for SecretScalar {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

// ============================================================================
// Addresses
// ============================================================================

/// A 20-byte one-time payment address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Chain-specific encoding of a stealth public key: the last 20 bytes
    /// of SHA-256 over the compressed point. Swap this one function to
    /// target a different address scheme.
    pub fn from_public_key(compressed: &[u8; 32]) -> Self {
        let digest = Sha256::digest(compressed);
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest[12..]);
        Self(out)
    }

    /// Constant-time equality, for use in scanning paths.
    pub fn ct_matches(&self, other: &Address) -> bool {
        bool::from(self.0[..].ct_eq(&other.0[..]))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl std::str::FromStr for Address {
    type Err = StealthError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let stripped = input.strip_prefix("0x").unwrap_or(input);
        let bytes =
            hex::decode(stripped).map_err(|e| StealthError::InvalidAddress(e.to_string()))?;
        let array: [u8; 20] = bytes
            .try_into()
            .map_err(|_| StealthError::InvalidAddress("expected 20 bytes".into()))?;
        Ok(Self(array))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Meta-addresses and key sets
// ============================================================================

/// The published recipient identity: compressed (B, V).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StealthMetaAddress {
    pub spend_pubkey: [u8; 32],
    pub viewing_pubkey: [u8; 32],
}

impl StealthMetaAddress {
    /// `veil:` + base58 of spend || viewing.
    pub fn encode(&self) -> String {
        let mut combined = [0u8; 64];
        combined[..32].copy_from_slice(&self.spend_pubkey);
        combined[32..].copy_from_slice(&self.viewing_pubkey);
        format!("{}{}", META_ADDRESS_PREFIX, bs58::encode(&combined).into_string())
    }

    pub fn parse(input: &str) -> Result<Self, StealthError> {
        let encoded = input.strip_prefix(META_ADDRESS_PREFIX).unwrap_or(input);
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| StealthError::InvalidMetaAddress(e.to_string()))?;
        if bytes.len() != 64 {
            return Err(StealthError::InvalidMetaAddress(format!(
                "expected 64 bytes, got {}",
                bytes.len()
            )));
        }

        let mut spend_pubkey = [0u8; 32];
        let mut viewing_pubkey = [0u8; 32];
        spend_pubkey.copy_from_slice(&bytes[..32]);
        viewing_pubkey.copy_from_slice(&bytes[32..]);

        // Reject encodings that are not curve points up front
        decompress_point(&spend_pubkey).ok_or(StealthError::InvalidPoint)?;
        decompress_point(&viewing_pubkey).ok_or(StealthError::InvalidPoint)?;

        Ok(Self {
            spend_pubkey,
            viewing_pubkey,
        })
    }
}

/// Complete recipient key set. Secrets zeroize on drop; `Clone` is not
/// derived so secret duplication stays deliberate.
pub struct StealthKeys {
    viewing_secret: SecretScalar,
    spend_secret: SecretScalar,
    pub viewing_pubkey: [u8; 32],
    pub spend_pubkey: [u8; 32],
}

impl StealthKeys {
    /// Generate a fresh key set from OS entropy.
    pub fn generate() -> Self {
        let mut rng = OsRng;
        let viewing = random_scalar(&mut rng);
        let spend = random_scalar(&mut rng);
        Self::from_scalars(&viewing, &spend)
    }

    /// Derive the key set from a BIP-39 mnemonic phrase.
    ///
    /// viewing_secret = SHA-256("veilpool/viewing" || seed)
    /// spend_secret   = SHA-256("veilpool/spend" || seed)
    pub fn from_mnemonic(phrase: &str, passphrase: &str) -> Result<Self, StealthError> {
        use bip39::Mnemonic;

        let mnemonic: Mnemonic = phrase
            .parse()
            .map_err(|e| StealthError::KeyMaterial(format!("invalid mnemonic: {}", e)))?;
        let seed = mnemonic.to_seed(passphrase);

        let viewing = seed_scalar(b"veilpool/viewing", &seed);
        let spend = seed_scalar(b"veilpool/spend", &seed);

        Ok(Self::from_scalars(&viewing, &spend))
    }

    /// Generate a new 24-word mnemonic and derive the key set from it.
    pub fn generate_with_mnemonic() -> Result<(Self, String), StealthError> {
        use bip39::Mnemonic;
        use rand::RngCore;

        let mut entropy = [0u8; 32];
        OsRng.fill_bytes(&mut entropy);
        let mnemonic = Mnemonic::from_entropy(&entropy)
            .map_err(|e| StealthError::KeyMaterial(format!("mnemonic generation: {}", e)))?;
        entropy.zeroize();

        let phrase = mnemonic.to_string();
        let keys = Self::from_mnemonic(&phrase, "")?;
        Ok((keys, phrase))
    }

    /// Reconstruct from stored secrets.
    pub fn from_secrets(viewing_secret: &[u8; 32], spend_secret: &[u8; 32]) -> Self {
        Self::from_scalars(
            &Scalar::from_bytes_mod_order(*viewing_secret),
            &Scalar::from_bytes_mod_order(*spend_secret),
        )
    }

    fn from_scalars(viewing: &Scalar, spend: &Scalar) -> Self {
        let g = ED25519_BASEPOINT_POINT;
        Self {
            viewing_secret: SecretScalar::from_scalar(viewing),
            spend_secret: SecretScalar::from_scalar(spend),
            viewing_pubkey: (viewing * &g).compress().to_bytes(),
            spend_pubkey: (spend * &g).compress().to_bytes(),
        }
    }

    pub fn meta_address(&self) -> StealthMetaAddress {
        StealthMetaAddress {
            spend_pubkey: self.spend_pubkey,
            viewing_pubkey: self.viewing_pubkey,
        }
    }

    /// The scan-only capability: viewing secret plus spend pubkey. Cannot
    /// derive spending keys.
    pub fn view_key(&self) -> ViewKey {
        ViewKey {
            viewing_secret: self.viewing_secret.clone(),
            spend_pubkey: self.spend_pubkey,
        }
    }

    /// Export secrets for encrypted storage. Handle with extreme care.
    pub fn export_secrets(&self) -> ([u8; 32], [u8; 32]) {
        (*self.viewing_secret.as_bytes(), *self.spend_secret.as_bytes())
    }

    /// Derive the one-time spending key for a payment made with the given
    /// ephemeral key and index.
    ///
    /// p = spend_secret + tweak. A zero result cannot be signed with and is
    /// rejected as a fatal derivation error for this attempt.
    pub fn derive_spending_key(
        &self,
        ephemeral_pubkey: &[u8; 32],
        k: u32,
    ) -> Result<SecretScalar, StealthError> {
        let ephemeral = decompress_point(ephemeral_pubkey).ok_or(StealthError::InvalidPoint)?;
        let shared = ecdh(&self.viewing_secret.to_scalar(), &ephemeral);
        let tweak = derive_tweak(&shared, k);

        let spending = self.spend_secret.to_scalar() + tweak;
        if spending == Scalar::zero() {
            return Err(StealthError::DegenerateKey);
        }
        Ok(SecretScalar::from_scalar(&spending))
    }
}

/// Scan-only capability for payment detection.
pub struct ViewKey {
    viewing_secret: SecretScalar,
    pub spend_pubkey: [u8; 32],
}

impl ViewKey {
    pub fn new(viewing_secret: [u8; 32], spend_pubkey: [u8; 32]) -> Self {
        Self {
            viewing_secret: SecretScalar::from_bytes(viewing_secret),
            spend_pubkey,
        }
    }

    /// Fingerprint of the viewing identity, used to key scan checkpoints.
    pub fn fingerprint(&self) -> String {
        let g = ED25519_BASEPOINT_POINT;
        let viewing_pubkey = (&self.viewing_secret.to_scalar() * &g).compress().to_bytes();
        let digest = Sha256::digest(viewing_pubkey);
        hex::encode(&digest[..8])
    }

    /// The expected view hint for an announcement, or None when the
    /// ephemeral key is not a curve point.
    pub fn expected_hint(&self, ephemeral_pubkey: &[u8; 32]) -> Option<u8> {
        let ephemeral = decompress_point(ephemeral_pubkey)?;
        let shared = ecdh(&self.viewing_secret.to_scalar(), &ephemeral);
        Some(shared[0])
    }

    /// Full verification: re-derive the stealth address for (R, k) and
    /// compare against the announced one in constant time.
    pub fn matches(&self, ephemeral_pubkey: &[u8; 32], k: u32, address: &Address) -> bool {
        let expected = match self.expected_address(ephemeral_pubkey, k) {
            Some(a) => a,
            None => return false,
        };
        expected.ct_matches(address)
    }

    fn expected_address(&self, ephemeral_pubkey: &[u8; 32], k: u32) -> Option<Address> {
        let ephemeral = decompress_point(ephemeral_pubkey)?;
        let spend = decompress_point(&self.spend_pubkey)?;

        let shared = ecdh(&self.viewing_secret.to_scalar(), &ephemeral);
        let tweak = derive_tweak(&shared, k);

        let g = ED25519_BASEPOINT_POINT;
        let stealth_point = &spend + &(&tweak * &g);
        Some(Address::from_public_key(&stealth_point.compress().to_bytes()))
    }
}

// ============================================================================
// Sender-side derivation
// ============================================================================

/// The per-payment wire object published alongside the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealthPayment {
    pub stealth_address: Address,
    #[serde(with = "crate::encoding::hex_array")]
    pub ephemeral_pubkey: [u8; 32],
    pub view_hint: u8,
    pub index_k: u32,
}

/// Sender-side derivation result. The stealth pubkey is kept so callers
/// can verify signatures against the address they are paying.
pub struct StealthDerivation {
    pub payment: StealthPayment,
    pub stealth_pubkey: [u8; 32],
}

/// Derive a one-time payment address for a recipient's meta-address.
///
/// `k` lets one ephemeral interaction fund several unlinkable addresses;
/// 0 is the common case.
pub fn derive_payment(
    meta: &StealthMetaAddress,
    k: u32,
) -> Result<StealthDerivation, StealthError> {
    let ephemeral = random_scalar(&mut OsRng);
    derive_payment_with_ephemeral(meta, k, &SecretScalar::from_scalar(&ephemeral))
}

/// Deterministic variant taking a caller-supplied ephemeral secret.
pub fn derive_payment_with_ephemeral(
    meta: &StealthMetaAddress,
    k: u32,
    ephemeral_secret: &SecretScalar,
) -> Result<StealthDerivation, StealthError> {
    let g = ED25519_BASEPOINT_POINT;
    let ephemeral_scalar = ephemeral_secret.to_scalar();
    let ephemeral_pubkey = (&ephemeral_scalar * &g).compress().to_bytes();

    let viewing = decompress_point(&meta.viewing_pubkey).ok_or(StealthError::InvalidPoint)?;
    let spend = decompress_point(&meta.spend_pubkey).ok_or(StealthError::InvalidPoint)?;

    let shared = ecdh(&ephemeral_scalar, &viewing);
    let tweak = derive_tweak(&shared, k);

    let stealth_point = &spend + &(&tweak * &g);
    let stealth_pubkey = stealth_point.compress().to_bytes();

    Ok(StealthDerivation {
        payment: StealthPayment {
            stealth_address: Address::from_public_key(&stealth_pubkey),
            ephemeral_pubkey,
            view_hint: shared[0],
            index_k: k,
        },
        stealth_pubkey,
    })
}

// ============================================================================
// Shared helpers
// ============================================================================

fn random_scalar<R: rand::RngCore + rand::CryptoRng>(rng: &mut R) -> Scalar {
    let mut bytes = [0u8; 64];
    rng.fill_bytes(&mut bytes);
    let scalar = Scalar::from_bytes_mod_order_wide(&bytes);
    bytes.zeroize();
    scalar
}

fn seed_scalar(domain: &[u8], seed: &[u8]) -> Scalar {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(seed);
    let digest = hasher.finalize();

    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    let scalar = Scalar::from_bytes_mod_order(bytes);
    bytes.zeroize();
    scalar
}

fn decompress_point(bytes: &[u8; 32]) -> Option<EdwardsPoint> {
    CompressedEdwardsY::from_slice(bytes).decompress()
}

/// Diffie-Hellman over edwards25519, compressed output. Symmetric:
/// ecdh(r, V) == ecdh(v, R) for matching key pairs.
fn ecdh(secret: &Scalar, point: &EdwardsPoint) -> [u8; 32] {
    (secret * point).compress().to_bytes()
}

/// tweak = SHA-256(domain || shared_secret || be32(k)) as a scalar.
fn derive_tweak(shared_secret: &[u8; 32], k: u32) -> Scalar {
    let mut hasher = Sha256::new();
    hasher.update(TWEAK_DOMAIN);
    hasher.update(shared_secret);
    hasher.update(k.to_be_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    let scalar = Scalar::from_bytes_mod_order(bytes);
    bytes.zeroize();
    scalar
}

// ============================================================================
// Stealth signer
// ============================================================================

/// An ed25519 signer over a raw derived scalar.
///
/// Needed because stealth spending keys are scalars (b + tweak), not
/// seeds; seed-based key derivation would produce a different scalar. The
/// expanded-key form signs with exactly our scalar so signatures verify
/// against the derived stealth public key.
pub struct StealthSigner {
    pubkey: [u8; 32],
    expanded: ExpandedSecretKey,
    dalek_pubkey: DalekPublicKey,
}

impl StealthSigner {
    pub fn from_scalar(scalar: &Scalar) -> Result<Self, StealthError> {
        let g = ED25519_BASEPOINT_POINT;
        let pubkey = (scalar * &g).compress().to_bytes();

        // Expanded form: [scalar (32) | nonce prefix (32)], with the nonce
        // prefix derived deterministically from the scalar.
        let scalar_bytes = scalar.to_bytes();
        let mut nonce_hasher = Sha512::new();
        nonce_hasher.update(NONCE_DOMAIN);
        nonce_hasher.update(scalar_bytes);
        let nonce = nonce_hasher.finalize();

        let mut expanded_bytes = [0u8; 64];
        expanded_bytes[..32].copy_from_slice(&scalar_bytes);
        expanded_bytes[32..].copy_from_slice(&nonce[..32]);

        let expanded = ExpandedSecretKey::from_bytes(&expanded_bytes)
            .map_err(|e| StealthError::Signer(e.to_string()))?;
        let dalek_pubkey = DalekPublicKey::from_bytes(&pubkey)
            .map_err(|e| StealthError::Signer(e.to_string()))?;

        let mut scalar_bytes = scalar_bytes;
        scalar_bytes.zeroize();
        expanded_bytes.zeroize();

        Ok(Self {
            pubkey,
            expanded,
            dalek_pubkey,
        })
    }

    pub fn from_secret(secret: &SecretScalar) -> Result<Self, StealthError> {
        Self::from_scalar(&secret.to_scalar())
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.pubkey
    }

    pub fn address(&self) -> Address {
        Address::from_public_key(&self.pubkey)
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.expanded.sign(message, &self.dalek_pubkey)
    }
}

impl std::fmt::Debug for StealthSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StealthSigner")
            .field("pubkey", &hex::encode(self.pubkey))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::Verifier;

    #[test]
    fn test_key_generation_round_trip() {
        let keys = StealthKeys::generate();
        let (viewing, spend) = keys.export_secrets();
        let restored = StealthKeys::from_secrets(&viewing, &spend);

        assert_eq!(keys.viewing_pubkey, restored.viewing_pubkey);
        assert_eq!(keys.spend_pubkey, restored.spend_pubkey);
    }

    #[test]
    fn test_mnemonic_derivation_deterministic() {
        let phrase = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

        let a = StealthKeys::from_mnemonic(phrase, "").unwrap();
        let b = StealthKeys::from_mnemonic(phrase, "").unwrap();
        assert_eq!(a.viewing_pubkey, b.viewing_pubkey);
        assert_eq!(a.spend_pubkey, b.spend_pubkey);

        let c = StealthKeys::from_mnemonic(phrase, "different").unwrap();
        assert_ne!(a.viewing_pubkey, c.viewing_pubkey);
    }

    #[test]
    fn test_invalid_mnemonic_rejected() {
        assert!(StealthKeys::from_mnemonic("not a mnemonic", "").is_err());
    }

    #[test]
    fn test_meta_address_codec() {
        let keys = StealthKeys::generate();
        let meta = keys.meta_address();

        let encoded = meta.encode();
        assert!(encoded.starts_with("veil:"));

        let parsed = StealthMetaAddress::parse(&encoded).unwrap();
        assert_eq!(parsed, meta);

        // Also accepted without the prefix
        let parsed = StealthMetaAddress::parse(encoded.trim_start_matches("veil:")).unwrap();
        assert_eq!(parsed, meta);
    }

    #[test]
    fn test_meta_address_rejects_garbage() {
        assert!(StealthMetaAddress::parse("veil:tooshort").is_err());
        assert!(StealthMetaAddress::parse("veil:!!!").is_err());
    }

    #[test]
    fn test_derivation_deterministic_for_fixed_inputs() {
        let keys = StealthKeys::generate();
        let meta = keys.meta_address();
        let ephemeral = SecretScalar::from_bytes([7u8; 32]);

        let a = derive_payment_with_ephemeral(&meta, 3, &ephemeral).unwrap();
        let b = derive_payment_with_ephemeral(&meta, 3, &ephemeral).unwrap();
        assert_eq!(a.payment, b.payment);
        assert_eq!(a.stealth_pubkey, b.stealth_pubkey);
    }

    #[test]
    fn test_different_k_yields_unlinkable_addresses() {
        let keys = StealthKeys::generate();
        let meta = keys.meta_address();
        let ephemeral = SecretScalar::from_bytes([9u8; 32]);

        let a = derive_payment_with_ephemeral(&meta, 0, &ephemeral).unwrap();
        let b = derive_payment_with_ephemeral(&meta, 1, &ephemeral).unwrap();
        assert_ne!(a.payment.stealth_address, b.payment.stealth_address);
    }

    #[test]
    fn test_ecdh_symmetry_100_pairs() {
        let g = ED25519_BASEPOINT_POINT;
        let mut rng = OsRng;

        for _ in 0..100 {
            let r = random_scalar(&mut rng);
            let v = random_scalar(&mut rng);
            let big_r = &r * &g;
            let big_v = &v * &g;

            assert_eq!(ecdh(&r, &big_v), ecdh(&v, &big_r));
        }
    }

    #[test]
    fn test_recipient_detects_and_controls_payment() {
        let keys = StealthKeys::generate();
        let meta = keys.meta_address();

        let derivation = derive_payment(&meta, 0).unwrap();
        let payment = derivation.payment;

        // View-side: hint matches and full verification passes
        let view = keys.view_key();
        assert_eq!(
            view.expected_hint(&payment.ephemeral_pubkey),
            Some(payment.view_hint)
        );
        assert!(view.matches(
            &payment.ephemeral_pubkey,
            payment.index_k,
            &payment.stealth_address
        ));

        // Spend-side: derived key controls the derived pubkey and address
        let spending = keys
            .derive_spending_key(&payment.ephemeral_pubkey, payment.index_k)
            .unwrap();
        let signer = StealthSigner::from_secret(&spending).unwrap();
        assert_eq!(signer.public_key(), derivation.stealth_pubkey);
        assert_eq!(signer.address(), payment.stealth_address);
    }

    #[test]
    fn test_derived_key_signs_and_verifies() {
        let keys = StealthKeys::generate();
        let derivation = derive_payment(&keys.meta_address(), 2).unwrap();

        let spending = keys
            .derive_spending_key(&derivation.payment.ephemeral_pubkey, 2)
            .unwrap();
        let signer = StealthSigner::from_secret(&spending).unwrap();

        let message = b"withdraw authorization";
        let signature = signer.sign(message);

        let pubkey = DalekPublicKey::from_bytes(&derivation.stealth_pubkey).unwrap();
        assert!(pubkey.verify(message, &signature).is_ok());
    }

    #[test]
    fn test_wrong_recipient_does_not_match() {
        let alice = StealthKeys::generate();
        let mallory = StealthKeys::generate();

        let derivation = derive_payment(&alice.meta_address(), 0).unwrap();
        let payment = derivation.payment;

        assert!(!mallory.view_key().matches(
            &payment.ephemeral_pubkey,
            payment.index_k,
            &payment.stealth_address
        ));
    }

    #[test]
    fn test_wrong_k_does_not_match() {
        let keys = StealthKeys::generate();
        let derivation = derive_payment(&keys.meta_address(), 1).unwrap();
        let payment = derivation.payment;

        assert!(!keys
            .view_key()
            .matches(&payment.ephemeral_pubkey, 0, &payment.stealth_address));
    }

    #[test]
    fn test_invalid_ephemeral_rejected() {
        let keys = StealthKeys::generate();
        // Not a point on the curve
        let bogus = [0xFFu8; 32];
        assert!(keys.derive_spending_key(&bogus, 0).is_err());
        assert_eq!(keys.view_key().expected_hint(&bogus), None);
    }

    #[test]
    fn test_address_codec() {
        let addr = Address([0xABu8; 20]);
        let text = addr.to_string();
        assert!(text.starts_with("0x"));
        assert_eq!(text.parse::<Address>().unwrap(), addr);
        assert!("0x1234".parse::<Address>().is_err());
    }
}
