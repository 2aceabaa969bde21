//! Configuration paths and the public key profile
//!
//! Secrets live only in the encrypted key file (see `secure_storage`); the
//! profile written here carries public keys so commands that just display
//! the meta-address do not prompt for a password.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use veilpool::StealthMetaAddress;

const VEILPOOL_DIR: &str = ".veilpool";
const PROFILE_FILE: &str = "profile.json";
const CHECKPOINT_DIR: &str = "checkpoints";

/// Public half of the stored identity.
#[derive(Serialize, Deserialize)]
pub struct PublicProfile {
    /// Viewing public key (hex encoded)
    pub viewing_pubkey: String,
    /// Spend public key (hex encoded)
    pub spend_pubkey: String,
    /// Creation timestamp
    pub created_at: String,
}

impl PublicProfile {
    pub fn meta_address(&self) -> Result<StealthMetaAddress> {
        Ok(StealthMetaAddress {
            viewing_pubkey: decode_pubkey(&self.viewing_pubkey)?,
            spend_pubkey: decode_pubkey(&self.spend_pubkey)?,
        })
    }
}

fn decode_pubkey(input: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(input).context("invalid public key hex")?;
    bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("public key must be 32 bytes"))
}

/// Base directory for keys, profile, and checkpoints.
pub fn veilpool_dir() -> PathBuf {
    dirs::home_dir()
        .expect("Could not find home directory")
        .join(VEILPOOL_DIR)
}

pub fn profile_file() -> PathBuf {
    veilpool_dir().join(PROFILE_FILE)
}

pub fn checkpoint_dir() -> PathBuf {
    veilpool_dir().join(CHECKPOINT_DIR)
}

pub fn save_profile(profile: &PublicProfile) -> Result<()> {
    let dir = veilpool_dir();
    fs::create_dir_all(&dir).context("Failed to create veilpool directory")?;

    let json = serde_json::to_string_pretty(profile)?;
    fs::write(profile_file(), json).context("Failed to write profile")?;
    Ok(())
}

pub fn load_profile() -> Result<PublicProfile> {
    let path = profile_file();
    if !path.exists() {
        bail!("No stealth keys found. Run 'veilpool keygen' first.");
    }

    let json = fs::read_to_string(&path).context("Failed to read profile")?;
    let profile: PublicProfile = serde_json::from_str(&json).context("Failed to parse profile")?;
    Ok(profile)
}

/// Parse a token identity from hex into the 32-byte form the pool uses,
/// left-padded like an ABI word.
pub fn parse_token(input: &str) -> Result<[u8; 32]> {
    let stripped = input.strip_prefix("0x").unwrap_or(input);
    let bytes = hex::decode(stripped).context("invalid token hex")?;
    if bytes.len() > 32 {
        bail!("token identity must be at most 32 bytes, got {}", bytes.len());
    }

    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(out)
}
