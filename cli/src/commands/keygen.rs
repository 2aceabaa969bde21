//! Key generation command with encrypted storage and mnemonic support

use anyhow::{bail, Result};
use colored::Colorize;
use veilpool::StealthKeys;

use crate::config::{save_profile, PublicProfile};
use crate::secure_storage::{prompt_new_password, KeyData, SecureKeyStorage};

/// Options for key generation
pub struct KeygenOptions {
    /// Force overwrite existing keys
    pub force: bool,
    /// Use mnemonic for key generation (allows recovery)
    pub with_mnemonic: bool,
    /// Import from existing mnemonic
    pub import_mnemonic: Option<String>,
    /// Passphrase for mnemonic (optional extra security)
    pub passphrase: Option<String>,
}

pub fn run(options: KeygenOptions) -> Result<()> {
    let storage = SecureKeyStorage::new(SecureKeyStorage::default_path());

    if storage.exists() && !options.force {
        bail!(
            "Stealth keys already exist. Use --force to overwrite.\n\
             Warning: Overwriting keys will make any existing stealth payments unrecoverable!"
        );
    }

    println!("{}", "=== Veilpool Key Generation ===".cyan().bold());
    println!();

    let (keys, mnemonic) = if let Some(ref phrase) = options.import_mnemonic {
        println!("{}", "Importing keys from mnemonic phrase...".cyan());
        let passphrase = options.passphrase.as_deref().unwrap_or("");
        let keys = StealthKeys::from_mnemonic(phrase, passphrase)?;
        (keys, Some(phrase.clone()))
    } else if options.with_mnemonic {
        println!("{}", "Generating keys with recovery phrase...".cyan());
        let (keys, phrase) = StealthKeys::generate_with_mnemonic()?;
        (keys, Some(phrase))
    } else {
        println!("{}", "Generating random keys (no recovery phrase)...".cyan());
        println!(
            "{}",
            "Warning: Without a recovery phrase, losing your password means losing your funds!"
                .yellow()
        );
        println!();
        (StealthKeys::generate(), None)
    };

    println!();
    println!("{}", "Choose a strong password to encrypt your keys.".cyan());
    println!(
        "{}",
        "Requirements: 8+ chars, uppercase, lowercase, and numbers".dimmed()
    );
    println!();

    let password = prompt_new_password("Enter password: ")?;

    let (viewing_secret, spend_secret) = keys.export_secrets();
    let key_data = KeyData {
        viewing_secret,
        spend_secret,
        viewing_pubkey: keys.viewing_pubkey,
        spend_pubkey: keys.spend_pubkey,
    };
    storage.save(&key_data, &password)?;

    save_profile(&PublicProfile {
        viewing_pubkey: hex::encode(keys.viewing_pubkey),
        spend_pubkey: hex::encode(keys.spend_pubkey),
        created_at: chrono::Utc::now().to_rfc3339(),
    })?;

    println!();
    println!(
        "{}",
        "Keys generated and encrypted successfully!".green().bold()
    );
    println!();

    if let Some(ref phrase) = mnemonic {
        println!("{}", "=== RECOVERY PHRASE - WRITE THIS DOWN! ===".red().bold());
        println!();

        let words: Vec<&str> = phrase.split_whitespace().collect();
        for (i, chunk) in words.chunks(4).enumerate() {
            let line: String = chunk
                .iter()
                .enumerate()
                .map(|(j, word)| format!("{:2}. {:<12}", i * 4 + j + 1, word))
                .collect::<Vec<_>>()
                .join(" ");
            println!("  {}", line.yellow());
        }

        println!();
        println!("{}", "CRITICAL: Store this phrase securely OFFLINE!".red().bold());
        println!("{}", "Anyone with this phrase can recover your keys.".red());
        println!("{}", "You will NOT be shown this phrase again.".red());
        println!();
    }

    println!("{}:", "Viewing Public Key".yellow());
    println!("  {}", hex::encode(keys.viewing_pubkey));
    println!();
    println!("{}:", "Spend Public Key".yellow());
    println!("  {}", hex::encode(keys.spend_pubkey));
    println!();
    println!(
        "{}:",
        "Meta-Address (share this to receive payments)".yellow()
    );
    println!("  {}", keys.meta_address().encode());
    println!();
    println!(
        "{}",
        format!(
            "Encrypted keys saved to: {:?}",
            SecureKeyStorage::default_path()
        )
        .dimmed()
    );

    if mnemonic.is_none() {
        println!();
        println!(
            "{}",
            "IMPORTANT: You did not use a recovery phrase.".red().bold()
        );
        println!(
            "{}",
            "If you lose your password, your funds are PERMANENTLY LOST.".red()
        );
    }

    Ok(())
}
