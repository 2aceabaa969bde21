//! Scan an exported event log for incoming stealth payments

use anyhow::{Context, Result};
use colored::Colorize;
use veilpool::adapters::{FsCheckpointStore, JsonLogReader};
use veilpool::ports::CheckpointStore;
use veilpool::{ScanControl, Scanner, ScannerConfig, ViewKey};

use crate::config::checkpoint_dir;
use crate::secure_storage::{prompt_password, SecureKeyStorage};

pub async fn run(log_path: &str, full: bool) -> Result<()> {
    println!("{}", "Scanning for incoming stealth payments...".cyan());

    let storage = SecureKeyStorage::new(SecureKeyStorage::default_path());
    if !storage.exists() {
        anyhow::bail!("No stealth keys found. Run 'veilpool keygen' first.");
    }

    let password = prompt_password("Enter password to decrypt keys: ")?;
    let key_data = storage
        .load(&password)
        .context("Failed to decrypt keys. Wrong password?")?;
    let view = ViewKey::new(key_data.viewing_secret, key_data.spend_pubkey);

    let reader = JsonLogReader::from_file(log_path)
        .with_context(|| format!("Failed to load event log {:?}", log_path))?;
    let config = ScannerConfig::new(reader.chain_id(), reader.contract());

    let store = FsCheckpointStore::new(checkpoint_dir());
    let mut scanner = Scanner::new(reader, store, config);

    if full {
        // Rewind the checkpoint so the whole log is replayed
        let key = scanner.checkpoint_key(&view);
        let mut rewind = FsCheckpointStore::new(checkpoint_dir());
        rewind.set(
            &key,
            &veilpool::ports::Checkpoint {
                last_scanned: 0,
                updated_at: chrono::Utc::now().timestamp(),
            },
        )?;
    }

    let matches = scanner.run_with(&view, |progress| {
        print!(
            "\rScanned through position {} of {} ({:.0}%)...",
            progress.scanned_through,
            progress.target,
            progress.fraction() * 100.0
        );
        ScanControl::Continue
    })?;
    println!();
    println!();

    if matches.is_empty() {
        println!("{}", "No incoming payments found.".yellow());
        if !full {
            println!(
                "{}",
                "The scan is incremental; use --full to replay the whole log.".dimmed()
            );
        }
    } else {
        println!(
            "{}",
            format!("Found {} payment(s):", matches.len()).green().bold()
        );
        println!();

        for (i, payment) in matches.iter().enumerate() {
            println!("{}. {}", i + 1, "Payment".yellow());
            println!("   Address:  {}", payment.stealth_address);
            println!("   Amount:   {}", payment.amount);
            println!("   Token:    0x{}", hex::encode(payment.token));
            println!("   Index k:  {}", payment.index_k);
            println!("   Position: {}", payment.position);
            println!();
        }

        let total: u64 = matches.iter().map(|p| p.amount).sum();
        println!(
            "{}",
            format!("Total received: {} ({} payment(s))", total, matches.len())
                .green()
                .bold()
        );
    }

    Ok(())
}
