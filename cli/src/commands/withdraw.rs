//! Prepare a withdrawal proof for a deposited note

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use veilpool::adapters::{JsonLogReader, MockProver};
use veilpool::circuit::ExtData;
use veilpool::{derive_payment, prepare_withdrawal, MimcSponge, StealthMetaAddress};

use crate::config::parse_token;

pub struct WithdrawOptions {
    pub note_path: String,
    pub log_path: String,
    pub recipient: String,
    pub dest_chain: u32,
    pub fee: u64,
    pub token: String,
    pub bridge: String,
    pub out_path: String,
}

pub async fn run(options: WithdrawOptions) -> Result<()> {
    let out = Path::new(&options.out_path);
    if out.exists() {
        bail!("Refusing to overwrite existing bundle {:?}", out);
    }

    // Load the note being spent
    let sponge = MimcSponge::new();
    let json = fs::read_to_string(&options.note_path).context("Failed to read note file")?;
    let record: veilpool::note::NoteRecord =
        serde_json::from_str(&json).context("Failed to parse note file")?;
    let note = record.into_note(&sponge)?;

    // Replay the deposit log
    let reader = JsonLogReader::from_file(&options.log_path)
        .with_context(|| format!("Failed to load event log {:?}", options.log_path))?;

    // Derive the one-time recipient and bind all parameters
    let meta = StealthMetaAddress::parse(&options.recipient)?;
    let derivation = derive_payment(&meta, 0)?;
    let ext_data = ExtData {
        destination_chain: options.dest_chain,
        recipient: derivation.payment,
        relayer_fee: options.fee,
        token: parse_token(&options.token)?,
        bridge: options.bridge.parse()?,
    };

    println!("{}", "Rebuilding commitment tree from the event log...".cyan());
    println!(
        "{}",
        "Proving backend: local development prover (not for mainnet submission)".dimmed()
    );
    let prover = MockProver::new();
    let bundle = prepare_withdrawal(&reader, &note, &ext_data, &prover)
        .context("Withdrawal preparation failed")?;

    let json = serde_json::to_string_pretty(&bundle)?;
    fs::write(out, json).context("Failed to write withdrawal bundle")?;

    println!();
    println!("{}", "Withdrawal bundle ready".green().bold());
    println!();
    println!("  Leaf index:     {}", bundle.leaf_index);
    println!("  Root:           {}", bundle.root);
    println!("  Nullifier hash: {}", bundle.nullifier_hash);
    println!("  Ext data hash:  {}", bundle.ext_data_hash);
    println!("  Paying to:      {}", bundle.ext_data.recipient.stealth_address);
    println!();
    println!(
        "{}",
        format!("Bundle saved to {:?} - submit it through your relayer.", out).dimmed()
    );

    Ok(())
}
