//! Deposit note management

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::Colorize;
use veilpool::{MimcSponge, Note};

#[derive(Subcommand)]
pub enum NoteCommands {
    /// Generate a fresh deposit note
    New {
        /// Output path for the note file
        #[arg(short, long, default_value = "note.json")]
        out: String,
    },

    /// Show the commitment of an existing note file
    Show {
        /// Path to the note file
        path: String,
    },
}

pub fn run(command: NoteCommands) -> Result<()> {
    match command {
        NoteCommands::New { out } => new_note(&out),
        NoteCommands::Show { path } => show_note(&path),
    }
}

fn new_note(out: &str) -> Result<()> {
    let path = Path::new(out);
    if path.exists() {
        bail!("Refusing to overwrite existing note file {:?}", path);
    }

    let sponge = MimcSponge::new();
    let note = Note::generate(&sponge);
    let record = note.to_record();

    let json = serde_json::to_string_pretty(&record)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::write(path, &json)?;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    #[cfg(not(unix))]
    {
        fs::write(path, &json)?;
    }

    println!();
    println!("{}", "Deposit note created".green().bold());
    println!();
    println!("{}:", "Commitment (submit this with your deposit)".yellow());
    println!("  {}", note.commitment);
    println!();
    println!(
        "{}",
        format!("Note saved to {:?} - anyone holding this file can spend the deposit.", path)
            .red()
    );

    Ok(())
}

fn show_note(path: &str) -> Result<()> {
    let json = fs::read_to_string(path).context("Failed to read note file")?;
    let record: veilpool::note::NoteRecord =
        serde_json::from_str(&json).context("Failed to parse note file")?;

    let sponge = MimcSponge::new();
    let note = record.into_note(&sponge)?;

    println!();
    println!("{}:", "Commitment".yellow());
    println!("  {}", note.commitment);
    println!("{}:", "Nullifier hash".yellow());
    println!("  {}", note.nullifier_hash);

    Ok(())
}
