//! Show configuration and key info

use anyhow::Result;
use colored::Colorize;

use crate::config::{checkpoint_dir, load_profile, profile_file, veilpool_dir};
use crate::secure_storage::SecureKeyStorage;

pub fn run() -> Result<()> {
    println!();
    println!("{}", "Veilpool Configuration".yellow().bold());
    println!();

    println!("{}:", "Data Directory".cyan());
    println!("  {}", veilpool_dir().display());
    println!();

    if let Ok(profile) = load_profile() {
        println!("{}", "Stealth Keys: CONFIGURED".green());
        println!("  Created: {}", profile.created_at);
        if let Ok(meta) = profile.meta_address() {
            println!("  Meta-address: {}", meta.encode());
        }
    } else {
        println!("{}", "Stealth Keys: NOT CONFIGURED".red());
        println!("  Run 'veilpool keygen' to generate keys");
    }
    println!();

    println!("{}:", "File Locations".cyan());
    println!("  Encrypted keys: {}", SecureKeyStorage::default_path().display());
    println!("  Profile:        {}", profile_file().display());
    println!("  Checkpoints:    {}", checkpoint_dir().display());

    Ok(())
}
