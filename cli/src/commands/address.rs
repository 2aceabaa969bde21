//! Display stealth meta-address

use anyhow::Result;
use colored::Colorize;

use crate::config::load_profile;

pub fn run() -> Result<()> {
    let profile = load_profile()?;
    let meta = profile.meta_address()?;

    println!();
    println!("{}", "Your Stealth Meta-Address".yellow().bold());
    println!();
    println!("{}", meta.encode());
    println!();
    println!("{}:", "Components".dimmed());
    println!("  Viewing pubkey: {}", hex::encode(meta.viewing_pubkey));
    println!("  Spend pubkey:   {}", hex::encode(meta.spend_pubkey));
    println!();
    println!(
        "{}",
        "Share the meta-address above to receive private payments.".dimmed()
    );

    Ok(())
}
