//! Veilpool CLI - shielded cross-chain payments with stealth addresses

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod secure_storage;

use commands::*;

#[derive(Parser)]
#[command(name = "veilpool")]
#[command(version = "0.1.0")]
#[command(about = "Shielded cross-chain payments with stealth addresses")]
#[command(long_about = r#"
Veilpool moves value through a shielded pool and delivers it to one-time
stealth addresses only the recipient can recognize and spend from.

Quick Start:
  1. veilpool keygen                 Generate your stealth keys
  2. veilpool address                Share your meta-address
  3. veilpool note new               Create a deposit note
  4. veilpool scan --log events.json Check for incoming payments
  5. veilpool withdraw ...           Prove a withdrawal
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate new stealth key pairs (viewing + spend keys)
    Keygen {
        /// Force overwrite existing keys
        #[arg(short, long)]
        force: bool,

        /// Generate with recovery phrase (recommended)
        #[arg(short, long, default_value = "true")]
        mnemonic: bool,

        /// Import from existing recovery phrase
        #[arg(long)]
        import_mnemonic: Option<String>,

        /// Passphrase for mnemonic (optional extra security)
        #[arg(long)]
        passphrase: Option<String>,
    },

    /// Show your stealth meta-address
    Address,

    /// Deposit note management
    Note {
        #[command(subcommand)]
        command: note::NoteCommands,
    },

    /// Scan an exported event log for incoming stealth payments
    Scan {
        /// Path to the exported event log (JSON)
        #[arg(long)]
        log: String,

        /// Ignore the saved checkpoint and scan from the beginning
        #[arg(long)]
        full: bool,
    },

    /// Prepare a withdrawal proof for a deposited note
    Withdraw {
        /// Path to the note file
        #[arg(long)]
        note: String,

        /// Path to the exported event log (JSON)
        #[arg(long)]
        log: String,

        /// Recipient meta-address (veil:... format)
        #[arg(short, long)]
        to: String,

        /// Destination chain id
        #[arg(long)]
        dest_chain: u32,

        /// Relayer fee in base units
        #[arg(long, default_value = "0")]
        fee: u64,

        /// Token identity (hex, up to 32 bytes)
        #[arg(long)]
        token: String,

        /// Bridge contract address (0x..., 20 bytes)
        #[arg(long)]
        bridge: String,

        /// Output path for the withdrawal bundle
        #[arg(short, long, default_value = "withdrawal.json")]
        out: String,
    },

    /// Show configuration and key info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Keygen {
            force,
            mnemonic,
            import_mnemonic,
            passphrase,
        } => {
            keygen::run(keygen::KeygenOptions {
                force,
                with_mnemonic: mnemonic,
                import_mnemonic,
                passphrase,
            })?;
        }
        Commands::Address => {
            address::run()?;
        }
        Commands::Note { command } => {
            note::run(command)?;
        }
        Commands::Scan { log, full } => {
            scan::run(&log, full).await?;
        }
        Commands::Withdraw {
            note,
            log,
            to,
            dest_chain,
            fee,
            token,
            bridge,
            out,
        } => {
            withdraw::run(withdraw::WithdrawOptions {
                note_path: note,
                log_path: log,
                recipient: to,
                dest_chain,
                fee,
                token,
                bridge,
                out_path: out,
            })
            .await?;
        }
        Commands::Info => {
            info::run()?;
        }
    }

    Ok(())
}
