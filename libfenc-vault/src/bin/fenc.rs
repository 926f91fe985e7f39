//! fenc CLI
//!
//! In-place password file encryption with searchable sidecar metadata.
//!
//! Usage:
//!   fenc encrypt <FILES>...
//!   fenc decrypt <FILES>...
//!   fenc search <TERMS>...
//!
//! The password is prompted without echo on a terminal, or read as a
//! single line from stdin otherwise. `--json` additionally dumps per-file
//! derived key material to stdout.

use std::collections::BTreeMap;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};

use fenc_vault::batch::{self, DecryptReport, FileReport};
use fenc_vault::error::VaultError;

/// In-place file encryption with searchable metadata
#[derive(Parser)]
#[command(name = "fenc")]
#[command(version)]
#[command(about = "Encrypt files in place and search them without decrypting", long_about = None)]
struct Cli {
    /// Dump per-file derived key material as JSON
    #[arg(short, long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt files in place
    Encrypt {
        /// Files to encrypt; none may already be encrypted
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Decrypt files in place
    Decrypt {
        /// Files to decrypt; each must have a sidecar
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Search encrypted files in the current directory
    Search {
        /// Whole words, or prefixes of at least 4 characters like "quic*"
        #[arg(required = true)]
        terms: Vec<String>,
    },
}

fn read_password() -> Result<String> {
    let password = if atty::is(atty::Stream::Stdin) {
        rpassword::prompt_password("Password: ")?
    } else {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        line.trim_end_matches(&['\r', '\n'][..]).to_owned()
    };
    Ok(password)
}

fn print_master_map(reports: &[&FileReport]) -> Result<()> {
    let map: BTreeMap<&str, String> = reports
        .iter()
        .map(|r| (r.name.as_str(), r.keys.master.to_hex()))
        .collect();
    println!("{}", serde_json::to_string_pretty(&map)?);
    Ok(())
}

fn print_subkey_map(reports: &[&FileReport]) -> Result<()> {
    let map: BTreeMap<&str, BTreeMap<&str, String>> = reports
        .iter()
        .map(|r| {
            let sk = &r.keys.subkeys;
            let keys: BTreeMap<&str, String> = [
                ("password validator", hex::encode(sk.validator)),
                ("1st round key", hex::encode(sk.round1)),
                ("2nd round key", hex::encode(sk.round2)),
                ("3rd round key", hex::encode(sk.round3)),
                ("4th round key", hex::encode(sk.round4)),
                ("mac key", hex::encode(sk.mac_key)),
                ("search term key", hex::encode(sk.term_key)),
            ]
            .into_iter()
            .collect();
            (r.name.as_str(), keys)
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&map)?);
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let password = read_password()?;
    if password.is_empty() {
        return Err(VaultError::EmptyPassword.into());
    }

    match cli.command {
        Commands::Encrypt { files } => {
            let reports = batch::encrypt_batch(&files, &password)?;
            if cli.json {
                print_master_map(&reports.iter().collect::<Vec<_>>())?;
            }
        }
        Commands::Decrypt { files } => {
            let reports = batch::decrypt_batch(&files, &password)?;
            let mut decrypted = Vec::new();
            for report in &reports {
                match report {
                    DecryptReport::Decrypted(r) => decrypted.push(r),
                    DecryptReport::Tampered(name) => {
                        println!("{name} has been tampered with and has not been decrypted");
                    }
                }
            }
            if cli.json {
                print_master_map(&decrypted)?;
                print_subkey_map(&decrypted)?;
            }
        }
        Commands::Search { terms } => {
            let outcome = batch::search_batch(Path::new("."), &terms, &password)?;
            for name in &outcome.skipped {
                eprintln!("The password did not match for {name}, skipping");
            }
            for (query, hits) in &outcome.matches {
                for hit in hits {
                    println!("{hit} contains \"{query}\"");
                }
            }
            if cli.json {
                print_master_map(&outcome.reports.iter().collect::<Vec<_>>())?;
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{e}");
        process::exit(1);
    }
}
