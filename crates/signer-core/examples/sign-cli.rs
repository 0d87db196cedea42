//! EIP-712 Signer CLI Example
//!
//! Reads a hex digest from stdin and signs it with exactly one credential
//! source chosen on the command line.
//!
//! # Quick Start
//!
//! ```bash
//! # Raw private key (Anvil account #0)
//! echo 0x$(printf '11%.0s' {1..32}) | cargo run --example sign-cli -- \
//!     --private-key ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80
//!
//! # Mnemonic, second account
//! echo 0x$(printf '11%.0s' {1..32}) | cargo run --example sign-cli -- \
//!     --mnemonic "test test test test test test test test test test test junk" \
//!     --hd-path "m/44'/60'/0'/0/1"
//!
//! # Simulated hardware wallet
//! echo 0x$(printf '11%.0s' {1..32}) | cargo run --example sign-cli -- --device
//! ```
//!
//! # Input
//!
//! Either a 32-byte digest or the full 66-byte EIP-712 envelope
//! (`0x1901 || domainSeparator || structHash`). The envelope is handed to the
//! signer whole, so a hardware wallet sees both hashes.
//!
//! # Options
//!
//! | Option | Description |
//! |--------|-------------|
//! | `--private-key <hex>` | Sign with a raw private key |
//! | `--mnemonic <phrase>` | Sign with a key derived from a BIP39 phrase |
//! | `--device` | Sign with the (simulated) hardware wallet |
//! | `--hd-path <path>` | Derivation path, default `m/44'/60'/0'/0/0` |
//!
//! # Security Notes
//!
//! - Passing secrets as arguments exposes them to other local users through
//!   the process table; this example is for development keys only
//! - The simulated wallet is backed by the public Hardhat test mnemonic

#![expect(unused_crate_dependencies, reason = "needed for CLI example")]

use std::env;
use std::io::{self, Read};
use std::process::ExitCode;

use eip712_signer_core::device::simulation::{SimulatedDevice, SimulatedHub};
use eip712_signer_core::{CredentialSelection, TypedDataPayload, sign_digest, sign_envelope};

const SIMULATED_MNEMONIC: &str = "test test test test test test test test test test test junk";

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| matches!(a.as_str(), "--help" | "-h" | "help")) {
        print_help();
        return ExitCode::SUCCESS;
    }

    let selection = match parse_args(&args) {
        Ok(selection) => selection,
        Err(msg) => {
            eprintln!("{msg}\n");
            print_help();
            return ExitCode::FAILURE;
        }
    };

    let mut input = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input) {
        eprintln!("Error reading from stdin: {e}");
        return ExitCode::FAILURE;
    }

    let data = match decode_input(&input) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Error reading input: {e}");
            return ExitCode::FAILURE;
        }
    };

    let hub = SimulatedHub::new()
        .with_device(SimulatedDevice::new("simulated", SIMULATED_MNEMONIC));

    // A full envelope goes to the wallet as-is; anything else must be a digest.
    let result = if data.len() == TypedDataPayload::BYTE_LEN {
        sign_envelope(&selection, &hub, &data)
    } else {
        sign_digest(&selection, &hub, &data)
    };

    match result {
        Ok(signed) => {
            println!("Data: 0x{}", hex::encode(&data));
            println!("Digest: {}", signed.digest);
            println!("Signer: {}", signed.address);
            println!("Signature: {}", signed.signature);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error signing data: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    println!(
        r#"EIP-712 Signer CLI

USAGE:
    sign-cli (--private-key <hex> | --mnemonic <phrase> | --device) [--hd-path <path>]

Reads a 32-byte digest or a 66-byte EIP-712 envelope, hex encoded, from stdin.

EXAMPLES:
    echo 0x$(printf '11%.0s' {{1..32}}) | cargo run --example sign-cli -- --device
"#
    );
}

fn parse_args(args: &[String]) -> Result<CredentialSelection, String> {
    let mut selection = CredentialSelection::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("Missing value for {arg}"))
        };
        selection = match arg.as_str() {
            "--private-key" => selection.with_private_key(&value()?),
            "--mnemonic" => selection.with_mnemonic(&value()?),
            "--hd-path" => selection.with_hd_path(&value()?),
            "--device" => selection.with_device(),
            other => return Err(format!("Unknown option: {other}")),
        };
    }

    Ok(selection)
}

fn decode_input(input: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let trimmed = input.trim();
    hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
}
