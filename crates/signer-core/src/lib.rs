//! EIP-712 Signer Core Library
//!
//! This crate signs a caller-supplied EIP-712 typed-data digest with exactly
//! one of three credential sources:
//!
//! - **Raw private key**: 32 bytes of hex held in process memory
//! - **Mnemonic**: a BIP39 phrase expanded along a BIP32 derivation path
//! - **Hardware wallet**: a connected device that derives and signs internally
//!
//! Whatever the source, the caller gets back the same thing: a 20-byte
//! address and a 65-byte secp256k1 signature whose recovery parameter is
//! `27` or `28`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      External caller                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │   resolver: CredentialSelection → CredentialSigner          │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │   KeySigner                  │   DeviceSigner               │
//! │   ┌──────────┐ ┌─────────┐   │   ┌──────────────────────┐   │
//! │   │derivation│ │ crypto  │   │   │ device: Hub/Handle/  │   │
//! │   │ bip39/32 │ │  k256   │   │   │ Session (+simulation)│   │
//! │   └──────────┘ └─────────┘   │   └──────────────────────┘   │
//! ├──────────────────────────────┴──────────────────────────────┤
//! │   digest · signature · address · path · error               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## Signing with a mnemonic
//!
//! ```rust
//! use eip712_signer_core::device::simulation::SimulatedHub;
//! use eip712_signer_core::{CredentialSelection, sign_digest};
//!
//! let selection = CredentialSelection::default()
//!     .with_mnemonic("test test test test test test test test test test test junk")
//!     .with_hd_path("m/44'/60'/0'/0/1");
//!
//! let digest = [0x5a; 32];
//! let signed = sign_digest(&selection, &SimulatedHub::new(), &digest).unwrap();
//!
//! assert_eq!(
//!     signed.address.to_string(),
//!     "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
//! );
//! assert!(matches!(signed.signature.v(), 27 | 28));
//! ```
//!
//! ## Hashing an EIP-712 envelope
//!
//! ```rust
//! use eip712_signer_core::{KeySigner, Signer, TypedDataPayload};
//!
//! let mut envelope = vec![0x19, 0x01];
//! envelope.extend_from_slice(&[0x11; 32]); // domain separator
//! envelope.extend_from_slice(&[0x22; 32]); // struct hash
//!
//! let digest = TypedDataPayload::parse(&envelope).unwrap().digest();
//!
//! let mut signer = KeySigner::from_hex(
//!     "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
//! )
//! .unwrap();
//! let signature = signer.sign(&digest).unwrap();
//! println!("{} signed {digest}: {signature}", signer.address());
//! ```
//!
//! # Hardware Wallets
//!
//! USB transport is not part of this crate. Implement the
//! [`device::DeviceHub`], [`device::DeviceHandle`] and [`device::Session`]
//! traits for your wallet and pass the hub to [`resolve`]. Exactly one wallet
//! must be connected; with two or more, resolution fails before any of them
//! is opened. Use [`sign_envelope`] when the 66-byte EIP-712 envelope is at
//! hand, so the wallet receives the domain separator and struct hash.
//!
//! # Feature Flags
//!
//! - `simulation` (default): [`device::simulation`], a mnemonic-backed fake
//!   wallet with fault injection, for tests and demos
//!
//! # Logging
//!
//! Resolution steps are emitted as [`tracing`] events with target
//! `eip712_signer`. Keys, mnemonics and passphrases are never logged.
//!
//! # Security Considerations
//!
//! - Private keys and seeds are zeroed when dropped
//! - The expanded signing key exists only for the duration of one `sign` call
//! - Hardware wallet sessions are closed on every exit path
//! - Signatures are deterministic (RFC 6979) and in low-S form

// Modules
pub mod address;
pub mod crypto;
pub mod derivation;
pub mod device;
pub mod digest;
pub mod error;
pub mod path;
pub mod resolver;
pub mod signature;
pub mod signer;

// Re-exports for convenience
pub use address::Address;
pub use derivation::{RawPrivateKey, derive};
pub use device::{Account, DeviceHandle, DeviceHub, Session};
pub use digest::{Digest, SigningRequest, TypedDataPayload};
pub use error::{Error, ErrorKind, MnemonicIssue, Result};
pub use path::{DEFAULT_HD_PATH, DerivationPath};
pub use resolver::{
    CredentialSelection, SignedDigest, resolve, sign_digest, sign_envelope, sign_request,
};
pub use signature::Signature;
pub use signer::{CredentialSigner, DeviceSigner, KeySigner, Signer};

// Re-export commonly used alloy types
pub use alloy_primitives::B256;
