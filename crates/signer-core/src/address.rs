//! Ethereum account addresses.
//!
//! An address is the last 20 bytes of the Keccak-256 hash of the
//! uncompressed secp256k1 public key with its `0x04` prefix removed:
//!
//! 1. Encode the public key as an uncompressed SEC1 point (65 bytes)
//! 2. Drop the `0x04` tag, keeping `x || y` (64 bytes)
//! 3. Hash with Keccak-256
//! 4. Keep bytes `12..32`
//!
//! Addresses display in EIP-55 mixed-case checksum form.
//!
//! # Example
//!
//! ```
//! use eip712_signer_core::{KeySigner, Signer};
//!
//! let signer = KeySigner::from_hex(
//!     "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
//! )
//! .unwrap();
//! assert_eq!(
//!     signer.address().to_string(),
//!     "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
//! );
//! ```

use std::fmt;

use alloy_primitives::{Address as AlloyAddress, keccak256};
use k256::ecdsa::VerifyingKey;

/// A 20-byte Ethereum account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(AlloyAddress);

impl Address {
    /// The length of an address in bytes.
    pub const BYTE_LEN: usize = 20;

    /// Creates an address from its raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; Self::BYTE_LEN]) -> Self {
        Self(AlloyAddress::new(bytes))
    }

    /// Derives the address of a secp256k1 public key.
    #[must_use]
    pub fn from_public_key(public_key: &VerifyingKey) -> Self {
        let encoded = public_key.to_encoded_point(false);
        Self::hash_coordinates(&encoded.as_bytes()[1..])
    }

    fn hash_coordinates(coordinates: &[u8]) -> Self {
        let hash = keccak256(coordinates);
        let mut bytes = [0u8; Self::BYTE_LEN];
        bytes.copy_from_slice(&hash[12..]);
        Self::new(bytes)
    }

    /// Returns the EIP-55 checksummed hex form, `0x`-prefixed.
    #[must_use]
    pub fn to_checksum_hex(&self) -> String {
        self.0.to_checksum(None)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum_hex())
    }
}
