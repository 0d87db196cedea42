//! Mnemonic to private key derivation.
//!
//! [`derive`] turns a BIP39 phrase and a [`DerivationPath`] into a
//! [`RawPrivateKey`]:
//!
//! 1. Validate the phrase against the English wordlist and its checksum
//! 2. Stretch it into a 64-byte seed with an empty passphrase
//! 3. Build the BIP32 master key from the seed
//! 4. Walk the path one child index at a time
//! 5. Take the final 32-byte scalar and check it is a valid secp256k1 key
//!
//! Every step is deterministic, and every intermediate secret is wiped when
//! it goes out of scope.
//!
//! # Example
//!
//! ```
//! use eip712_signer_core::derivation::derive;
//! use eip712_signer_core::path::DerivationPath;
//!
//! let phrase = "test test test test test test test test test test test junk";
//! let key = derive(phrase, &DerivationPath::default()).unwrap();
//! assert_eq!(
//!     key.address().unwrap().to_string(),
//!     "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
//! );
//! ```

use core::fmt;

use bip32::{ChildNumber, XPrv};
use bip39::Mnemonic;
use k256::ecdsa::SigningKey;
use tracing::debug;
use zeroize::Zeroizing;

use crate::address::Address;
use crate::crypto::public_address;
use crate::error::{Error, Result};
use crate::path::{DerivationPath, HARDENED_OFFSET, is_hardened};

/// A 32-byte secp256k1 private scalar.
///
/// The bytes are zeroed on drop and never printed. There is one owner per
/// key; it cannot be cloned:
///
/// ```compile_fail
/// use eip712_signer_core::RawPrivateKey;
///
/// let key = RawPrivateKey::from_hex(
///     "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
/// )
/// .unwrap();
/// let copy: RawPrivateKey = key.clone();
/// ```
pub struct RawPrivateKey(Zeroizing<[u8; 32]>);

impl RawPrivateKey {
    /// The length of a private key in bytes.
    pub const BYTE_LEN: usize = 32;

    /// Decodes a hex private key, with or without `0x`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPrivateKeyEncoding`] if the input is not hex,
    /// is not 32 bytes long, or is zero or not below the curve order.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let trimmed = hex_str.trim();
        let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        let decoded = Zeroizing::new(
            hex::decode(trimmed).map_err(|e| Error::InvalidPrivateKeyEncoding(e.to_string()))?,
        );
        if decoded.len() != Self::BYTE_LEN {
            return Err(Error::InvalidPrivateKeyEncoding(format!(
                "expected {} bytes, got {}",
                Self::BYTE_LEN,
                decoded.len()
            )));
        }

        let mut bytes = Zeroizing::new([0u8; 32]);
        bytes.copy_from_slice(&decoded);
        let key = Self(bytes);
        key.signing_key()
            .map_err(|_| Error::InvalidPrivateKeyEncoding("scalar out of range".to_string()))?;
        Ok(key)
    }

    /// Returns the key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the address controlled by this key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyDecode`] if the bytes are not a valid scalar.
    pub fn address(&self) -> Result<Address> {
        Ok(public_address(&self.signing_key()?))
    }

    /// Builds the curve signing key. The result wipes itself on drop.
    pub(crate) fn signing_key(&self) -> Result<SigningKey> {
        SigningKey::from_slice(self.0.as_slice()).map_err(|e| Error::KeyDecode(e.to_string()))
    }
}

impl fmt::Debug for RawPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawPrivateKey([REDACTED])")
    }
}

/// Checks a phrase and stretches it into the 64-byte BIP39 seed.
///
/// The passphrase is always empty.
///
/// # Errors
///
/// Returns [`Error::InvalidMnemonic`] naming the word count, unknown word,
/// or checksum problem.
pub fn seed_from_mnemonic(phrase: &str) -> Result<Zeroizing<[u8; 64]>> {
    let mnemonic = Mnemonic::parse_normalized(phrase.trim())?;
    Ok(Zeroizing::new(mnemonic.to_seed_normalized("")))
}

/// Derives the private key at `path` from a BIP39 phrase.
///
/// # Errors
///
/// - [`Error::InvalidMnemonic`] if the phrase is malformed
/// - [`Error::SeedDerivation`] if no master key can be built from the seed
/// - [`Error::Derivation`] if a child step yields an invalid key
/// - [`Error::KeyDecode`] if the final scalar is not a valid private key
pub fn derive(mnemonic: &str, path: &DerivationPath) -> Result<RawPrivateKey> {
    let seed = seed_from_mnemonic(mnemonic)?;
    let master = XPrv::new(seed.as_slice()).map_err(|e| Error::SeedDerivation(e.to_string()))?;

    let mut key = master;
    for (depth, &index) in path.iter().enumerate() {
        let step_failed = |reason: String| Error::Derivation {
            depth,
            index,
            reason,
        };
        let child = ChildNumber::new(index & !HARDENED_OFFSET, is_hardened(index))
            .map_err(|e| step_failed(e.to_string()))?;
        key = key
            .derive_child(child)
            .map_err(|e| step_failed(e.to_string()))?;
    }
    debug!(target: "eip712_signer", %path, depth = path.len(), "derived child key");

    let raw = RawPrivateKey(Zeroizing::new(key.private_key().to_bytes().into()));
    raw.signing_key()?;
    Ok(raw)
}
