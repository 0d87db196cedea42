//! Error types for the EIP-712 signer library.
//!
//! This module provides a single error type [`enum@Error`] covering every
//! failure mode of resolving a credential source and signing a digest with it.
//!
//! # Error Categories
//!
//! - **Input errors**: malformed digests and ambiguous credential selections
//! - **Credential errors**: bad mnemonics, private keys, and derivation paths
//! - **Device errors**: hardware wallet discovery, unlocking, and signing
//! - **Cryptographic errors**: failures of the signing primitive itself
//!
//! Every error is fatal to the operation that produced it. Nothing in this
//! crate retries, and no operation returns a partial result.
//!
//! # Example
//!
//! ```
//! use eip712_signer_core::{Error, ErrorKind};
//!
//! let err = Error::DigestLength { expected: 32, actual: 31 };
//! assert_eq!(err.kind(), ErrorKind::Input);
//! ```

use core::fmt;
use core::result::Result as CoreResult;

use hex::FromHexError;
use thiserror::Error;

/// The main error type for the EIP-712 signer library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Input Errors
    // =========================================================================
    /// The digest does not have the accepted fixed length.
    #[error("expected a {expected}-byte digest, got {actual} bytes")]
    DigestLength {
        /// The accepted digest length.
        expected: usize,
        /// The decoded length that was supplied.
        actual: usize,
    },

    /// Zero or more than one credential source was selected.
    #[error(
        "exactly one of private key, mnemonic, or device must be selected ({selected} selected)"
    )]
    AmbiguousCredentialSelection {
        /// How many sources were selected.
        selected: usize,
    },

    /// Hex input could not be decoded.
    #[error("hex decoding failed: {0}")]
    HexDecodeFailed(String),

    /// The EIP-712 envelope is not `0x1901 || domainSeparator || structHash`.
    #[error("invalid EIP-712 payload: {0}")]
    InvalidTypedDataPayload(String),

    // =========================================================================
    // Credential Errors
    // =========================================================================
    /// The mnemonic phrase failed BIP39 validation.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(MnemonicIssue),

    /// The derivation path string is malformed.
    #[error("invalid derivation path: {0}")]
    InvalidDerivationPath(String),

    /// The raw private key is not 32 bytes of hex encoding a valid scalar.
    #[error("invalid private key: {0}")]
    InvalidPrivateKeyEncoding(String),

    /// The master key could not be built from the seed.
    #[error("master key derivation failed: {0}")]
    SeedDerivation(String),

    /// A child derivation step produced an invalid key.
    #[error("child derivation failed at depth {depth} (index {index:#010x}): {reason}")]
    Derivation {
        /// Zero-based position of the failing step in the path.
        depth: usize,
        /// The raw child index, hardening bit included.
        index: u32,
        /// The underlying failure.
        reason: String,
    },

    /// The derived scalar is not a valid secp256k1 private key.
    #[error("derived key could not be decoded: {0}")]
    KeyDecode(String),

    // =========================================================================
    // Device Errors
    // =========================================================================
    /// No hardware wallet is connected.
    #[error("no hardware wallet found, please connect one")]
    NoDeviceFound,

    /// More than one hardware wallet is connected.
    #[error("{count} hardware wallets found, please connect only one")]
    AmbiguousDevice {
        /// How many devices were enumerated.
        count: usize,
    },

    /// The device could not be opened (typically because it is locked).
    #[error("hardware wallet unavailable (is it unlocked?): {0}")]
    DeviceLockedOrUnavailable(String),

    /// The device failed to derive the requested account.
    #[error("hardware wallet account derivation failed: {0}")]
    DeviceDerivation(String),

    /// The device rejected or aborted the signing request.
    #[error("hardware wallet signing failed: {0}")]
    DeviceSigning(String),

    // =========================================================================
    // Cryptographic Errors
    // =========================================================================
    /// The ECDSA signing operation failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The signature bytes are malformed or do not recover a public key.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
}

/// The reason a mnemonic phrase was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MnemonicIssue {
    /// The phrase does not have 12, 15, 18, 21, or 24 words.
    WordCount(usize),
    /// The word at this zero-based position is not in the wordlist.
    UnknownWord(usize),
    /// The checksum bits do not match the entropy.
    Checksum,
    /// Any other BIP39 failure.
    Other(String),
}

impl fmt::Display for MnemonicIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WordCount(n) => write!(f, "expected 12, 15, 18, 21 or 24 words, got {n}"),
            Self::UnknownWord(i) => write!(f, "word #{} is not in the BIP39 wordlist", i + 1),
            Self::Checksum => f.write_str("checksum mismatch"),
            Self::Other(msg) => f.write_str(msg),
        }
    }
}

impl From<bip39::Error> for MnemonicIssue {
    fn from(err: bip39::Error) -> Self {
        match err {
            bip39::Error::BadWordCount(n) => Self::WordCount(n),
            bip39::Error::UnknownWord(i) => Self::UnknownWord(i),
            bip39::Error::InvalidChecksum => Self::Checksum,
            other => Self::Other(other.to_string()),
        }
    }
}

/// The coarse category of an [`enum@Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad digest or bad credential selection.
    Input,
    /// Bad mnemonic, private key, or derivation path.
    Credential,
    /// Hardware wallet failure.
    Device,
    /// Signing primitive failure.
    Crypto,
}

impl Error {
    /// Returns the category this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DigestLength { .. }
            | Self::AmbiguousCredentialSelection { .. }
            | Self::HexDecodeFailed(_)
            | Self::InvalidTypedDataPayload(_) => ErrorKind::Input,
            Self::InvalidMnemonic(_)
            | Self::InvalidDerivationPath(_)
            | Self::InvalidPrivateKeyEncoding(_)
            | Self::SeedDerivation(_)
            | Self::Derivation { .. }
            | Self::KeyDecode(_) => ErrorKind::Credential,
            Self::NoDeviceFound
            | Self::AmbiguousDevice { .. }
            | Self::DeviceLockedOrUnavailable(_)
            | Self::DeviceDerivation(_)
            | Self::DeviceSigning(_) => ErrorKind::Device,
            Self::Signing(_) | Self::InvalidSignature(_) => ErrorKind::Crypto,
        }
    }

    /// Keeps device errors as they are and wraps anything else with `wrap`.
    ///
    /// Device collaborators return crate errors; this pins a failure from a
    /// given collaborator call to the variant that call is documented to fail
    /// with, without losing a more specific device variant.
    pub(crate) fn into_device(self, wrap: fn(String) -> Self) -> Self {
        match self.kind() {
            ErrorKind::Device => self,
            _ => wrap(self.to_string()),
        }
    }
}

impl From<FromHexError> for Error {
    fn from(err: FromHexError) -> Self {
        Error::HexDecodeFailed(err.to_string())
    }
}

impl From<bip39::Error> for Error {
    fn from(err: bip39::Error) -> Self {
        Error::InvalidMnemonic(err.into())
    }
}

/// A specialized [`Result`] type for signer operations.
pub type Result<T> = CoreResult<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::DigestLength {
            expected: 32,
            actual: 33,
        };
        assert_eq!(err.to_string(), "expected a 32-byte digest, got 33 bytes");

        let err = Error::AmbiguousDevice { count: 2 };
        assert_eq!(
            err.to_string(),
            "2 hardware wallets found, please connect only one"
        );

        let err = Error::Derivation {
            depth: 1,
            index: 0x8000_003c,
            reason: "invalid child".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "child derivation failed at depth 1 (index 0x8000003c): invalid child"
        );
    }

    #[test]
    fn error_kinds() {
        assert_eq!(
            Error::AmbiguousCredentialSelection { selected: 0 }.kind(),
            ErrorKind::Input
        );
        assert_eq!(
            Error::InvalidMnemonic(MnemonicIssue::Checksum).kind(),
            ErrorKind::Credential
        );
        assert_eq!(
            Error::InvalidDerivationPath(String::new()).kind(),
            ErrorKind::Credential
        );
        assert_eq!(Error::NoDeviceFound.kind(), ErrorKind::Device);
        assert_eq!(Error::Signing(String::new()).kind(), ErrorKind::Crypto);
    }

    #[test]
    fn into_device_keeps_device_variants() {
        let err = Error::DeviceSigning("declined".to_string());
        let err = err.into_device(Error::DeviceLockedOrUnavailable);
        assert!(matches!(err, Error::DeviceSigning(_)));

        let err = Error::Signing("boom".to_string());
        let err = err.into_device(Error::DeviceLockedOrUnavailable);
        assert!(matches!(err, Error::DeviceLockedOrUnavailable(msg) if msg.contains("boom")));
    }

    #[test]
    fn from_hex_error() {
        let hex_err = FromHexError::InvalidHexCharacter { c: 'g', index: 0 };
        let err: Error = hex_err.into();
        assert!(matches!(err, Error::HexDecodeFailed(_)));
    }

    #[test]
    fn mnemonic_issue_from_bip39() {
        assert_eq!(
            MnemonicIssue::from(bip39::Error::BadWordCount(3)),
            MnemonicIssue::WordCount(3)
        );
        assert_eq!(
            MnemonicIssue::from(bip39::Error::InvalidChecksum),
            MnemonicIssue::Checksum
        );
        assert_eq!(
            MnemonicIssue::UnknownWord(0).to_string(),
            "word #1 is not in the BIP39 wordlist"
        );
    }
}
