//! Typed-data digests.
//!
//! The signers in this crate consume a [`Digest`]: exactly 32 bytes of
//! caller-supplied hash material, typically the EIP-712 signing hash
//!
//! ```text
//! keccak256("\x19\x01" || domainSeparator || hashStruct(message))
//! ```
//!
//! The digest is opaque here. Callers that hold the 66-byte pre-image can
//! go through [`TypedDataPayload`], which checks the envelope and hashes it.
//! A [`SigningRequest`] carries the digest to a signer together with the
//! envelope when one is known, since hardware wallets display and sign the
//! two hashes rather than the digest.
//!
//! # Example
//!
//! ```
//! use eip712_signer_core::Digest;
//!
//! let digest = Digest::validate(&[0x11; 32]).unwrap();
//! assert_eq!(digest.as_bytes(), &[0x11; 32]);
//!
//! assert!(Digest::validate(&[0x11; 33]).is_err());
//! ```

use core::fmt;

use alloy_primitives::{B256, keccak256};

use crate::error::{Error, Result};

/// An EIP-712 typed-data digest (exactly 32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(B256);

impl Digest {
    /// The only accepted digest length.
    pub const BYTE_LEN: usize = 32;

    /// Checks that `raw` has the digest length and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DigestLength`] carrying the length of `raw` if it is
    /// not [`Self::BYTE_LEN`] bytes.
    pub fn validate(raw: &[u8]) -> Result<Self> {
        let bytes: [u8; Self::BYTE_LEN] = raw.try_into().map_err(|_| Error::DigestLength {
            expected: Self::BYTE_LEN,
            actual: raw.len(),
        })?;
        Ok(Self(B256::new(bytes)))
    }

    /// Decodes a hex digest and validates it.
    ///
    /// Surrounding whitespace and an optional `0x` prefix are accepted. A
    /// length mismatch reports the decoded byte count, not the length of the
    /// text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HexDecodeFailed`] for malformed hex, or
    /// [`Error::DigestLength`] for a well-formed value of the wrong size.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let trimmed = hex_str.trim();
        let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        Self::validate(&hex::decode(trimmed)?)
    }

    /// Returns the digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; Self::BYTE_LEN] {
        &self.0.0
    }

    /// Returns `true` if every byte is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<B256> for Digest {
    fn from(hash: B256) -> Self {
        Self(hash)
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(B256::new(bytes))
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// The 66-byte EIP-712 pre-image, `0x19 0x01 || domainSeparator || structHash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedDataPayload {
    domain_separator: B256,
    struct_hash: B256,
}

impl TypedDataPayload {
    /// The EIP-191 version byte pair for structured data.
    pub const PREFIX: [u8; 2] = [0x19, 0x01];

    /// The length of a full payload.
    pub const BYTE_LEN: usize = 2 + 32 + 32;

    /// Builds a payload from its two hashes.
    #[must_use]
    pub const fn new(domain_separator: B256, struct_hash: B256) -> Self {
        Self {
            domain_separator,
            struct_hash,
        }
    }

    /// Parses a serialized payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTypedDataPayload`] if `bytes` is not 66 bytes
    /// or does not start with `0x1901`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::BYTE_LEN {
            return Err(Error::InvalidTypedDataPayload(format!(
                "expected {} bytes, got {}",
                Self::BYTE_LEN,
                bytes.len()
            )));
        }
        if bytes[..2] != Self::PREFIX {
            return Err(Error::InvalidTypedDataPayload(format!(
                "expected 0x1901 prefix, got 0x{}",
                hex::encode(&bytes[..2])
            )));
        }

        Ok(Self::new(
            B256::from_slice(&bytes[2..34]),
            B256::from_slice(&bytes[34..]),
        ))
    }

    /// Returns the domain separator hash.
    #[must_use]
    pub const fn domain_separator(&self) -> B256 {
        self.domain_separator
    }

    /// Returns the message struct hash.
    #[must_use]
    pub const fn struct_hash(&self) -> B256 {
        self.struct_hash
    }

    /// Serializes the payload to its 66-byte form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::BYTE_LEN] {
        let mut bytes = [0u8; Self::BYTE_LEN];
        bytes[..2].copy_from_slice(&Self::PREFIX);
        bytes[2..34].copy_from_slice(self.domain_separator.as_slice());
        bytes[34..].copy_from_slice(self.struct_hash.as_slice());
        bytes
    }

    /// Hashes the payload into the digest that gets signed.
    #[must_use]
    pub fn digest(&self) -> Digest {
        Digest(keccak256(self.to_bytes()))
    }
}

/// What a signer is asked to sign.
///
/// The digest always matches the payload when one is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningRequest {
    digest: Digest,
    payload: Option<TypedDataPayload>,
}

impl SigningRequest {
    /// Returns the digest to sign.
    #[must_use]
    pub const fn digest(&self) -> &Digest {
        &self.digest
    }

    /// Returns the envelope the digest was computed from, if known.
    #[must_use]
    pub const fn payload(&self) -> Option<&TypedDataPayload> {
        self.payload.as_ref()
    }
}

impl From<Digest> for SigningRequest {
    fn from(digest: Digest) -> Self {
        Self {
            digest,
            payload: None,
        }
    }
}

impl From<TypedDataPayload> for SigningRequest {
    fn from(payload: TypedDataPayload) -> Self {
        Self {
            digest: payload.digest(),
            payload: Some(payload),
        }
    }
}
