//! Ethereum signature types for secp256k1 ECDSA.
//!
//! This module provides the [`Signature`] type returned by every signer in
//! this crate, whichever credential source produced it.
//!
//! # Signature Format
//!
//! Ethereum signatures consist of three components:
//!
//! - `r`: The x-coordinate of the ephemeral public key (32 bytes)
//! - `s`: The signature scalar (32 bytes)
//! - `v`: The recovery parameter, always `27` or `28`
//!
//! The curve itself yields a recovery id of `0` or `1`; it is offset by
//! [`Signature::RECOVERY_ID_OFFSET`] before it leaves the crate.
//!
//! # Example
//!
//! ```
//! use eip712_signer_core::Signature;
//!
//! let sig = Signature::from_parts([1u8; 32], [2u8; 32], 1).unwrap();
//! assert_eq!(sig.v(), 28);
//! assert_eq!(sig.recovery_id(), Some(1));
//! ```

use core::fmt;

use crate::error::{Error, Result};

/// An Ethereum ECDSA signature over secp256k1.
///
/// # Wire Format
///
/// Encoded as 65 bytes: `r (32 bytes) || s (32 bytes) || v (1 byte)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// The R component of the signature (32 bytes).
    r: [u8; 32],

    /// The S component of the signature (32 bytes).
    s: [u8; 32],

    /// The recovery parameter.
    v: u8,
}

/// Maps a recovery parameter onto the `{27, 28}` convention.
///
/// Values already in the convention are returned unchanged, raw curve ids
/// `0` and `1` are offset by 27. Anything else has no meaning and yields
/// [`None`].
///
/// # Example
///
/// ```
/// use eip712_signer_core::signature::normalize_v;
///
/// assert_eq!(normalize_v(0), Some(27));
/// assert_eq!(normalize_v(28), Some(28));
/// assert_eq!(normalize_v(37), None);
/// ```
#[must_use]
pub const fn normalize_v(v: u8) -> Option<u8> {
    match v {
        0 | 1 => Some(v + Signature::RECOVERY_ID_OFFSET),
        27 | 28 => Some(v),
        _ => None,
    }
}

impl Signature {
    /// The length of a serialized signature in bytes.
    pub const BYTE_LEN: usize = 65;

    /// Offset added to the curve recovery id to form `v`.
    pub const RECOVERY_ID_OFFSET: u8 = 27;

    /// Creates a signature from raw components, storing `v` as given.
    ///
    /// Use [`Signature::from_parts`] when holding a curve recovery id.
    #[must_use]
    pub const fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        Self { r, s, v }
    }

    /// Creates a normalized signature from `r`, `s` and a curve recovery id.
    ///
    /// # Arguments
    ///
    /// * `r` - The R component as a 32-byte array
    /// * `s` - The S component as a 32-byte array
    /// * `recovery_id` - The curve recovery id, `0` or `1`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSignature`] if `recovery_id` is not `0` or `1`.
    pub fn from_parts(r: [u8; 32], s: [u8; 32], recovery_id: u8) -> Result<Self> {
        if recovery_id > 1 {
            return Err(Error::InvalidSignature(format!(
                "recovery id must be 0 or 1, got {recovery_id}"
            )));
        }
        Ok(Self::new(r, s, recovery_id + Self::RECOVERY_ID_OFFSET))
    }

    /// Returns this signature with `v` mapped onto `{27, 28}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSignature`] if `v` is neither a raw curve id
    /// nor already normalized.
    pub fn normalized(self) -> Result<Self> {
        let v = normalize_v(self.v).ok_or_else(|| {
            Error::InvalidSignature(format!("unexpected recovery parameter {}", self.v))
        })?;
        Ok(Self { v, ..self })
    }

    /// Serializes the signature to a 65-byte array (`r || s || v`).
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::BYTE_LEN] {
        let mut bytes = [0u8; Self::BYTE_LEN];
        bytes[0..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.v;
        bytes
    }

    /// Returns the R component of the signature.
    #[must_use]
    pub const fn r(&self) -> &[u8; 32] {
        &self.r
    }

    /// Returns the S component of the signature.
    #[must_use]
    pub const fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// Returns the recovery parameter (v).
    #[must_use]
    pub const fn v(&self) -> u8 {
        self.v
    }

    /// Returns the curve recovery id (`0` or `1`) encoded in `v`.
    ///
    /// Returns [`None`] if `v` is not in the `{27, 28}` convention.
    #[must_use]
    pub const fn recovery_id(&self) -> Option<u8> {
        match self.v {
            27 | 28 => Some(self.v - Self::RECOVERY_ID_OFFSET),
            _ => None,
        }
    }

    /// Encodes the signature as a hex string with `0x` prefix.
    ///
    /// # Example
    ///
    /// ```
    /// use eip712_signer_core::Signature;
    ///
    /// let sig = Signature::new([0u8; 32], [0u8; 32], 27);
    /// let hex = sig.to_hex();
    /// assert!(hex.starts_with("0x"));
    /// assert_eq!(hex.len(), 132); // "0x" + 130 hex chars
    /// ```
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
