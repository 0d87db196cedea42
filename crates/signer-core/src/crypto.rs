//! Cryptographic utilities for secp256k1 ECDSA.
//!
//! This module wraps the two curve operations the signers need:
//!
//! - Signing a 32-byte prehash with a private key ([`sign_prehash`])
//! - Recovering the signing address from a signature ([`recover_address`])
//!
//! Signatures are deterministic (RFC 6979) and always in low-S form, so the
//! same key and digest give the same `(r, s, v)` on every call.
//!
//! # Example
//!
//! ```
//! use eip712_signer_core::crypto::{public_address, recover_address, sign_prehash};
//! use eip712_signer_core::Digest;
//! use k256::ecdsa::SigningKey;
//!
//! let key = SigningKey::from_slice(&[0x42; 32]).unwrap();
//! let digest = Digest::from([0x01; 32]);
//!
//! let sig = sign_prehash(&key, &digest).unwrap();
//! assert_eq!(recover_address(&digest, &sig).unwrap(), public_address(&key));
//! ```

use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey};

use crate::address::Address;
use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::signature::Signature;

/// Returns the address controlled by `key`.
#[must_use]
pub fn public_address(key: &SigningKey) -> Address {
    Address::from_public_key(key.verifying_key())
}

/// Signs a digest with `key`.
///
/// The curve recovery id is offset into the `{27, 28}` convention.
///
/// # Errors
///
/// Returns [`Error::Signing`] if the digest is all zeros or the curve
/// operation fails.
pub fn sign_prehash(key: &SigningKey, digest: &Digest) -> Result<Signature> {
    if digest.is_zero() {
        return Err(Error::Signing("refusing to sign an all-zero digest".to_string()));
    }

    let (sig, recovery_id) = key
        .sign_prehash_recoverable(digest.as_bytes())
        .map_err(|e| Error::Signing(e.to_string()))?;

    let (r, s) = sig.split_bytes();
    Signature::from_parts(r.into(), s.into(), recovery_id.to_byte())
}

/// Recovers the address that produced `signature` over `digest`.
///
/// # Errors
///
/// Returns [`Error::InvalidSignature`] if `v` is not 27 or 28, the scalars
/// are out of range, or no public key verifies the signature.
pub fn recover_address(digest: &Digest, signature: &Signature) -> Result<Address> {
    let recovery_id = signature
        .recovery_id()
        .and_then(RecoveryId::from_byte)
        .ok_or_else(|| {
            Error::InvalidSignature(format!(
                "unexpected recovery parameter {}",
                signature.v()
            ))
        })?;

    let sig = K256Signature::from_slice(&signature.to_bytes()[..64])
        .map_err(|e| Error::InvalidSignature(e.to_string()))?;

    let public_key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &sig, recovery_id)
        .map_err(|e| Error::InvalidSignature(e.to_string()))?;

    Ok(Address::from_public_key(&public_key))
}
