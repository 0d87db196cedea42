//! Signers for EIP-712 digests.
//!
//! The [`Signer`] trait is the whole contract: an address and a way to sign
//! a [`Digest`]. Two implementations exist:
//!
//! - [`KeySigner`] signs in-process with a private key, either supplied
//!   directly or derived from a mnemonic
//! - [`DeviceSigner`] forwards the digest, and the EIP-712 envelope when
//!   known, to a hardware wallet session
//!
//! Both return signatures with `v` in `{27, 28}`, and both report an
//! address that never changes over the signer's lifetime.
//!
//! # Example
//!
//! ```
//! use eip712_signer_core::{Digest, KeySigner, Signer};
//!
//! let mut signer = KeySigner::from_hex(
//!     "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
//! )
//! .unwrap();
//!
//! let sig = signer.sign(&Digest::from([0x01; 32])).unwrap();
//! assert!(sig.v() == 27 || sig.v() == 28);
//! ```

use core::fmt;

use tracing::{debug, warn};

use crate::address::Address;
use crate::crypto::{recover_address, sign_prehash};
use crate::derivation::{RawPrivateKey, derive};
use crate::device::{Account, DeviceHub, SessionGuard};
use crate::digest::{Digest, SigningRequest};
use crate::error::{Error, Result};
use crate::path::DerivationPath;
use crate::signature::Signature;

/// Something that can sign EIP-712 digests for one account.
pub trait Signer {
    /// Returns the account address.
    fn address(&self) -> Address;

    /// Signs a digest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Signing`] for in-process failures, or a device error
    /// if a hardware wallet rejects or aborts the request.
    fn sign(&mut self, digest: &Digest) -> Result<Signature>;

    /// Signs a request, which may carry the EIP-712 envelope alongside the
    /// digest.
    ///
    /// In-process signers only need the digest. Hardware wallets override
    /// this to forward the envelope.
    ///
    /// # Errors
    ///
    /// Same as [`Signer::sign`].
    fn sign_request(&mut self, request: &SigningRequest) -> Result<Signature> {
        self.sign(request.digest())
    }
}

/// Signs with a private key held in process memory.
pub struct KeySigner {
    key: RawPrivateKey,
    address: Address,
}

impl KeySigner {
    /// Wraps a private key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyDecode`] if the key is not a valid scalar.
    pub fn new(key: RawPrivateKey) -> Result<Self> {
        let address = key.address()?;
        Ok(Self { key, address })
    }

    /// Builds a signer from a hex private key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPrivateKeyEncoding`] if the key is malformed.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        Self::new(RawPrivateKey::from_hex(hex_str)?)
    }

    /// Builds a signer for the key at `path` under a BIP39 phrase.
    ///
    /// # Errors
    ///
    /// Returns any error of [`derive`].
    pub fn from_mnemonic(mnemonic: &str, path: &DerivationPath) -> Result<Self> {
        Self::new(derive(mnemonic, path)?)
    }
}

impl Signer for KeySigner {
    fn address(&self) -> Address {
        self.address
    }

    fn sign(&mut self, digest: &Digest) -> Result<Signature> {
        // The expanded key lives only for this call.
        let signing_key = self.key.signing_key()?;
        sign_prehash(&signing_key, digest)
    }
}

impl fmt::Debug for KeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Signs through an open hardware wallet session.
///
/// The session is closed when the signer is dropped.
#[derive(Debug)]
pub struct DeviceSigner {
    guard: SessionGuard,
    account: Account,
}

impl DeviceSigner {
    /// Finds the single connected wallet, opens it and derives `path`.
    ///
    /// # Errors
    ///
    /// - [`Error::NoDeviceFound`] if no wallet is connected
    /// - [`Error::AmbiguousDevice`] if more than one is; none is opened
    /// - [`Error::DeviceLockedOrUnavailable`] if opening fails
    /// - [`Error::DeviceDerivation`] if the account cannot be derived; the
    ///   session is closed before returning
    pub fn connect(hub: &dyn DeviceHub, passphrase: &str, path: &DerivationPath) -> Result<Self> {
        let mut handles = hub
            .enumerate()
            .map_err(|e| e.into_device(Error::DeviceLockedOrUnavailable))?;

        let handle = match handles.len() {
            0 => {
                warn!(target: "eip712_signer", "no hardware wallet connected");
                return Err(Error::NoDeviceFound);
            }
            1 => handles.remove(0),
            count => {
                warn!(target: "eip712_signer", count, "refusing to pick between hardware wallets");
                return Err(Error::AmbiguousDevice { count });
            }
        };

        let device_id = handle.id().to_string();
        let session = handle.open(passphrase).map_err(|e| {
            warn!(
                target: "eip712_signer",
                device = %device_id,
                error = %e,
                "could not open hardware wallet"
            );
            e.into_device(Error::DeviceLockedOrUnavailable)
        })?;
        debug!(target: "eip712_signer", device = %device_id, "opened device session");

        let mut guard = SessionGuard::new(device_id, session);
        let account = guard.session().derive_account(path).map_err(|e| {
            warn!(
                target: "eip712_signer",
                device = %guard.device_id(),
                %path,
                error = %e,
                "device derivation failed"
            );
            e.into_device(Error::DeviceDerivation)
        })?;

        Ok(Self { guard, account })
    }

    /// Returns the derived account.
    #[must_use]
    pub const fn account(&self) -> &Account {
        &self.account
    }

    /// Returns the identifier of the wallet in use.
    #[must_use]
    pub fn device_id(&self) -> &str {
        self.guard.device_id()
    }
}

impl Signer for DeviceSigner {
    fn address(&self) -> Address {
        self.account.address()
    }

    fn sign(&mut self, digest: &Digest) -> Result<Signature> {
        self.sign_request(&SigningRequest::from(*digest))
    }

    fn sign_request(&mut self, request: &SigningRequest) -> Result<Signature> {
        let signature = self
            .guard
            .session()
            .sign_typed_data(&self.account, request)
            .map_err(|e| {
                warn!(target: "eip712_signer", error = %e, "device signing failed");
                e.into_device(Error::DeviceSigning)
            })?;

        check_device_signature(request.digest(), signature, self.account.address())
    }
}

/// Normalizes `v` and checks the signature belongs to `expected`.
fn check_device_signature(
    digest: &Digest,
    signature: Signature,
    expected: Address,
) -> Result<Signature> {
    let signature = signature
        .normalized()
        .map_err(|e| Error::DeviceSigning(format!("device returned {e}")))?;

    let recovered = recover_address(digest, &signature)
        .map_err(|e| Error::DeviceSigning(format!("unusable device signature: {e}")))?;
    if recovered != expected {
        return Err(Error::DeviceSigning(format!(
            "device signed for {recovered}, expected {expected}"
        )));
    }

    Ok(signature)
}

/// A signer for whichever credential source was selected.
#[derive(Debug)]
pub enum CredentialSigner {
    /// In-process key, from a raw private key or a mnemonic.
    Key(KeySigner),
    /// Hardware wallet session.
    Device(DeviceSigner),
}

impl Signer for CredentialSigner {
    fn address(&self) -> Address {
        match self {
            Self::Key(signer) => signer.address(),
            Self::Device(signer) => signer.address(),
        }
    }

    fn sign(&mut self, digest: &Digest) -> Result<Signature> {
        match self {
            Self::Key(signer) => signer.sign(digest),
            Self::Device(signer) => signer.sign(digest),
        }
    }

    fn sign_request(&mut self, request: &SigningRequest) -> Result<Signature> {
        match self {
            Self::Key(signer) => signer.sign_request(request),
            Self::Device(signer) => signer.sign_request(request),
        }
    }
}

impl From<KeySigner> for CredentialSigner {
    fn from(signer: KeySigner) -> Self {
        Self::Key(signer)
    }
}

impl From<DeviceSigner> for CredentialSigner {
    fn from(signer: DeviceSigner) -> Self {
        Self::Device(signer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANVIL_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_PHRASE: &str = "test test test test test test test test test test test junk";

    #[test]
    fn key_signer_from_hex_and_mnemonic_agree() {
        let mut from_hex = KeySigner::from_hex(ANVIL_KEY).unwrap();
        let mut from_phrase =
            KeySigner::from_mnemonic(TEST_PHRASE, &DerivationPath::default()).unwrap();
        assert_eq!(from_hex.address(), from_phrase.address());

        let digest = Digest::from([0x42; 32]);
        assert_eq!(
            from_hex.sign(&digest).unwrap(),
            from_phrase.sign(&digest).unwrap()
        );
    }

    #[test]
    fn key_signer_address_stable_across_sign() {
        let mut signer = KeySigner::from_hex(ANVIL_KEY).unwrap();
        let before = signer.address();
        signer.sign(&Digest::from([0x42; 32])).unwrap();
        assert_eq!(signer.address(), before);
    }

    #[test]
    fn key_signer_rejects_zero_digest() {
        let mut signer = KeySigner::from_hex(ANVIL_KEY).unwrap();
        let err = signer.sign(&Digest::from([0u8; 32])).unwrap_err();
        assert!(matches!(err, Error::Signing(_)));
    }

    #[test]
    fn key_signer_debug_hides_key() {
        let signer = KeySigner::from_hex(ANVIL_KEY).unwrap();
        let debug = format!("{signer:?}");
        assert!(!debug.contains("ac0974"));
        assert!(debug.contains("address"));
    }

    #[test]
    fn check_device_signature_normalizes_raw_v() {
        let mut signer = KeySigner::from_hex(ANVIL_KEY).unwrap();
        let digest = Digest::from([0x42; 32]);
        let sig = signer.sign(&digest).unwrap();
        let raw = Signature::new(*sig.r(), *sig.s(), sig.v() - 27);

        let checked = check_device_signature(&digest, raw, signer.address()).unwrap();
        assert_eq!(checked, sig);

        let checked = check_device_signature(&digest, sig, signer.address()).unwrap();
        assert_eq!(checked, sig);
    }

    #[test]
    fn check_device_signature_rejects_bad_v() {
        let mut signer = KeySigner::from_hex(ANVIL_KEY).unwrap();
        let digest = Digest::from([0x42; 32]);
        let sig = signer.sign(&digest).unwrap();
        let bad = Signature::new(*sig.r(), *sig.s(), 37);

        let err = check_device_signature(&digest, bad, signer.address()).unwrap_err();
        assert!(matches!(err, Error::DeviceSigning(_)));
    }

    #[test]
    fn check_device_signature_rejects_wrong_account() {
        let mut signer = KeySigner::from_hex(ANVIL_KEY).unwrap();
        let digest = Digest::from([0x42; 32]);
        let sig = signer.sign(&digest).unwrap();

        let err = check_device_signature(&digest, sig, Address::new([0x99; 20])).unwrap_err();
        assert!(matches!(err, Error::DeviceSigning(msg) if msg.contains("expected")));
    }

    #[test]
    fn credential_signer_delegates() {
        let key = KeySigner::from_hex(ANVIL_KEY).unwrap();
        let address = key.address();
        let mut signer = CredentialSigner::from(key);
        assert_eq!(signer.address(), address);
        assert!(signer.sign(&Digest::from([0x42; 32])).is_ok());
    }
}
