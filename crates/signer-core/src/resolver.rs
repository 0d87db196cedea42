//! Credential selection and signer construction.
//!
//! A [`CredentialSelection`] names at most one of three credential sources:
//! a hex private key, a BIP39 mnemonic, or a connected hardware wallet.
//! [`resolve`] checks that exactly one is set and builds the matching
//! [`CredentialSigner`]. [`sign_digest`] runs the whole pipeline for a single
//! digest and returns the address and signature together; [`sign_envelope`]
//! does the same for a 66-byte EIP-712 envelope.
//!
//! The selection can be deserialized, so callers may keep it in a config
//! file:
//!
//! ```json
//! { "mnemonic": "test test test ... junk", "hd_path": "m/44'/60'/0'/0/3" }
//! ```
//!
//! # Example
//!
//! ```
//! use eip712_signer_core::device::simulation::SimulatedHub;
//! use eip712_signer_core::{CredentialSelection, sign_digest};
//!
//! let selection = CredentialSelection::default()
//!     .with_mnemonic("test test test test test test test test test test test junk");
//!
//! let signed = sign_digest(&selection, &SimulatedHub::new(), &[0x01; 32]).unwrap();
//! assert_eq!(
//!     signed.address.to_string(),
//!     "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
//! );
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::address::Address;
use crate::device::DeviceHub;
use crate::digest::{Digest, SigningRequest, TypedDataPayload};
use crate::error::{Error, Result};
use crate::path::{DEFAULT_HD_PATH, DerivationPath};
use crate::signature::Signature;
use crate::signer::{CredentialSigner, DeviceSigner, KeySigner, Signer};

/// Which credential source to sign with, plus its parameters.
///
/// Empty strings count as unset. Secrets are wiped on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CredentialSelection {
    /// Hex private key, with or without `0x`.
    #[serde(default)]
    pub private_key: Option<String>,
    /// BIP39 mnemonic phrase.
    #[serde(default)]
    pub mnemonic: Option<String>,
    /// Sign with the single connected hardware wallet.
    #[serde(default)]
    pub use_device: bool,
    /// Derivation path for the mnemonic and hardware wallet sources.
    #[serde(default = "default_hd_path")]
    pub hd_path: String,
    /// Passphrase used to open the hardware wallet.
    #[serde(default)]
    pub device_passphrase: String,
}

fn default_hd_path() -> String {
    DEFAULT_HD_PATH.to_string()
}

impl Default for CredentialSelection {
    fn default() -> Self {
        Self {
            private_key: None,
            mnemonic: None,
            use_device: false,
            hd_path: default_hd_path(),
            device_passphrase: String::new(),
        }
    }
}

impl CredentialSelection {
    /// Selects a hex private key.
    #[must_use]
    pub fn with_private_key(mut self, hex: &str) -> Self {
        self.private_key = Some(hex.to_string());
        self
    }

    /// Selects a mnemonic phrase.
    #[must_use]
    pub fn with_mnemonic(mut self, phrase: &str) -> Self {
        self.mnemonic = Some(phrase.to_string());
        self
    }

    /// Selects the connected hardware wallet.
    #[must_use]
    pub fn with_device(mut self) -> Self {
        self.use_device = true;
        self
    }

    /// Sets the derivation path.
    #[must_use]
    pub fn with_hd_path(mut self, path: &str) -> Self {
        self.hd_path = path.to_string();
        self
    }

    /// Sets the hardware wallet passphrase.
    #[must_use]
    pub fn with_device_passphrase(mut self, passphrase: &str) -> Self {
        self.device_passphrase = passphrase.to_string();
        self
    }

    /// Returns how many credential sources are set.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        [
            nonempty(self.private_key.as_deref()).is_some(),
            nonempty(self.mnemonic.as_deref()).is_some(),
            self.use_device,
        ]
        .into_iter()
        .filter(|&selected| selected)
        .count()
    }
}

impl fmt::Debug for CredentialSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("CredentialSelection")
            .field("private_key", &redact(&self.private_key))
            .field("mnemonic", &redact(&self.mnemonic))
            .field("use_device", &self.use_device)
            .field("hd_path", &self.hd_path)
            .finish_non_exhaustive()
    }
}

/// Builds the signer for the selected credential source.
///
/// # Errors
///
/// - [`Error::AmbiguousCredentialSelection`] unless exactly one source is set
/// - [`Error::InvalidDerivationPath`] if `hd_path` is malformed
/// - any error of [`KeySigner::from_hex`], [`KeySigner::from_mnemonic`] or
///   [`DeviceSigner::connect`] for the chosen source
pub fn resolve(selection: &CredentialSelection, hub: &dyn DeviceHub) -> Result<CredentialSigner> {
    let selected = selection.selected_count();
    if selected != 1 {
        return Err(Error::AmbiguousCredentialSelection { selected });
    }

    let path = DerivationPath::parse(&selection.hd_path)?;

    let signer: CredentialSigner = if let Some(hex) = nonempty(selection.private_key.as_deref()) {
        debug!(target: "eip712_signer", "using raw private key");
        KeySigner::from_hex(hex)?.into()
    } else if let Some(phrase) = nonempty(selection.mnemonic.as_deref()) {
        debug!(target: "eip712_signer", %path, "deriving key from mnemonic");
        KeySigner::from_mnemonic(phrase, &path)?.into()
    } else {
        debug!(target: "eip712_signer", %path, "using hardware wallet");
        DeviceSigner::connect(hub, &selection.device_passphrase, &path)?.into()
    };

    info!(target: "eip712_signer", address = %signer.address(), "signer ready");
    Ok(signer)
}

fn nonempty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// The outcome of [`sign_digest`] and [`sign_envelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedDigest {
    /// The digest that was signed.
    pub digest: Digest,
    /// The signing account.
    pub address: Address,
    /// The signature, `v` in `{27, 28}`.
    pub signature: Signature,
}

/// Validates `raw_digest`, resolves a signer and signs.
///
/// The digest is checked before any credential is touched. Any hardware
/// wallet session is closed before this returns.
///
/// # Errors
///
/// Returns [`Error::DigestLength`] for a digest that is not 32 bytes, or any
/// error of [`sign_request`].
pub fn sign_digest(
    selection: &CredentialSelection,
    hub: &dyn DeviceHub,
    raw_digest: &[u8],
) -> Result<SignedDigest> {
    let digest = Digest::validate(raw_digest)?;
    sign_request(selection, hub, &digest.into())
}

/// Parses the 66-byte EIP-712 envelope, resolves a signer and signs.
///
/// A hardware wallet receives the domain separator and struct hash, not
/// just their digest.
///
/// # Errors
///
/// Returns [`Error::InvalidTypedDataPayload`] for a malformed envelope, or
/// any error of [`sign_request`].
pub fn sign_envelope(
    selection: &CredentialSelection,
    hub: &dyn DeviceHub,
    envelope: &[u8],
) -> Result<SignedDigest> {
    let payload = TypedDataPayload::parse(envelope)?;
    sign_request(selection, hub, &payload.into())
}

/// Resolves a signer and signs `request`.
///
/// # Errors
///
/// Returns any error of [`resolve`] and [`Signer::sign_request`].
pub fn sign_request(
    selection: &CredentialSelection,
    hub: &dyn DeviceHub,
    request: &SigningRequest,
) -> Result<SignedDigest> {
    let mut signer = resolve(selection, hub)?;

    let address = signer.address();
    let signature = signer.sign_request(request)?;

    Ok(SignedDigest {
        digest: *request.digest(),
        address,
        signature,
    })
}
