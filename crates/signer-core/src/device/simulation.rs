//! A deterministic stand-in for real hardware wallets.
//!
//! Each [`SimulatedDevice`] is backed by a mnemonic and derives and signs
//! with the same code paths as the in-process key signer, so its addresses
//! and signatures can be compared byte for byte with [`KeySigner`] output.
//! Devices can be told to misbehave (locked, failing derivation, declining,
//! disconnecting, emitting raw recovery ids or a canned signature). Every
//! session they open or close, and every request they are asked to sign, is
//! recorded in a shared [`SessionLog`].
//!
//! [`KeySigner`]: crate::KeySigner
//!
//! # Example
//!
//! ```
//! use eip712_signer_core::device::simulation::{SimulatedDevice, SimulatedHub};
//! use eip712_signer_core::{CredentialSelection, Digest, Signer, resolve};
//!
//! let phrase = "test test test test test test test test test test test junk";
//! let hub = SimulatedHub::new().with_device(SimulatedDevice::new("nano-1", phrase));
//! let log = hub.log();
//!
//! {
//!     let mut signer = resolve(&CredentialSelection::default().with_device(), &hub).unwrap();
//!     signer.sign(&Digest::from([0x01; 32])).unwrap();
//!     assert_eq!(log.open_sessions(), 1);
//! }
//! assert_eq!(log.open_sessions(), 0);
//! ```

use core::cell::RefCell;
use core::fmt;
use std::rc::Rc;

use zeroize::Zeroizing;

use crate::crypto::sign_prehash;
use crate::derivation::derive;
use crate::device::{Account, DeviceHandle, DeviceHub, Session};
use crate::digest::SigningRequest;
use crate::error::{Error, Result};
use crate::path::DerivationPath;
use crate::signature::Signature;

/// Something that happened to a simulated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session was opened on the named device.
    Opened(String),
    /// A session on the named device was closed.
    Closed(String),
    /// The named device was asked to sign, whatever it answered.
    SignRequested(String, SigningRequest),
}

/// A shared record of session events.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct SessionLog(Rc<RefCell<Vec<SessionEvent>>>);

impl SessionLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: SessionEvent) {
        self.0.borrow_mut().push(event);
    }

    /// Returns a copy of every recorded event, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<SessionEvent> {
        self.0.borrow().clone()
    }

    /// Returns how many sessions were opened.
    #[must_use]
    pub fn opened(&self) -> usize {
        self.count(|e| matches!(e, SessionEvent::Opened(_)))
    }

    /// Returns how many sessions were closed.
    #[must_use]
    pub fn closed(&self) -> usize {
        self.count(|e| matches!(e, SessionEvent::Closed(_)))
    }

    /// Returns how many sessions are still open.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.opened().saturating_sub(self.closed())
    }

    /// Returns every signing request the devices received, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<SigningRequest> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                SessionEvent::SignRequested(_, request) => Some(*request),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&SessionEvent) -> bool) -> usize {
        self.0.borrow().iter().filter(|&e| pred(e)).count()
    }
}

/// How a simulated device answers signing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignBehavior {
    Sign,
    RawRecoveryId,
    Canned(Signature),
    Decline,
    Disconnect,
}

/// A fake hardware wallet holding a mnemonic.
#[derive(Clone)]
pub struct SimulatedDevice {
    id: String,
    mnemonic: Zeroizing<String>,
    passphrase: Option<Zeroizing<String>>,
    locked: bool,
    fail_derivation: bool,
    behavior: SignBehavior,
    log: SessionLog,
}

impl SimulatedDevice {
    /// Creates a well-behaved device backed by `mnemonic`.
    #[must_use]
    pub fn new(id: impl Into<String>, mnemonic: &str) -> Self {
        Self {
            id: id.into(),
            mnemonic: Zeroizing::new(mnemonic.to_string()),
            passphrase: None,
            locked: false,
            fail_derivation: false,
            behavior: SignBehavior::Sign,
            log: SessionLog::new(),
        }
    }

    /// Refuses to open, as a locked device would.
    #[must_use]
    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    /// Only opens when given this passphrase.
    #[must_use]
    pub fn with_passphrase(mut self, passphrase: &str) -> Self {
        self.passphrase = Some(Zeroizing::new(passphrase.to_string()));
        self
    }

    /// Fails every account derivation.
    #[must_use]
    pub fn failing_derivation(mut self) -> Self {
        self.fail_derivation = true;
        self
    }

    /// Rejects every signing request, as if the user pressed "reject".
    #[must_use]
    pub fn declining(mut self) -> Self {
        self.behavior = SignBehavior::Decline;
        self
    }

    /// Drops off the bus when asked to sign.
    #[must_use]
    pub fn disconnecting(mut self) -> Self {
        self.behavior = SignBehavior::Disconnect;
        self
    }

    /// Returns signatures with `v` in `{0, 1}` instead of `{27, 28}`.
    #[must_use]
    pub fn raw_recovery_ids(mut self) -> Self {
        self.behavior = SignBehavior::RawRecoveryId;
        self
    }

    /// Returns `signature` for every request, whatever the digest.
    #[must_use]
    pub fn with_canned_signature(mut self, signature: Signature) -> Self {
        self.behavior = SignBehavior::Canned(signature);
        self
    }

    /// Returns the device identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Debug for SimulatedDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedDevice")
            .field("id", &self.id)
            .field("mnemonic", &"[REDACTED]")
            .field("locked", &self.locked)
            .field("fail_derivation", &self.fail_derivation)
            .field("behavior", &self.behavior)
            .finish_non_exhaustive()
    }
}

impl DeviceHandle for SimulatedDevice {
    fn id(&self) -> &str {
        &self.id
    }

    fn open(self: Box<Self>, passphrase: &str) -> Result<Box<dyn Session>> {
        if self.locked {
            return Err(Error::DeviceLockedOrUnavailable(format!(
                "{} is locked",
                self.id
            )));
        }
        if let Some(expected) = &self.passphrase
            && expected.as_str() != passphrase
        {
            return Err(Error::DeviceLockedOrUnavailable(format!(
                "{}: wrong passphrase",
                self.id
            )));
        }

        self.log.push(SessionEvent::Opened(self.id.clone()));
        Ok(Box::new(SimulatedSession {
            device: *self,
            connected: true,
            closed: false,
        }))
    }
}

struct SimulatedSession {
    device: SimulatedDevice,
    connected: bool,
    closed: bool,
}

impl SimulatedSession {
    fn ensure_connected(&self, wrap: fn(String) -> Error) -> Result<()> {
        if self.connected && !self.closed {
            Ok(())
        } else {
            Err(wrap(format!("{} is not connected", self.device.id)))
        }
    }
}

impl Session for SimulatedSession {
    fn derive_account(&mut self, path: &DerivationPath) -> Result<Account> {
        self.ensure_connected(Error::DeviceDerivation)?;
        if self.device.fail_derivation {
            return Err(Error::DeviceDerivation(format!(
                "{} could not derive {path}",
                self.device.id
            )));
        }

        let address = derive(&self.device.mnemonic, path)
            .and_then(|key| key.address())
            .map_err(|e| Error::DeviceDerivation(e.to_string()))?;
        Ok(Account::new(address, path.clone()))
    }

    fn sign_typed_data(
        &mut self,
        account: &Account,
        request: &SigningRequest,
    ) -> Result<Signature> {
        self.ensure_connected(Error::DeviceSigning)?;
        self.device
            .log
            .push(SessionEvent::SignRequested(self.device.id.clone(), *request));

        match self.device.behavior {
            SignBehavior::Decline => {
                return Err(Error::DeviceSigning("user declined on device".to_string()));
            }
            SignBehavior::Disconnect => {
                self.connected = false;
                return Err(Error::DeviceSigning(format!(
                    "{} disconnected",
                    self.device.id
                )));
            }
            SignBehavior::Canned(signature) => return Ok(signature),
            SignBehavior::Sign | SignBehavior::RawRecoveryId => {}
        }

        let key = derive(&self.device.mnemonic, account.path())
            .and_then(|key| key.signing_key())
            .map_err(|e| Error::DeviceSigning(e.to_string()))?;
        let signature = sign_prehash(&key, request.digest())
            .map_err(|e| Error::DeviceSigning(e.to_string()))?;

        if self.device.behavior == SignBehavior::RawRecoveryId {
            Ok(Signature::new(
                *signature.r(),
                *signature.s(),
                signature.v() - Signature::RECOVERY_ID_OFFSET,
            ))
        } else {
            Ok(signature)
        }
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.device
                .log
                .push(SessionEvent::Closed(self.device.id.clone()));
        }
    }
}

/// A fake bus holding any number of [`SimulatedDevice`]s.
#[derive(Debug, Clone, Default)]
pub struct SimulatedHub {
    devices: Vec<SimulatedDevice>,
    log: SessionLog,
}

impl SimulatedHub {
    /// Creates a hub with no devices attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a device. Its sessions are recorded in this hub's log.
    #[must_use]
    pub fn with_device(mut self, mut device: SimulatedDevice) -> Self {
        device.log = self.log.clone();
        self.devices.push(device);
        self
    }

    /// Returns the shared session log.
    #[must_use]
    pub fn log(&self) -> SessionLog {
        self.log.clone()
    }
}

impl DeviceHub for SimulatedHub {
    fn enumerate(&self) -> Result<Vec<Box<dyn DeviceHandle>>> {
        Ok(self
            .devices
            .iter()
            .cloned()
            .map(|device| Box::new(device) as Box<dyn DeviceHandle>)
            .collect())
    }
}
