//! Hardware wallet collaborator interface.
//!
//! The USB transport and wire protocol of a hardware wallet live outside this
//! crate. What the signer needs from a wallet is captured by three traits:
//!
//! - [`DeviceHub`]: lists the wallets currently connected
//! - [`DeviceHandle`]: one connected wallet, which can be opened
//! - [`Session`]: an open wallet that derives accounts and signs requests
//!
//! Private keys never leave the device; a session only hands back addresses
//! and signatures.
//!
//! # Session lifetime
//!
//! A session is owned by exactly one [`DeviceSigner`](crate::DeviceSigner),
//! which closes it when dropped. This covers every exit path, including a
//! failed account derivation right after opening.
//!
//! # Example
//!
//! ```
//! # #[cfg(feature = "simulation")]
//! # {
//! use eip712_signer_core::device::DeviceHub;
//! use eip712_signer_core::device::simulation::{SimulatedDevice, SimulatedHub};
//!
//! let phrase = "test test test test test test test test test test test junk";
//! let hub = SimulatedHub::new().with_device(SimulatedDevice::new("nano-1", phrase));
//!
//! let handles = hub.enumerate().unwrap();
//! assert_eq!(handles.len(), 1);
//! assert_eq!(handles[0].id(), "nano-1");
//! # }
//! ```

#[cfg(feature = "simulation")]
pub mod simulation;

use core::fmt;

use tracing::debug;

use crate::address::Address;
use crate::digest::SigningRequest;
use crate::error::Result;
use crate::path::DerivationPath;
use crate::signature::Signature;

/// An account derived on a hardware wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    address: Address,
    path: DerivationPath,
}

impl Account {
    /// Creates an account record.
    #[must_use]
    pub const fn new(address: Address, path: DerivationPath) -> Self {
        Self { address, path }
    }

    /// Returns the account address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Returns the path the account was derived at.
    #[must_use]
    pub const fn path(&self) -> &DerivationPath {
        &self.path
    }
}

/// Discovers connected hardware wallets.
pub trait DeviceHub {
    /// Lists every wallet currently connected.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus cannot be scanned.
    fn enumerate(&self) -> Result<Vec<Box<dyn DeviceHandle>>>;
}

/// A connected, not yet opened, hardware wallet.
pub trait DeviceHandle {
    /// Returns a stable identifier for log output (a serial or bus path).
    fn id(&self) -> &str;

    /// Opens a session on the wallet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceLockedOrUnavailable`](crate::Error::DeviceLockedOrUnavailable)
    /// if the wallet is locked or cannot be reached.
    fn open(self: Box<Self>, passphrase: &str) -> Result<Box<dyn Session>>;
}

/// An open session on a hardware wallet.
pub trait Session {
    /// Derives the account at `path` using the wallet's own key tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceDerivation`](crate::Error::DeviceDerivation) on failure.
    fn derive_account(&mut self, path: &DerivationPath) -> Result<Account>;

    /// Asks the wallet to sign `request` with `account`.
    ///
    /// When the request carries a [`TypedDataPayload`](crate::TypedDataPayload),
    /// wallets that show the domain and message hashes should sign those;
    /// otherwise only the digest is available. This may block until the user
    /// confirms on the device.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceSigning`](crate::Error::DeviceSigning) if the
    /// user declines or the wallet goes away.
    fn sign_typed_data(&mut self, account: &Account, request: &SigningRequest) -> Result<Signature>;

    /// Releases the session. Called exactly once.
    fn close(&mut self);
}

/// Sole owner of an open [`Session`]; closes it on drop.
pub(crate) struct SessionGuard {
    device_id: String,
    session: Box<dyn Session>,
}

impl SessionGuard {
    pub(crate) fn new(device_id: String, session: Box<dyn Session>) -> Self {
        Self {
            device_id,
            session,
        }
    }

    pub(crate) fn device_id(&self) -> &str {
        &self.device_id
    }

    pub(crate) fn session(&mut self) -> &mut dyn Session {
        self.session.as_mut()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.session.close();
        debug!(target: "eip712_signer", device = %self.device_id, "closed device session");
    }
}

impl fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGuard")
            .field("device_id", &self.device_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    /// A session that only counts how often it was closed.
    struct CountingSession {
        closes: Rc<Cell<u32>>,
    }

    impl Session for CountingSession {
        fn derive_account(&mut self, path: &DerivationPath) -> Result<Account> {
            Ok(Account::new(Address::new([0x11; 20]), path.clone()))
        }

        fn sign_typed_data(
            &mut self,
            _account: &Account,
            _request: &SigningRequest,
        ) -> Result<Signature> {
            Err(crate::Error::DeviceSigning("not supported".to_string()))
        }

        fn close(&mut self) {
            self.closes.set(self.closes.get() + 1);
        }
    }

    #[test]
    fn guard_closes_once_on_drop() {
        let closes = Rc::new(Cell::new(0));
        let guard = SessionGuard::new(
            "mock".to_string(),
            Box::new(CountingSession {
                closes: Rc::clone(&closes),
            }),
        );
        assert_eq!(guard.device_id(), "mock");
        assert_eq!(closes.get(), 0);

        drop(guard);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn guard_forwards_to_session() {
        let closes = Rc::new(Cell::new(0));
        let mut guard = SessionGuard::new(
            "mock".to_string(),
            Box::new(CountingSession {
                closes: Rc::clone(&closes),
            }),
        );

        let path = DerivationPath::default();
        let account = guard.session().derive_account(&path).unwrap();
        assert_eq!(account.path(), &path);
        assert_eq!(account.address(), Address::new([0x11; 20]));
        assert!(format!("{guard:?}").contains("mock"));
    }
}
