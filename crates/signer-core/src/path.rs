//! BIP32 derivation paths.
//!
//! A [`DerivationPath`] is the parsed form of strings like
//! `m/44'/60'/0'/0/0`. The same path drives both the in-process HD
//! derivation of a mnemonic and the account lookup on a hardware wallet.
//!
//! # Syntax
//!
//! ```text
//! m / <index> [ ' | h | H ] / <index> ...
//! ```
//!
//! - The leading `m` is mandatory and at least one index must follow it.
//! - Indices are decimal or `0x`-prefixed hexadecimal.
//! - A trailing `'` (or `h`) marks the index as hardened, which adds
//!   [`HARDENED_OFFSET`] to it.
//! - Whitespace around components is ignored.
//!
//! # Example
//!
//! ```
//! use eip712_signer_core::path::{DerivationPath, HARDENED_OFFSET};
//!
//! let path: DerivationPath = "m/44'/60'/0'/0/7".parse().unwrap();
//! assert_eq!(path.as_slice()[0], 44 + HARDENED_OFFSET);
//! assert_eq!(path.as_slice()[4], 7);
//! assert_eq!(path.to_string(), "m/44'/60'/0'/0/7");
//! ```

use core::fmt;
use core::str::FromStr;

use crate::error::{Error, Result};

/// Offset added to an index to mark it hardened (the top bit).
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// The standard Ethereum account path, `m/44'/60'/0'/0/0`.
pub const DEFAULT_HD_PATH: &str = "m/44'/60'/0'/0/0";

/// An immutable, non-empty sequence of raw BIP32 child indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<u32>);

impl DerivationPath {
    /// Parses a path string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDerivationPath`] if the path does not start
    /// with `m`, has no indices, or contains a component that is not a number
    /// in range.
    pub fn parse(path: &str) -> Result<Self> {
        let mut components = path.split('/');

        match components.next().map(str::trim) {
            Some("m") => {}
            Some("") => {
                return Err(invalid(path, "missing 'm' root before the first '/'"));
            }
            _ => return Err(invalid(path, "path must start with 'm/'")),
        }

        let indices = components
            .map(|component| parse_component(component).map_err(|reason| invalid(path, &reason)))
            .collect::<Result<Vec<_>>>()?;

        if indices.is_empty() {
            return Err(invalid(path, "no child indices after 'm'"));
        }

        Ok(Self(indices))
    }

    /// Returns the raw indices, hardening bit included.
    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// Returns the number of derivation steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; a parsed path has at least one index.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the raw indices.
    pub fn iter(&self) -> core::slice::Iter<'_, u32> {
        self.0.iter()
    }
}

/// Returns whether a raw index has its hardening bit set.
#[must_use]
pub const fn is_hardened(index: u32) -> bool {
    index & HARDENED_OFFSET != 0
}

fn invalid(path: &str, reason: &str) -> Error {
    Error::InvalidDerivationPath(format!("{path:?}: {reason}"))
}

fn parse_component(component: &str) -> core::result::Result<u32, String> {
    let component = component.trim();

    let (digits, offset) = match component.strip_suffix(['\'', 'h', 'H']) {
        Some(rest) => (rest.trim(), HARDENED_OFFSET),
        None => (component, 0),
    };

    if digits.is_empty() {
        return Err("empty path component".to_string());
    }

    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex_digits) => u64::from_str_radix(hex_digits, 16),
        None => digits.parse::<u64>(),
    }
    .map_err(|_| format!("invalid component {digits:?}"))?;

    let max = u64::from(u32::MAX - offset);
    if value > max {
        let range = if offset == 0 { "" } else { "hardened " };
        return Err(format!(
            "component {value} out of allowed {range}range [0, {max}]"
        ));
    }

    u32::try_from(value + u64::from(offset)).map_err(|_| format!("component {value} overflows"))
}

impl Default for DerivationPath {
    fn default() -> Self {
        Self(vec![
            44 + HARDENED_OFFSET,
            60 + HARDENED_OFFSET,
            HARDENED_OFFSET,
            0,
            0,
        ])
    }
}

impl FromStr for DerivationPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for &index in &self.0 {
            if is_hardened(index) {
                write!(f, "/{}'", index - HARDENED_OFFSET)?;
            } else {
                write!(f, "/{index}")?;
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a DerivationPath {
    type Item = &'a u32;
    type IntoIter = core::slice::Iter<'a, u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_default_path() {
        let path = DerivationPath::parse(DEFAULT_HD_PATH).unwrap();
        assert_eq!(
            path.as_slice(),
            &[0x8000_002c, 0x8000_003c, 0x8000_0000, 0, 0]
        );
        assert_eq!(path, DerivationPath::default());
        assert_eq!(path.len(), 5);
        assert!(!path.is_empty());
    }

    #[test]
    fn display_is_canonical() {
        let path = DerivationPath::parse(" m / 44h / 60H/0' /0x0/ 12 ").unwrap();
        assert_eq!(path.to_string(), "m/44'/60'/0'/0/12");
    }

    #[test]
    fn parse_hex_components() {
        let path = DerivationPath::parse("m/0x2c'/0x3C'").unwrap();
        assert_eq!(path.as_slice(), &[44 + HARDENED_OFFSET, 60 + HARDENED_OFFSET]);
    }

    #[test]
    fn parse_ledger_live_style_path() {
        let path = DerivationPath::parse("m/44'/60'/3'/0/0").unwrap();
        assert_eq!(path.as_slice()[2], 3 + HARDENED_OFFSET);
    }

    #[test]
    fn non_hardened_index_may_use_top_bit() {
        let path = DerivationPath::parse("m/2147483648").unwrap();
        assert!(is_hardened(path.as_slice()[0]));
        assert_eq!(path.to_string(), "m/0'");

        let path = DerivationPath::parse("m/4294967295").unwrap();
        assert_eq!(path.as_slice(), &[u32::MAX]);
    }

    #[test]
    fn hardened_index_out_of_range() {
        let err = DerivationPath::parse("m/2147483648'").unwrap_err();
        assert!(matches!(err, Error::InvalidDerivationPath(msg) if msg.contains("hardened range")));

        assert!(DerivationPath::parse("m/2147483647'").is_ok());
    }

    #[test]
    fn non_hardened_index_out_of_range() {
        let err = DerivationPath::parse("m/4294967296").unwrap_err();
        assert!(matches!(err, Error::InvalidDerivationPath(_)));
    }

    #[test]
    fn rejects_missing_root() {
        for bad in ["44'/60'/0'/0/0", "/44'/60'", "n/0", "M/0", ""] {
            let err = DerivationPath::parse(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidDerivationPath(_)), "{bad:?}");
        }
    }

    #[test]
    fn rejects_empty_and_garbage_components() {
        for bad in ["m", "m/", "m//0", "m/44'/x", "m/-1", "m/1''", "m/'", "m/0x"] {
            let err = DerivationPath::parse(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidDerivationPath(_)), "{bad:?}");
        }
    }
}
