//! The watch-list of destination addresses whose transactions are retained.

use alloy_primitives::{Address, address};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, str::FromStr};
use thiserror::Error;

/// The Uniswap V2 router.
const UNISWAP_V2_ROUTER: Address = address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D");
/// The Uniswap V3 swap router.
const UNISWAP_V3_ROUTER: Address = address!("E592427A0AEce92De3Edee1F18E0157C05861564");

/// A named address of interest.
///
/// The name identifies the address group when querying, e.g. `v2` or `v3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[display("{name}={address}")]
pub struct WatchedAddress {
    /// The group name.
    pub name: String,
    /// The watched destination address.
    pub address: Address,
}

impl WatchedAddress {
    /// Creates a new [`WatchedAddress`].
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self { name: name.into(), address }
    }
}

/// An error parsing a [`WatchedAddress`] from its `name=0xaddress` form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WatchedAddressError {
    /// The input is not of the form `name=address`.
    #[error("expected `name=address`, got `{0}`")]
    MissingSeparator(String),
    /// The group name is empty.
    #[error("empty group name in `{0}`")]
    EmptyName(String),
    /// The address is not a valid hex address.
    #[error("invalid address `{0}`")]
    InvalidAddress(String),
}

impl FromStr for WatchedAddress {
    type Err = WatchedAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, address) =
            s.split_once('=').ok_or_else(|| WatchedAddressError::MissingSeparator(s.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(WatchedAddressError::EmptyName(s.to_string()));
        }
        let address = Address::from_str(address.trim())
            .map_err(|_| WatchedAddressError::InvalidAddress(address.to_string()))?;
        Ok(Self::new(name, address))
    }
}

/// The immutable set of watched destination addresses.
///
/// Membership checks are constant time. The filter is fixed once built and is
/// shared between the capture tasks and the query service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressFilter {
    watched: Vec<WatchedAddress>,
    addresses: HashSet<Address>,
}

impl AddressFilter {
    /// Creates a new [`AddressFilter`] from the given watch-list.
    pub fn new(watched: impl IntoIterator<Item = WatchedAddress>) -> Self {
        let watched: Vec<_> = watched.into_iter().collect();
        let addresses = watched.iter().map(|w| w.address).collect();
        Self { watched, addresses }
    }

    /// Returns true if `recipient` is a watched address.
    ///
    /// A missing recipient (contract creation) never matches.
    pub fn matches(&self, recipient: Option<&Address>) -> bool {
        recipient.is_some_and(|address| self.addresses.contains(address))
    }

    /// Returns the address watched under the given group name.
    pub fn group(&self, name: &str) -> Option<Address> {
        self.watched.iter().find(|w| w.name == name).map(|w| w.address)
    }

    /// Iterates over the watch-list in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &WatchedAddress> {
        self.watched.iter()
    }

    /// Returns the number of distinct watched addresses.
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// Returns true if nothing is watched.
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

impl Default for AddressFilter {
    fn default() -> Self {
        Self::new([
            WatchedAddress::new("v2", UNISWAP_V2_ROUTER),
            WatchedAddress::new("v3", UNISWAP_V3_ROUTER),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_filter_matches_routers() {
        let filter = AddressFilter::default();
        assert_eq!(filter.len(), 2);
        assert!(filter.matches(Some(&UNISWAP_V2_ROUTER)));
        assert!(filter.matches(Some(&UNISWAP_V3_ROUTER)));
        assert!(!filter.matches(Some(&Address::ZERO)));
    }

    #[test]
    fn test_missing_recipient_never_matches() {
        let filter = AddressFilter::new([WatchedAddress::new("zero", Address::ZERO)]);
        assert!(filter.matches(Some(&Address::ZERO)));
        assert!(!filter.matches(None));
    }

    #[test]
    fn test_group_lookup() {
        let filter = AddressFilter::default();
        assert_eq!(filter.group("v2"), Some(UNISWAP_V2_ROUTER));
        assert_eq!(filter.group("v3"), Some(UNISWAP_V3_ROUTER));
        assert_eq!(filter.group("v4"), None);
    }

    #[test]
    fn test_empty_filter() {
        let filter = AddressFilter::new([]);
        assert!(filter.is_empty());
        assert!(!filter.matches(Some(&UNISWAP_V2_ROUTER)));
    }

    #[rstest]
    #[case("v2=0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D", Ok(WatchedAddress::new("v2", UNISWAP_V2_ROUTER)))]
    #[case(" v3 = 0xE592427A0AEce92De3Edee1F18E0157C05861564", Ok(WatchedAddress::new("v3", UNISWAP_V3_ROUTER)))]
    #[case("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D", Err(WatchedAddressError::MissingSeparator("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D".to_string())))]
    #[case("=0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D", Err(WatchedAddressError::EmptyName("=0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D".to_string())))]
    #[case("v2=0x1234", Err(WatchedAddressError::InvalidAddress("0x1234".to_string())))]
    fn test_parse_watched_address(
        #[case] input: &str,
        #[case] expected: Result<WatchedAddress, WatchedAddressError>,
    ) {
        assert_eq!(input.parse::<WatchedAddress>(), expected);
    }

    #[test]
    fn test_watched_address_display_roundtrips() {
        let watched = WatchedAddress::new("v2", UNISWAP_V2_ROUTER);
        let parsed: WatchedAddress = watched.to_string().parse().unwrap();
        assert_eq!(parsed, watched);
    }
}
