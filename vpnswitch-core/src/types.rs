//! Location identifiers and the catalog the rotator draws from

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Countries with P2P-capable servers, as listed by `nordvpn countries`
pub const P2P_COUNTRIES: &[&str] = &[
    "nl", "ch", "se", "es", "ro", "hk", "sg", "is", "fr", "ca", "uk", "us", "fi", "no", "dk",
    "at", "au", "be", "br", "cz", "de", "ie", "it", "jp", "kr", "mx", "nz", "pl", "pt", "za",
    "cl", "co", "ee", "gr", "hu", "lv", "lt", "lu", "my", "rs", "sk", "si", "tw", "th", "ua",
    "ae", "vn", "lk", "ar", "pe", "ph", "pa",
];

/// Opaque exit location identifier, usually a country code
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(String);

impl Location {
    /// Create a location from its identifier
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The identifier as passed to the control tool
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Location {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Deduplicated, sorted set of eligible locations
///
/// Ordering is deterministic so that logs and `vpnswitch locations` are
/// stable across runs. Selection is uniform over the entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationCatalog {
    locations: Vec<Location>,
}

impl LocationCatalog {
    /// Build a catalog, trimming blanks and dropping duplicates
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut locations: Vec<Location> = codes
            .into_iter()
            .map(|code| code.as_ref().trim().to_string())
            .filter(|code| !code.is_empty())
            .map(Location::new)
            .collect();
        locations.sort();
        locations.dedup();
        Self { locations }
    }

    /// The built-in P2P catalog
    pub fn p2p() -> Self {
        Self::new(P2P_COUNTRIES)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn contains(&self, location: &Location) -> bool {
        self.locations.binary_search(location).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    /// Pick a location uniformly at random, `None` when the catalog is empty
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Location> {
        if self.locations.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.locations.len());
        self.locations.get(index)
    }
}

impl Default for LocationCatalog {
    fn default() -> Self {
        Self::p2p()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_catalog_is_sorted_and_deduplicated() {
        let catalog = LocationCatalog::new(["se", "nl", " se ", "", "ch"]);
        let codes: Vec<&str> = catalog.iter().map(Location::as_str).collect();
        assert_eq!(codes, vec!["ch", "nl", "se"]);
    }

    #[test]
    fn test_default_catalog_is_strictly_ordered() {
        let catalog = LocationCatalog::p2p();
        let codes: Vec<&str> = catalog.iter().map(Location::as_str).collect();
        assert!(codes.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(catalog.len(), P2P_COUNTRIES.len());
        assert!(catalog.contains(&Location::from("nl")));
    }

    #[test]
    fn test_choose_returns_member() {
        let catalog = LocationCatalog::new(["a", "b", "c"]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let location = catalog.choose(&mut rng).unwrap();
            assert!(catalog.contains(location));
        }
    }

    #[test]
    fn test_choose_single_entry() {
        let catalog = LocationCatalog::new(["only"]);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(catalog.choose(&mut rng).unwrap().as_str(), "only");
    }

    #[test]
    fn test_choose_empty_catalog() {
        let catalog = LocationCatalog::new(Vec::<String>::new());
        let mut rng = StdRng::seed_from_u64(1);
        assert!(catalog.is_empty());
        assert!(catalog.choose(&mut rng).is_none());
    }
}
