//! Claim Type Catalog
//!
//! Frozen mapping from short display keys to the fully-qualified claim
//! types the store persists. Built once at startup from the static table
//! below, optionally extended from configuration, then shared read-only.

use std::collections::{BTreeMap, HashMap};

use crate::claim::entity::{Claim, ClaimPair};
use crate::shared::error::{IdentityError, Result};

const XMLSOAP: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims";
const MICROSOFT: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims";

/// Key of the claim carrying a user's display name.
pub const NAME_KEY: &str = "Name";

/// Well-known claim types: (key, namespace, suffix)
const WELL_KNOWN_CLAIM_TYPES: &[(&str, &str, &str)] = &[
    ("Actor", "http://schemas.xmlsoap.org/ws/2009/09/identity/claims", "actor"),
    ("Anonymous", XMLSOAP, "anonymous"),
    ("Authentication", XMLSOAP, "authenticated"),
    ("AuthenticationInstant", MICROSOFT, "authenticationinstant"),
    ("AuthenticationMethod", MICROSOFT, "authenticationmethod"),
    ("AuthorizationDecision", XMLSOAP, "authorizationdecision"),
    ("Country", XMLSOAP, "country"),
    ("DateOfBirth", XMLSOAP, "dateofbirth"),
    ("Dns", XMLSOAP, "dns"),
    ("Email", XMLSOAP, "emailaddress"),
    ("Expiration", MICROSOFT, "expiration"),
    ("Gender", XMLSOAP, "gender"),
    ("GivenName", XMLSOAP, "givenname"),
    ("GroupSid", MICROSOFT, "groupsid"),
    ("HomePhone", XMLSOAP, "homephone"),
    ("Locality", XMLSOAP, "locality"),
    ("MobilePhone", XMLSOAP, "mobilephone"),
    ("Name", XMLSOAP, "name"),
    ("NameIdentifier", XMLSOAP, "nameidentifier"),
    ("OtherPhone", XMLSOAP, "otherphone"),
    ("PostalCode", XMLSOAP, "postalcode"),
    ("PrimarySid", MICROSOFT, "primarysid"),
    ("Role", MICROSOFT, "role"),
    ("SerialNumber", MICROSOFT, "serialnumber"),
    ("Sid", XMLSOAP, "sid"),
    ("Spn", XMLSOAP, "spn"),
    ("StateOrProvince", XMLSOAP, "stateorprovince"),
    ("StreetAddress", XMLSOAP, "streetaddress"),
    ("Surname", XMLSOAP, "surname"),
    ("System", XMLSOAP, "system"),
    ("Thumbprint", XMLSOAP, "thumbprint"),
    ("Upn", XMLSOAP, "upn"),
    ("Uri", XMLSOAP, "uri"),
    ("UserData", MICROSOFT, "userdata"),
    ("Version", MICROSOFT, "version"),
    ("Webpage", XMLSOAP, "webpage"),
    ("WindowsAccountName", MICROSOFT, "windowsaccountname"),
];

#[derive(Debug, Clone)]
pub struct ClaimTypeCatalog {
    by_key: BTreeMap<String, String>,
    by_type: HashMap<String, String>,
}

impl ClaimTypeCatalog {
    /// Catalog of the well-known claim types.
    pub fn well_known() -> Self {
        let mut catalog = Self::empty();
        for (key, namespace, suffix) in WELL_KNOWN_CLAIM_TYPES {
            catalog.by_key.insert(key.to_string(), format!("{}/{}", namespace, suffix));
        }
        catalog.rebuild_reverse();
        catalog
    }

    /// Catalog of exactly the given entries.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::empty().with_extra(entries)
    }

    /// Add entries; a repeated key or claim type is a configuration error.
    pub fn with_extra<I, K, V>(mut self, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, claim_type) in entries {
            let key = key.into();
            let claim_type = claim_type.into();
            if self.by_key.contains_key(&key) {
                return Err(IdentityError::configuration(format!(
                    "Duplicate claim type key '{}'",
                    key
                )));
            }
            if self.by_type.contains_key(&claim_type) {
                return Err(IdentityError::configuration(format!(
                    "Claim type '{}' is already mapped to '{}'",
                    claim_type, self.by_type[&claim_type]
                )));
            }
            self.by_type.insert(claim_type.clone(), key.clone());
            self.by_key.insert(key, claim_type);
        }
        Ok(self)
    }

    fn empty() -> Self {
        Self {
            by_key: BTreeMap::new(),
            by_type: HashMap::new(),
        }
    }

    fn rebuild_reverse(&mut self) {
        self.by_type = self
            .by_key
            .iter()
            .map(|(k, t)| (t.clone(), k.clone()))
            .collect();
    }

    /// Fully-qualified claim type for a key.
    pub fn resolve(&self, key: &str) -> Result<&str> {
        self.by_key
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| IdentityError::invalid_key("claim type", key))
    }

    /// Key for a stored claim type, if it is catalogued.
    pub fn key_for(&self, claim_type: &str) -> Option<&str> {
        self.by_type.get(claim_type).map(String::as_str)
    }

    /// Translate caller pairs to store claims. Fails on the first unknown key
    /// without partial output.
    pub fn translate(&self, pairs: &[ClaimPair]) -> Result<Vec<Claim>> {
        pairs
            .iter()
            .map(|p| Ok(Claim::new(self.resolve(&p.key)?, &p.value)))
            .collect()
    }

    /// Pair for display. Uncatalogued types keep their full type as the key.
    pub fn to_pair(&self, claim: &Claim) -> ClaimPair {
        let key = self.key_for(&claim.claim_type).unwrap_or(&claim.claim_type);
        ClaimPair::new(key, &claim.value)
    }

    /// Entries ordered by key.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_key.iter().map(|(k, t)| (k.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl Default for ClaimTypeCatalog {
    fn default() -> Self {
        Self::well_known()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_keys_sorted_and_unique() {
        let catalog = ClaimTypeCatalog::well_known();
        let keys: Vec<&str> = catalog.entries().map(|(k, _)| k).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(keys, sorted);
        assert_eq!(catalog.len(), WELL_KNOWN_CLAIM_TYPES.len());
    }

    #[test]
    fn test_resolve_and_reverse() {
        let catalog = ClaimTypeCatalog::well_known();
        let name = catalog.resolve(NAME_KEY).unwrap();
        assert_eq!(name, "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name");
        assert_eq!(catalog.key_for(name), Some("Name"));
        assert_eq!(
            catalog.resolve("Role").unwrap(),
            "http://schemas.microsoft.com/ws/2008/06/identity/claims/role"
        );
    }

    #[test]
    fn test_unknown_key_is_invalid_key() {
        let catalog = ClaimTypeCatalog::well_known();
        let err = catalog.resolve("ShoeSize").unwrap_err();
        assert!(matches!(err, IdentityError::InvalidKey { .. }));
    }

    #[test]
    fn test_translate_rejects_whole_batch() {
        let catalog = ClaimTypeCatalog::well_known();
        let pairs = vec![ClaimPair::new("Name", "Alice"), ClaimPair::new("Nope", "x")];
        assert!(catalog.translate(&pairs).is_err());

        let ok = catalog.translate(&pairs[..1]).unwrap();
        assert_eq!(ok[0].value, "Alice");
    }

    #[test]
    fn test_with_extra() {
        let catalog = ClaimTypeCatalog::well_known()
            .with_extra([("Department", "urn:ic:department")])
            .unwrap();
        assert_eq!(catalog.resolve("Department").unwrap(), "urn:ic:department");
        assert_eq!(catalog.key_for("urn:ic:department"), Some("Department"));
    }

    #[test]
    fn test_with_extra_rejects_duplicates() {
        let dup_key = ClaimTypeCatalog::well_known().with_extra([("Name", "urn:other")]);
        assert!(matches!(dup_key, Err(IdentityError::Configuration { .. })));

        let dup_type = ClaimTypeCatalog::from_entries([("A", "urn:x"), ("B", "urn:x")]);
        assert!(dup_type.is_err());
    }

    #[test]
    fn test_uncatalogued_type_displays_raw() {
        let catalog = ClaimTypeCatalog::from_entries([("Dept", "urn:dept")]).unwrap();
        assert_eq!(catalog.to_pair(&Claim::new("urn:dept", "Eng")), ClaimPair::new("Dept", "Eng"));
        assert_eq!(catalog.to_pair(&Claim::new("urn:other", "1")), ClaimPair::new("urn:other", "1"));
    }
}
