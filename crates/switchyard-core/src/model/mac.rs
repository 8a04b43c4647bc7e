//! MAC address newtype.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Vendor prefix for locally generated addresses.
const GENERATED_PREFIX: [u8; 3] = [0xfa, 0x16, 0x3e];

/// A MAC address, normalized to lowercase colon-separated form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacAddress(String);

impl MacAddress {
    /// Parse and normalize. Accepts `:` or `-` separated hex octets.
    pub fn new(raw: &str) -> Result<Self, CoreError> {
        let octets: Vec<&str> = raw.split([':', '-']).collect();
        let well_formed = octets.len() == 6
            && octets
                .iter()
                .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));
        if !well_formed {
            return Err(CoreError::invalid_input(format!(
                "malformed MAC address {raw:?}"
            )));
        }
        Ok(Self(octets.join(":").to_ascii_lowercase()))
    }

    /// Generate a fresh address under the local vendor prefix.
    #[must_use]
    pub fn generate() -> Self {
        let entropy = Uuid::new_v4();
        let b = entropy.as_bytes();
        Self(format!(
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            GENERATED_PREFIX[0], GENERATED_PREFIX[1], GENERATED_PREFIX[2], b[0], b[1], b[2]
        ))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MacAddress {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_separator() {
        let mac = MacAddress::new("FA-16-3E-AB-CD-EF").unwrap();
        assert_eq!(mac.as_str(), "fa:16:3e:ab:cd:ef");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(MacAddress::new("fa:16:3e:ab:cd").is_err());
        assert!(MacAddress::new("fa:16:3e:ab:cd:zz").is_err());
        assert!(MacAddress::new("not-a-mac").is_err());
    }

    #[test]
    fn generated_addresses_use_local_prefix() {
        let mac = MacAddress::generate();
        assert!(mac.as_str().starts_with("fa:16:3e:"));
        assert_ne!(MacAddress::generate(), MacAddress::generate());
    }
}
