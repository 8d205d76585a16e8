use std::fmt::{Debug, Display};
use std::str::FromStr;

use bech32::{FromBase32, ToBase32, Variant};
use serde::de::Visitor;

use crate::error::{Error, Result};

/// A bech32 account address.
///
/// Only the 20-byte account form is accepted; validator and consensus
/// addresses are not part of the client surface.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccAddress {
    hrp: String,
    raw: [u8; 20],
}

impl AccAddress {
    pub fn new(hrp: impl Into<String>, raw: [u8; 20]) -> AccAddress {
        AccAddress {
            hrp: hrp.into(),
            raw,
        }
    }

    /// Human-readable part of the address (the chain's bech32 prefix).
    pub fn hrp(&self) -> &str {
        &self.hrp
    }

    pub fn raw_bytes(&self) -> &[u8; 20] {
        &self.raw
    }
}

impl FromStr for AccAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidAddress {
            address: s.to_owned(),
            reason: reason.to_owned(),
        };
        let (hrp, data, variant) = bech32::decode(s).map_err(|e| Error::InvalidAddress {
            address: s.to_owned(),
            reason: e.to_string(),
        })?;
        if variant != Variant::Bech32 {
            return Err(invalid("must use the Bech32 variant"));
        }
        let data = Vec::<u8>::from_base32(&data).map_err(|e| Error::InvalidAddress {
            address: s.to_owned(),
            reason: e.to_string(),
        })?;
        let raw = data
            .as_slice()
            .try_into()
            .map_err(|_| invalid("expected a 20 byte account address"))?;
        Ok(AccAddress { hrp, raw })
    }
}

impl Display for AccAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let encoded = bech32::encode(&self.hrp, self.raw.to_base32(), Variant::Bech32)
            .map_err(|_| std::fmt::Error)?;
        f.write_str(&encoded)
    }
}

impl Debug for AccAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "AccAddress({self})")
    }
}

impl serde::Serialize for AccAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for AccAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(AccAddressVisitor)
    }
}

struct AccAddressVisitor;

impl<'de> Visitor<'de> for AccAddressVisitor {
    type Value = AccAddress;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("AccAddress")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        v.parse().map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let addr = AccAddress::new("cosmos", [7; 20]);
        let s = addr.to_string();
        assert!(s.starts_with("cosmos1"));
        let parsed: AccAddress = s.parse().unwrap();
        assert_eq!(parsed, addr);
        assert_eq!(parsed.hrp(), "cosmos");
    }

    #[test]
    fn rejects_garbage() {
        assert!("not-an-address".parse::<AccAddress>().is_err());
        // bech32m data must be rejected even when it decodes
        assert!("cosmos1xyz".parse::<AccAddress>().is_err());
    }

    #[test]
    fn serde_as_string() {
        let addr = AccAddress::new("iaa", [1; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{addr}\""));
        let back: AccAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
