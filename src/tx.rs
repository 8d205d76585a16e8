use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::coin::Coin;
use crate::msg::Msg;

/// Fee payable for one transaction: coin amounts in minimal units plus the
/// gas limit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdFee {
    pub amount: Vec<Coin>,
    pub gas: u64,
}

/// One signature over the sign doc, together with the account coordinates it
/// was produced against.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdSignature {
    #[serde(with = "base64_bytes")]
    pub pub_key: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
    pub account_number: u64,
    pub sequence: u64,
}

/// A fully signed transaction ready for serialization and broadcast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdTx {
    pub msgs: Vec<Msg>,
    pub fee: StdFee,
    pub signatures: Vec<StdSignature>,
    #[serde(default)]
    pub memo: String,
}

/// A key/value event attribute emitted by transaction execution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Tag {
        Tag {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Outcome of a broadcast.
///
/// Which fields carry data depends on the broadcast mode: async and sync
/// returns know only the hash, commit returns fill in height, gas and tags.
/// A partially populated result is valid, not an error.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultTx {
    pub gas_wanted: i64,
    pub gas_used: i64,
    pub tags: Vec<Tag>,
    pub hash: String,
    pub height: i64,
}

/// Execution result of a transaction already included in a block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxResult {
    pub code: u32,
    pub log: String,
    pub gas_wanted: i64,
    pub gas_used: i64,
    pub tags: Vec<Tag>,
}

/// A looked-up transaction joined with its block's timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxDetail {
    pub hash: String,
    pub height: i64,
    pub tx: StdTx,
    pub result: TxResult,
    /// RFC 3339 timestamp of the containing block.
    pub timestamp: String,
}

/// One page of a tag-filtered transaction search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxSearch {
    pub total: u32,
    pub page: u32,
    pub size: u32,
    pub txs: Vec<TxDetail>,
}

/// Builds the tag filter string for [crate::ChainClient::query_txs].
///
/// Conditions take the node's event query form, e.g.
/// `message.sender='iaa1...'`, joined with `AND`.
#[derive(Clone, Debug, Default)]
pub struct EventQueryBuilder {
    conditions: Vec<String>,
}

impl EventQueryBuilder {
    pub fn new() -> EventQueryBuilder {
        EventQueryBuilder::default()
    }

    pub fn add_condition(mut self, key: impl Display, value: impl Display) -> EventQueryBuilder {
        self.conditions.push(format!("{key}='{value}'"));
        self
    }

    /// The assembled query; empty when no condition was added.
    pub fn build(&self) -> String {
        self.conditions.join(" AND ")
    }
}

pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_builder_joins_with_and() {
        let query = EventQueryBuilder::new()
            .add_condition("message.sender", "iaa1abc")
            .add_condition("tx.height", 42)
            .build();
        assert_eq!(query, "message.sender='iaa1abc' AND tx.height='42'");
    }

    #[test]
    fn empty_builder_builds_empty() {
        assert_eq!(EventQueryBuilder::new().build(), "");
    }

    #[test]
    fn signature_bytes_round_trip_as_base64() {
        let sig = StdSignature {
            pub_key: vec![1, 2, 3],
            signature: vec![4, 5, 6],
            account_number: 9,
            sequence: 3,
        };
        let json = serde_json::to_value(&sig).unwrap();
        assert_eq!(json["pub_key"], "AQID");
        let back: StdSignature = serde_json::from_value(json).unwrap();
        assert_eq!(back, sig);
    }
}
