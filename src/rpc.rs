//! Node RPC surface consumed by the client, plus the default JSON-RPC 2.0
//! implementation speaking to a Tendermint-style node over HTTP.

use std::fmt::Display;
use std::str::FromStr;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::tx::Tag;

/// Raw ABCI query response. A non-zero code means the queried module rejected
/// the request; the log carries the reason.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AbciQuery {
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub log: String,
    #[serde(default)]
    pub codespace: String,
    #[serde(default, deserialize_with = "nullable_base64")]
    pub value: Vec<u8>,
}

/// Result of one execution phase (pre-check or delivery).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TxPhaseResult {
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub log: String,
    #[serde(default)]
    pub codespace: String,
    #[serde(default, deserialize_with = "string_number")]
    pub gas_wanted: i64,
    #[serde(default, deserialize_with = "string_number")]
    pub gas_used: i64,
    #[serde(default, deserialize_with = "tag_list")]
    pub tags: Vec<Tag>,
}

impl TxPhaseResult {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Response of a commit-mode broadcast: both phases reported.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BroadcastCommit {
    #[serde(default)]
    pub check_tx: TxPhaseResult,
    #[serde(default)]
    pub deliver_tx: TxPhaseResult,
    #[serde(default)]
    pub hash: String,
    #[serde(default, deserialize_with = "string_number")]
    pub height: i64,
}

/// Response of a sync-mode broadcast: pre-check only.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BroadcastSync {
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub log: String,
    #[serde(default)]
    pub hash: String,
}

/// Response of an async-mode broadcast: receipt only.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BroadcastAsync {
    #[serde(default)]
    pub hash: String,
}

/// A transaction as stored by the node, with its execution result.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TxResponse {
    #[serde(default)]
    pub hash: String,
    #[serde(default, deserialize_with = "string_number")]
    pub height: i64,
    #[serde(default)]
    pub tx_result: TxPhaseResult,
    #[serde(default, deserialize_with = "nullable_base64")]
    pub tx: Vec<u8>,
}

/// One page of raw search results.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TxSearchResponse {
    #[serde(default)]
    pub txs: Vec<TxResponse>,
    #[serde(default, deserialize_with = "string_number")]
    pub total_count: u32,
}

/// Block metadata needed to format transaction details.
#[derive(Clone, Debug)]
pub struct BlockResponse {
    pub height: i64,
    pub time: DateTime<Utc>,
    pub chain_id: String,
}

/// The node endpoints this SDK depends on.
///
/// Implementations must map a missing transaction in [NodeRpc::tx] to
/// [Error::NotFound] so callers can distinguish "not yet included" from
/// transport failures.
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// `ABCIQuery` without proofs; used for account, token and store lookups.
    async fn abci_query(&self, path: &str, data: &[u8]) -> Result<AbciQuery>;

    /// Broadcast and wait for the transaction to be checked and executed in
    /// a block.
    async fn broadcast_tx_commit(&self, tx: &[u8]) -> Result<BroadcastCommit>;

    /// Broadcast and wait for the admission check only.
    async fn broadcast_tx_sync(&self, tx: &[u8]) -> Result<BroadcastSync>;

    /// Broadcast and return as soon as the node accepts the send.
    async fn broadcast_tx_async(&self, tx: &[u8]) -> Result<BroadcastAsync>;

    /// Look up a transaction by hash bytes.
    async fn tx(&self, hash: &[u8]) -> Result<TxResponse>;

    /// Paged tag-filtered search.
    async fn tx_search(&self, query: &str, page: u32, size: u32) -> Result<TxSearchResponse>;

    /// Block metadata at the given height.
    async fn block(&self, height: i64) -> Result<BlockResponse>;
}

/// JSON-RPC 2.0 transport over HTTP.
pub struct HttpRpc {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRpc {
    pub fn new(endpoint: impl Into<String>) -> HttpRpc {
        HttpRpc {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &'static str,
        params: P,
    ) -> Result<R> {
        #[derive(Serialize)]
        struct Request<P> {
            jsonrpc: &'static str,
            method: &'static str,
            id: u64,
            params: P,
        }
        #[derive(Deserialize)]
        struct Response<R> {
            result: Option<R>,
            error: Option<RpcError>,
        }
        #[derive(Deserialize, Debug)]
        struct RpcError {
            code: i64,
            message: String,
            #[serde(default)]
            data: String,
        }

        let req = Request {
            jsonrpc: "2.0",
            method,
            id: rand::random(),
            params,
        };
        let res: Response<R> = self
            .client
            .post(&self.endpoint)
            .json(&req)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if let Some(err) = res.error {
            let message = if err.data.is_empty() {
                err.message
            } else {
                format!("{}: {}", err.message, err.data)
            };
            return Err(Error::Rpc {
                code: err.code,
                message,
            });
        }
        res.result.ok_or_else(|| Error::Rpc {
            code: 0,
            message: format!("missing result in {method} response"),
        })
    }
}

#[async_trait]
impl NodeRpc for HttpRpc {
    async fn abci_query(&self, path: &str, data: &[u8]) -> Result<AbciQuery> {
        #[derive(Serialize)]
        struct Params<'a> {
            path: &'a str,
            data: String,
            prove: bool,
        }
        #[derive(Deserialize)]
        struct Wrapper {
            response: AbciQuery,
        }
        let wrapper: Wrapper = self
            .call(
                "abci_query",
                Params {
                    path,
                    data: hex::encode(data),
                    prove: false,
                },
            )
            .await?;
        Ok(wrapper.response)
    }

    async fn broadcast_tx_commit(&self, tx: &[u8]) -> Result<BroadcastCommit> {
        self.call("broadcast_tx_commit", TxParams::new(tx)).await
    }

    async fn broadcast_tx_sync(&self, tx: &[u8]) -> Result<BroadcastSync> {
        self.call("broadcast_tx_sync", TxParams::new(tx)).await
    }

    async fn broadcast_tx_async(&self, tx: &[u8]) -> Result<BroadcastAsync> {
        self.call("broadcast_tx_async", TxParams::new(tx)).await
    }

    async fn tx(&self, hash: &[u8]) -> Result<TxResponse> {
        #[derive(Serialize)]
        struct Params {
            hash: String,
            prove: bool,
        }
        let res: Result<TxResponse> = self
            .call(
                "tx",
                Params {
                    hash: STANDARD.encode(hash),
                    prove: false,
                },
            )
            .await;
        match res {
            Err(Error::Rpc { message, .. }) if message.contains("not found") => {
                Err(Error::NotFound {
                    hash: hex::encode_upper(hash),
                })
            }
            other => other,
        }
    }

    async fn tx_search(&self, query: &str, page: u32, size: u32) -> Result<TxSearchResponse> {
        #[derive(Serialize)]
        struct Params<'a> {
            query: &'a str,
            prove: bool,
            page: String,
            per_page: String,
        }
        self.call(
            "tx_search",
            Params {
                query,
                prove: false,
                page: page.to_string(),
                per_page: size.to_string(),
            },
        )
        .await
    }

    async fn block(&self, height: i64) -> Result<BlockResponse> {
        #[derive(Serialize)]
        struct Params {
            height: String,
        }
        #[derive(Deserialize)]
        struct Wrapper {
            block: Block,
        }
        #[derive(Deserialize)]
        struct Block {
            header: Header,
        }
        #[derive(Deserialize)]
        struct Header {
            chain_id: String,
            #[serde(deserialize_with = "string_number")]
            height: i64,
            time: DateTime<Utc>,
        }
        let wrapper: Wrapper = self
            .call(
                "block",
                Params {
                    height: height.to_string(),
                },
            )
            .await?;
        Ok(BlockResponse {
            height: wrapper.block.header.height,
            time: wrapper.block.header.time,
            chain_id: wrapper.block.header.chain_id,
        })
    }
}

#[derive(Serialize)]
struct TxParams {
    tx: String,
}

impl TxParams {
    fn new(tx: &[u8]) -> TxParams {
        TxParams {
            tx: STANDARD.encode(tx),
        }
    }
}

/// Tendermint JSON encodes 64-bit numbers as strings; accept either shape.
pub(crate) fn string_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNum {
        Str(String),
        Num(i64),
    }
    let parsed = match StringOrNum::deserialize(deserializer)? {
        StringOrNum::Str(s) => s.parse().map_err(serde::de::Error::custom)?,
        StringOrNum::Num(n) => n.to_string().parse().map_err(serde::de::Error::custom)?,
    };
    Ok(parsed)
}

fn nullable_base64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(Vec::new()),
        Some(s) => STANDARD.decode(s).map_err(serde::de::Error::custom),
    }
}

/// Event attributes arrive base64-encoded on the wire; values that do not
/// decode as UTF-8 base64 are kept verbatim.
fn tag_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Tag>, D::Error> {
    #[derive(Deserialize)]
    struct RawTag {
        #[serde(default)]
        key: String,
        #[serde(default)]
        value: String,
    }
    let raw: Option<Vec<RawTag>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|tag| Tag::new(decode_tag_field(tag.key), decode_tag_field(tag.value)))
        .collect())
}

fn decode_tag_field(field: String) -> String {
    match STANDARD.decode(&field) {
        Ok(bytes) => String::from_utf8(bytes).unwrap_or(field),
        Err(_) => field,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_response_parses_tendermint_shape() {
        let json = r#"{
            "check_tx": {"code": 0, "gas_wanted": "100000", "gas_used": "55000"},
            "deliver_tx": {
                "log": "ok",
                "gas_wanted": "100000",
                "gas_used": "72431",
                "tags": [{"key": "YWN0aW9u", "value": "c2VuZA=="}]
            },
            "hash": "ABC123",
            "height": "2412"
        }"#;
        let res: BroadcastCommit = serde_json::from_str(json).unwrap();
        assert!(res.check_tx.is_ok());
        assert_eq!(res.height, 2412);
        assert_eq!(res.deliver_tx.gas_used, 72431);
        assert_eq!(res.deliver_tx.tags, vec![Tag::new("action", "send")]);
    }

    #[test]
    fn abci_query_null_value() {
        let res: AbciQuery =
            serde_json::from_str(r#"{"code": 6, "log": "account not found", "value": null}"#)
                .unwrap();
        assert_eq!(res.code, 6);
        assert!(res.value.is_empty());
    }

    #[test]
    fn numbers_accept_both_shapes() {
        let a: TxResponse = serde_json::from_str(r#"{"height": "7"}"#).unwrap();
        let b: TxResponse = serde_json::from_str(r#"{"height": 7}"#).unwrap();
        assert_eq!(a.height, b.height);
    }
}
