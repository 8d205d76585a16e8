use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::address::AccAddress;
use crate::codec::{JsonCodec, TxCodec};
use crate::coin::{sort_coins, Coin, DecCoin};
use crate::config::ClientConfig;
use crate::context::{BaseTx, BroadcastMode, TxContext};
use crate::error::{BatchError, Error, Result, ROOT_CODESPACE};
use crate::msg::Msg;
use crate::rpc::{BlockResponse, HttpRpc, NodeRpc, TxResponse};
use crate::signer::Signer;
use crate::token::{Token, TokenCache};
use crate::tx::{EventQueryBuilder, ResultTx, StdTx, TxDetail, TxResult, TxSearch};

/// An account as reported by the auth module.
#[derive(Clone, Debug, Deserialize)]
pub struct BaseAccount {
    pub address: AccAddress,
    #[serde(default)]
    pub coins: Vec<Coin>,
    #[serde(default, deserialize_with = "crate::rpc::string_number")]
    pub account_number: u64,
    #[serde(default, deserialize_with = "crate::rpc::string_number")]
    pub sequence: u64,
}

/// The abstract chain client: builds, signs, broadcasts and queries
/// transactions against a single node.
///
/// Every submission gets its own freshly prepared [TxContext], so one client
/// can be shared freely between tasks. What the client cannot arbitrate is
/// the chain-side sequence number: two in-flight submissions for the same
/// account will race on it and the node will reject the loser, so callers
/// should keep at most one submission in flight per account.
pub struct ChainClient {
    config: ClientConfig,
    /// Configured default fee, normalized to minimal units at construction.
    default_fee: Vec<Coin>,
    rpc: Arc<dyn NodeRpc>,
    signer: Arc<dyn Signer>,
    codec: Arc<dyn TxCodec>,
    tokens: TokenCache,
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("config", &self.config)
            .field("default_fee", &self.default_fee)
            .finish_non_exhaustive()
    }
}

impl ChainClient {
    /// Build a client over an explicit transport, signer and codec.
    ///
    /// The configured default fee is normalized here: online clients resolve
    /// token metadata and convert to minimal units, offline clients truncate
    /// the decimal amounts as-is. A failed conversion is returned as an
    /// error, it does not abort the process.
    pub async fn new(
        config: ClientConfig,
        rpc: Arc<dyn NodeRpc>,
        signer: Arc<dyn Signer>,
        codec: Arc<dyn TxCodec>,
    ) -> Result<ChainClient> {
        let mut client = ChainClient {
            config,
            default_fee: Vec::new(),
            rpc,
            signer,
            codec,
            tokens: TokenCache::default(),
        };
        client.default_fee = if client.config.online {
            client.to_min_coin(&client.config.fee).await?
        } else {
            sort_coins(client.config.fee.iter().map(DecCoin::truncate).collect())
        };
        Ok(client)
    }

    /// Convenience constructor wiring up the default HTTP transport and
    /// JSON codec from the configured node URI.
    pub async fn connect(config: ClientConfig, signer: Arc<dyn Signer>) -> Result<ChainClient> {
        let rpc = Arc::new(HttpRpc::new(config.node_uri.clone()));
        ChainClient::new(config, rpc, signer, Arc::new(JsonCodec)).await
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Validate, prepare, sign, serialize and broadcast a set of messages as
    /// one transaction.
    ///
    /// Fails fast: the first invalid message aborts before any network call,
    /// and any later step's failure short-circuits the rest. Nothing is
    /// retried. A panic inside the broadcast step is caught, logged and
    /// returned as [Error::Internal] rather than taking the process down.
    pub async fn build_and_send(&self, msgs: Vec<Msg>, base_tx: &BaseTx) -> Result<ResultTx> {
        for msg in &msgs {
            msg.validate()?;
        }
        tracing::debug!(count = msgs.len(), "validate msg success");

        let ctx = self.prepare(base_tx).await?;

        let tx = self
            .signer
            .sign(&base_tx.from, &base_tx.password, &ctx, msgs)?;
        tracing::debug!(sequence = ctx.sequence, "sign transaction success");

        let tx_bytes = self.codec.marshal_tx(&tx)?;

        let res = AssertUnwindSafe(self.broadcast_tx(ctx.mode, &tx_bytes))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_owned());
                Err(Error::Internal { reason })
            });
        match &res {
            Ok(res) => tracing::info!(hash = %res.hash, "broadcast transaction success"),
            Err(err) => tracing::error!("broadcast transaction failed: {err}"),
        }
        res
    }

    /// Split the messages into `batch` contiguous segments and submit them
    /// sequentially, each as its own Commit-mode transaction.
    ///
    /// Commit mode is forced so every segment has a definite outcome before
    /// the next one is signed against the incremented sequence number. On the
    /// first failing segment the accumulated results are returned inside
    /// [BatchError]; committed segments are not rolled back.
    pub async fn send_msg_batch(
        &self,
        batch: usize,
        msgs: Vec<Msg>,
        base_tx: &BaseTx,
    ) -> Result<Vec<ResultTx>, BatchError> {
        let base_tx = BaseTx {
            mode: Some(BroadcastMode::Commit),
            ..base_tx.clone()
        };
        let mut completed = Vec::new();
        for segment in split_batches(batch, msgs) {
            match self.build_and_send(segment, &base_tx).await {
                Ok(res) => completed.push(res),
                Err(source) => return Err(BatchError { completed, source }),
            }
        }
        Ok(completed)
    }

    /// Broadcast an externally signed transaction under an explicit mode,
    /// bypassing prepare entirely.
    pub async fn broadcast(&self, tx: &StdTx, mode: BroadcastMode) -> Result<ResultTx> {
        let tx_bytes = self.codec.marshal_tx(tx)?;
        self.broadcast_tx(mode, &tx_bytes).await
    }

    /// Build the per-call transaction context: chain-config defaults, then
    /// the on-chain account coordinates (online only), then the caller's
    /// explicitly supplied overrides. Caller fields always win; unset fields
    /// keep the defaults.
    async fn prepare(&self, base_tx: &BaseTx) -> Result<TxContext> {
        let mut ctx = TxContext::from_defaults(&self.config, self.default_fee.clone());
        if self.config.online {
            let address = self.signer.resolve(&base_tx.from).map_err(|err| match err {
                found @ Error::AddressNotFound { .. } => found,
                other => Error::AddressNotFound {
                    name: base_tx.from.clone(),
                    reason: other.to_string(),
                },
            })?;
            let account = self.query_account(&address).await?;
            ctx.account_number = account.account_number;
            ctx.sequence = account.sequence;
        }
        // first use caller params
        if !base_tx.fee.is_empty() {
            ctx.fee = self.to_min_coin(&base_tx.fee).await?;
        }
        if let Some(mode) = base_tx.mode {
            ctx.mode = mode;
        }
        if base_tx.simulate {
            ctx.simulate = true;
        }
        if base_tx.gas > 0 {
            ctx.gas = base_tx.gas;
        }
        if !base_tx.memo.is_empty() {
            ctx.memo = base_tx.memo.clone();
        }
        Ok(ctx)
    }

    async fn broadcast_tx(&self, mode: BroadcastMode, tx_bytes: &[u8]) -> Result<ResultTx> {
        match mode {
            BroadcastMode::Commit => self.broadcast_tx_commit(tx_bytes).await,
            BroadcastMode::Sync => self.broadcast_tx_sync(tx_bytes).await,
            BroadcastMode::Async => self.broadcast_tx_async(tx_bytes).await,
        }
    }

    /// Broadcast and wait for both execution phases. The delivery result is
    /// only consulted once the admission check has passed.
    async fn broadcast_tx_commit(&self, tx_bytes: &[u8]) -> Result<ResultTx> {
        let res = self.rpc.broadcast_tx_commit(tx_bytes).await?;
        if !res.check_tx.is_ok() {
            return Err(Error::node(
                res.check_tx.codespace,
                res.check_tx.code,
                res.check_tx.log,
            ));
        }
        if !res.deliver_tx.is_ok() {
            return Err(Error::node(
                res.deliver_tx.codespace,
                res.deliver_tx.code,
                res.deliver_tx.log,
            ));
        }
        Ok(ResultTx {
            gas_wanted: res.deliver_tx.gas_wanted,
            gas_used: res.deliver_tx.gas_used,
            tags: res.deliver_tx.tags,
            hash: res.hash,
            height: res.height,
        })
    }

    /// Broadcast and wait for the admission check only; execution has not
    /// happened yet, so only the hash is known.
    async fn broadcast_tx_sync(&self, tx_bytes: &[u8]) -> Result<ResultTx> {
        let res = self.rpc.broadcast_tx_sync(tx_bytes).await?;
        if res.code != 0 {
            return Err(Error::node(ROOT_CODESPACE, res.code, res.log));
        }
        Ok(ResultTx {
            hash: res.hash,
            ..ResultTx::default()
        })
    }

    /// Broadcast without waiting for any check. Callers poll [Self::query_tx]
    /// if they need the execution outcome.
    async fn broadcast_tx_async(&self, tx_bytes: &[u8]) -> Result<ResultTx> {
        let res = self.rpc.broadcast_tx_async(tx_bytes).await?;
        Ok(ResultTx {
            hash: res.hash,
            ..ResultTx::default()
        })
    }

    /// Look up a transaction by hex hash and join it with its block's
    /// timestamp.
    pub async fn query_tx(&self, hash: &str) -> Result<TxDetail> {
        let hash_bytes = hex::decode(hash).map_err(|source| Error::InvalidHash {
            hash: hash.to_owned(),
            source,
        })?;
        let res = self.rpc.tx(&hash_bytes).await?;
        let block = self.rpc.block(res.height).await?;
        self.format_tx_result(res, &block)
    }

    /// Paged tag-filtered transaction search.
    ///
    /// Requires at least one condition; an empty filter would scan the whole
    /// chain and is rejected before any network call. Block metadata is
    /// fetched once per distinct height in the result set.
    pub async fn query_txs(
        &self,
        builder: &EventQueryBuilder,
        page: u32,
        size: u32,
    ) -> Result<TxSearch> {
        let query = builder.build();
        if query.is_empty() {
            return Err(Error::InvalidQuery);
        }

        let res = self.rpc.tx_search(&query, page, size).await?;
        let blocks = self.blocks_for_tx_results(&res.txs).await?;

        let mut txs = Vec::with_capacity(res.txs.len());
        for tx in res.txs {
            let block = blocks.get(&tx.height).ok_or_else(|| Error::Internal {
                reason: format!("missing block {} for search result", tx.height),
            })?;
            txs.push(self.format_tx_result(tx, block)?);
        }

        Ok(TxSearch {
            total: res.total_count,
            page,
            size,
            txs,
        })
    }

    async fn blocks_for_tx_results(
        &self,
        txs: &[TxResponse],
    ) -> Result<HashMap<i64, BlockResponse>> {
        let mut blocks = HashMap::new();
        for tx in txs {
            if !blocks.contains_key(&tx.height) {
                let block = self.rpc.block(tx.height).await?;
                blocks.insert(tx.height, block);
            }
        }
        Ok(blocks)
    }

    fn format_tx_result(&self, res: TxResponse, block: &BlockResponse) -> Result<TxDetail> {
        let tx = self.codec.unmarshal_tx(&res.tx)?;
        Ok(TxDetail {
            hash: res.hash,
            height: res.height,
            tx,
            result: TxResult {
                code: res.tx_result.code,
                log: res.tx_result.log,
                gas_wanted: res.tx_result.gas_wanted,
                gas_used: res.tx_result.gas_used,
                tags: res.tx_result.tags,
            },
            timestamp: block.time.to_rfc3339(),
        })
    }

    /// ABCI query returning the raw response value; a non-OK response
    /// surfaces its log as the error.
    pub async fn query<P: Serialize + ?Sized>(&self, path: &str, param: &P) -> Result<Vec<u8>> {
        let data = serde_json::to_vec(param)?;
        self.abci_query_raw(path, &data).await
    }

    /// ABCI query with a JSON-decoded response.
    pub async fn query_with_response<T, P>(&self, path: &str, param: &P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let value = self.query(path, param).await?;
        Ok(serde_json::from_slice(&value)?)
    }

    /// Raw range query against a named store's subspace.
    pub async fn query_store(&self, key: &[u8], store_name: &str) -> Result<Vec<u8>> {
        let path = format!("/store/{store_name}/subspace");
        self.abci_query_raw(&path, key).await
    }

    async fn abci_query_raw(&self, path: &str, data: &[u8]) -> Result<Vec<u8>> {
        let res = self.rpc.abci_query(path, data).await?;
        if res.code != 0 {
            let codespace = if res.codespace.is_empty() {
                ROOT_CODESPACE.to_owned()
            } else {
                res.codespace
            };
            return Err(Error::node(codespace, res.code, res.log));
        }
        Ok(res.value)
    }

    /// Current account number and sequence for an address.
    pub async fn query_account(&self, address: &AccAddress) -> Result<BaseAccount> {
        #[derive(Serialize)]
        struct Param<'a> {
            address: &'a AccAddress,
        }
        self.query_with_response("custom/acc/account", &Param { address })
            .await
            .map_err(|err| match err {
                Error::Node { log, .. } => Error::AccountNotFound {
                    address: address.to_string(),
                    log,
                },
                other => other,
            })
    }

    /// Token metadata for a denomination, by symbol or minimal-unit name.
    ///
    /// Served from the process-wide cache when possible; a miss queries the
    /// asset module and caches the result under both names. A failed lookup
    /// is always returned as an error, never as empty metadata.
    pub async fn query_token(&self, denom: &str) -> Result<Token> {
        if let Some(token) = self.tokens.get(denom) {
            return Ok(token);
        }

        #[derive(Serialize)]
        struct Param<'a> {
            symbol: &'a str,
        }
        let symbol = denom.strip_suffix("-min").unwrap_or(denom);
        let token: Token = self
            .query_with_response("custom/asset/token", &Param { symbol })
            .await
            .map_err(|err| match err {
                Error::Node { log, .. } => Error::TokenNotFound {
                    denom: denom.to_owned(),
                    log,
                },
                other => other,
            })?;
        tracing::debug!(denom, "fetched token metadata from node");
        self.tokens.insert(token.clone());
        Ok(token)
    }

    /// Convert main-unit decimal coins to minimal-unit coins, sorted by
    /// denomination. Any single failure fails the whole batch.
    pub async fn to_min_coin(&self, coins: &[DecCoin]) -> Result<Vec<Coin>> {
        let mut converted = Vec::with_capacity(coins.len());
        for coin in coins {
            let token = self.query_token(&coin.denom).await?;
            converted.push(token.to_min_coin(coin)?);
        }
        Ok(sort_coins(converted))
    }

    /// Convert minimal-unit coins to main-unit decimal coins, sorted by
    /// denomination. Any single failure fails the whole batch.
    pub async fn to_main_coin(&self, coins: &[Coin]) -> Result<Vec<DecCoin>> {
        let mut converted = Vec::with_capacity(coins.len());
        for coin in coins {
            let token = self.query_token(&coin.denom).await?;
            converted.push(token.to_main_coin(coin)?);
        }
        converted.sort_by(|a, b| a.denom.cmp(&b.denom));
        Ok(converted)
    }
}

/// Split messages into `batch` contiguous segments; the last segment absorbs
/// the remainder. Fewer messages than segments collapse to a single segment.
fn split_batches<T>(batch: usize, msgs: Vec<T>) -> Vec<Vec<T>> {
    if batch <= 1 || msgs.len() < batch {
        return vec![msgs];
    }
    let quantity = msgs.len() / batch;
    let mut segments = Vec::with_capacity(batch);
    let mut rest = msgs;
    for _ in 0..batch - 1 {
        let tail = rest.split_off(quantity);
        segments.push(std::mem::replace(&mut rest, tail));
    }
    segments.push(rest);
    segments
}
