use crate::coin::DecCoin;
use crate::context::BroadcastMode;

/// Chain-level defaults shared by every submission from one client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// RPC endpoint of the node, e.g. `http://localhost:26657`.
    pub node_uri: String,
    /// Chain ID the signatures must commit to.
    pub chain_id: String,
    /// Default fee in main units; normalized to minimal units when the client
    /// is constructed.
    pub fee: Vec<DecCoin>,
    /// Default gas limit.
    pub gas: u64,
    /// Default broadcast mode.
    pub mode: BroadcastMode,
    /// When false the client never queries chain state during prepare:
    /// account number and sequence stay zero and must be covered by the
    /// signer's own bookkeeping.
    pub online: bool,
}

impl ClientConfig {
    pub fn new(node_uri: impl Into<String>, chain_id: impl Into<String>) -> ClientConfig {
        ClientConfig {
            node_uri: node_uri.into(),
            chain_id: chain_id.into(),
            fee: Vec::new(),
            gas: 20_000,
            mode: BroadcastMode::Sync,
            online: true,
        }
    }
}
