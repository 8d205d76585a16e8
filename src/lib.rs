pub use address::AccAddress;
pub use client::{BaseAccount, ChainClient};
pub use codec::{tx_hash, JsonCodec, TxCodec};
pub use coin::{sort_coins, sort_dec_coins, Coin, DecCoin};
pub use config::ClientConfig;
pub use context::{BaseTx, BroadcastMode, TxContext};
pub use error::{BatchError, Error, Result, ROOT_CODESPACE};
pub use msg::{Msg, MsgCreateRecord, MsgIssueToken, MsgSend, MsgVote, VoteOption};
pub use rpc::{HttpRpc, NodeRpc};
pub use signer::{sign_doc_bytes, Signer};
pub use token::{Token, TokenCache};
pub use tx::{
    EventQueryBuilder, ResultTx, StdFee, StdSignature, StdTx, Tag, TxDetail, TxResult, TxSearch,
};

mod address;
mod client;
mod codec;
mod coin;
mod config;
mod context;
mod error;
mod msg;
pub mod rpc;
mod signer;
mod token;
mod tx;
