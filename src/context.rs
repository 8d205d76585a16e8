use std::fmt::Display;
use std::str::FromStr;

use serde::de::Visitor;

use crate::coin::{Coin, DecCoin};
use crate::config::ClientConfig;
use crate::error::Error;

/// Delivery guarantee requested for a broadcast.
///
/// `Commit` waits for the transaction to be checked and executed in a block,
/// `Sync` waits for the admission check only, `Async` returns as soon as the
/// node accepts the send. Callers trade latency for certainty.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum BroadcastMode {
    Sync,
    Async,
    Commit,
}

impl BroadcastMode {
    fn as_str(self) -> &'static str {
        match self {
            BroadcastMode::Sync => "sync",
            BroadcastMode::Async => "async",
            BroadcastMode::Commit => "commit",
        }
    }
}

impl Display for BroadcastMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BroadcastMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sync" => Ok(BroadcastMode::Sync),
            "async" => Ok(BroadcastMode::Async),
            "commit" => Ok(BroadcastMode::Commit),
            _ => Err(Error::Validation {
                reason: format!("unknown broadcast mode: {s}"),
            }),
        }
    }
}

impl serde::Serialize for BroadcastMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for BroadcastMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(BroadcastModeVisitor)
    }
}

struct BroadcastModeVisitor;

impl<'de> Visitor<'de> for BroadcastModeVisitor {
    type Value = BroadcastMode;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("BroadcastMode")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        BroadcastMode::from_str(v).map_err(E::custom)
    }
}

/// Caller-supplied parameters for a single submission.
///
/// Only explicitly set fields override the configured defaults: an empty fee,
/// zero gas, empty memo or `None` mode keep the client's configuration.
#[derive(Clone, Debug, Default)]
pub struct BaseTx {
    /// Key name of the sender, resolved through the [crate::Signer].
    pub from: String,
    /// Credential handed to the signer to unlock the sender's key.
    pub password: String,
    /// Fee override in main units; converted to minimal units on prepare.
    pub fee: Vec<DecCoin>,
    pub gas: u64,
    pub memo: String,
    pub mode: Option<BroadcastMode>,
    pub simulate: bool,
}

impl BaseTx {
    pub fn new(from: impl Into<String>, password: impl Into<String>) -> BaseTx {
        BaseTx {
            from: from.into(),
            password: password.into(),
            ..BaseTx::default()
        }
    }
}

/// Everything a signature must cover for one transaction, fixed at prepare
/// time.
///
/// A fresh context is built for every submission from the configured defaults
/// plus the caller's overrides, then threaded by reference through signing and
/// broadcast. Nothing on the client is mutated per call, so two sequential
/// submissions cannot leak parameters into each other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxContext {
    pub chain_id: String,
    /// Meaningful only for online clients; zero otherwise.
    pub account_number: u64,
    /// Meaningful only for online clients; zero otherwise.
    pub sequence: u64,
    /// Fee in minimal units, sorted by denomination.
    pub fee: Vec<Coin>,
    pub gas: u64,
    pub memo: String,
    pub mode: BroadcastMode,
    pub simulate: bool,
}

impl TxContext {
    /// Seed a context from chain-config defaults. Account number and sequence
    /// start at zero until an online prepare overwrites them.
    pub(crate) fn from_defaults(config: &ClientConfig, default_fee: Vec<Coin>) -> TxContext {
        TxContext {
            chain_id: config.chain_id.clone(),
            account_number: 0,
            sequence: 0,
            fee: default_fee,
            gas: config.gas,
            memo: String::new(),
            mode: config.mode,
            simulate: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_round_trip() {
        for mode in [
            BroadcastMode::Sync,
            BroadcastMode::Async,
            BroadcastMode::Commit,
        ] {
            assert_eq!(mode.to_string().parse::<BroadcastMode>().unwrap(), mode);
        }
        assert!("block".parse::<BroadcastMode>().is_err());
    }

    #[test]
    fn defaults_reset_account_state() {
        let config = ClientConfig::new("http://localhost:26657", "test-chain");
        let ctx = TxContext::from_defaults(&config, vec![Coin::new("uiris", 4)]);
        assert_eq!(ctx.account_number, 0);
        assert_eq!(ctx.sequence, 0);
        assert_eq!(ctx.fee, vec![Coin::new("uiris", 4)]);
        assert_eq!(ctx.gas, config.gas);
        assert_eq!(ctx.mode, config.mode);
        assert!(!ctx.simulate);
        assert!(ctx.memo.is_empty());
    }
}
