//! Error types exposed by this package.

use crate::tx::ResultTx;

/// Codespace used for errors raised by this SDK itself rather than by a
/// specific chain module.
pub const ROOT_CODESPACE: &str = "sdk";

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while preparing, submitting or querying transactions.
///
/// Node-reported failures keep the codespace/code/log triple the node sent so
/// callers can branch on the rejecting module instead of parsing log strings.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("message failed validation: {reason}")]
    Validation { reason: String },

    #[error("no address found for key name {name}: {reason}")]
    AddressNotFound { name: String, reason: String },

    #[error("account {address} not found: {log}")]
    AccountNotFound { address: String, log: String },

    #[error("no token found for denom {denom}: {log}")]
    TokenNotFound { denom: String, log: String },

    #[error("cannot convert {amount}{denom}: {reason}")]
    Conversion {
        denom: String,
        amount: String,
        reason: String,
    },

    #[error("signing failed: {reason}")]
    Signing { reason: String },

    #[error("node returned {codespace}/{code}: {log}")]
    Node {
        codespace: String,
        code: u32,
        log: String,
    },

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("transaction {hash} not found")]
    NotFound { hash: String },

    #[error("must declare at least one tag to search")]
    InvalidQuery,

    #[error("codec failure: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("malformed transaction bytes: {reason}")]
    InvalidTxBytes { reason: String },

    #[error("invalid transaction hash {hash}: {source}")]
    InvalidHash {
        hash: String,
        source: hex::FromHexError,
    },

    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("internal fault during broadcast: {reason}")]
    Internal { reason: String },
}

impl Error {
    pub(crate) fn node(codespace: impl Into<String>, code: u32, log: impl Into<String>) -> Self {
        Error::Node {
            codespace: codespace.into(),
            code,
            log: log.into(),
        }
    }

    pub(crate) fn conversion(
        denom: impl Into<String>,
        amount: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Error::Conversion {
            denom: denom.into(),
            amount: amount.to_string(),
            reason: reason.into(),
        }
    }
}

/// A batch submission failure, carrying the results of the segments that
/// committed before the failing one. Committed segments are never rolled back.
#[derive(thiserror::Error, Debug)]
#[error("batch aborted after {} committed segment(s): {source}", completed.len())]
pub struct BatchError {
    pub completed: Vec<ResultTx>,
    #[source]
    pub source: Error,
}
