//! Domain messages accepted by the transaction pipeline.
//!
//! The message set is closed per chain version, so it is a plain enum rather
//! than an open trait object: validation is a match, and serde gains the
//! amino-style `{"type": ..., "value": ...}` envelope for free.

use cosmwasm_std::Uint128;
use serde::{Deserialize, Serialize};

use crate::address::AccAddress;
use crate::coin::Coin;
use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Msg {
    #[serde(rename = "bank/MsgSend")]
    Send(MsgSend),
    #[serde(rename = "asset/MsgIssueToken")]
    IssueToken(MsgIssueToken),
    #[serde(rename = "record/MsgCreateRecord")]
    CreateRecord(MsgCreateRecord),
    #[serde(rename = "gov/MsgVote")]
    Vote(MsgVote),
}

impl Msg {
    /// Stateless self-check, run before any network traffic is spent on the
    /// transaction.
    pub fn validate(&self) -> Result<()> {
        match self {
            Msg::Send(msg) => msg.validate(),
            Msg::IssueToken(msg) => msg.validate(),
            Msg::CreateRecord(msg) => msg.validate(),
            Msg::Vote(msg) => msg.validate(),
        }
    }
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::Validation {
        reason: reason.into(),
    }
}

/// Transfer coins between two accounts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSend {
    pub from_address: AccAddress,
    pub to_address: AccAddress,
    pub amount: Vec<Coin>,
}

impl MsgSend {
    fn validate(&self) -> Result<()> {
        if self.amount.is_empty() {
            return Err(invalid("send amount must not be empty"));
        }
        for coin in &self.amount {
            if coin.denom.is_empty() {
                return Err(invalid("send amount has an empty denom"));
            }
            if coin.amount.is_zero() {
                return Err(invalid(format!("send amount {coin} must be positive")));
            }
        }
        Ok(())
    }
}

/// Register a new token with the asset module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgIssueToken {
    pub symbol: String,
    pub name: String,
    pub scale: u32,
    pub min_unit: String,
    pub initial_supply: Uint128,
    pub owner: AccAddress,
}

impl MsgIssueToken {
    fn validate(&self) -> Result<()> {
        if self.symbol.is_empty() || !self.symbol.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(invalid(format!(
                "token symbol {:?} must be non-empty lowercase ascii",
                self.symbol
            )));
        }
        if self.min_unit.is_empty() {
            return Err(invalid("token min unit must not be empty"));
        }
        if self.scale > 18 {
            return Err(invalid(format!("token scale {} exceeds 18", self.scale)));
        }
        Ok(())
    }
}

/// Anchor arbitrary content digests on chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateRecord {
    pub digest: String,
    pub digest_algo: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub meta: String,
    pub creator: AccAddress,
}

impl MsgCreateRecord {
    fn validate(&self) -> Result<()> {
        if self.digest.is_empty() {
            return Err(invalid("record digest must not be empty"));
        }
        if self.digest_algo.is_empty() {
            return Err(invalid("record digest algo must not be empty"));
        }
        Ok(())
    }
}

/// Cast a vote on an active governance proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVote {
    pub proposal_id: u64,
    pub voter: AccAddress,
    pub option: VoteOption,
}

impl MsgVote {
    fn validate(&self) -> Result<()> {
        if self.proposal_id == 0 {
            return Err(invalid("proposal id must be positive"));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOption {
    Yes,
    No,
    Abstain,
    NoWithVeto,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> AccAddress {
        AccAddress::new("cosmos", [byte; 20])
    }

    fn send() -> Msg {
        Msg::Send(MsgSend {
            from_address: addr(1),
            to_address: addr(2),
            amount: vec![Coin::new("uiris", 100)],
        })
    }

    #[test]
    fn valid_send_passes() {
        send().validate().unwrap();
    }

    #[test]
    fn empty_amount_fails() {
        let msg = Msg::Send(MsgSend {
            from_address: addr(1),
            to_address: addr(2),
            amount: vec![],
        });
        assert!(matches!(
            msg.validate().unwrap_err(),
            Error::Validation { .. }
        ));
    }

    #[test]
    fn zero_coin_fails() {
        let msg = Msg::Send(MsgSend {
            from_address: addr(1),
            to_address: addr(2),
            amount: vec![Coin::new("uiris", 0)],
        });
        assert!(msg.validate().is_err());
    }

    #[test]
    fn issue_token_checks_symbol_and_scale() {
        let mut msg = MsgIssueToken {
            symbol: "kitty".to_owned(),
            name: "Kitty token".to_owned(),
            scale: 9,
            min_unit: "ukitty".to_owned(),
            initial_supply: Uint128::new(1_000_000),
            owner: addr(3),
        };
        msg.validate().unwrap();
        msg.scale = 19;
        assert!(msg.validate().is_err());
        msg.scale = 9;
        msg.symbol = "Kitty".to_owned();
        assert!(msg.validate().is_err());
    }

    #[test]
    fn vote_requires_proposal_id() {
        let msg = Msg::Vote(MsgVote {
            proposal_id: 0,
            voter: addr(4),
            option: VoteOption::Yes,
        });
        assert!(msg.validate().is_err());
    }

    #[test]
    fn serde_envelope() {
        let json = serde_json::to_value(send()).unwrap();
        assert_eq!(json["type"], "bank/MsgSend");
        assert_eq!(json["value"]["amount"][0]["amount"], "100");
        let back: Msg = serde_json::from_value(json).unwrap();
        assert_eq!(back, send());
    }
}
