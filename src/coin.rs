use std::fmt::Display;

use cosmwasm_std::{Decimal, Uint128};
use serde::{Deserialize, Serialize};

/// A coin amount in the token's minimal (integer) unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: Uint128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Coin {
        Coin {
            denom: denom.into(),
            amount: Uint128::new(amount),
        }
    }
}

impl Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// A coin amount in the token's main (human decimal) unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecCoin {
    pub denom: String,
    pub amount: Decimal,
}

impl DecCoin {
    pub fn new(denom: impl Into<String>, amount: Decimal) -> DecCoin {
        DecCoin {
            denom: denom.into(),
            amount,
        }
    }

    /// Drop the fractional part, keeping the denomination as-is.
    ///
    /// Used for configured default fees on offline clients, where no token
    /// metadata is available to rescale the amount.
    pub fn truncate(&self) -> Coin {
        Coin {
            denom: self.denom.clone(),
            amount: self.amount.to_uint_floor(),
        }
    }
}

impl Display for DecCoin {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Sort coins by denomination. Fee and amount lists must be deterministically
/// ordered before signing, or the signed bytes will not match what the node
/// reconstructs.
pub fn sort_coins(mut coins: Vec<Coin>) -> Vec<Coin> {
    coins.sort_by(|a, b| a.denom.cmp(&b.denom));
    coins
}

/// See [sort_coins].
pub fn sort_dec_coins(mut coins: Vec<DecCoin>) -> Vec<DecCoin> {
    coins.sort_by(|a, b| a.denom.cmp(&b.denom));
    coins
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_by_denom() {
        let coins = vec![
            Coin::new("ubbb", 5),
            Coin::new("uaaa", 9),
            Coin::new("uccc", 1),
        ];
        let sorted = sort_coins(coins);
        let denoms: Vec<&str> = sorted.iter().map(|c| c.denom.as_str()).collect();
        assert_eq!(denoms, vec!["uaaa", "ubbb", "uccc"]);
    }

    #[test]
    fn truncate_drops_fraction() {
        let dec = DecCoin::new("iris", Decimal::from_ratio(25u128, 10u128));
        assert_eq!(dec.truncate(), Coin::new("iris", 2));
    }

    #[test]
    fn coin_display() {
        assert_eq!(Coin::new("uiris", 42).to_string(), "42uiris");
    }
}
