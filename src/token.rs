use std::collections::HashMap;

use cosmwasm_std::{Decimal, Uint128};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::coin::{Coin, DecCoin};
use crate::error::{Error, Result};

/// On-chain token metadata, fetched once from the asset module and then
/// treated as immutable for the lifetime of the process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub symbol: String,
    pub name: String,
    /// Number of decimal places between the main unit and the minimal unit.
    pub scale: u32,
    pub min_unit: String,
}

impl Token {
    /// Rescale a main-unit decimal amount into the minimal integer unit.
    ///
    /// An input already denominated in the minimal unit passes through with a
    /// factor of one, so re-converting converted coins is the identity.
    /// Fractional precision beyond the token's scale is an error rather than
    /// silent truncation.
    pub fn to_min_coin(&self, coin: &DecCoin) -> Result<Coin> {
        let factor = if coin.denom == self.min_unit {
            Uint128::one()
        } else {
            self.min_unit_factor()?
        };
        let atomics = coin
            .amount
            .atomics()
            .checked_mul(factor)
            .map_err(|_| Error::conversion(&coin.denom, coin.amount, "amount overflow"))?;
        let one = Uint128::new(10u128.pow(Decimal::DECIMAL_PLACES));
        if !(atomics % one).is_zero() {
            return Err(Error::conversion(
                &coin.denom,
                coin.amount,
                format!("precision exceeds token scale {}", self.scale),
            ));
        }
        Ok(Coin {
            denom: self.min_unit.clone(),
            amount: atomics / one,
        })
    }

    /// Rescale a minimal-unit integer amount into the main decimal unit.
    pub fn to_main_coin(&self, coin: &Coin) -> Result<DecCoin> {
        let factor = if coin.denom == self.symbol {
            Uint128::one()
        } else {
            self.min_unit_factor()?
        };
        let amount = Decimal::checked_from_ratio(coin.amount, factor)
            .map_err(|_| Error::conversion(&coin.denom, coin.amount, "amount overflow"))?;
        Ok(DecCoin {
            denom: self.symbol.clone(),
            amount,
        })
    }

    fn min_unit_factor(&self) -> Result<Uint128> {
        10u128
            .checked_pow(self.scale)
            .map(Uint128::new)
            .ok_or_else(|| {
                Error::conversion(
                    &self.symbol,
                    "",
                    format!("unusable token scale {}", self.scale),
                )
            })
    }
}

/// Process-wide token metadata cache.
///
/// Append-mostly: reads happen on every conversion, a write only on the first
/// sight of a new denomination. Entries are stored under both the symbol and
/// the minimal-unit name and never expire.
#[derive(Default)]
pub struct TokenCache {
    tokens: RwLock<HashMap<String, Token>>,
}

impl TokenCache {
    pub fn get(&self, denom: &str) -> Option<Token> {
        self.tokens.read().get(denom).cloned()
    }

    pub fn insert(&self, token: Token) {
        let mut guard = self.tokens.write();
        guard.insert(token.symbol.clone(), token.clone());
        guard.insert(token.min_unit.clone(), token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iris() -> Token {
        Token {
            symbol: "iris".to_owned(),
            name: "Irishub staking token".to_owned(),
            scale: 6,
            min_unit: "uiris".to_owned(),
        }
    }

    #[test]
    fn main_to_min() {
        let coin = DecCoin::new("iris", Decimal::from_ratio(15u128, 10u128));
        assert_eq!(iris().to_min_coin(&coin).unwrap(), Coin::new("uiris", 1_500_000));
    }

    #[test]
    fn min_unit_input_is_identity() {
        let coin = DecCoin::new("uiris", Decimal::from_ratio(1_500_000u128, 1u128));
        assert_eq!(iris().to_min_coin(&coin).unwrap(), Coin::new("uiris", 1_500_000));
    }

    #[test]
    fn min_to_main() {
        let coin = Coin::new("uiris", 2_500_000);
        let main = iris().to_main_coin(&coin).unwrap();
        assert_eq!(main.denom, "iris");
        assert_eq!(main.amount, Decimal::from_ratio(25u128, 10u128));
    }

    #[test]
    fn excess_precision_fails() {
        // 6-decimal token cannot represent 0.0000001 iris
        let coin = DecCoin::new("iris", Decimal::from_ratio(1u128, 10_000_000u128));
        let err = iris().to_min_coin(&coin).unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }), "{err}");
    }

    #[test]
    fn cache_serves_both_keys() {
        let cache = TokenCache::default();
        assert!(cache.get("iris").is_none());
        cache.insert(iris());
        assert_eq!(cache.get("iris"), Some(iris()));
        assert_eq!(cache.get("uiris"), Some(iris()));
        assert!(cache.get("atom").is_none());
    }
}
