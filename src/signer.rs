use serde::Serialize;

use crate::address::AccAddress;
use crate::context::TxContext;
use crate::error::Result;
use crate::msg::Msg;
use crate::tx::{StdFee, StdTx};

/// External signing capability: key lookup and transaction signing.
///
/// Mnemonic/keystore handling lives behind this trait. The client only
/// requires that [Signer::sign] produce a signature covering exactly the
/// sign doc for the supplied context and messages ([sign_doc_bytes]); any
/// mismatch is rejected by the node, not detected client-side.
pub trait Signer: Send + Sync {
    /// Resolve a key name to its account address.
    fn resolve(&self, name: &str) -> Result<AccAddress>;

    /// Sign the messages under the given context, returning a complete
    /// [StdTx]. Fails with [crate::Error::Signing] when the key is missing or
    /// the credential does not unlock it.
    fn sign(&self, name: &str, password: &str, ctx: &TxContext, msgs: Vec<Msg>) -> Result<StdTx>;
}

#[derive(Serialize)]
struct StdSignDoc<'a> {
    account_number: u64,
    chain_id: &'a str,
    fee: StdFee,
    memo: &'a str,
    msgs: &'a [Msg],
    sequence: u64,
}

/// The canonical bytes a signature must cover: messages, fee, memo, chain ID,
/// account number and sequence, JSON-encoded with fields in fixed order.
pub fn sign_doc_bytes(ctx: &TxContext, msgs: &[Msg]) -> Result<Vec<u8>> {
    let doc = StdSignDoc {
        account_number: ctx.account_number,
        chain_id: &ctx.chain_id,
        fee: StdFee {
            amount: ctx.fee.clone(),
            gas: ctx.gas,
        },
        memo: &ctx.memo,
        msgs,
        sequence: ctx.sequence,
    };
    Ok(serde_json::to_vec(&doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coin::Coin;
    use crate::config::ClientConfig;
    use crate::context::TxContext;

    #[test]
    fn sign_doc_covers_context_fields() {
        let config = ClientConfig::new("http://localhost:26657", "test-chain");
        let mut ctx = TxContext::from_defaults(&config, vec![Coin::new("uiris", 10)]);
        ctx.account_number = 8;
        ctx.sequence = 21;
        ctx.memo = "note".to_owned();

        let bytes = sign_doc_bytes(&ctx, &[]).unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(doc["chain_id"], "test-chain");
        assert_eq!(doc["account_number"], 8);
        assert_eq!(doc["sequence"], 21);
        assert_eq!(doc["memo"], "note");
        assert_eq!(doc["fee"]["gas"], 20_000);
        assert_eq!(doc["fee"]["amount"][0]["denom"], "uiris");
    }

    #[test]
    fn sign_doc_changes_with_sequence() {
        let config = ClientConfig::new("http://localhost:26657", "test-chain");
        let ctx_a = TxContext::from_defaults(&config, vec![]);
        let mut ctx_b = ctx_a.clone();
        ctx_b.sequence = 1;
        assert_ne!(
            sign_doc_bytes(&ctx_a, &[]).unwrap(),
            sign_doc_bytes(&ctx_b, &[]).unwrap()
        );
    }
}
