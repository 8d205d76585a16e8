use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::tx::StdTx;

/// Binary transaction codec.
///
/// The wire format a node expects is chain-specific and out of scope here;
/// the client only needs a round-trippable framing, injected at construction.
pub trait TxCodec: Send + Sync {
    fn marshal_tx(&self, tx: &StdTx) -> Result<Vec<u8>>;
    fn unmarshal_tx(&self, bytes: &[u8]) -> Result<StdTx>;
}

/// Default codec: length-prefixed JSON framing.
///
/// A uvarint byte length followed by the canonical JSON encoding of the
/// transaction. Keeps the length-prefixed contract of the chain's amino
/// codec without pulling the amino wire format into this crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl TxCodec for JsonCodec {
    fn marshal_tx(&self, tx: &StdTx) -> Result<Vec<u8>> {
        let body = serde_json::to_vec(tx)?;
        let mut out = Vec::with_capacity(body.len() + 2);
        encode_uvarint(body.len() as u64, &mut out);
        out.extend_from_slice(&body);
        Ok(out)
    }

    fn unmarshal_tx(&self, bytes: &[u8]) -> Result<StdTx> {
        let (len, read) = decode_uvarint(bytes)?;
        let body = &bytes[read..];
        if body.len() as u64 != len {
            return Err(Error::InvalidTxBytes {
                reason: format!("length prefix {} does not match body {}", len, body.len()),
            });
        }
        Ok(serde_json::from_slice(body)?)
    }
}

fn encode_uvarint(mut n: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (n & 0x7f) as u8;
        n >>= 7;
        if n == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn decode_uvarint(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;
    for (i, byte) in bytes.iter().enumerate() {
        if i >= 10 {
            break;
        }
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(Error::InvalidTxBytes {
        reason: "truncated length prefix".to_owned(),
    })
}

/// Tendermint-style transaction hash: uppercase hex of the SHA-256 digest of
/// the serialized transaction bytes.
pub fn tx_hash(tx_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tx_bytes);
    hex::encode_upper(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::StdFee;

    #[test]
    fn marshal_round_trip() {
        let tx = StdTx {
            msgs: vec![],
            fee: StdFee {
                amount: vec![],
                gas: 20_000,
            },
            signatures: vec![],
            memo: "hello".to_owned(),
        };
        let codec = JsonCodec;
        let bytes = codec.marshal_tx(&tx).unwrap();
        assert_eq!(codec.unmarshal_tx(&bytes).unwrap(), tx);
    }

    #[test]
    fn rejects_bad_length_prefix() {
        let codec = JsonCodec;
        assert!(codec.unmarshal_tx(&[0x05, b'{']).is_err());
        assert!(codec.unmarshal_tx(&[0x80]).is_err());
    }

    #[test]
    fn uvarint_multi_byte() {
        let mut out = Vec::new();
        encode_uvarint(300, &mut out);
        assert_eq!(out, vec![0xac, 0x02]);
        assert_eq!(decode_uvarint(&out).unwrap(), (300, 2));
    }

    #[test]
    fn hash_is_upper_hex_sha256() {
        assert_eq!(
            tx_hash(b""),
            "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855"
        );
    }
}
