//! A tagged RLP value, distinguishing byte strings from lists at the type
//! level so a caller can never feed one where the other is meant.

use bytes::Bytes;
use ethereum_types::U256;
use rlp::{DecoderError, Rlp, RlpStream};

/// One RLP value: an opaque byte string or a list of nested values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    /// A byte string, encoded with the usual single-byte inlining and
    /// length-prefix rules.
    Bytes(Bytes),
    /// A heterogeneous list of nested items.
    List(Vec<RlpItem>),
}

impl RlpItem {
    /// Byte-string item copied out of anything byte-like.
    pub fn bytes(data: impl AsRef<[u8]>) -> Self {
        Self::Bytes(Bytes::copy_from_slice(data.as_ref()))
    }

    /// Scalar item: minimal big-endian bytes, where zero is the empty
    /// string rather than `0x00`.
    pub fn scalar(value: U256) -> Self {
        if value.is_zero() {
            return Self::Bytes(Bytes::new());
        }
        let mut word = [0u8; 32];
        value.to_big_endian(&mut word);
        let skip = 32 - (value.bits() + 7) / 8;
        Self::Bytes(Bytes::copy_from_slice(&word[skip..]))
    }

    /// Canonical RLP encoding of this item.
    pub fn encode(&self) -> Bytes {
        let mut stream = RlpStream::new();
        self.encode_into(&mut stream);
        stream.out().freeze()
    }

    fn encode_into(&self, stream: &mut RlpStream) {
        match self {
            Self::Bytes(data) => {
                stream.append(&data.as_ref());
            }
            Self::List(items) => {
                stream.begin_list(items.len());
                for item in items {
                    item.encode_into(stream);
                }
            }
        }
    }

    /// Decode a single item from canonical RLP, rejecting trailing bytes.
    pub fn decode(data: &[u8]) -> Result<Self, DecoderError> {
        let rlp = Rlp::new(data);
        let info = rlp.payload_info()?;
        if info.header_len + info.value_len != data.len() {
            return Err(DecoderError::RlpIsTooBig);
        }
        Self::from_rlp(&rlp)
    }

    fn from_rlp(rlp: &Rlp<'_>) -> Result<Self, DecoderError> {
        if rlp.is_list() {
            let mut items = Vec::with_capacity(rlp.item_count()?);
            for child in rlp.iter() {
                items.push(Self::from_rlp(&child)?);
            }
            Ok(Self::List(items))
        } else {
            Ok(Self::Bytes(Bytes::copy_from_slice(rlp.data()?)))
        }
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    fn enc(item: &RlpItem) -> Vec<u8> {
        item.encode().to_vec()
    }

    #[test]
    fn empty_string_is_0x80() {
        assert_eq!(enc(&RlpItem::Bytes(Bytes::new())), hex!("80"));
    }

    #[test]
    fn single_low_byte_is_inlined() {
        assert_eq!(enc(&RlpItem::bytes([0x7f])), hex!("7f"));
        assert_eq!(enc(&RlpItem::bytes([0x80])), hex!("8180"));
    }

    #[test]
    fn scalar_zero_is_the_empty_string() {
        assert_eq!(RlpItem::scalar(U256::zero()), RlpItem::Bytes(Bytes::new()));
        assert_eq!(enc(&RlpItem::scalar(U256::zero())), hex!("80"));
    }

    #[test]
    fn scalars_trim_leading_zeroes() {
        assert_eq!(enc(&RlpItem::scalar(U256::from(0x01u64))), hex!("01"));
        assert_eq!(enc(&RlpItem::scalar(U256::from(0x0400u64))), hex!("820400"));
        assert_eq!(
            enc(&RlpItem::scalar(U256::from(0x0136f578u64))),
            hex!("840136f578"),
        );
    }

    #[test]
    fn nested_lists_round_trip() {
        let item = RlpItem::List(vec![
            RlpItem::bytes(hex!("deadbeef")),
            RlpItem::List(vec![RlpItem::scalar(U256::from(7u64)), RlpItem::List(vec![])]),
        ]);
        let encoded = item.encode();
        assert_eq!(encoded.as_ref(), &hex!("c884deadbeefc207c0")[..]);
        assert_eq!(RlpItem::decode(&encoded), Ok(item));
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        assert_eq!(
            RlpItem::decode(&hex!("c0ff")),
            Err(DecoderError::RlpIsTooBig),
        );
    }
}
