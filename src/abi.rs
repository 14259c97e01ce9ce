//! ABI-style tuple encoding
//!
//! Produces the same bytes as Solidity's `abi.encode` for tuples made of
//! `string`, `bytes` and `uint256` values:
//!
//! - the head holds one 32-byte word per field
//! - static fields (`uint`) are written inline in the head
//! - dynamic fields (`string`, `bytes`) write the offset of their tail,
//!   measured from the start of the tuple
//! - each tail is a 32-byte big-endian length followed by the data, right
//!   padded with zeros to a 32-byte boundary
//!
//! Every dynamic value carries its own length, so two distinct tuples never
//! share an encoding.

/// ABI word size in bytes
pub const WORD: usize = 32;

/// A single typed value in a tuple
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    String(&'a str),
    Bytes(&'a [u8]),
    Uint(u64),
}

impl Token<'_> {
    fn is_dynamic(&self) -> bool {
        matches!(self, Token::String(_) | Token::Bytes(_))
    }

    fn data(&self) -> &[u8] {
        match self {
            Token::String(s) => s.as_bytes(),
            Token::Bytes(b) => b,
            Token::Uint(_) => &[],
        }
    }
}

/// Encode an unsigned integer as a 32-byte big-endian ABI word.
///
/// The value occupies the last 8 bytes; the first 24 are zero.
pub fn uint_word(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

/// ABI-encode a tuple of tokens.
pub fn encode(tokens: &[Token<'_>]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let tail_len: usize = tokens
        .iter()
        .filter(|t| t.is_dynamic())
        .map(|t| WORD + padded_len(t.data().len()))
        .sum();

    let mut head = Vec::with_capacity(head_len + tail_len);
    let mut tail = Vec::with_capacity(tail_len);

    for token in tokens {
        match token {
            Token::Uint(value) => head.extend_from_slice(&uint_word(*value)),
            Token::String(_) | Token::Bytes(_) => {
                let offset = head_len + tail.len();
                head.extend_from_slice(&uint_word(offset as u64));

                let data = token.data();
                tail.extend_from_slice(&uint_word(data.len() as u64));
                tail.extend_from_slice(data);
                tail.resize(tail.len() + padded_len(data.len()) - data.len(), 0);
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// Tightly packed encoding (Solidity `abi.encodePacked`).
///
/// Strings and bytes are concatenated without length or padding; integers
/// take their full 32-byte word.
pub fn encode_packed(tokens: &[Token<'_>]) -> Vec<u8> {
    let mut out = Vec::new();
    for token in tokens {
        match token {
            Token::Uint(value) => out.extend_from_slice(&uint_word(*value)),
            _ => out.extend_from_slice(token.data()),
        }
    }
    out
}

/// Encode the four signed fields of a chat exchange as
/// `(string, string, string, string)`.
pub fn encode_strings(fields: &[&str]) -> Vec<u8> {
    let tokens: Vec<Token<'_>> = fields.iter().map(|s| Token::String(*s)).collect();
    encode(&tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn word(hex_str: &str) -> Vec<u8> {
        let mut w = hex::decode(hex_str).unwrap();
        w.resize(WORD, 0);
        w
    }

    #[test]
    fn test_uint_word_is_big_endian() {
        let w = uint_word(0x0102);
        assert!(w[..30].iter().all(|&b| b == 0));
        assert_eq!(w[30], 0x01);
        assert_eq!(w[31], 0x02);
        assert_eq!(uint_word(u64::MAX)[24..], [0xff; 8]);
    }

    #[test]
    fn test_single_string() {
        let encoded = encode(&[Token::String("abc")]);

        let mut expected = uint_word(0x20).to_vec();
        expected.extend_from_slice(&uint_word(3));
        expected.extend_from_slice(&word("616263"));
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_two_strings_with_empty() {
        let encoded = encode(&[Token::String("a"), Token::String("")]);

        let mut expected = Vec::new();
        expected.extend_from_slice(&uint_word(0x40));
        expected.extend_from_slice(&uint_word(0x80));
        expected.extend_from_slice(&uint_word(1));
        expected.extend_from_slice(&word("61"));
        expected.extend_from_slice(&uint_word(0));
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_exact_word_is_not_padded_further() {
        let s = "x".repeat(WORD);
        let encoded = encode(&[Token::String(&s)]);
        assert_eq!(encoded.len(), 3 * WORD);
    }

    #[test]
    fn test_mixed_static_and_dynamic() {
        let encoded = encode(&[Token::Uint(7), Token::Bytes(&[0xaa, 0xbb])]);

        let mut expected = Vec::new();
        expected.extend_from_slice(&uint_word(7));
        expected.extend_from_slice(&uint_word(0x40));
        expected.extend_from_slice(&uint_word(2));
        expected.extend_from_slice(&word("aabb"));
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_packed_concatenates() {
        let packed = encode_packed(&[Token::String("ab"), Token::Bytes(b"cd")]);
        assert_eq!(packed, b"abcd");
    }

    #[test]
    fn test_shifted_boundaries_differ() {
        // Plain concatenation would collide here
        let a = encode_strings(&["ab", "c", "", ""]);
        let b = encode_strings(&["a", "bc", "", ""]);
        assert_ne!(a, b);
    }

    fn field() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            ".{0,80}",
            // Strings that look like ABI length words
            proptest::collection::vec(prop_oneof![Just('\0'), Just(' '), Just('@'), Just('`')], 0..70)
                .prop_map(|cs: Vec<char>| cs.into_iter().collect::<String>()),
        ]
    }

    proptest! {
        #[test]
        fn prop_string_tuples_encode_injectively(
            a in proptest::array::uniform4(field()),
            b in proptest::array::uniform4(field()),
        ) {
            let ea = encode_strings(&[a[0].as_str(), a[1].as_str(), a[2].as_str(), a[3].as_str()]);
            let eb = encode_strings(&[b[0].as_str(), b[1].as_str(), b[2].as_str(), b[3].as_str()]);
            prop_assert_eq!(a == b, ea == eb);
        }

        #[test]
        fn prop_encoding_is_word_aligned(a in proptest::array::uniform4(field())) {
            let encoded = encode_strings(&[a[0].as_str(), a[1].as_str(), a[2].as_str(), a[3].as_str()]);
            prop_assert_eq!(encoded.len() % WORD, 0);
        }
    }
}
