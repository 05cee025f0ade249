//! Entry key encoding.
//!
//! A key is either a slot in a small predefined dictionary, written as one
//! byte below 64, or a free-form ASCII name whose first byte is at least 64.
//! Free-form names are written byte by byte with the high bit set on the
//! final byte.

use super::wire::ByteCursor;
use super::AlfalfaError;

/// Dictionary of predefined keys. Slot 0 terminates the entry list.
///
/// Cannot grow past 64 entries.
pub const PREDEFINED_KEYS: [&str; 4] = ["END", "wing", "erase", "cape"];

/// Bytes below this value are dictionary slots.
const LITERAL_THRESHOLD: u8 = 64;

const UNKNOWN_PREFIX: &str = "!unk";

/// A decoded or encodable entry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Dictionary slot 0-63, assigned or not.
    Predefined(u8),
    /// Free-form name.
    Literal(String),
}

impl Key {
    /// The list terminator.
    pub const END: Key = Key::Predefined(0);

    /// Classifies a map key for writing.
    ///
    /// Dictionary names map to their slot, `!unk<N>` maps back to raw slot
    /// `N`, and anything else must be a valid free-form name.
    pub fn parse(name: &str) -> Result<Key, AlfalfaError> {
        if let Some(idx) = PREDEFINED_KEYS.iter().position(|k| *k == name) {
            return Ok(Key::Predefined(idx as u8));
        }
        if let Some(slot) = name.strip_prefix(UNKNOWN_PREFIX) {
            return match slot.parse::<u8>() {
                Ok(n) if n < LITERAL_THRESHOLD => Ok(Key::Predefined(n)),
                _ => Err(invalid(name, "unknown slot must be a number from 0 to 63")),
            };
        }

        let bytes = name.as_bytes();
        match bytes {
            [] => Err(invalid(name, "it must not be empty")),
            [_] => Err(invalid(name, "it must be at least two characters long")),
            [first, ..] if *first < LITERAL_THRESHOLD => Err(invalid(
                name,
                "it must start with an ASCII character with value 64 (@) or greater",
            )),
            _ if !name.is_ascii() => Err(invalid(name, "it must only contain ASCII characters")),
            _ => Ok(Key::Literal(name.to_owned())),
        }
    }

    /// The map key this decodes to.
    pub fn name(&self) -> String {
        match self {
            Key::Predefined(idx) => match PREDEFINED_KEYS.get(*idx as usize) {
                Some(name) => (*name).to_owned(),
                None => format!("{UNKNOWN_PREFIX}{idx}"),
            },
            Key::Literal(name) => name.clone(),
        }
    }

    /// True for the list terminator, whether written as dictionary slot 0 or
    /// spelled out as a literal.
    pub fn is_end(&self) -> bool {
        match self {
            Key::Predefined(idx) => *idx == 0,
            Key::Literal(name) => name == PREDEFINED_KEYS[0],
        }
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Key::Predefined(idx) => out.push(*idx),
            Key::Literal(name) => {
                let bytes = name.as_bytes();
                let last = bytes.len() - 1;
                out.extend_from_slice(&bytes[..last]);
                out.push(bytes[last] | 0x80);
            }
        }
    }

    pub(crate) fn decode(cursor: &mut ByteCursor<'_>) -> Result<Key, AlfalfaError> {
        let first = cursor.read_u8()?;
        if first < LITERAL_THRESHOLD {
            return Ok(Key::Predefined(first));
        }
        let mut name = String::new();
        name.push(char::from(first));
        loop {
            let b = cursor.read_u8()?;
            if b & 0x80 != 0 {
                name.push(char::from(b & 0x7F));
                break;
            }
            name.push(char::from(b));
        }
        Ok(Key::Literal(name))
    }
}

fn invalid(name: &str, reason: &'static str) -> AlfalfaError {
    AlfalfaError::InvalidKey {
        key: name.to_owned(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(key: &Key) -> Vec<u8> {
        let mut out = Vec::new();
        key.encode(&mut out);
        out
    }

    #[test]
    fn test_dictionary_names() {
        assert_eq!(Key::parse("END").unwrap(), Key::END);
        assert_eq!(Key::parse("wing").unwrap(), Key::Predefined(1));
        assert_eq!(Key::parse("erase").unwrap(), Key::Predefined(2));
        assert_eq!(Key::parse("cape").unwrap(), Key::Predefined(3));
        assert_eq!(Key::Predefined(3).name(), "cape");
    }

    #[test]
    fn test_unassigned_slots_round_trip_by_name() {
        let key = Key::Predefined(17);
        assert_eq!(key.name(), "!unk17");
        assert_eq!(Key::parse("!unk17").unwrap(), key);
        assert_eq!(encoded(&key), vec![17]);
    }

    #[test]
    fn test_unknown_slot_out_of_range() {
        assert!(matches!(
            Key::parse("!unk64"),
            Err(AlfalfaError::InvalidKey { .. })
        ));
        assert!(matches!(
            Key::parse("!unkx"),
            Err(AlfalfaError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_literal_encoding_marks_last_byte() {
        let key = Key::parse("tail").unwrap();
        assert_eq!(encoded(&key), vec![b't', b'a', b'i', b'l' | 0x80]);
    }

    #[test]
    fn test_literal_decoding() {
        let data = [b'H', b'o', b'r', b'n' | 0x80, 0xFF];
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(
            Key::decode(&mut cursor).unwrap(),
            Key::Literal("Horn".to_owned())
        );
        assert_eq!(cursor.read_u8().unwrap(), 0xFF);
    }

    #[test]
    fn test_literal_decoding_truncated() {
        let data = [b'H', b'o'];
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            Key::decode(&mut cursor),
            Err(AlfalfaError::Truncated)
        ));
    }

    #[test]
    fn test_invalid_literals() {
        for name in ["", "x", "0abc", "?abc", "wïng"] {
            assert!(
                matches!(Key::parse(name), Err(AlfalfaError::InvalidKey { .. })),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_end_in_either_form() {
        assert!(Key::END.is_end());
        assert!(Key::Literal("END".to_owned()).is_end());
        assert!(!Key::Literal("ENDS".to_owned()).is_end());
        assert!(!Key::Predefined(1).is_end());
    }

    #[test]
    fn test_at_sign_is_lowest_literal_start() {
        assert_eq!(
            Key::parse("@x").unwrap(),
            Key::Literal("@x".to_owned())
        );
    }
}
