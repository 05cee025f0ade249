//! Byte-level framing.
//!
//! ```text
//! [reserved:1]  read side only, skipped
//! [magic:4]     0xEA1FA1FA, big-endian
//! [version:1]   only 1 is understood
//! { [key] [len:1] [bytes:len] ... }   value chunks repeat while len == 255
//! [0]           dictionary slot 0, "END", no value
//! ```

use std::collections::BTreeMap;

use super::{Alfalfa, AlfalfaError, Key, Slice};

/// Magic number following the reserved byte ("EALFALFA").
pub const MAGIC: u32 = 0xEA1F_A1FA;

/// Largest value chunk; a chunk of exactly this length is followed by another.
const CHUNK_LEN: usize = 255;

/// Forward-only reader over a byte slice that reports running out of data
/// as [`AlfalfaError::Truncated`].
pub(crate) struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, AlfalfaError> {
        let b = *self.data.get(self.position).ok_or(AlfalfaError::Truncated)?;
        self.position += 1;
        Ok(b)
    }

    pub(crate) fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], AlfalfaError> {
        let end = self
            .position
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(AlfalfaError::Truncated)?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    pub(crate) fn read_u32_be(&mut self) -> Result<u32, AlfalfaError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

impl Alfalfa {
    /// Decodes a framed byte stream.
    ///
    /// The first byte is reserved and skipped. A magic or version mismatch
    /// yields `Ok(Alfalfa::NONE)`; running out of bytes mid-stream is an
    /// error so the caller can decide how to degrade.
    pub fn decode(bytes: &[u8]) -> Result<Alfalfa, AlfalfaError> {
        let mut cursor = ByteCursor::new(bytes);
        cursor.read_u8()?;

        let magic = cursor.read_u32_be()?;
        if magic != MAGIC {
            tracing::debug!(
                expected = %format!("{MAGIC:08x}"),
                got = %format!("{magic:08x}"),
                "Alfalfa magic number does not match"
            );
            return Ok(Alfalfa::NONE);
        }

        let version = cursor.read_u8()?;
        tracing::debug!(version, "Discovered Alfalfa data");
        if version != Alfalfa::CURRENT_VERSION {
            tracing::debug!(version, "Unknown Alfalfa version, ignoring");
            return Ok(Alfalfa::NONE);
        }

        let mut data = BTreeMap::new();
        loop {
            let key = Key::decode(&mut cursor)?;
            if key.is_end() {
                break;
            }

            let mut value = Vec::new();
            loop {
                let len = usize::from(cursor.read_u8()?);
                value.extend_from_slice(cursor.read_bytes(len)?);
                if len != CHUNK_LEN {
                    break;
                }
            }

            let name = key.name();
            tracing::debug!(key = %name, bytes = value.len(), "Found Alfalfa entry");
            data.insert(name, Slice::from(value));
        }

        tracing::debug!(entries = data.len(), "Finished reading Alfalfa data");
        Ok(Alfalfa::new(version, data))
    }

    /// Encodes the store into its framed byte form.
    ///
    /// The reserved leading byte is not emitted. [`Alfalfa::NONE`] encodes to
    /// nothing at all.
    pub fn encode(&self) -> Result<Vec<u8>, AlfalfaError> {
        let mut out = Vec::new();
        if self.version == 0 {
            return Ok(out);
        }
        if self.version != Alfalfa::CURRENT_VERSION {
            return Err(AlfalfaError::UnsupportedVersion(self.version));
        }

        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.push(self.version);

        for (name, value) in &self.data {
            let key = Key::parse(name)?;
            if key.is_end() {
                return Err(AlfalfaError::InvalidKey {
                    key: name.clone(),
                    reason: "it is reserved as the entry list terminator",
                });
            }
            key.encode(&mut out);

            let mut pos = 0;
            loop {
                let len = CHUNK_LEN.min(value.len() - pos);
                out.push(len as u8);
                value.slice(pos, len).write_to(&mut out)?;
                pos += len;
                // a full chunk always announces another, possibly empty, one
                if len < CHUNK_LEN {
                    break;
                }
            }
        }

        Key::END.encode(&mut out);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The decoder skips one byte the encoder never writes.
    fn framed(payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0];
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn test_none_encodes_to_nothing() {
        assert!(Alfalfa::NONE.encode().unwrap().is_empty());
    }

    #[test]
    fn test_empty_store_layout() {
        let bytes = Alfalfa::empty().encode().unwrap();
        assert_eq!(bytes, vec![0xEA, 0x1F, 0xA1, 0xFA, 0x01, 0x00]);
    }

    #[test]
    fn test_entry_layout() {
        let alfalfa = Alfalfa::empty()
            .with_entry("wing", vec![0xAA, 0xBB])
            .with_entry("Tx", vec![]);
        let bytes = alfalfa.encode().unwrap();

        // BTreeMap order: "Tx" < "wing"
        assert_eq!(
            bytes,
            vec![
                0xEA, 0x1F, 0xA1, 0xFA, 0x01, // header
                b'T', b'x' | 0x80, 0x00, // literal key, empty value
                0x01, 0x02, 0xAA, 0xBB, // wing
                0x00, // END
            ]
        );
    }

    #[test]
    fn test_unsupported_version() {
        let alfalfa = Alfalfa::new(2, BTreeMap::new());
        assert!(matches!(
            alfalfa.encode(),
            Err(AlfalfaError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn test_end_key_is_rejected() {
        let alfalfa = Alfalfa::empty().with_entry("END", vec![1]);
        assert!(matches!(
            alfalfa.encode(),
            Err(AlfalfaError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_invalid_key_is_rejected() {
        let alfalfa = Alfalfa::empty().with_entry("1st", vec![1]);
        assert!(matches!(
            alfalfa.encode(),
            Err(AlfalfaError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_round_trip_needs_reserved_byte() {
        let alfalfa = Alfalfa::empty().with_entry("cape", vec![1, 2, 3]);
        let bytes = alfalfa.encode().unwrap();

        assert_eq!(Alfalfa::decode(&framed(&bytes)).unwrap(), alfalfa);
        // without the reserved byte the magic is misaligned
        assert_eq!(Alfalfa::decode(&bytes).unwrap(), Alfalfa::NONE);
    }

    #[test]
    fn test_chunk_boundaries() {
        for len in [0usize, 1, 254, 255, 256, 510, 511] {
            let value: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let alfalfa = Alfalfa::empty().with_entry("erase", value);
            let bytes = alfalfa.encode().unwrap();

            // header + key + value + one length byte per chunk + END
            let chunks = len / 255 + 1;
            assert_eq!(bytes.len(), 5 + 1 + len + chunks + 1, "len {len}");
            assert_eq!(Alfalfa::decode(&framed(&bytes)).unwrap(), alfalfa);
        }
    }

    #[test]
    fn test_exact_chunk_has_empty_trailer() {
        let alfalfa = Alfalfa::empty().with_entry("wing", vec![7u8; 255]);
        let bytes = alfalfa.encode().unwrap();

        // key, 255, 255 bytes, 0, END
        assert_eq!(bytes[5], 1);
        assert_eq!(bytes[6], 255);
        assert_eq!(bytes[6 + 256], 0);
        assert_eq!(bytes[6 + 257], 0);
        assert_eq!(bytes.len(), 6 + 258);
    }

    #[test]
    fn test_magic_mismatch_yields_none() {
        let bytes = [0x00, 0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x00];
        assert_eq!(Alfalfa::decode(&bytes).unwrap(), Alfalfa::NONE);
    }

    #[test]
    fn test_unknown_version_yields_none() {
        let bytes = [0x00, 0xEA, 0x1F, 0xA1, 0xFA, 0x02, 0x00];
        assert_eq!(Alfalfa::decode(&bytes).unwrap(), Alfalfa::NONE);
    }

    #[test]
    fn test_truncated_stream_is_error() {
        let bytes = Alfalfa::empty()
            .with_entry("wing", vec![1, 2, 3, 4])
            .encode()
            .unwrap();
        let framed = framed(&bytes);

        for cut in 0..framed.len() {
            assert!(
                matches!(
                    Alfalfa::decode(&framed[..cut]),
                    Err(AlfalfaError::Truncated)
                ),
                "cut at {cut}"
            );
        }
    }

    #[test]
    fn test_unassigned_slot_decodes_as_unk() {
        let bytes = [0x00, 0xEA, 0x1F, 0xA1, 0xFA, 0x01, 0x2A, 0x01, 0x05, 0x00];
        let alfalfa = Alfalfa::decode(&bytes).unwrap();

        assert_eq!(alfalfa.get("!unk42").unwrap().as_bytes(), &[5]);
        // and writes back to the same slot
        assert_eq!(alfalfa.encode().unwrap(), bytes[1..].to_vec());
    }

    #[test]
    fn test_multiple_of_chunk_len_round_trips() {
        for len in [255usize, 510, 765] {
            let alfalfa = Alfalfa::empty()
                .with_entry("wing", vec![7u8; len])
                .with_entry("cape", vec![1]);
            let bytes = alfalfa.encode().unwrap();

            // one length byte per full chunk plus the empty trailer
            assert_eq!(bytes.len(), 5 + (1 + len + len / 255 + 1) + (1 + 1 + 1) + 1);
            assert_eq!(Alfalfa::decode(&framed(&bytes)).unwrap(), alfalfa, "len {len}");
        }
    }

    #[test]
    fn test_literal_end_key_terminates() {
        let bytes = [
            0x00, 0xEA, 0x1F, 0xA1, 0xFA, 0x01, // header
            b'E', b'N', b'D' | 0x80, // "END" spelled out
            0x01, 0x07, 0x00,
        ];
        let alfalfa = Alfalfa::decode(&bytes).unwrap();

        assert_eq!(alfalfa, Alfalfa::empty());
        assert!(!alfalfa.contains_key("END"));
        assert!(alfalfa.encode().is_ok());
    }

    #[test]
    fn test_trailing_bytes_after_end_are_ignored() {
        let mut bytes = framed(&Alfalfa::empty().with_entry("cape", vec![1]).encode().unwrap());
        bytes.extend_from_slice(&[0x55; 10]);

        let alfalfa = Alfalfa::decode(&bytes).unwrap();
        assert_eq!(alfalfa.get("cape").unwrap().as_bytes(), &[1]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_key() -> impl Strategy<Value = String> {
            prop_oneof![
                Just("wing".to_owned()),
                Just("erase".to_owned()),
                Just("cape".to_owned()),
                (4u8..64).prop_map(|n| format!("!unk{n}")),
                "[@-~][ -~]{1,12}".prop_filter("END is reserved", |k| k != "END"),
            ]
        }

        proptest! {
            #[test]
            fn wire_round_trip(
                entries in prop::collection::btree_map(
                    arb_key(),
                    prop::collection::vec(any::<u8>(), 0..600),
                    0..6,
                ),
            ) {
                let data = entries
                    .into_iter()
                    .map(|(k, v)| (k, Slice::from(v)))
                    .collect();
                let alfalfa = Alfalfa::new(1, data);
                let bytes = alfalfa.encode().unwrap();
                prop_assert_eq!(Alfalfa::decode(&framed(&bytes)).unwrap(), alfalfa);
            }

            #[test]
            fn decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..300)) {
                let _ = Alfalfa::decode(&bytes);
            }
        }
    }
}
