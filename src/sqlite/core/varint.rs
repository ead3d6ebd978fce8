//! SQLite variable-length integers.
//!
//! A varint is one to nine bytes. Each of the first eight bytes contributes
//! its low seven bits, most significant first, with the high bit set when
//! more bytes follow. A ninth byte, if reached, contributes all eight bits.
//! The decoded value is a 64-bit signed integer.

use crate::error::{Error, Result};

/// Decodes one varint from the front of `bytes`.
///
/// Returns the value and the number of bytes consumed. Fails when the buffer
/// ends while the continuation bit is still set.
pub fn read_varint(bytes: &[u8]) -> Result<(i64, usize)> {
    let mut value: i64 = 0;

    for (i, &byte) in bytes.iter().take(9).enumerate() {
        if i == 8 {
            value = (value << 8) | byte as i64;
            return Ok((value, 9));
        }

        value = (value << 7) | (byte & 0x7f) as i64;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }

    Err(Error::malformed("varint overruns its buffer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Inverse of `read_varint`, used to check the round-trip property.
    fn encode_varint(value: i64) -> Vec<u8> {
        let value = value as u64;
        if value >> 56 != 0 {
            // Nine-byte form: eight continuation bytes then a full byte.
            let mut out = Vec::with_capacity(9);
            for i in (1..9).rev() {
                out.push(0x80 | ((value >> (8 + 7 * (i - 1))) & 0x7f) as u8);
            }
            out.push((value & 0xff) as u8);
            return out;
        }

        let mut groups = vec![(value & 0x7f) as u8];
        let mut rest = value >> 7;
        while rest != 0 {
            groups.push((rest & 0x7f) as u8);
            rest >>= 7;
        }
        groups
            .iter()
            .rev()
            .enumerate()
            .map(|(i, &g)| if i + 1 < groups.len() { 0x80 | g } else { g })
            .collect()
    }

    #[test]
    fn single_byte() -> Result<()> {
        assert_eq!(read_varint(&[0x00])?, (0, 1));
        assert_eq!(read_varint(&[0x7f])?, (127, 1));
        Ok(())
    }

    #[test]
    fn two_bytes_msb_first() -> Result<()> {
        // 0x81 0x00 = 1 << 7
        assert_eq!(read_varint(&[0x81, 0x00])?, (128, 2));
        Ok(())
    }

    #[test]
    fn nine_bytes_all_continuation() -> Result<()> {
        let (value, len) = read_varint(&[0xff; 9])?;
        assert_eq!(len, 9);
        assert_eq!(value, -1);
        Ok(())
    }

    #[test]
    fn trailing_bytes_ignored() -> Result<()> {
        let (value, len) = read_varint(&[0x05, 0xaa, 0xbb])?;
        assert_eq!((value, len), (5, 1));
        Ok(())
    }

    #[test]
    fn truncated_varint_is_malformed() {
        assert!(read_varint(&[0x80, 0x80]).is_err());
        assert!(read_varint(&[]).is_err());
    }

    #[test]
    fn round_trip() -> Result<()> {
        for v in [
            0i64,
            1,
            127,
            128,
            16384,
            3_000_000,
            i64::from(u32::MAX),
            1 << 45,
            (1 << 62) + 1234,
            i64::MAX,
        ] {
            let encoded = encode_varint(v);
            let (decoded, len) = read_varint(&encoded)?;
            assert_eq!(decoded, v);
            assert_eq!(len, encoded.len());
        }
        Ok(())
    }
}
