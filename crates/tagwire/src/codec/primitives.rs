//! Primitive encoding/decoding for the binary format.
//!
//! Implements the packed integer (big-endian VLQ with the sign folded into
//! bit 6 of the first byte) and the minimal big-endian magnitude layout used
//! by integer payloads.

use std::io::{Read, Write};

use crate::error::{map_read_error, Error, Result};
use crate::limits::{MAX_NUMERIC_BYTES, MAX_PACKED_INT_BYTES};

// =============================================================================
// STRUCTURAL TOKENS
// =============================================================================

/// Start of an object.
pub const START_OBJECT_TOKEN: i32 = -1;
/// End of an object.
pub const END_OBJECT_TOKEN: i32 = -2;
/// Start of an array.
pub const START_ARRAY_TOKEN: i32 = -3;
/// End of an array.
pub const END_ARRAY_TOKEN: i32 = -4;
/// Null value.
pub const NULL_TOKEN: i32 = -5;
/// Boolean true.
pub const TRUE_TOKEN: i32 = -6;
/// Boolean false.
pub const FALSE_TOKEN: i32 = -7;

/// Describes a packed integer read where a token was expected.
pub(crate) fn describe_token(value: i32) -> String {
    match value {
        START_OBJECT_TOKEN => "start of object".to_string(),
        END_OBJECT_TOKEN => "end of object".to_string(),
        START_ARRAY_TOKEN => "start of array".to_string(),
        END_ARRAY_TOKEN => "end of array".to_string(),
        NULL_TOKEN => "null".to_string(),
        TRUE_TOKEN | FALSE_TOKEN => "boolean".to_string(),
        n if n >= 0 => format!("length or member key {n}"),
        n => format!("unknown token {n}"),
    }
}

// =============================================================================
// PACKED INTEGERS
// =============================================================================

/// Encodes a packed integer into `buf` and returns the used prefix.
///
/// Magnitude `<= 0x3f` takes 1 byte, `<= 0x1fff` 2, `<= 0xfffff` 3,
/// `<= 0x7ffffff` 4, anything else 5.
pub fn encode_packed_int(value: i32, buf: &mut [u8; MAX_PACKED_INT_BYTES]) -> &[u8] {
    // Negative values store the complement so the magnitude stays non-negative
    let (sign, magnitude) = if value < 0 {
        (0x40u8, !value as u32)
    } else {
        (0u8, value as u32)
    };

    let len = match magnitude {
        0..=0x3f => 1,
        0x40..=0x1fff => 2,
        0x2000..=0xf_ffff => 3,
        0x10_0000..=0x7ff_ffff => 4,
        _ => 5,
    };

    for (i, byte) in buf.iter_mut().take(len).enumerate() {
        let shift = 7 * (len - 1 - i);
        *byte = ((magnitude >> shift) & 0x7f) as u8;
        if i + 1 < len {
            *byte |= 0x80;
        }
    }
    buf[0] |= sign;
    &buf[..len]
}

/// Writes a packed integer.
pub fn write_packed_int<W: Write + ?Sized>(writer: &mut W, value: i32) -> Result<()> {
    let mut buf = [0u8; MAX_PACKED_INT_BYTES];
    writer.write_all(encode_packed_int(value, &mut buf))?;
    Ok(())
}

/// Writes a structural token. Tokens are always negative.
pub fn write_token<W: Write + ?Sized>(writer: &mut W, token: i32) -> Result<()> {
    if token >= 0 {
        return Err(Error::InvalidTokenValue { token });
    }
    write_packed_int(writer, token)
}

/// Writes a length prefix. Lengths are never negative.
pub fn write_length<W: Write + ?Sized>(writer: &mut W, length: i32) -> Result<()> {
    if length < 0 {
        return Err(Error::NegativeLength { length });
    }
    write_packed_int(writer, length)
}

/// Converts a payload size to a wire length.
pub fn length_from_usize(len: usize, field: &'static str) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::LengthTooLarge {
        field,
        len,
        max: i32::MAX as usize,
    })
}

/// Reads a single byte.
#[inline]
pub fn read_byte<R: Read + ?Sized>(reader: &mut R, context: &'static str) -> Result<u8> {
    let mut byte = [0u8; 1];
    reader
        .read_exact(&mut byte)
        .map_err(|err| map_read_error(err, context))?;
    Ok(byte[0])
}

/// Reads a packed integer.
pub fn read_packed_int<R: Read + ?Sized>(reader: &mut R, context: &'static str) -> Result<i32> {
    let first = read_byte(reader, context)?;
    let negative = first & 0x40 != 0;
    let mut magnitude = u64::from(first & 0x3f);

    let mut byte = first;
    let mut len = 1;
    while byte & 0x80 != 0 {
        if len == MAX_PACKED_INT_BYTES {
            return Err(Error::PackedIntTooLong);
        }
        byte = read_byte(reader, context)?;
        magnitude = (magnitude << 7) | u64::from(byte & 0x7f);
        len += 1;
    }

    let magnitude = i32::try_from(magnitude).map_err(|_| Error::PackedIntOverflow)?;
    Ok(if negative { !magnitude } else { magnitude })
}

// =============================================================================
// INTEGER PAYLOADS
// =============================================================================

/// Encodes a signed integer as a minimal big-endian magnitude.
///
/// The most significant bit of the first byte carries the sign; negative
/// values store the complement. Returns the used suffix of `buf`.
pub fn encode_signed(value: i64, buf: &mut [u8; MAX_NUMERIC_BYTES]) -> &[u8] {
    let (sign, magnitude) = if value < 0 {
        (0x80u8, !value as u64)
    } else {
        (0u8, value as u64)
    };

    // Smallest width whose top bit stays free for the sign
    let mut len = 1;
    while len < MAX_NUMERIC_BYTES && magnitude >> (8 * len - 1) != 0 {
        len += 1;
    }

    *buf = magnitude.to_be_bytes();
    let bytes = &mut buf[MAX_NUMERIC_BYTES - len..];
    bytes[0] |= sign;
    bytes
}

/// Returns the wire width of an unsigned integer.
///
/// Widths 5 to 7 keep the top bit of the first byte clear, so values such as
/// `0x80_0000_0000` take one extra leading zero byte. Width 8 has no such
/// headroom.
pub fn unsigned_width(value: u64) -> usize {
    match value {
        0..=0xff => 1,
        0x100..=0xffff => 2,
        0x1_0000..=0xff_ffff => 3,
        0x100_0000..=0xffff_ffff => 4,
        0x1_0000_0000..=0x7f_ffff_ffff => 5,
        0x80_0000_0000..=0x7fff_ffff_ffff => 6,
        0x8000_0000_0000..=0x7f_ffff_ffff_ffff => 7,
        _ => 8,
    }
}

/// Encodes an unsigned integer as big-endian bytes of [`unsigned_width`].
pub fn encode_unsigned(value: u64, buf: &mut [u8; MAX_NUMERIC_BYTES]) -> &[u8] {
    let len = unsigned_width(value);
    *buf = value.to_be_bytes();
    &buf[MAX_NUMERIC_BYTES - len..]
}

fn check_numeric_len(bytes: &[u8], context: &'static str) -> Result<()> {
    if bytes.is_empty() || bytes.len() > MAX_NUMERIC_BYTES {
        return Err(Error::InvalidNumericLength {
            context,
            len: bytes.len(),
        });
    }
    Ok(())
}

/// Decodes a sign-folded big-endian magnitude.
pub fn decode_signed(bytes: &[u8], context: &'static str) -> Result<i64> {
    check_numeric_len(bytes, context)?;
    let negative = bytes[0] & 0x80 != 0;
    let magnitude = bytes[1..]
        .iter()
        .fold(u64::from(bytes[0] & 0x7f), |acc, &b| (acc << 8) | u64::from(b));
    // At most 63 significant bits remain once the sign is cleared
    let magnitude = magnitude as i64;
    Ok(if negative { !magnitude } else { magnitude })
}

/// Decodes big-endian unsigned bytes.
pub fn decode_unsigned(bytes: &[u8], context: &'static str) -> Result<u64> {
    check_numeric_len(bytes, context)?;
    Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn packed(value: i32) -> Vec<u8> {
        let mut buf = [0u8; MAX_PACKED_INT_BYTES];
        encode_packed_int(value, &mut buf).to_vec()
    }

    fn signed(value: i64) -> Vec<u8> {
        let mut buf = [0u8; MAX_NUMERIC_BYTES];
        encode_signed(value, &mut buf).to_vec()
    }

    fn unsigned(value: u64) -> Vec<u8> {
        let mut buf = [0u8; MAX_NUMERIC_BYTES];
        encode_unsigned(value, &mut buf).to_vec()
    }

    #[test]
    fn test_packed_int_vectors() {
        assert_eq!(packed(0), [0x00]);
        assert_eq!(packed(0x3f), [0x3f]);
        assert_eq!(packed(0x40), [0x80, 0x40]);
        assert_eq!(packed(0x1fff), [0xbf, 0x7f]);
        assert_eq!(packed(0x2000), [0x80, 0xc0, 0x00]);
        assert_eq!(packed(i32::MAX), [0x87, 0xff, 0xff, 0xff, 0x7f]);

        assert_eq!(packed(-1), [0x40]);
        assert_eq!(packed(-0x40), [0x7f]);
        assert_eq!(packed(-0x41), [0xc0, 0x40]);
        assert_eq!(packed(i32::MIN), [0xc7, 0xff, 0xff, 0xff, 0x7f]);
    }

    #[test]
    fn test_token_bytes() {
        let tokens = [
            START_OBJECT_TOKEN,
            END_OBJECT_TOKEN,
            START_ARRAY_TOKEN,
            END_ARRAY_TOKEN,
            NULL_TOKEN,
            TRUE_TOKEN,
            FALSE_TOKEN,
        ];
        for (i, token) in tokens.into_iter().enumerate() {
            assert_eq!(packed(token), [0x40 + i as u8]);
        }
    }

    #[test]
    fn test_packed_int_group_boundaries() {
        let widths = [
            (0x3f, 1),
            (0x40, 2),
            (0x1fff, 2),
            (0x2000, 3),
            (0xf_ffff, 3),
            (0x10_0000, 4),
            (0x7ff_ffff, 4),
            (0x800_0000, 5),
        ];
        for (value, width) in widths {
            for v in [value, !value] {
                let bytes = packed(v);
                assert_eq!(bytes.len(), width, "width for {v:#x}");
                let decoded = read_packed_int(&mut bytes.as_slice(), "test").unwrap();
                assert_eq!(decoded, v);
            }
        }
    }

    #[test]
    fn test_token_and_length_contracts() {
        let mut out = Vec::new();
        assert!(matches!(
            write_token(&mut out, 0),
            Err(Error::InvalidTokenValue { token: 0 })
        ));
        assert!(matches!(
            write_token(&mut out, 5),
            Err(Error::InvalidTokenValue { token: 5 })
        ));
        assert!(matches!(
            write_length(&mut out, -1),
            Err(Error::NegativeLength { length: -1 })
        ));
        assert!(out.is_empty());

        write_token(&mut out, NULL_TOKEN).unwrap();
        write_length(&mut out, 0).unwrap();
        assert_eq!(out, [0x44, 0x00]);
    }

    #[test]
    fn test_length_from_usize() {
        assert_eq!(length_from_usize(17, "bytes").unwrap(), 17);
        assert!(matches!(
            length_from_usize(i32::MAX as usize + 1, "bytes"),
            Err(Error::LengthTooLarge { field: "bytes", .. })
        ));
    }

    #[test]
    fn test_packed_int_too_long() {
        let data = [0x80u8; 6];
        let mut input = &data[..];
        assert!(matches!(
            read_packed_int(&mut input, "test"),
            Err(Error::PackedIntTooLong)
        ));
        // Stops after the fifth byte
        assert_eq!(input.len(), 1);
    }

    #[test]
    fn test_packed_int_overflow() {
        let data = [0x8f, 0xff, 0xff, 0xff, 0x7f];
        assert!(matches!(
            read_packed_int(&mut &data[..], "test"),
            Err(Error::PackedIntOverflow)
        ));
    }

    #[test]
    fn test_packed_int_truncated() {
        let data = [0x80u8, 0x80];
        assert!(matches!(
            read_packed_int(&mut &data[..], "member key"),
            Err(Error::UnexpectedEof { context: "member key" })
        ));
    }

    #[test]
    fn test_signed_vectors() {
        assert_eq!(signed(0), [0x00]);
        assert_eq!(signed(-1), [0x80]);
        assert_eq!(signed(127), [0x7f]);
        assert_eq!(signed(128), [0x00, 0x80]);
        assert_eq!(signed(-128), [0xff]);
        assert_eq!(signed(-129), [0x80, 0x80]);
        assert_eq!(signed(i32::MAX as i64), [0x7f, 0xff, 0xff, 0xff]);
        assert_eq!(signed(i32::MIN as i64), [0xff, 0xff, 0xff, 0xff]);
        assert_eq!(signed(i64::MAX), [0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(signed(i64::MIN), [0xff; 8]);
    }

    #[test]
    fn test_signed_width_transitions() {
        for width in 1..MAX_NUMERIC_BYTES {
            let max = (1i64 << (8 * width - 1)) - 1;
            assert_eq!(signed(max).len(), width);
            assert_eq!(signed(max + 1).len(), width + 1);
            assert_eq!(signed(!max).len(), width);
            assert_eq!(signed(!(max + 1)).len(), width + 1);
            for v in [max, max + 1, !max, !(max + 1)] {
                assert_eq!(decode_signed(&signed(v), "test").unwrap(), v);
            }
        }
    }

    #[test]
    fn test_unsigned_widths() {
        assert_eq!(unsigned(0), [0x00]);
        assert_eq!(unsigned(0xff), [0xff]);
        assert_eq!(unsigned(0x100), [0x01, 0x00]);
        assert_eq!(unsigned(0xffff_ffff), [0xff; 4]);
        assert_eq!(unsigned(0x1_0000_0000).len(), 5);
        assert_eq!(unsigned(0x7f_ffff_ffff).len(), 5);
        assert_eq!(unsigned(0x80_0000_0000), [0x00, 0x80, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(unsigned(0x7fff_ffff_ffff).len(), 6);
        assert_eq!(unsigned(0x8000_0000_0000).len(), 7);
        assert_eq!(unsigned(0x7f_ffff_ffff_ffff).len(), 7);
        assert_eq!(unsigned(0x80_0000_0000_0000).len(), 8);
        assert_eq!(unsigned(u64::MAX), [0xff; 8]);
    }

    #[test]
    fn test_numeric_length_rejected() {
        assert!(matches!(
            decode_signed(&[], "int64"),
            Err(Error::InvalidNumericLength { len: 0, .. })
        ));
        assert!(matches!(
            decode_unsigned(&[0u8; 9], "uint64"),
            Err(Error::InvalidNumericLength { len: 9, .. })
        ));
    }

    #[test]
    fn test_describe_token() {
        assert_eq!(describe_token(NULL_TOKEN), "null");
        assert_eq!(describe_token(3), "length or member key 3");
        assert_eq!(describe_token(-40), "unknown token -40");
    }

    proptest! {
        #[test]
        fn prop_packed_int_roundtrip(v in any::<i32>()) {
            let bytes = packed(v);
            let mut input = bytes.as_slice();
            prop_assert_eq!(read_packed_int(&mut input, "prop").unwrap(), v);
            prop_assert!(input.is_empty());
        }

        #[test]
        fn prop_signed_roundtrip(v in any::<i64>()) {
            prop_assert_eq!(decode_signed(&signed(v), "prop").unwrap(), v);
        }

        #[test]
        fn prop_unsigned_roundtrip(v in any::<u64>()) {
            prop_assert_eq!(decode_unsigned(&unsigned(v), "prop").unwrap(), v);
        }
    }
}
