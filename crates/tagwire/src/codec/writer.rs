//! Binary object writer.

use std::io::Write;

use crate::codec::primitives::{
    encode_signed, encode_unsigned, length_from_usize, write_length, write_packed_int,
    write_token, END_ARRAY_TOKEN, END_OBJECT_TOKEN, FALSE_TOKEN, NULL_TOKEN, START_ARRAY_TOKEN,
    START_OBJECT_TOKEN, TRUE_TOKEN,
};
use crate::error::{Error, Result};
use crate::grammar::{ContainerKind, WriteGrammar};
use crate::inspect::{Inspector, Observer};
use crate::limits::MAX_NUMERIC_BYTES;
use crate::object::ObjectWriter;

/// Serializes grammar events to the compact binary form.
///
/// Every call writes straight to the sink; wrap the sink in a
/// [`BufWriter`](std::io::BufWriter) when it is unbuffered.
#[derive(Debug)]
pub struct BinaryObjectWriter<W> {
    sink: Inspector<W>,
    grammar: WriteGrammar,
}

impl<W: Write> BinaryObjectWriter<W> {
    /// Creates a writer over `sink`.
    pub fn new(sink: W) -> Self {
        Self {
            sink: Inspector::new(sink),
            grammar: WriteGrammar::new(),
        }
    }

    /// Creates a writer whose output is also reported to `observer`.
    pub fn with_observer(sink: W, observer: Box<dyn Observer>) -> Self {
        Self {
            sink: Inspector::with_observer(sink, observer),
            grammar: WriteGrammar::new(),
        }
    }

    /// Returns a reference to the sink.
    pub fn get_ref(&self) -> &W {
        self.sink.get_ref()
    }

    /// Unwraps the sink. Does not flush.
    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }

    fn write_signed(&mut self, value: i64, operation: &'static str) -> Result<()> {
        self.grammar.begin_value(false, operation)?;
        let mut buf = [0u8; MAX_NUMERIC_BYTES];
        let payload = encode_signed(value, &mut buf);
        self.write_payload(payload, operation)
    }

    fn write_unsigned(&mut self, value: u64, operation: &'static str) -> Result<()> {
        self.grammar.begin_value(false, operation)?;
        let mut buf = [0u8; MAX_NUMERIC_BYTES];
        let payload = encode_unsigned(value, &mut buf);
        self.write_payload(payload, operation)
    }

    /// Writes a length prefix followed by the payload.
    fn write_payload(&mut self, payload: &[u8], field: &'static str) -> Result<()> {
        write_length(&mut self.sink, length_from_usize(payload.len(), field)?)?;
        self.sink.write_all(payload)?;
        Ok(())
    }
}

impl<W: Write> ObjectWriter for BinaryObjectWriter<W> {
    fn write_start_object(&mut self) -> Result<()> {
        self.grammar.begin_value(true, "write_start_object")?;
        write_token(&mut self.sink, START_OBJECT_TOKEN)?;
        self.grammar.push(ContainerKind::Object);
        Ok(())
    }

    fn write_member(&mut self, key: i32) -> Result<()> {
        if key <= 0 {
            return Err(Error::InvalidMemberKey { key });
        }
        self.grammar.begin_member("write_member")?;
        write_packed_int(&mut self.sink, key)
    }

    fn write_end_object(&mut self) -> Result<()> {
        self.grammar.end(ContainerKind::Object, "write_end_object")?;
        write_token(&mut self.sink, END_OBJECT_TOKEN)
    }

    fn write_start_array(&mut self) -> Result<()> {
        self.grammar.begin_value(true, "write_start_array")?;
        write_token(&mut self.sink, START_ARRAY_TOKEN)?;
        self.grammar.push(ContainerKind::Array);
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<()> {
        self.grammar.end(ContainerKind::Array, "write_end_array")?;
        write_token(&mut self.sink, END_ARRAY_TOKEN)
    }

    fn write_null(&mut self) -> Result<()> {
        self.grammar.begin_value(false, "write_null")?;
        write_token(&mut self.sink, NULL_TOKEN)
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.grammar.begin_value(false, "write_bool")?;
        write_token(&mut self.sink, if value { TRUE_TOKEN } else { FALSE_TOKEN })
    }

    fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_signed(i64::from(value), "write_i32")
    }

    fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_unsigned(u64::from(value), "write_u32")
    }

    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_signed(value, "write_i64")
    }

    fn write_u64(&mut self, value: u64) -> Result<()> {
        self.write_unsigned(value, "write_u64")
    }

    fn write_f32(&mut self, value: f32) -> Result<()> {
        self.grammar.begin_value(false, "write_f32")?;
        self.write_payload(&value.to_be_bytes(), "write_f32")
    }

    fn write_f64(&mut self, value: f64) -> Result<()> {
        self.grammar.begin_value(false, "write_f64")?;
        self.write_payload(&value.to_be_bytes(), "write_f64")
    }

    fn write_bytes(&mut self, value: &[u8]) -> Result<()> {
        // Check the size before the grammar so a rejected blob leaves no trace
        length_from_usize(value.len(), "bytes")?;
        self.grammar.begin_value(false, "write_bytes")?;
        self.write_payload(value, "bytes")
    }

    fn write_str(&mut self, value: &str) -> Result<()> {
        length_from_usize(value.len(), "string")?;
        self.grammar.begin_value(false, "write_str")?;
        self.write_payload(value.as_bytes(), "string")
    }

    fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }

    fn depth(&self) -> usize {
        self.grammar.depth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::grammar::Token;

    fn written(tokens: &[Token<'_>]) -> Vec<u8> {
        let mut writer = BinaryObjectWriter::new(Vec::new());
        for token in tokens {
            writer.write_token(*token).unwrap();
        }
        writer.into_inner()
    }

    #[test]
    fn test_object_layout() {
        let bytes = written(&[
            Token::StartObject,
            Token::Member(1),
            Token::Int32(-1),
            Token::Member(2),
            Token::String("hi"),
            Token::Member(3),
            Token::Null,
            Token::EndObject,
        ]);
        assert_eq!(
            bytes,
            [0x40, 0x01, 0x01, 0x80, 0x02, 0x02, b'h', b'i', 0x03, 0x44, 0x41]
        );
    }

    #[test]
    fn test_array_and_bools() {
        let bytes = written(&[
            Token::StartArray,
            Token::Bool(true),
            Token::Bool(false),
            Token::UInt32(0x1234),
            Token::EndArray,
        ]);
        assert_eq!(bytes, [0x42, 0x45, 0x46, 0x02, 0x12, 0x34, 0x43]);
    }

    #[test]
    fn test_floats_are_length_prefixed() {
        let bytes = written(&[
            Token::StartArray,
            Token::Float32(1.0),
            Token::Float64(-2.0),
            Token::EndArray,
        ]);
        let mut expected = vec![0x42, 0x04];
        expected.extend_from_slice(&1.0f32.to_be_bytes());
        expected.push(0x08);
        expected.extend_from_slice(&(-2.0f64).to_be_bytes());
        expected.push(0x43);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_nullable_payloads() {
        let mut writer = BinaryObjectWriter::new(Vec::new());
        writer.write_start_array().unwrap();
        writer.write_nullable_bytes(None).unwrap();
        writer.write_nullable_str(None).unwrap();
        writer.write_nullable_bytes(Some(&[])).unwrap();
        writer.write_end_array().unwrap();
        assert_eq!(writer.into_inner(), [0x42, 0x44, 0x44, 0x00, 0x43]);
    }

    #[test]
    fn test_member_key_must_be_positive() {
        let mut writer = BinaryObjectWriter::new(Vec::new());
        writer.write_start_object().unwrap();
        for key in [0, -1, i32::MIN] {
            let err = writer.write_member(key).unwrap_err();
            assert!(matches!(err, Error::InvalidMemberKey { .. }));
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert_eq!(writer.get_ref(), &[0x40]);
    }

    #[test]
    fn test_grammar_violation_writes_nothing() {
        let mut writer = BinaryObjectWriter::new(Vec::new());
        assert!(matches!(
            writer.write_end_array(),
            Err(Error::NoOpenContainer { .. })
        ));
        assert!(matches!(writer.write_i32(1), Err(Error::NoOpenContainer { .. })));
        writer.write_start_array().unwrap();
        let err = writer.write_end_object().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedStructure);
        assert_eq!(writer.get_ref(), &[0x42]);
        assert_eq!(writer.depth(), 1);
    }
}
