//! Text object writer.

use std::fmt;
use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::write::EncoderWriter;

use crate::error::{Error, Result};
use crate::grammar::{ContainerKind, WriteGrammar};
use crate::inspect::{Inspector, Observer};
use crate::object::ObjectWriter;
use crate::text::escape::write_quoted;
use crate::text::TextOptions;

/// Serializes grammar events as JSON-style text.
#[derive(Debug)]
pub struct TextObjectWriter<W> {
    sink: Inspector<W>,
    grammar: WriteGrammar,
    options: TextOptions,
}

impl<W: Write> TextObjectWriter<W> {
    /// Creates a writer over `sink`.
    pub fn new(sink: W, options: TextOptions) -> Self {
        Self {
            sink: Inspector::new(sink),
            grammar: WriteGrammar::new(),
            options,
        }
    }

    /// Creates a writer whose output is also reported to `observer`.
    pub fn with_observer(sink: W, options: TextOptions, observer: Box<dyn Observer>) -> Self {
        Self {
            sink: Inspector::with_observer(sink, observer),
            grammar: WriteGrammar::new(),
            options,
        }
    }

    /// Returns the layout options.
    pub fn options(&self) -> &TextOptions {
        &self.options
    }

    /// Returns a reference to the sink.
    pub fn get_ref(&self) -> &W {
        self.sink.get_ref()
    }

    /// Unwraps the sink. Does not flush.
    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }

    /// Registers a value and writes the separator it needs.
    fn begin_value(&mut self, container: bool, operation: &'static str) -> Result<()> {
        if self.grammar.begin_value(container, operation)? {
            self.sink.write_all(b",")?;
        }
        Ok(())
    }

    fn write_scalar(&mut self, operation: &'static str, text: fmt::Arguments<'_>) -> Result<()> {
        self.begin_value(false, operation)?;
        self.sink.write_fmt(text)?;
        Ok(())
    }
}

/// Bare word for a non-finite float.
fn non_finite_word(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("NaN")
    } else if value == f64::INFINITY {
        Some("Infinity")
    } else if value == f64::NEG_INFINITY {
        Some("-Infinity")
    } else {
        None
    }
}

impl<W: Write> ObjectWriter for TextObjectWriter<W> {
    fn write_start_object(&mut self) -> Result<()> {
        self.begin_value(true, "write_start_object")?;
        self.sink.write_all(b"{")?;
        self.grammar.push(ContainerKind::Object);
        Ok(())
    }

    fn write_member(&mut self, key: i32) -> Result<()> {
        if key <= 0 {
            return Err(Error::InvalidMemberKey { key });
        }
        if self.grammar.begin_member("write_member")? {
            self.sink.write_all(b",")?;
        }
        if self.options.member_newlines {
            self.sink.write_all(b"\r\n")?;
        }
        write!(self.sink, "\"{key}\":")?;
        Ok(())
    }

    fn write_end_object(&mut self) -> Result<()> {
        self.grammar.end(ContainerKind::Object, "write_end_object")?;
        self.sink.write_all(b"}")?;
        Ok(())
    }

    fn write_start_array(&mut self) -> Result<()> {
        self.begin_value(true, "write_start_array")?;
        self.sink.write_all(b"[")?;
        self.grammar.push(ContainerKind::Array);
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<()> {
        self.grammar.end(ContainerKind::Array, "write_end_array")?;
        self.sink.write_all(b"]")?;
        Ok(())
    }

    fn write_null(&mut self) -> Result<()> {
        self.write_scalar("write_null", format_args!("null"))
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_scalar("write_bool", format_args!("{value}"))
    }

    fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_scalar("write_i32", format_args!("{value}"))
    }

    fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_scalar("write_u32", format_args!("{value}"))
    }

    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_scalar("write_i64", format_args!("{value}"))
    }

    fn write_u64(&mut self, value: u64) -> Result<()> {
        self.write_scalar("write_u64", format_args!("{value}"))
    }

    fn write_f32(&mut self, value: f32) -> Result<()> {
        match non_finite_word(f64::from(value)) {
            Some(word) => self.write_scalar("write_f32", format_args!("{word}")),
            None => self.write_scalar("write_f32", format_args!("{value:?}")),
        }
    }

    fn write_f64(&mut self, value: f64) -> Result<()> {
        match non_finite_word(value) {
            Some(word) => self.write_scalar("write_f64", format_args!("{word}")),
            None => self.write_scalar("write_f64", format_args!("{value:?}")),
        }
    }

    fn write_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.begin_value(false, "write_bytes")?;
        self.sink.write_all(b"\"")?;
        {
            let mut encoder = EncoderWriter::new(&mut self.sink, &STANDARD);
            encoder.write_all(value)?;
            encoder.finish()?;
        }
        self.sink.write_all(b"\"")?;
        Ok(())
    }

    fn write_str(&mut self, value: &str) -> Result<()> {
        self.begin_value(false, "write_str")?;
        write_quoted(&mut self.sink, value)?;
        Ok(())
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
    use crate::grammar::Token;

    fn written(options: TextOptions, tokens: &[Token<'_>]) -> String {
        let mut writer = TextObjectWriter::new(Vec::new(), options);
        for token in tokens {
            writer.write_token(*token).unwrap();
        }
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_object_layout() {
        let text = written(
            TextOptions::new(),
            &[
                Token::StartObject,
                Token::Member(1),
                Token::Int32(42),
                Token::Member(2),
                Token::StartArray,
                Token::Bool(true),
                Token::Null,
                Token::StartObject,
                Token::EndObject,
                Token::EndArray,
                Token::Member(3),
                Token::String("x"),
                Token::EndObject,
            ],
        );
        assert_eq!(text, r#"{"1":42,"2":[true,null,{}],"3":"x"}"#);
    }

    #[test]
    fn test_member_newlines() {
        let text = written(
            TextOptions::pretty(),
            &[
                Token::StartObject,
                Token::Member(1),
                Token::UInt64(u64::MAX),
                Token::Member(2),
                Token::Int64(i64::MIN),
                Token::EndObject,
            ],
        );
        assert_eq!(
            text,
            "{\r\n\"1\":18446744073709551615,\r\n\"2\":-9223372036854775808}"
        );
    }

    #[test]
    fn test_floats() {
        let text = written(
            TextOptions::new(),
            &[
                Token::StartArray,
                Token::Float64(0.1),
                Token::Float64(1.0),
                Token::Float32(0.1),
                Token::Float64(f64::NAN),
                Token::Float32(f32::INFINITY),
                Token::Float64(f64::NEG_INFINITY),
                Token::EndArray,
            ],
        );
        assert_eq!(text, "[0.1,1.0,0.1,NaN,Infinity,-Infinity]");
    }

    #[test]
    fn test_bytes_are_base64() {
        let text = written(
            TextOptions::new(),
            &[
                Token::StartArray,
                Token::Bytes(b"hello"),
                Token::Bytes(&[]),
                Token::EndArray,
            ],
        );
        assert_eq!(text, r#"["aGVsbG8=",""]"#);
    }

    #[test]
    fn test_strings_escaped() {
        let text = written(
            TextOptions::new(),
            &[Token::StartArray, Token::String("a\"b\\c\u{7}"), Token::EndArray],
        );
        assert_eq!(text, r#"["a\"b\\c\u0007"]"#);
    }

    #[test]
    fn test_grammar_violation_writes_nothing() {
        let mut writer = TextObjectWriter::new(Vec::new(), TextOptions::new());
        writer.write_start_object().unwrap();
        assert!(matches!(writer.write_i32(1), Err(Error::InvalidPosition { .. })));
        assert!(matches!(writer.write_member(0), Err(Error::InvalidMemberKey { key: 0 })));
        writer.write_member(5).unwrap();
        assert!(matches!(writer.write_end_object(), Err(Error::InvalidPosition { .. })));
        writer.write_null().unwrap();
        writer.write_end_object().unwrap();
        assert_eq!(writer.get_ref(), br#"{"5":null}"#);
    }
}
