//! Text object reader.

use std::io::Read;
use std::num::{IntErrorKind, ParseIntError};
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{Error, Result};
use crate::grammar::{ContainerKind, ReadGrammar};
use crate::inspect::{Inspector, Observer};
use crate::limits::ReadLimits;
use crate::object::ObjectReader;
use crate::text::lexer::{describe_byte, number_form, starts_number, Lexer, NumberForm};

/// Position inside a container being skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    FirstElementOrEnd,
    /// After a comma: a member key or an array value.
    Element,
    MemberValue,
    SeparatorOrEnd,
}

#[derive(Debug, Clone, Copy)]
struct SkipFrame {
    kind: ContainerKind,
    expect: Expect,
}

/// Pull cursor over the JSON-style text form.
///
/// Reads the source one byte at a time; wrap unbuffered sources in a
/// [`BufReader`](std::io::BufReader).
#[derive(Debug)]
pub struct TextObjectReader<R> {
    lexer: Lexer<R>,
    grammar: ReadGrammar,
    limits: ReadLimits,
}

impl<R: Read> TextObjectReader<R> {
    /// Creates a reader over `source` with default limits.
    pub fn new(source: R) -> Self {
        Self::from_inspector(Inspector::new(source))
    }

    /// Creates a reader whose input is also reported to `observer`.
    pub fn with_observer(source: R, observer: Box<dyn Observer>) -> Self {
        Self::from_inspector(Inspector::with_observer(source, observer))
    }

    fn from_inspector(source: Inspector<R>) -> Self {
        let limits = ReadLimits::default();
        Self {
            lexer: Lexer::new(source),
            grammar: ReadGrammar::new(limits.max_depth),
            limits,
        }
    }

    /// Replaces the reader limits.
    #[must_use]
    pub fn with_limits(mut self, limits: ReadLimits) -> Self {
        self.grammar.set_max_depth(limits.max_depth);
        self.limits = limits;
        self
    }

    /// Returns a reference to the source.
    pub fn get_ref(&self) -> &R {
        self.lexer.get_ref()
    }

    /// Unwraps the source. A lookahead byte, if any, is lost.
    pub fn into_inner(self) -> R {
        self.lexer.into_inner()
    }

    fn read_start(&mut self, kind: ContainerKind, open: u8, operation: &'static str) -> Result<bool> {
        self.grammar.check_value(true, operation)?;
        let byte = self.lexer.peek_significant(operation)?;
        if byte == open {
            self.lexer.bump();
            self.grammar.begin_value(true, operation)?;
            self.grammar.push(kind)?;
            Ok(true)
        } else if byte == b'n' {
            self.lexer.literal("null")?;
            self.grammar.begin_value(true, operation)?;
            Ok(false)
        } else {
            Err(Error::UnexpectedToken {
                expected: match kind {
                    ContainerKind::Object => "start of object or null",
                    ContainerKind::Array => "start of array or null",
                },
                found: describe_byte(byte),
            })
        }
    }

    /// Consumes the separator in front of every element but the first.
    fn separator(&mut self, context: &'static str) -> Result<()> {
        if self.grammar.count() > 0 {
            self.lexer.expect(b',', context)?;
        }
        Ok(())
    }

    fn number_text(&mut self, operation: &'static str) -> Result<String> {
        self.grammar.begin_value(false, operation)?;
        let byte = self.lexer.peek_significant(operation)?;
        if !starts_number(byte) {
            return Err(Error::UnexpectedToken {
                expected: "number",
                found: describe_byte(byte),
            });
        }
        self.lexer.number_text()
    }

    fn read_integer<T>(&mut self, operation: &'static str, context: &'static str) -> Result<T>
    where
        T: FromStr<Err = ParseIntError>,
    {
        let text = self.number_text(operation)?;
        if number_form(&text) != Some(NumberForm::Integer) {
            return Err(Error::InvalidNumber { context, text });
        }
        text.parse::<T>().map_err(|err| match err.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                Error::NumberOutOfRange { context }
            }
            _ => Error::InvalidNumber { context, text },
        })
    }

    /// Parses a float literal. A finite literal that rounds to infinity is
    /// out of range.
    fn read_float<T: FromStr + Copy>(
        &mut self,
        operation: &'static str,
        context: &'static str,
        is_infinite: fn(T) -> bool,
    ) -> Result<T> {
        let text = self.number_text(operation)?;
        let Some(form) = number_form(&text) else {
            return Err(Error::InvalidNumber { context, text });
        };
        let value = match text.parse::<T>() {
            Ok(value) => value,
            Err(_) => return Err(Error::InvalidNumber { context, text }),
        };
        if form != NumberForm::NonFinite && is_infinite(value) {
            return Err(Error::NumberOutOfRange { context });
        }
        Ok(value)
    }

    /// Positions at a string value, or consumes a null.
    ///
    /// Returns `false` for null; otherwise the opening quote is consumed.
    fn open_string(&mut self, operation: &'static str) -> Result<bool> {
        self.grammar.begin_value(false, operation)?;
        match self.lexer.peek_significant(operation)? {
            b'"' => {
                self.lexer.bump();
                Ok(true)
            }
            b'n' => {
                self.lexer.literal("null")?;
                Ok(false)
            }
            byte => Err(Error::UnexpectedToken {
                expected: "string or null",
                found: describe_byte(byte),
            }),
        }
    }
}

impl<R: Read> ObjectReader for TextObjectReader<R> {
    fn limits(&self) -> &ReadLimits {
        &self.limits
    }

    fn depth(&self) -> usize {
        self.grammar.depth()
    }

    fn read_start_object(&mut self) -> Result<bool> {
        self.read_start(ContainerKind::Object, b'{', "read_start_object")
    }

    fn move_to_next_member(&mut self) -> Result<Option<i32>> {
        if self.grammar.value_pending(ContainerKind::Object, "move_to_next_member")? {
            tracing::trace!("skipping unread member value");
            self.skip_value()?;
        }
        if self.lexer.peek_significant("member key")? == b'}' {
            self.lexer.bump();
            self.grammar.mark_ended();
            return Ok(None);
        }
        self.separator("member separator")?;
        let key = self.lexer.member_key()?;
        self.lexer.expect(b':', "member key")?;
        self.grammar.enter_element();
        Ok(Some(key))
    }

    fn read_end_object(&mut self) -> Result<()> {
        if !self.grammar.is_ended(ContainerKind::Object, "read_end_object")? {
            while self.move_to_next_member()?.is_some() {}
        }
        self.grammar.pop(ContainerKind::Object, "read_end_object")
    }

    fn read_start_array(&mut self) -> Result<bool> {
        self.read_start(ContainerKind::Array, b'[', "read_start_array")
    }

    fn move_to_next_array_value(&mut self) -> Result<bool> {
        if self.grammar.value_pending(ContainerKind::Array, "move_to_next_array_value")? {
            tracing::trace!("skipping unread array value");
            self.skip_value()?;
        }
        if self.lexer.peek_significant("array value")? == b']' {
            self.lexer.bump();
            self.grammar.mark_ended();
            return Ok(false);
        }
        self.separator("array separator")?;
        self.grammar.enter_element();
        Ok(true)
    }

    fn read_end_array(&mut self) -> Result<()> {
        if !self.grammar.is_ended(ContainerKind::Array, "read_end_array")? {
            while self.move_to_next_array_value()? {}
        }
        self.grammar.pop(ContainerKind::Array, "read_end_array")
    }

    fn try_read_null(&mut self) -> Result<bool> {
        self.grammar.check_value(true, "try_read_null")?;
        if self.lexer.peek_significant("value")? == b'n' {
            self.lexer.literal("null")?;
            self.grammar.begin_value(true, "try_read_null")?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn read_value_as_bool(&mut self) -> Result<bool> {
        self.grammar.begin_value(false, "read_value_as_bool")?;
        match self.lexer.peek_significant("bool")? {
            b't' => {
                self.lexer.literal("true")?;
                Ok(true)
            }
            b'f' => {
                self.lexer.literal("false")?;
                Ok(false)
            }
            byte => Err(Error::UnexpectedToken {
                expected: "boolean",
                found: describe_byte(byte),
            }),
        }
    }

    fn read_value_as_i32(&mut self) -> Result<i32> {
        self.read_integer("read_value_as_i32", "i32")
    }

    fn read_value_as_u32(&mut self) -> Result<u32> {
        self.read_integer("read_value_as_u32", "u32")
    }

    fn read_value_as_i64(&mut self) -> Result<i64> {
        self.read_integer("read_value_as_i64", "i64")
    }

    fn read_value_as_u64(&mut self) -> Result<u64> {
        self.read_integer("read_value_as_u64", "u64")
    }

    fn read_value_as_f32(&mut self) -> Result<f32> {
        self.read_float("read_value_as_f32", "f32", f32::is_infinite)
    }

    fn read_value_as_f64(&mut self) -> Result<f64> {
        self.read_float("read_value_as_f64", "f64", f64::is_infinite)
    }

    fn read_value_as_bytes(&mut self, quota: usize) -> Result<Option<Vec<u8>>> {
        if !self.open_string("read_value_as_bytes")? {
            return Ok(None);
        }
        // Padded Base64 needs four characters per started group of three bytes
        let text_quota = quota.div_ceil(3).saturating_mul(4);
        let text = self
            .lexer
            .string_bytes(text_quota, "bytes")
            .map_err(|err| match err {
                Error::QuotaExceeded { field, len, .. } => Error::QuotaExceeded {
                    field,
                    len: len.div_ceil(4).saturating_mul(3),
                    quota,
                },
                other => other,
            })?;
        let bytes = STANDARD.decode(&text)?;
        if bytes.len() > quota {
            tracing::debug!(len = bytes.len(), quota, "decoded blob exceeds quota");
            return Err(Error::QuotaExceeded {
                field: "bytes",
                len: bytes.len(),
                quota,
            });
        }
        Ok(Some(bytes))
    }

    fn read_value_as_string(&mut self, quota: usize) -> Result<Option<String>> {
        if !self.open_string("read_value_as_string")? {
            return Ok(None);
        }
        let bytes = self.lexer.string_bytes(quota, "string")?;
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| Error::InvalidUtf8 { context: "string" })
    }

    fn skip_value(&mut self) -> Result<()> {
        const CONTEXT: &str = "skipped value";
        self.grammar.begin_value(true, "skip_value")?;
        let max_depth = self.grammar.max_depth().saturating_sub(self.grammar.depth());
        let mut stack: Vec<SkipFrame> = Vec::new();

        loop {
            let byte = self.lexer.peek_significant(CONTEXT)?;
            if let Some(frame) = stack.last_mut() {
                let close = match frame.kind {
                    ContainerKind::Object => b'}',
                    ContainerKind::Array => b']',
                };
                match frame.expect {
                    Expect::SeparatorOrEnd if byte == b',' => {
                        self.lexer.bump();
                        frame.expect = Expect::Element;
                        continue;
                    }
                    Expect::SeparatorOrEnd | Expect::FirstElementOrEnd if byte == close => {
                        self.lexer.bump();
                        stack.pop();
                        if stack.is_empty() {
                            return Ok(());
                        }
                        continue;
                    }
                    Expect::SeparatorOrEnd => {
                        return Err(Error::UnexpectedByte { byte, context: CONTEXT });
                    }
                    Expect::FirstElementOrEnd | Expect::Element => {
                        if frame.kind == ContainerKind::Object {
                            self.lexer.member_key()?;
                            self.lexer.expect(b':', "member key")?;
                            frame.expect = Expect::MemberValue;
                            continue;
                        }
                        frame.expect = Expect::SeparatorOrEnd;
                    }
                    Expect::MemberValue => frame.expect = Expect::SeparatorOrEnd,
                }
            }

            match byte {
                b'{' | b'[' => {
                    if stack.len() >= max_depth {
                        return Err(Error::NestingTooDeep {
                            max: self.grammar.max_depth(),
                        });
                    }
                    self.lexer.bump();
                    stack.push(SkipFrame {
                        kind: if byte == b'{' {
                            ContainerKind::Object
                        } else {
                            ContainerKind::Array
                        },
                        expect: Expect::FirstElementOrEnd,
                    });
                    continue;
                }
                b'"' => {
                    self.lexer.bump();
                    self.lexer.skip_string()?;
                }
                b'n' => self.lexer.literal("null")?,
                b't' => self.lexer.literal("true")?,
                b'f' => self.lexer.literal("false")?,
                byte if starts_number(byte) => {
                    let text = self.lexer.number_text()?;
                    if number_form(&text).is_none() {
                        return Err(Error::InvalidNumber { context: CONTEXT, text });
                    }
                }
                byte => return Err(Error::UnexpectedByte { byte, context: CONTEXT }),
            }

            if stack.is_empty() {
                return Ok(());
            }
        }
    }
}
