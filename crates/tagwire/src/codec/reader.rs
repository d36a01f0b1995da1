//! Binary object reader.

use std::io::{self, Read};

use crate::codec::primitives::{
    decode_signed, decode_unsigned, describe_token, read_packed_int, END_ARRAY_TOKEN,
    END_OBJECT_TOKEN, FALSE_TOKEN, NULL_TOKEN, START_ARRAY_TOKEN, START_OBJECT_TOKEN, TRUE_TOKEN,
};
use crate::error::{map_read_error, Error, Result};
use crate::grammar::{ContainerKind, ReadGrammar};
use crate::inspect::{Inspector, Observer};
use crate::limits::{ReadLimits, MAX_NUMERIC_BYTES};
use crate::object::ObjectReader;

#[derive(Debug, Clone, Copy)]
enum SkipFrame {
    Object { expect_key: bool },
    Array,
}

/// Pull cursor over the compact binary form.
///
/// Keeps one packed integer of lookahead so the start of a container, a
/// null, or the end of an array can be recognized without consuming it.
#[derive(Debug)]
pub struct BinaryObjectReader<R> {
    source: Inspector<R>,
    grammar: ReadGrammar,
    limits: ReadLimits,
    peeked: Option<i32>,
}

impl<R: Read> BinaryObjectReader<R> {
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
            source,
            grammar: ReadGrammar::new(limits.max_depth),
            limits,
            peeked: None,
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
        self.source.get_ref()
    }

    /// Unwraps the source. A lookahead token, if any, is lost.
    pub fn into_inner(self) -> R {
        self.source.into_inner()
    }

    fn peek_packed(&mut self, context: &'static str) -> Result<i32> {
        if let Some(value) = self.peeked {
            return Ok(value);
        }
        let value = read_packed_int(&mut self.source, context)?;
        self.peeked = Some(value);
        Ok(value)
    }

    fn next_packed(&mut self, context: &'static str) -> Result<i32> {
        match self.peeked.take() {
            Some(value) => Ok(value),
            None => read_packed_int(&mut self.source, context),
        }
    }

    fn read_start(
        &mut self,
        kind: ContainerKind,
        token: i32,
        operation: &'static str,
        expected: &'static str,
    ) -> Result<bool> {
        self.grammar.check_value(true, operation)?;
        let value = self.peek_packed(operation)?;
        if value == token {
            self.peeked = None;
            self.grammar.begin_value(true, operation)?;
            self.grammar.push(kind)?;
            Ok(true)
        } else if value == NULL_TOKEN {
            self.peeked = None;
            self.grammar.begin_value(true, operation)?;
            Ok(false)
        } else {
            Err(Error::UnexpectedToken {
                expected,
                found: describe_token(value),
            })
        }
    }

    /// Reads the length prefix of a scalar payload.
    fn read_scalar_length(&mut self, operation: &'static str, expected: &'static str) -> Result<usize> {
        self.grammar.begin_value(false, operation)?;
        let value = self.next_packed(operation)?;
        if value < 0 {
            return Err(Error::UnexpectedToken {
                expected,
                found: describe_token(value),
            });
        }
        Ok(value as usize)
    }

    fn read_numeric(&mut self, operation: &'static str) -> Result<([u8; MAX_NUMERIC_BYTES], usize)> {
        let len = self.read_scalar_length(operation, "integer payload")?;
        if len == 0 || len > MAX_NUMERIC_BYTES {
            return Err(Error::InvalidNumericLength {
                context: operation,
                len,
            });
        }
        let mut buf = [0u8; MAX_NUMERIC_BYTES];
        self.source
            .read_exact(&mut buf[..len])
            .map_err(|err| map_read_error(err, operation))?;
        Ok((buf, len))
    }

    fn read_float_bytes<const N: usize>(&mut self, operation: &'static str) -> Result<[u8; N]> {
        let len = self.read_scalar_length(operation, "float payload")?;
        if len != N {
            return Err(Error::InvalidNumericLength {
                context: operation,
                len,
            });
        }
        let mut buf = [0u8; N];
        self.source
            .read_exact(&mut buf)
            .map_err(|err| map_read_error(err, operation))?;
        Ok(buf)
    }

    /// Reads a length-prefixed payload or a null.
    ///
    /// The declared length is checked against `quota` before anything is
    /// allocated, and the payload is read through `take` so the buffer only
    /// grows with bytes that actually arrive.
    fn read_payload(
        &mut self,
        quota: usize,
        field: &'static str,
        operation: &'static str,
    ) -> Result<Option<Vec<u8>>> {
        self.grammar.begin_value(false, operation)?;
        let value = self.next_packed(field)?;
        if value == NULL_TOKEN {
            return Ok(None);
        }
        if value < 0 {
            return Err(Error::UnexpectedToken {
                expected: "length prefix or null",
                found: describe_token(value),
            });
        }

        let len = value as usize;
        if len > quota {
            tracing::debug!(field, len, quota, "declared length exceeds quota");
            return Err(Error::QuotaExceeded { field, len, quota });
        }

        let mut buf = Vec::new();
        Read::by_ref(&mut self.source)
            .take(len as u64)
            .read_to_end(&mut buf)?;
        if buf.len() != len {
            return Err(Error::UnexpectedEof { context: field });
        }
        Ok(Some(buf))
    }

    fn skip_bytes(&mut self, len: usize, context: &'static str) -> Result<()> {
        let mut payload = Read::by_ref(&mut self.source).take(len as u64);
        let skipped = io::copy(&mut payload, &mut io::sink())?;
        if skipped != len as u64 {
            return Err(Error::UnexpectedEof { context });
        }
        Ok(())
    }
}

impl<R: Read> ObjectReader for BinaryObjectReader<R> {
    fn limits(&self) -> &ReadLimits {
        &self.limits
    }

    fn depth(&self) -> usize {
        self.grammar.depth()
    }

    fn read_start_object(&mut self) -> Result<bool> {
        self.read_start(
            ContainerKind::Object,
            START_OBJECT_TOKEN,
            "read_start_object",
            "start of object or null",
        )
    }

    fn move_to_next_member(&mut self) -> Result<Option<i32>> {
        if self.grammar.value_pending(ContainerKind::Object, "move_to_next_member")? {
            tracing::trace!("skipping unread member value");
            self.skip_value()?;
        }
        match self.next_packed("member key")? {
            END_OBJECT_TOKEN => {
                self.grammar.mark_ended();
                Ok(None)
            }
            key if key > 0 => {
                self.grammar.enter_element();
                Ok(Some(key))
            }
            other => Err(Error::UnexpectedToken {
                expected: "member key or end of object",
                found: describe_token(other),
            }),
        }
    }

    fn read_end_object(&mut self) -> Result<()> {
        if !self.grammar.is_ended(ContainerKind::Object, "read_end_object")? {
            while self.move_to_next_member()?.is_some() {}
        }
        self.grammar.pop(ContainerKind::Object, "read_end_object")
    }

    fn read_start_array(&mut self) -> Result<bool> {
        self.read_start(
            ContainerKind::Array,
            START_ARRAY_TOKEN,
            "read_start_array",
            "start of array or null",
        )
    }

    fn move_to_next_array_value(&mut self) -> Result<bool> {
        if self.grammar.value_pending(ContainerKind::Array, "move_to_next_array_value")? {
            tracing::trace!("skipping unread array value");
            self.skip_value()?;
        }
        if self.peek_packed("array value")? == END_ARRAY_TOKEN {
            self.peeked = None;
            self.grammar.mark_ended();
            Ok(false)
        } else {
            self.grammar.enter_element();
            Ok(true)
        }
    }

    fn read_end_array(&mut self) -> Result<()> {
        if !self.grammar.is_ended(ContainerKind::Array, "read_end_array")? {
            while self.move_to_next_array_value()? {}
        }
        self.grammar.pop(ContainerKind::Array, "read_end_array")
    }

    fn try_read_null(&mut self) -> Result<bool> {
        self.grammar.check_value(true, "try_read_null")?;
        if self.peek_packed("value")? == NULL_TOKEN {
            self.peeked = None;
            self.grammar.begin_value(true, "try_read_null")?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn read_value_as_bool(&mut self) -> Result<bool> {
        self.grammar.begin_value(false, "read_value_as_bool")?;
        match self.next_packed("bool")? {
            TRUE_TOKEN => Ok(true),
            FALSE_TOKEN => Ok(false),
            other => Err(Error::UnexpectedToken {
                expected: "boolean",
                found: describe_token(other),
            }),
        }
    }

    fn read_value_as_i32(&mut self) -> Result<i32> {
        let (buf, len) = self.read_numeric("read_value_as_i32")?;
        let value = decode_signed(&buf[..len], "i32")?;
        i32::try_from(value).map_err(|_| Error::NumberOutOfRange { context: "i32" })
    }

    fn read_value_as_u32(&mut self) -> Result<u32> {
        let (buf, len) = self.read_numeric("read_value_as_u32")?;
        let value = decode_unsigned(&buf[..len], "u32")?;
        u32::try_from(value).map_err(|_| Error::NumberOutOfRange { context: "u32" })
    }

    fn read_value_as_i64(&mut self) -> Result<i64> {
        let (buf, len) = self.read_numeric("read_value_as_i64")?;
        decode_signed(&buf[..len], "i64")
    }

    fn read_value_as_u64(&mut self) -> Result<u64> {
        let (buf, len) = self.read_numeric("read_value_as_u64")?;
        decode_unsigned(&buf[..len], "u64")
    }

    fn read_value_as_f32(&mut self) -> Result<f32> {
        Ok(f32::from_be_bytes(self.read_float_bytes("read_value_as_f32")?))
    }

    fn read_value_as_f64(&mut self) -> Result<f64> {
        Ok(f64::from_be_bytes(self.read_float_bytes("read_value_as_f64")?))
    }

    fn read_value_as_bytes(&mut self, quota: usize) -> Result<Option<Vec<u8>>> {
        self.read_payload(quota, "bytes", "read_value_as_bytes")
    }

    fn read_value_as_string(&mut self, quota: usize) -> Result<Option<String>> {
        match self.read_payload(quota, "string", "read_value_as_string")? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| Error::InvalidUtf8 { context: "string" }),
            None => Ok(None),
        }
    }

    fn skip_value(&mut self) -> Result<()> {
        self.grammar.begin_value(true, "skip_value")?;
        let max_depth = self.grammar.max_depth().saturating_sub(self.grammar.depth());
        let mut stack: Vec<SkipFrame> = Vec::new();

        loop {
            if matches!(stack.last(), Some(SkipFrame::Object { expect_key: true })) {
                let value = self.next_packed("member key")?;
                if value == END_OBJECT_TOKEN {
                    stack.pop();
                    if stack.is_empty() {
                        return Ok(());
                    }
                } else if value > 0 {
                    if let Some(SkipFrame::Object { expect_key }) = stack.last_mut() {
                        *expect_key = false;
                    }
                } else {
                    return Err(Error::UnexpectedToken {
                        expected: "member key or end of object",
                        found: describe_token(value),
                    });
                }
                continue;
            }

            let value = self.next_packed("value")?;
            if value == END_ARRAY_TOKEN && matches!(stack.last(), Some(SkipFrame::Array)) {
                stack.pop();
                if stack.is_empty() {
                    return Ok(());
                }
                continue;
            }

            // This value completes the enclosing member
            if let Some(SkipFrame::Object { expect_key }) = stack.last_mut() {
                *expect_key = true;
            }

            match value {
                START_OBJECT_TOKEN | START_ARRAY_TOKEN => {
                    if stack.len() >= max_depth {
                        return Err(Error::NestingTooDeep {
                            max: self.grammar.max_depth(),
                        });
                    }
                    stack.push(if value == START_OBJECT_TOKEN {
                        SkipFrame::Object { expect_key: true }
                    } else {
                        SkipFrame::Array
                    });
                    continue;
                }
                NULL_TOKEN | TRUE_TOKEN | FALSE_TOKEN => {}
                len if len >= 0 => self.skip_bytes(len as usize, "skipped payload")?,
                other => {
                    return Err(Error::UnexpectedToken {
                        expected: "value",
                        found: describe_token(other),
                    });
                }
            }

            if stack.is_empty() {
                return Ok(());
            }
        }
    }
}
