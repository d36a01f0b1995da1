//! Byte-level lexer for the text reader.
//!
//! Pulls one byte at a time from the source and keeps at most one byte of
//! lookahead, so nothing past the current token is ever consumed. Wrap
//! unbuffered sources in a [`BufReader`](std::io::BufReader).

use std::io::{self, Read};

use crate::error::{Error, Result};
use crate::inspect::Inspector;
use crate::limits::{MAX_MEMBER_KEY_DIGITS, MAX_NUMBER_TEXT_LEN};

/// Describes a byte for error messages.
pub(crate) fn describe_byte(byte: u8) -> String {
    match byte {
        b'{' => "start of object".to_string(),
        b'}' => "end of object".to_string(),
        b'[' => "start of array".to_string(),
        b']' => "end of array".to_string(),
        b'"' => "string".to_string(),
        b'n' => "null".to_string(),
        b't' | b'f' => "boolean".to_string(),
        b'-' | b'0'..=b'9' | b'N' | b'I' => "number".to_string(),
        0x21..=0x7e => format!("'{}'", byte as char),
        _ => format!("byte 0x{byte:02x}"),
    }
}

/// Shape of a number literal accepted by the text format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumberForm {
    /// `-?(0|[1-9][0-9]*)`
    Integer,
    /// An integer part followed by a fraction, an exponent, or both.
    Fraction,
    /// One of the words `NaN`, `Infinity` and `-Infinity`.
    NonFinite,
}

/// Classifies `text` against the JSON number grammar extended with the
/// non-finite words. Returns `None` for anything else.
pub(crate) fn number_form(text: &str) -> Option<NumberForm> {
    if matches!(text, "NaN" | "Infinity" | "-Infinity") {
        return Some(NumberForm::NonFinite);
    }
    let bytes = text.as_bytes();
    let digits = |pos: &mut usize| {
        let start = *pos;
        while bytes.get(*pos).is_some_and(u8::is_ascii_digit) {
            *pos += 1;
        }
        *pos - start
    };

    let mut pos = usize::from(bytes.first() == Some(&b'-'));
    let int_start = pos;
    let int_len = digits(&mut pos);
    if int_len == 0 || (int_len > 1 && bytes[int_start] == b'0') {
        return None;
    }
    let mut form = NumberForm::Integer;
    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        if digits(&mut pos) == 0 {
            return None;
        }
        form = NumberForm::Fraction;
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        if digits(&mut pos) == 0 {
            return None;
        }
        form = NumberForm::Fraction;
    }
    (pos == bytes.len()).then_some(form)
}

/// Returns true for bytes that may start a number literal.
pub(crate) fn starts_number(byte: u8) -> bool {
    matches!(byte, b'-' | b'0'..=b'9' | b'N' | b'I')
}

#[derive(Debug)]
pub(crate) struct Lexer<R> {
    source: Inspector<R>,
    peeked: Option<u8>,
}

impl<R: Read> Lexer<R> {
    pub(crate) fn new(source: Inspector<R>) -> Self {
        Self {
            source,
            peeked: None,
        }
    }

    pub(crate) fn get_ref(&self) -> &R {
        self.source.get_ref()
    }

    pub(crate) fn into_inner(self) -> R {
        self.source.into_inner()
    }

    fn fill(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.source.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Peeks at the next byte; `None` at end of input.
    pub(crate) fn peek(&mut self) -> Result<Option<u8>> {
        if self.peeked.is_none() {
            self.peeked = self.fill()?;
        }
        Ok(self.peeked)
    }

    /// Consumes the next byte.
    pub(crate) fn next_byte(&mut self, context: &'static str) -> Result<u8> {
        let byte = match self.peeked.take() {
            Some(byte) => Some(byte),
            None => self.fill()?,
        };
        byte.ok_or(Error::UnexpectedEof { context })
    }

    /// Consumes the peeked byte.
    pub(crate) fn bump(&mut self) {
        self.peeked = None;
    }

    /// Skips whitespace and peeks at the next significant byte.
    pub(crate) fn peek_significant(&mut self, context: &'static str) -> Result<u8> {
        loop {
            match self.peek()? {
                Some(b' ' | b'\t' | b'\n' | b'\r') => self.bump(),
                Some(byte) => return Ok(byte),
                None => return Err(Error::UnexpectedEof { context }),
            }
        }
    }

    /// Skips whitespace and consumes `expected`.
    pub(crate) fn expect(&mut self, expected: u8, context: &'static str) -> Result<()> {
        let byte = self.peek_significant(context)?;
        if byte != expected {
            return Err(Error::UnexpectedByte { byte, context });
        }
        self.bump();
        Ok(())
    }

    /// Consumes a bare word such as `null` or `true`.
    pub(crate) fn literal(&mut self, word: &'static str) -> Result<()> {
        for &expected in word.as_bytes() {
            let byte = self.next_byte(word)?;
            if byte != expected {
                return Err(Error::UnexpectedByte {
                    byte,
                    context: word,
                });
            }
        }
        Ok(())
    }

    /// Reads the text of a number literal, including `NaN` and `Infinity`.
    pub(crate) fn number_text(&mut self) -> Result<String> {
        let mut text = String::new();
        while let Some(byte) = self.peek()? {
            if !(byte.is_ascii_alphanumeric() || matches!(byte, b'+' | b'-' | b'.')) {
                break;
            }
            if text.len() == MAX_NUMBER_TEXT_LEN {
                tracing::debug!(max = MAX_NUMBER_TEXT_LEN, "number literal too long");
                return Err(Error::NumberTooLong {
                    max: MAX_NUMBER_TEXT_LEN,
                });
            }
            text.push(byte as char);
            self.bump();
        }
        Ok(text)
    }

    fn hex4(&mut self) -> Result<u16> {
        let mut value = 0u16;
        for _ in 0..4 {
            let byte = self.next_byte("unicode escape")?;
            let digit = (byte as char).to_digit(16).ok_or(Error::InvalidEscape {
                context: "unicode escape",
            })?;
            value = (value << 4) | digit as u16;
        }
        Ok(value)
    }

    /// Decodes the escape sequence after a backslash.
    fn escape(&mut self, context: &'static str) -> Result<char> {
        Ok(match self.next_byte(context)? {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => self.unicode_escape()?,
            _ => return Err(Error::InvalidEscape { context }),
        })
    }

    fn unicode_escape(&mut self) -> Result<char> {
        let first = self.hex4()?;
        let code = match first {
            0xd800..=0xdbff => {
                let backslash = self.next_byte("unicode escape")?;
                if backslash != b'\\' || self.next_byte("unicode escape")? != b'u' {
                    return Err(Error::InvalidEscape {
                        context: "unpaired surrogate",
                    });
                }
                let second = self.hex4()?;
                if !(0xdc00..=0xdfff).contains(&second) {
                    return Err(Error::InvalidEscape {
                        context: "unpaired surrogate",
                    });
                }
                0x10000 + ((u32::from(first) - 0xd800) << 10) + (u32::from(second) - 0xdc00)
            }
            0xdc00..=0xdfff => {
                return Err(Error::InvalidEscape {
                    context: "unpaired surrogate",
                });
            }
            code => u32::from(code),
        };
        char::from_u32(code).ok_or(Error::InvalidEscape {
            context: "unicode escape",
        })
    }

    /// Decodes the body of a string whose opening quote was consumed.
    ///
    /// Fails with `QuotaExceeded` as soon as the decoded length passes
    /// `quota`, so at most `quota` bytes are buffered.
    pub(crate) fn string_bytes(&mut self, quota: usize, field: &'static str) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            let byte = self.next_byte(field)?;
            match byte {
                b'"' => return Ok(out),
                b'\\' => {
                    let escaped = self.escape(field)?;
                    let mut buf = [0u8; 4];
                    out.extend_from_slice(escaped.encode_utf8(&mut buf).as_bytes());
                }
                0x00..=0x1f => return Err(Error::UnexpectedByte { byte, context: field }),
                _ => out.push(byte),
            }
            if out.len() > quota {
                tracing::debug!(field, quota, "decoded length exceeds quota");
                return Err(Error::QuotaExceeded {
                    field,
                    len: out.len(),
                    quota,
                });
            }
        }
    }

    /// Skips the body of a string whose opening quote was consumed.
    pub(crate) fn skip_string(&mut self) -> Result<()> {
        const CONTEXT: &str = "skipped string";
        loop {
            match self.next_byte(CONTEXT)? {
                b'"' => return Ok(()),
                b'\\' => {
                    self.escape(CONTEXT)?;
                }
                byte @ 0x00..=0x1f => return Err(Error::UnexpectedByte { byte, context: CONTEXT }),
                _ => {}
            }
        }
    }

    /// Reads a quoted member key naming a positive `i32`.
    pub(crate) fn member_key(&mut self) -> Result<i32> {
        self.expect(b'"', "member key")?;
        let text = match self.string_bytes(MAX_MEMBER_KEY_DIGITS, "member key") {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(Error::QuotaExceeded { .. }) => {
                return Err(Error::InvalidMemberKeyText {
                    text: format!("more than {MAX_MEMBER_KEY_DIGITS} characters"),
                });
            }
            Err(err) => return Err(err),
        };
        match text.parse::<i32>() {
            Ok(key) if key > 0 && text.bytes().all(|b| b.is_ascii_digit()) => Ok(key),
            _ => Err(Error::InvalidMemberKeyText { text }),
        }
    }
}
