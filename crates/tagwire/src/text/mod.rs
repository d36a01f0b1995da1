//! JSON-style text encoding.
//!
//! Objects are written as `{"<key>":<value>,...}` with decimal member keys,
//! blobs as padded standard Base64 strings, and non-finite floats as the bare
//! words `NaN`, `Infinity` and `-Infinity`.
//!
//! ```rust
//! use tagwire::{ObjectWriter, TextObjectWriter, TextOptions};
//!
//! let mut writer = TextObjectWriter::new(Vec::new(), TextOptions::new());
//! writer.write_start_object()?;
//! writer.write_member(1)?;
//! writer.write_str("a\"b")?;
//! writer.write_member(2)?;
//! writer.write_bytes(&[0xde, 0xad])?;
//! writer.write_end_object()?;
//! assert_eq!(writer.into_inner(), br#"{"1":"a\"b","2":"3q0="}"#);
//! # Ok::<(), tagwire::Error>(())
//! ```

mod escape;
mod lexer;
mod reader;
mod writer;

pub use reader::TextObjectReader;
pub use writer::TextObjectWriter;

/// Formatting options for [`TextObjectWriter`].
///
/// # Examples
///
/// ```rust
/// use tagwire::TextOptions;
///
/// assert!(!TextOptions::new().member_newlines);
/// assert!(TextOptions::pretty().member_newlines);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextOptions {
    /// Write `\r\n` before every object member.
    pub member_newlines: bool,
}

impl TextOptions {
    /// Compact output on one line.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            member_newlines: false,
        }
    }

    /// One member per line.
    #[must_use]
    pub const fn pretty() -> Self {
        Self {
            member_newlines: true,
        }
    }

    /// Sets [`member_newlines`](Self::member_newlines).
    #[must_use]
    pub const fn with_member_newlines(mut self, member_newlines: bool) -> Self {
        self.member_newlines = member_newlines;
        self
    }
}
