//! Writer and reader capabilities shared by every encoding.
//!
//! [`ObjectWriter`] is push-style: each call immediately serializes one
//! grammar event. [`ObjectReader`] is pull-style: the caller moves a cursor
//! through members and array elements and reads typed values on demand.
//! Both traits are object safe so a format can be chosen at runtime (see
//! [`WireFormat`](crate::WireFormat)).

use crate::error::Result;
use crate::grammar::Token;
use crate::limits::ReadLimits;

/// Push-style serializer for one stream.
///
/// Calls that would break the grammar fail with a malformed-structure error
/// before any byte is written. Nothing is flushed until [`flush`] is
/// called.
///
/// [`flush`]: ObjectWriter::flush
pub trait ObjectWriter {
    /// Opens an object.
    fn write_start_object(&mut self) -> Result<()>;

    /// Writes a member key inside the innermost object. Exactly one value
    /// must follow. Keys must be positive.
    fn write_member(&mut self, key: i32) -> Result<()>;

    /// Closes the innermost object.
    fn write_end_object(&mut self) -> Result<()>;

    /// Opens an array.
    fn write_start_array(&mut self) -> Result<()>;

    /// Closes the innermost array.
    fn write_end_array(&mut self) -> Result<()>;

    /// Writes a null.
    fn write_null(&mut self) -> Result<()>;

    /// Writes `true` or `false`.
    fn write_bool(&mut self, value: bool) -> Result<()>;

    /// Writes an `i32` in its minimal width.
    fn write_i32(&mut self, value: i32) -> Result<()>;

    /// Writes an `u32` in its minimal width.
    fn write_u32(&mut self, value: u32) -> Result<()>;

    /// Writes an `i64` in its minimal width.
    fn write_i64(&mut self, value: i64) -> Result<()>;

    /// Writes an `u64` in its minimal width.
    fn write_u64(&mut self, value: u64) -> Result<()>;

    /// Writes an `f32`; non-finite values are allowed.
    fn write_f32(&mut self, value: f32) -> Result<()>;

    /// Writes an `f64`; non-finite values are allowed.
    fn write_f64(&mut self, value: f64) -> Result<()>;

    /// Writes a blob.
    fn write_bytes(&mut self, value: &[u8]) -> Result<()>;

    /// Writes a UTF-8 string.
    fn write_str(&mut self, value: &str) -> Result<()>;

    /// Flushes the underlying sink.
    fn flush(&mut self) -> Result<()>;

    /// Number of containers currently open.
    fn depth(&self) -> usize;

    /// Writes a blob, or null for `None`.
    fn write_nullable_bytes(&mut self, value: Option<&[u8]>) -> Result<()> {
        match value {
            Some(bytes) => self.write_bytes(bytes),
            None => self.write_null(),
        }
    }

    /// Writes a string, or null for `None`.
    fn write_nullable_str(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            Some(s) => self.write_str(s),
            None => self.write_null(),
        }
    }

    /// Writes one token through the matching call.
    fn write_token(&mut self, token: Token<'_>) -> Result<()> {
        match token {
            Token::StartObject => self.write_start_object(),
            Token::EndObject => self.write_end_object(),
            Token::StartArray => self.write_start_array(),
            Token::EndArray => self.write_end_array(),
            Token::Member(key) => self.write_member(key),
            Token::Null => self.write_null(),
            Token::Bool(v) => self.write_bool(v),
            Token::Int32(v) => self.write_i32(v),
            Token::UInt32(v) => self.write_u32(v),
            Token::Int64(v) => self.write_i64(v),
            Token::UInt64(v) => self.write_u64(v),
            Token::Float32(v) => self.write_f32(v),
            Token::Float64(v) => self.write_f64(v),
            Token::Bytes(v) => self.write_bytes(v),
            Token::String(v) => self.write_str(v),
        }
    }
}

/// Pull-style cursor over one stream.
///
/// A typical object read:
///
/// ```rust
/// use tagwire::{BinaryObjectReader, BinaryObjectWriter, ObjectReader, ObjectWriter};
///
/// let mut writer = BinaryObjectWriter::new(Vec::new());
/// writer.write_start_object()?;
/// writer.write_member(1)?;
/// writer.write_i32(-7)?;
/// writer.write_end_object()?;
/// let bytes = writer.into_inner();
///
/// let mut reader = BinaryObjectReader::new(bytes.as_slice());
/// assert!(reader.read_start_object()?);
/// while let Some(key) = reader.move_to_next_member()? {
///     match key {
///         1 => assert_eq!(reader.read_value_as_i32()?, -7),
///         _ => reader.skip_value()?,
///     }
/// }
/// reader.read_end_object()?;
/// # Ok::<(), tagwire::Error>(())
/// ```
pub trait ObjectReader {
    /// Limits applied to this reader.
    fn limits(&self) -> &ReadLimits;

    /// Number of containers currently open.
    fn depth(&self) -> usize;

    /// Reads the start of an object. Returns `false` (after consuming it)
    /// when the value is null.
    fn read_start_object(&mut self) -> Result<bool>;

    /// Moves to the next member of the innermost object and returns its key,
    /// or `None` once the end of the object is consumed. A value left unread
    /// from the previous member is skipped.
    fn move_to_next_member(&mut self) -> Result<Option<i32>>;

    /// Closes the innermost object, skipping any members not visited yet.
    fn read_end_object(&mut self) -> Result<()>;

    /// Reads the start of an array. Returns `false` (after consuming it)
    /// when the value is null.
    fn read_start_array(&mut self) -> Result<bool>;

    /// Moves to the next element of the innermost array. Returns `false`
    /// once the end of the array is consumed. A value left unread from the
    /// previous element is skipped.
    fn move_to_next_array_value(&mut self) -> Result<bool>;

    /// Closes the innermost array, skipping any elements not visited yet.
    fn read_end_array(&mut self) -> Result<()>;

    /// Consumes the current value if it is null and returns whether it was.
    /// Any other value is left in place.
    fn try_read_null(&mut self) -> Result<bool>;

    /// Reads a boolean value.
    fn read_value_as_bool(&mut self) -> Result<bool>;

    /// Reads the current value as an `i32`. Fails with `NumberOutOfRange`
    /// if it does not fit.
    fn read_value_as_i32(&mut self) -> Result<i32>;

    /// Reads the current value as an `u32`. Fails with `NumberOutOfRange`
    /// if it does not fit.
    fn read_value_as_u32(&mut self) -> Result<u32>;

    /// Reads the current value as an `i64`. Fails with `NumberOutOfRange`
    /// if it does not fit.
    fn read_value_as_i64(&mut self) -> Result<i64>;

    /// Reads the current value as an `u64`. Fails with `NumberOutOfRange`
    /// if it does not fit.
    fn read_value_as_u64(&mut self) -> Result<u64>;

    /// Reads the current value as an `f32`.
    fn read_value_as_f32(&mut self) -> Result<f32>;

    /// Reads the current value as an `f64`.
    fn read_value_as_f64(&mut self) -> Result<f64>;

    /// Reads a blob of at most `quota` bytes; `None` for null.
    fn read_value_as_bytes(&mut self, quota: usize) -> Result<Option<Vec<u8>>>;

    /// Reads a string of at most `quota` UTF-8 bytes; `None` for null.
    fn read_value_as_string(&mut self, quota: usize) -> Result<Option<String>>;

    /// Skips the current value, including nested containers.
    fn skip_value(&mut self) -> Result<()>;
}
