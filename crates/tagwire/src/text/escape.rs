//! String quoting for the text writer.

use std::io::{self, Write};

/// Writes `value` as a quoted string.
///
/// Unescaped runs are written in one call; only `"`, `\` and control
/// characters below 0x20 are escaped.
pub(crate) fn write_quoted<W: Write + ?Sized>(writer: &mut W, value: &str) -> io::Result<()> {
    let bytes = value.as_bytes();
    writer.write_all(b"\"")?;

    let mut start = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        let escape: &[u8] = match byte {
            b'"' => b"\\\"",
            b'\\' => b"\\\\",
            0x08 => b"\\b",
            0x0c => b"\\f",
            b'\n' => b"\\n",
            b'\r' => b"\\r",
            b'\t' => b"\\t",
            0x00..=0x1f => {
                writer.write_all(&bytes[start..i])?;
                write!(writer, "\\u{byte:04x}")?;
                start = i + 1;
                continue;
            }
            _ => continue,
        };
        writer.write_all(&bytes[start..i])?;
        writer.write_all(escape)?;
        start = i + 1;
    }

    writer.write_all(&bytes[start..])?;
    writer.write_all(b"\"")
}
