//! Runtime selection of the wire encoding.

use std::io::{Read, Write};

use crate::codec::{BinaryObjectReader, BinaryObjectWriter};
use crate::inspect::Observer;
use crate::limits::ReadLimits;
use crate::object::{ObjectReader, ObjectWriter};
use crate::text::{TextObjectReader, TextObjectWriter, TextOptions};

/// A wire encoding, chosen when a writer or reader is constructed.
///
/// # Examples
///
/// ```rust
/// use tagwire::{ObjectReader, ObjectWriter, ReadLimits, TextOptions, WireFormat};
///
/// for format in [WireFormat::Binary, WireFormat::Text(TextOptions::new())] {
///     let mut buf = Vec::new();
///     let mut writer = format.writer(&mut buf);
///     writer.write_start_array()?;
///     writer.write_u64(7)?;
///     writer.write_end_array()?;
///     drop(writer);
///
///     let mut reader = format.reader(buf.as_slice(), ReadLimits::default());
///     assert!(reader.read_start_array()?);
///     assert!(reader.move_to_next_array_value()?);
///     assert_eq!(reader.read_value_as_u64()?, 7);
///     reader.read_end_array()?;
/// }
/// # Ok::<(), tagwire::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// Packed-integer binary encoding.
    #[default]
    Binary,
    /// JSON-style text encoding.
    Text(TextOptions),
}

impl WireFormat {
    /// Returns the name of the encoding.
    pub fn name(&self) -> &'static str {
        match self {
            WireFormat::Binary => "binary",
            WireFormat::Text(_) => "text",
        }
    }

    /// Creates a writer for this encoding over `sink`.
    pub fn writer<'a, W: Write + 'a>(&self, sink: W) -> Box<dyn ObjectWriter + 'a> {
        match *self {
            WireFormat::Binary => Box::new(BinaryObjectWriter::new(sink)),
            WireFormat::Text(options) => Box::new(TextObjectWriter::new(sink, options)),
        }
    }

    /// Like [`writer`](Self::writer), reporting every written byte to
    /// `observer`.
    pub fn writer_with_observer<'a, W: Write + 'a>(
        &self,
        sink: W,
        observer: Box<dyn Observer>,
    ) -> Box<dyn ObjectWriter + 'a> {
        match *self {
            WireFormat::Binary => Box::new(BinaryObjectWriter::with_observer(sink, observer)),
            WireFormat::Text(options) => {
                Box::new(TextObjectWriter::with_observer(sink, options, observer))
            }
        }
    }

    /// Creates a reader for this encoding over `source`.
    pub fn reader<'a, R: Read + 'a>(&self, source: R, limits: ReadLimits) -> Box<dyn ObjectReader + 'a> {
        match self {
            WireFormat::Binary => Box::new(BinaryObjectReader::new(source).with_limits(limits)),
            WireFormat::Text(_) => Box::new(TextObjectReader::new(source).with_limits(limits)),
        }
    }

    /// Like [`reader`](Self::reader), reporting every consumed byte to
    /// `observer`.
    pub fn reader_with_observer<'a, R: Read + 'a>(
        &self,
        source: R,
        limits: ReadLimits,
        observer: Box<dyn Observer>,
    ) -> Box<dyn ObjectReader + 'a> {
        match self {
            WireFormat::Binary => {
                Box::new(BinaryObjectReader::with_observer(source, observer).with_limits(limits))
            }
            WireFormat::Text(_) => {
                Box::new(TextObjectReader::with_observer(source, observer).with_limits(limits))
            }
        }
    }
}
