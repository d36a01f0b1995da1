//! tagwire: streaming serialization of integer-keyed object trees.
//!
//! Data is a tree of objects (members keyed by positive integers), arrays
//! and primitive scalars. Writers serialize each call immediately and readers
//! expose a pull cursor, so a tree is never materialized in memory.
//!
//! # Overview
//!
//! Two wire encodings share one token grammar:
//! - **Binary**: packed variable-length integers for tokens, keys and
//!   lengths, with minimal big-endian payloads for numbers
//! - **Text**: JSON with decimal member keys and Base64 blobs
//!
//! Unknown members are skipped without interpretation, which is the only
//! schema evolution rule.
//!
//! # Quick Start
//!
//! ```rust
//! use tagwire::{BinaryObjectReader, BinaryObjectWriter};
//! use tagwire::{ObjectReader, ObjectReaderExt, ObjectWriter};
//!
//! // Write {1: "Alice", 2: [3, 4]}
//! let mut writer = BinaryObjectWriter::new(Vec::new());
//! writer.write_start_object()?;
//! writer.write_member(1)?;
//! writer.write_str("Alice")?;
//! writer.write_member(2)?;
//! writer.write_start_array()?;
//! writer.write_i32(3)?;
//! writer.write_i32(4)?;
//! writer.write_end_array()?;
//! writer.write_end_object()?;
//! let bytes = writer.into_inner();
//!
//! // Read it back
//! let mut reader = BinaryObjectReader::new(bytes.as_slice());
//! let mut name = None;
//! let mut scores = None;
//! if let Some(mut members) = reader.get_object()? {
//!     while let Some(mut member) = members.next()? {
//!         match member.key() {
//!             1 => name = member.read_value_as_string(256)?,
//!             2 => scores = member.read_value_as_i32_list()?,
//!             _ => {}
//!         }
//!     }
//! }
//! assert_eq!(name.as_deref(), Some("Alice"));
//! assert_eq!(scores, Some(vec![3, 4]));
//! # Ok::<(), tagwire::Error>(())
//! ```
//!
//! # Modules
//!
//! - [`codec`]: Binary encoding
//! - [`text`]: JSON-style text encoding
//! - [`grammar`]: Token alphabet
//! - [`iter`]: Lazy member and element sequences
//! - [`inspect`]: Byte observation
//! - [`error`]: Error types
//! - [`limits`]: Wire constants and reader limits
//! - [`util`]: Tick conversions
//!
//! # Security
//!
//! Readers are meant for untrusted input:
//! - String and blob reads take a quota that is checked before allocating
//! - Nesting depth and collected array length are bounded by [`ReadLimits`]
//! - Skipping a value never recurses

pub mod codec;
pub mod error;
mod ext;
mod format;
pub mod grammar;
pub mod inspect;
pub mod iter;
pub mod limits;
mod object;
pub mod text;
pub mod util;

// Re-export commonly used types at crate root
pub use codec::{BinaryObjectReader, BinaryObjectWriter};
pub use error::{Error, ErrorKind, Result};
pub use ext::{ObjectReaderExt, ObjectWriterExt};
pub use format::WireFormat;
pub use grammar::{ContainerKind, Token};
pub use inspect::{Inspector, Observer, TracingObserver};
pub use iter::{ArrayValues, Member, Members};
pub use limits::ReadLimits;
pub use object::{ObjectReader, ObjectWriter};
pub use text::{TextObjectReader, TextObjectWriter, TextOptions};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
