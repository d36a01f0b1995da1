//! Compact binary encoding.
//!
//! Every structural token, length prefix and member key is a packed
//! integer. Scalars follow as length-prefixed big-endian payloads.

pub mod primitives;
mod reader;
mod writer;

pub use reader::BinaryObjectReader;
pub use writer::BinaryObjectWriter;
