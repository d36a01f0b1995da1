//! Wire constants and reader limits.
//!
//! Readers treat every length and count in the input as untrusted. The
//! constants here bound the fixed-size parts of the wire format; the
//! [`ReadLimits`] struct bounds the parts a caller can tune.

/// Maximum bytes in a packed integer (31 magnitude bits + sign).
pub const MAX_PACKED_INT_BYTES: usize = 5;

/// Maximum bytes in a length-prefixed integer payload.
pub const MAX_NUMERIC_BYTES: usize = 8;

/// Maximum characters in a text-form number literal.
pub const MAX_NUMBER_TEXT_LEN: usize = 64;

/// Maximum digits in a text-form member key (`i32::MAX` has 10).
pub const MAX_MEMBER_KEY_DIGITS: usize = 10;

/// Size of a GUID payload.
pub const GUID_LEN: usize = 16;

/// Default maximum nesting depth of objects and arrays.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Default maximum number of elements an eager collector will store.
pub const DEFAULT_MAX_ARRAY_LEN: usize = 1 << 20;

/// Reader-wide bounds applied to untrusted input.
///
/// String and blob sizes are bounded per call through explicit quotas; these
/// limits cover what has no declared size on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLimits {
    /// Maximum number of simultaneously open containers.
    pub max_depth: usize,
    /// Maximum number of elements collected by the `read_value_as_*_list`
    /// and `_array` helpers.
    pub max_array_len: usize,
}

impl ReadLimits {
    /// Creates the default limits.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_array_len: DEFAULT_MAX_ARRAY_LEN,
        }
    }

    /// Limits that never reject input. Only for trusted data.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_depth: usize::MAX,
            max_array_len: usize::MAX,
        }
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the maximum collected array length.
    #[must_use]
    pub const fn with_max_array_len(mut self, max_array_len: usize) -> Self {
        self.max_array_len = max_array_len;
        self
    }
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let limits = ReadLimits::new().with_max_depth(4).with_max_array_len(10);
        assert_eq!(limits.max_depth, 4);
        assert_eq!(limits.max_array_len, 10);
        assert_eq!(ReadLimits::default(), ReadLimits::new());
        assert_eq!(ReadLimits::unlimited().max_depth, usize::MAX);
    }
}
