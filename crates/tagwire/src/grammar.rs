//! The structural token grammar shared by every encoding.
//!
//! ```text
//! Object := '{' Member* '}'
//! Member := Key Value
//! Array  := '[' Value* ']'
//! Value  := Object | Array | Null | Bool | IntK | UIntK | FloatK | Bytes | String
//! ```
//!
//! [`WriteGrammar`] and [`ReadGrammar`] track the stack of open containers
//! for writers and readers and reject calls that would break the grammar.
//! Every check runs before the caller touches the stream, so a rejected
//! call never emits or consumes bytes.

use std::fmt;

use crate::error::{Error, Result};

/// The two container kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Object,
    Array,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Object => f.write_str("object"),
            ContainerKind::Array => f.write_str("array"),
        }
    }
}

/// One structural or primitive event.
///
/// Tokens borrow their payload and only exist while being written; see
/// [`ObjectWriter::write_token`](crate::ObjectWriter::write_token).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'a> {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    /// A member key; must be positive.
    Member(i32),
    Null,
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Bytes(&'a [u8]),
    String(&'a str),
}

// =============================================================================
// WRITE SIDE
// =============================================================================

#[derive(Debug, Clone)]
struct WriteFrame {
    kind: ContainerKind,
    count: usize,
    member_open: bool,
}

/// Container stack for writers.
///
/// The `begin_*` methods return `true` when the item is not the first in its
/// container, which text writers use to emit a separator.
#[derive(Debug, Clone, Default)]
pub(crate) struct WriteGrammar {
    frames: Vec<WriteFrame>,
}

impl WriteGrammar {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of open containers.
    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Registers a value (scalar or container start) at the current position.
    pub(crate) fn begin_value(&mut self, container: bool, operation: &'static str) -> Result<bool> {
        match self.frames.last_mut() {
            None if container => Ok(false),
            None => Err(Error::NoOpenContainer { operation }),
            Some(frame) => match frame.kind {
                ContainerKind::Object if frame.member_open => {
                    frame.member_open = false;
                    Ok(false)
                }
                ContainerKind::Object => Err(Error::InvalidPosition {
                    operation,
                    reason: "object values must follow a member key",
                }),
                ContainerKind::Array => {
                    frame.count += 1;
                    Ok(frame.count > 1)
                }
            },
        }
    }

    /// Registers a member key in the innermost object.
    pub(crate) fn begin_member(&mut self, operation: &'static str) -> Result<bool> {
        let frame = self
            .frames
            .last_mut()
            .ok_or(Error::NoOpenContainer { operation })?;
        if frame.kind != ContainerKind::Object {
            return Err(Error::ContainerMismatch {
                operation,
                expected: ContainerKind::Object,
                found: frame.kind,
            });
        }
        if frame.member_open {
            return Err(Error::InvalidPosition {
                operation,
                reason: "the previous member has no value",
            });
        }
        frame.member_open = true;
        frame.count += 1;
        Ok(frame.count > 1)
    }

    /// Opens a container after its start value was registered.
    pub(crate) fn push(&mut self, kind: ContainerKind) {
        self.frames.push(WriteFrame {
            kind,
            count: 0,
            member_open: false,
        });
    }

    /// Closes the innermost container, which must be of `kind`.
    pub(crate) fn end(&mut self, kind: ContainerKind, operation: &'static str) -> Result<()> {
        let frame = self.frames.last().ok_or(Error::NoOpenContainer { operation })?;
        if frame.kind != kind {
            return Err(Error::ContainerMismatch {
                operation,
                expected: kind,
                found: frame.kind,
            });
        }
        if frame.member_open {
            return Err(Error::InvalidPosition {
                operation,
                reason: "the last member has no value",
            });
        }
        self.frames.pop();
        Ok(())
    }
}

// =============================================================================
// READ SIDE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Between elements; the next call must move to an element or the end.
    Between,
    /// Positioned at an element's value, which has not been read yet.
    ValuePending,
    /// The closing token has been consumed.
    Ended,
}

#[derive(Debug, Clone)]
struct ReadFrame {
    kind: ContainerKind,
    count: usize,
    slot: Slot,
}

/// Container stack and cursor position for readers.
#[derive(Debug, Clone)]
pub(crate) struct ReadGrammar {
    frames: Vec<ReadFrame>,
    max_depth: usize,
}

impl ReadGrammar {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    pub(crate) fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of open containers.
    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Checks that a value may be read here without changing the position.
    pub(crate) fn check_value(&self, container: bool, operation: &'static str) -> Result<()> {
        match self.frames.last() {
            None if container => Ok(()),
            None => Err(Error::InvalidPosition {
                operation,
                reason: "scalar values must be inside an object or array",
            }),
            Some(frame) if frame.slot == Slot::ValuePending => Ok(()),
            Some(_) => Err(Error::InvalidPosition {
                operation,
                reason: "the reader is not positioned at a value",
            }),
        }
    }

    /// Consumes the pending value slot.
    pub(crate) fn begin_value(&mut self, container: bool, operation: &'static str) -> Result<()> {
        self.check_value(container, operation)?;
        if let Some(frame) = self.frames.last_mut() {
            frame.slot = Slot::Between;
        }
        Ok(())
    }

    /// Opens a container whose start token was just consumed.
    pub(crate) fn push(&mut self, kind: ContainerKind) -> Result<()> {
        if self.frames.len() >= self.max_depth {
            tracing::debug!(max = self.max_depth, "nesting depth limit reached");
            return Err(Error::NestingTooDeep {
                max: self.max_depth,
            });
        }
        self.frames.push(ReadFrame {
            kind,
            count: 0,
            slot: Slot::Between,
        });
        Ok(())
    }

    fn top(&self, kind: ContainerKind, operation: &'static str) -> Result<&ReadFrame> {
        let frame = self.frames.last().ok_or(Error::NoOpenContainer { operation })?;
        if frame.kind != kind {
            return Err(Error::ContainerMismatch {
                operation,
                expected: kind,
                found: frame.kind,
            });
        }
        Ok(frame)
    }

    /// Returns whether the current element's value was left unread.
    ///
    /// Fails if the innermost container is not `kind` or has already ended.
    pub(crate) fn value_pending(&self, kind: ContainerKind, operation: &'static str) -> Result<bool> {
        let frame = self.top(kind, operation)?;
        match frame.slot {
            Slot::Ended => Err(Error::InvalidPosition {
                operation,
                reason: "the container has already ended",
            }),
            slot => Ok(slot == Slot::ValuePending),
        }
    }

    /// Returns whether the innermost container's closing token was consumed.
    pub(crate) fn is_ended(&self, kind: ContainerKind, operation: &'static str) -> Result<bool> {
        Ok(self.top(kind, operation)?.slot == Slot::Ended)
    }

    /// Number of elements entered in the innermost container.
    pub(crate) fn count(&self) -> usize {
        self.frames.last().map_or(0, |frame| frame.count)
    }

    /// Positions the cursor at the next element's value.
    pub(crate) fn enter_element(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.count += 1;
            frame.slot = Slot::ValuePending;
        }
    }

    /// Records that the innermost container's closing token was consumed.
    pub(crate) fn mark_ended(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.slot = Slot::Ended;
        }
    }

    /// Closes the innermost container once its end was reached.
    pub(crate) fn pop(&mut self, kind: ContainerKind, operation: &'static str) -> Result<()> {
        if self.top(kind, operation)?.slot != Slot::Ended {
            return Err(Error::InvalidPosition {
                operation,
                reason: "the end of the container has not been reached",
            });
        }
        self.frames.pop();
        Ok(())
    }
}
