//! Lazy sequences over the members of an object and the elements of an
//! array.
//!
//! Both borrow the reader for their whole lifetime and consume the closing
//! token themselves once exhausted, leaving the reader right after the
//! container.

use std::iter::FusedIterator;
use std::ops::{Deref, DerefMut};

use crate::error::Result;
use crate::object::ObjectReader;

/// Element reader used by the typed array shorthands.
pub type ReadFn<R, T> = fn(&mut R) -> Result<T>;

/// The members of one object, in stream order.
///
/// Members are lent out one at a time, so this is not an [`Iterator`]:
///
/// ```rust
/// # use tagwire::{ObjectReader, ObjectReaderExt};
/// # fn demo(reader: &mut dyn ObjectReader) -> tagwire::Result<()> {
/// if let Some(mut members) = reader.get_object()? {
///     while let Some(mut member) = members.next()? {
///         if member.key() == 1 {
///             let _name = member.read_value_as_string(64)?;
///         }
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Members<'r, R: ObjectReader + ?Sized> {
    reader: &'r mut R,
    done: bool,
}

impl<'r, R: ObjectReader + ?Sized> Members<'r, R> {
    pub(crate) fn new(reader: &'r mut R) -> Self {
        Self {
            reader,
            done: false,
        }
    }

    /// Moves to the next member. A value left unread from the previous
    /// member is skipped; after the last member the end of the object is
    /// consumed and `None` is returned from then on.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<Member<'_, R>>> {
        if self.done {
            return Ok(None);
        }
        match self.reader.move_to_next_member() {
            Ok(Some(key)) => Ok(Some(Member {
                key,
                reader: &mut *self.reader,
            })),
            Ok(None) => {
                self.done = true;
                self.reader.read_end_object()?;
                Ok(None)
            }
            Err(err) => {
                self.done = true;
                Err(err)
            }
        }
    }

    /// Skips the remaining members and consumes the end of the object.
    pub fn finish(mut self) -> Result<()> {
        while self.next()?.is_some() {}
        Ok(())
    }
}

/// One member: its key plus the reader positioned at its value.
#[derive(Debug)]
pub struct Member<'a, R: ?Sized> {
    key: i32,
    reader: &'a mut R,
}

impl<R: ?Sized> Member<'_, R> {
    /// The member key.
    pub fn key(&self) -> i32 {
        self.key
    }

    /// The reader, positioned at this member's value.
    pub fn reader(&mut self) -> &mut R {
        &mut *self.reader
    }
}

impl<R: ?Sized> Deref for Member<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        &*self.reader
    }
}

impl<R: ?Sized> DerefMut for Member<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut *self.reader
    }
}

/// The elements of one array, each read with `read`.
///
/// Yields `Err` at most once; the sequence is fused afterwards.
#[derive(Debug)]
pub struct ArrayValues<'r, R: ?Sized, F> {
    reader: &'r mut R,
    read: F,
    done: bool,
}

impl<'r, R: ObjectReader + ?Sized, F> ArrayValues<'r, R, F> {
    pub(crate) fn new(reader: &'r mut R, read: F) -> Self {
        Self {
            reader,
            read,
            done: false,
        }
    }
}

impl<R, F, T> Iterator for ArrayValues<'_, R, F>
where
    R: ObjectReader + ?Sized,
    F: FnMut(&mut R) -> Result<T>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        if self.done {
            return None;
        }
        let item = match self.reader.move_to_next_array_value() {
            Ok(true) => (self.read)(&mut *self.reader),
            Ok(false) => {
                self.done = true;
                return self.reader.read_end_array().err().map(Err);
            }
            Err(err) => Err(err),
        };
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}

impl<R, F, T> FusedIterator for ArrayValues<'_, R, F>
where
    R: ObjectReader + ?Sized,
    F: FnMut(&mut R) -> Result<T>,
{
}
