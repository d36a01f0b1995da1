//! Convenience operations layered over [`ObjectReader`] and
//! [`ObjectWriter`].
//!
//! Both traits are implemented for every reader and writer, including trait
//! objects, so they only need to be imported.

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::iter::{ArrayValues, Members, ReadFn};
use crate::limits::GUID_LEN;
use crate::object::{ObjectReader, ObjectWriter};
use crate::util::ticks;

/// Lazy sequences, eager collectors and typed conversions for readers.
///
/// Every operation that expects a container returns `Ok(None)` when the
/// value is null. Any other non-container value (a number, a string, a
/// boolean) is not treated as absent: it fails with
/// [`Error::UnexpectedToken`] and leaves the value unread, so a caller
/// never ends up positioned inside a half-consumed value.
pub trait ObjectReaderExt: ObjectReader {
    /// Starts reading an object as a sequence of members.
    fn get_object(&mut self) -> Result<Option<Members<'_, Self>>> {
        if self.read_start_object()? {
            Ok(Some(Members::new(self)))
        } else {
            Ok(None)
        }
    }

    /// Starts reading an array whose elements are read with `read`.
    fn get_array_values<T, F>(&mut self, read: F) -> Result<Option<ArrayValues<'_, Self, F>>>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        if self.read_start_array()? {
            Ok(Some(ArrayValues::new(self, read)))
        } else {
            Ok(None)
        }
    }

    /// Lazy sequence over an array of `bool`.
    fn get_bool_array_values(&mut self) -> Result<Option<ArrayValues<'_, Self, ReadFn<Self, bool>>>> {
        self.get_array_values(Self::read_value_as_bool as ReadFn<Self, bool>)
    }

    /// Lazy sequence over an array of `i32`.
    fn get_i32_array_values(&mut self) -> Result<Option<ArrayValues<'_, Self, ReadFn<Self, i32>>>> {
        self.get_array_values(Self::read_value_as_i32 as ReadFn<Self, i32>)
    }

    /// Lazy sequence over an array of `u32`.
    fn get_u32_array_values(&mut self) -> Result<Option<ArrayValues<'_, Self, ReadFn<Self, u32>>>> {
        self.get_array_values(Self::read_value_as_u32 as ReadFn<Self, u32>)
    }

    /// Lazy sequence over an array of `i64`.
    fn get_i64_array_values(&mut self) -> Result<Option<ArrayValues<'_, Self, ReadFn<Self, i64>>>> {
        self.get_array_values(Self::read_value_as_i64 as ReadFn<Self, i64>)
    }

    /// Lazy sequence over an array of `u64`.
    fn get_u64_array_values(&mut self) -> Result<Option<ArrayValues<'_, Self, ReadFn<Self, u64>>>> {
        self.get_array_values(Self::read_value_as_u64 as ReadFn<Self, u64>)
    }

    /// Lazy sequence over an array of `f32`.
    fn get_f32_array_values(&mut self) -> Result<Option<ArrayValues<'_, Self, ReadFn<Self, f32>>>> {
        self.get_array_values(Self::read_value_as_f32 as ReadFn<Self, f32>)
    }

    /// Lazy sequence over an array of `f64`.
    fn get_f64_array_values(&mut self) -> Result<Option<ArrayValues<'_, Self, ReadFn<Self, f64>>>> {
        self.get_array_values(Self::read_value_as_f64 as ReadFn<Self, f64>)
    }

    /// Starts reading an array of strings, each at most `item_quota` bytes.
    /// Null elements come out as `None`.
    fn get_string_array_values(
        &mut self,
        item_quota: usize,
    ) -> Result<Option<ArrayValues<'_, Self, impl FnMut(&mut Self) -> Result<Option<String>>>>> {
        self.get_array_values(move |reader: &mut Self| reader.read_value_as_string(item_quota))
    }

    /// Reads a whole array into a `Vec`, reading each element with `read`.
    ///
    /// Fails with `QuotaExceeded` before reading an element past
    /// [`ReadLimits::max_array_len`](crate::ReadLimits::max_array_len).
    fn read_value_as_list<T, F>(&mut self, mut read: F) -> Result<Option<Vec<T>>>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        if !self.read_start_array()? {
            return Ok(None);
        }
        let max = self.limits().max_array_len;
        let mut list = Vec::new();
        while self.move_to_next_array_value()? {
            if list.len() == max {
                tracing::debug!(max, "array length exceeds limit");
                return Err(Error::QuotaExceeded {
                    field: "array",
                    len: max.saturating_add(1),
                    quota: max,
                });
            }
            list.push(read(&mut *self)?);
        }
        self.read_end_array()?;
        Ok(Some(list))
    }

    /// Collects an array of `bool` into a `Vec`.
    fn read_value_as_bool_list(&mut self) -> Result<Option<Vec<bool>>> {
        self.read_value_as_list(Self::read_value_as_bool)
    }

    /// Collects an array of `i32` into a `Vec`.
    fn read_value_as_i32_list(&mut self) -> Result<Option<Vec<i32>>> {
        self.read_value_as_list(Self::read_value_as_i32)
    }

    /// Collects an array of `u32` into a `Vec`.
    fn read_value_as_u32_list(&mut self) -> Result<Option<Vec<u32>>> {
        self.read_value_as_list(Self::read_value_as_u32)
    }

    /// Collects an array of `i64` into a `Vec`.
    fn read_value_as_i64_list(&mut self) -> Result<Option<Vec<i64>>> {
        self.read_value_as_list(Self::read_value_as_i64)
    }

    /// Collects an array of `u64` into a `Vec`.
    fn read_value_as_u64_list(&mut self) -> Result<Option<Vec<u64>>> {
        self.read_value_as_list(Self::read_value_as_u64)
    }

    /// Collects an array of `f32` into a `Vec`.
    fn read_value_as_f32_list(&mut self) -> Result<Option<Vec<f32>>> {
        self.read_value_as_list(Self::read_value_as_f32)
    }

    /// Collects an array of `f64` into a `Vec`.
    fn read_value_as_f64_list(&mut self) -> Result<Option<Vec<f64>>> {
        self.read_value_as_list(Self::read_value_as_f64)
    }

    /// Collects an array of strings, each at most `item_quota` bytes.
    fn read_value_as_string_list(&mut self, item_quota: usize) -> Result<Option<Vec<Option<String>>>> {
        self.read_value_as_list(|reader: &mut Self| reader.read_value_as_string(item_quota))
    }

    /// Like [`read_value_as_bool_list`](Self::read_value_as_bool_list), as a boxed slice.
    fn read_value_as_bool_array(&mut self) -> Result<Option<Box<[bool]>>> {
        Ok(self.read_value_as_bool_list()?.map(Vec::into_boxed_slice))
    }

    /// Like [`read_value_as_i32_list`](Self::read_value_as_i32_list), as a boxed slice.
    fn read_value_as_i32_array(&mut self) -> Result<Option<Box<[i32]>>> {
        Ok(self.read_value_as_i32_list()?.map(Vec::into_boxed_slice))
    }

    /// Like [`read_value_as_u32_list`](Self::read_value_as_u32_list), as a boxed slice.
    fn read_value_as_u32_array(&mut self) -> Result<Option<Box<[u32]>>> {
        Ok(self.read_value_as_u32_list()?.map(Vec::into_boxed_slice))
    }

    /// Like [`read_value_as_i64_list`](Self::read_value_as_i64_list), as a boxed slice.
    fn read_value_as_i64_array(&mut self) -> Result<Option<Box<[i64]>>> {
        Ok(self.read_value_as_i64_list()?.map(Vec::into_boxed_slice))
    }

    /// Like [`read_value_as_u64_list`](Self::read_value_as_u64_list), as a boxed slice.
    fn read_value_as_u64_array(&mut self) -> Result<Option<Box<[u64]>>> {
        Ok(self.read_value_as_u64_list()?.map(Vec::into_boxed_slice))
    }

    /// Like [`read_value_as_f32_list`](Self::read_value_as_f32_list), as a boxed slice.
    fn read_value_as_f32_array(&mut self) -> Result<Option<Box<[f32]>>> {
        Ok(self.read_value_as_f32_list()?.map(Vec::into_boxed_slice))
    }

    /// Like [`read_value_as_f64_list`](Self::read_value_as_f64_list), as a boxed slice.
    fn read_value_as_f64_array(&mut self) -> Result<Option<Box<[f64]>>> {
        Ok(self.read_value_as_f64_list()?.map(Vec::into_boxed_slice))
    }

    /// Like [`read_value_as_string_list`](Self::read_value_as_string_list), as a boxed slice.
    fn read_value_as_string_array(&mut self, item_quota: usize) -> Result<Option<Box<[Option<String>]>>> {
        Ok(self
            .read_value_as_string_list(item_quota)?
            .map(Vec::into_boxed_slice))
    }

    /// Reads a 16-byte blob in Microsoft GUID byte order.
    fn read_value_as_guid(&mut self) -> Result<Uuid> {
        let bytes = match self.read_value_as_bytes(GUID_LEN) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                return Err(Error::UnexpectedToken {
                    expected: "guid",
                    found: "null".to_string(),
                });
            }
            Err(Error::QuotaExceeded { len, .. }) => return Err(Error::InvalidGuidLength { len }),
            Err(err) => return Err(err),
        };
        let raw: [u8; GUID_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::InvalidGuidLength { len: bytes.len() })?;
        Ok(Uuid::from_bytes_le(raw))
    }

    /// Reads a duration stored as signed 100 ns ticks.
    fn read_value_as_time_span(&mut self) -> Result<TimeDelta> {
        ticks::ticks_to_time_delta(self.read_value_as_i64()?)
    }

    /// Reads an instant stored as 100 ns ticks since 0001-01-01 UTC.
    fn read_value_as_date_time(&mut self) -> Result<DateTime<Utc>> {
        ticks::ticks_to_date_time(self.read_value_as_i64()?)
    }
}

impl<R: ObjectReader + ?Sized> ObjectReaderExt for R {}

/// Typed conversions for writers, mirroring [`ObjectReaderExt`].
pub trait ObjectWriterExt: ObjectWriter {
    /// Writes a GUID as 16 bytes in Microsoft GUID byte order.
    fn write_guid(&mut self, value: &Uuid) -> Result<()> {
        self.write_bytes(&value.to_bytes_le())
    }

    /// Writes a duration as signed 100 ns ticks, truncating finer precision.
    fn write_time_span(&mut self, value: TimeDelta) -> Result<()> {
        let ticks = ticks::time_delta_to_ticks(value)?;
        self.write_i64(ticks)
    }

    /// Writes an instant as 100 ns ticks since 0001-01-01 UTC.
    fn write_date_time(&mut self, value: &DateTime<Utc>) -> Result<()> {
        let ticks = ticks::date_time_to_ticks(*value)?;
        self.write_i64(ticks)
    }
}

impl<W: ObjectWriter + ?Sized> ObjectWriterExt for W {}
