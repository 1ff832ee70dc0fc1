// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::mem::size_of;

use zerocopy::FromBytes;

use crate::Error;
use crate::Result;

/// Forward-only cursor over a blob in native endianness.
///
/// Values are copied out, so the input does not need any alignment.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::TruncatedInput {
                offset: self.offset,
                needed: len - self.remaining(),
            });
        }
        let bytes = &self.buf[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    pub(crate) fn read<T: FromBytes>(&mut self) -> Result<T> {
        let offset = self.offset;
        let bytes = self.take(size_of::<T>())?;
        // take() returned exactly size_of::<T>() bytes.
        T::read_from(bytes).ok_or(Error::TruncatedInput { offset, needed: 0 })
    }

    /// Reads `count` consecutive values of `T`.
    pub(crate) fn read_vec<T: FromBytes>(&mut self, count: usize) -> Result<Vec<T>> {
        let len = count.checked_mul(size_of::<T>()).ok_or(Error::TruncatedInput {
            offset: self.offset,
            needed: usize::MAX,
        })?;
        let offset = self.offset;
        let bytes = self.take(len)?;
        bytes
            .chunks_exact(size_of::<T>())
            .map(T::read_from)
            .collect::<Option<Vec<_>>>()
            .ok_or(Error::TruncatedInput { offset, needed: 0 })
    }
}
