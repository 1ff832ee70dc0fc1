// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Checks shared by the FIR and IIR blob layouts.

use std::mem::size_of;

use crate::Error;
use crate::Result;

/// Both layouts start with a `u32 size` that does not count itself.
pub(crate) const SIZE_FIELD_LEN: usize = size_of::<u32>();

/// Rejects a blob whose total length is over the per-kind byte budget.
pub(crate) fn check_budget(len: usize, max: usize) -> Result<()> {
    if len > max {
        return Err(Error::BlobTooLarge { size: len, max });
    }
    Ok(())
}

/// Compares the header `size` with what the buffer really holds.
pub(crate) fn check_declared_size(declared: u32, total_len: usize) -> Result<()> {
    let actual = total_len.saturating_sub(SIZE_FIELD_LEN);
    if usize::try_from(declared).map_or(true, |d| d != actual) {
        return Err(Error::SizeMismatch { declared, actual });
    }
    Ok(())
}

/// The `size` value to emit for a blob of `total_len` bytes.
pub(crate) fn declared_size(total_len: usize) -> Result<u32> {
    // Callers have already checked the budget, which is far below u32::MAX.
    u32::try_from(total_len - SIZE_FIELD_LEN).map_err(|_| Error::BlobTooLarge {
        size: total_len,
        max: u32::MAX as usize,
    })
}
