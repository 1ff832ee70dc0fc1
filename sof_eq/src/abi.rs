// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The `sof_abi_hdr` that wraps component blobs on the SOF control path.
//!
//! The EQ codecs never look at this header. The control layer strips it and
//! rejects unknown ABI versions before handing the payload over.

use std::mem::size_of;

use zerocopy::AsBytes;
use zerocopy::FromBytes;
use zerocopy::FromZeroes;

use crate::Error;
use crate::Result;

/// "SOF\0" in native byte order.
pub const SOF_ABI_MAGIC: u32 = 0x00464F53;

/// Component will reject a non-matching FIR configuration.
pub const SOF_EQ_FIR_ABI_VERSION: u32 = 1;

/// Component will reject a non-matching IIR configuration.
pub const SOF_EQ_IIR_ABI_VERSION: u32 = 1;

/// Control index of the FIR EQ on/off switch.
pub const SOF_EQ_FIR_IDX_SWITCH: u32 = 0;

/// Control index of the IIR EQ on/off switch.
pub const SOF_EQ_IIR_IDX_SWITCH: u32 = 0;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromZeroes, FromBytes, AsBytes)]
pub struct SofAbiHeader {
    pub magic: u32,
    /// Component specific blob type.
    pub blob_type: u32,
    /// Payload size in bytes, header excluded.
    pub size: u32,
    pub abi: u32,
    pub reserved: [u32; 4],
}

impl SofAbiHeader {
    pub const SIZE: usize = size_of::<Self>();
}

/// Validates the ABI header at the start of `bytes` and returns it together
/// with the payload that follows.
pub fn strip_abi_header(bytes: &[u8], expected_abi: u32) -> Result<(SofAbiHeader, &[u8])> {
    let header = SofAbiHeader::read_from_prefix(bytes).ok_or(Error::TruncatedInput {
        offset: 0,
        needed: SofAbiHeader::SIZE.saturating_sub(bytes.len()),
    })?;
    if header.magic != SOF_ABI_MAGIC {
        return Err(Error::InvalidAbiMagic(header.magic));
    }
    if header.abi != expected_abi {
        return Err(Error::AbiVersionMismatch {
            expected: expected_abi,
            actual: header.abi,
        });
    }
    let payload = &bytes[SofAbiHeader::SIZE..];
    if usize::try_from(header.size).map_or(true, |s| s != payload.len()) {
        return Err(Error::AbiSizeMismatch {
            declared: header.size,
            actual: payload.len(),
        });
    }
    Ok((header, payload))
}

/// Prepends an ABI header to an already built payload.
pub fn wrap_abi_header(blob_type: u32, abi: u32, payload: &[u8]) -> Result<Vec<u8>> {
    let size = u32::try_from(payload.len()).map_err(|_| Error::BlobTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;
    let header = SofAbiHeader {
        magic: SOF_ABI_MAGIC,
        blob_type,
        size,
        abi,
        reserved: [0; 4],
    };
    let mut out = Vec::with_capacity(SofAbiHeader::SIZE + payload.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}
