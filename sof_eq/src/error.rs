// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use remain::sorted;
use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

/// Returned by `parse_fir` and `parse_iir`.
pub type ParseError = Error;

/// Returned by `build_fir` and `build_iir`.
pub type BuildError = Error;

/// Every way an EQ blob can be rejected.
///
/// A blob is accepted or rejected as a whole; the caller is expected to
/// drop the configuration update on any of these.
#[sorted]
#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum Error {
    #[error("ABI header declares {declared} payload bytes, {actual} available")]
    AbiSizeMismatch { declared: u32, actual: usize },
    #[error("unsupported ABI version: expect {expected}, get {actual}")]
    AbiVersionMismatch { expected: u32, actual: u32 },
    #[error("blob of {size} bytes exceeds the maximum of {max}")]
    BlobTooLarge { size: usize, max: usize },
    #[error("invalid ABI magic: {0:#010x}")]
    InvalidAbiMagic(u32),
    #[error("response {response}: invalid cascade of {num_sections} sections, {num_sections_in_series} in series")]
    InvalidCascadeShape {
        response: usize,
        num_sections: u32,
        num_sections_in_series: u32,
    },
    #[error("invalid channels_in_config: {0}")]
    InvalidChannelCount(u32),
    #[error("response {response}: invalid filter length {length}")]
    InvalidFilterLength { response: usize, length: i32 },
    #[error("channel {channel}: invalid response index {index}")]
    InvalidResponseIndex { channel: usize, index: i32 },
    #[error("declared size {declared} does not match {actual} available bytes")]
    SizeMismatch { declared: u32, actual: usize },
    #[error("{count} responses exceed the maximum of {max}")]
    TooManyResponses { count: u32, max: u32 },
    #[error("{0} bytes left over after the last response")]
    TrailingData(usize),
    #[error("blob truncated at offset {offset}: need {needed} more bytes")]
    TruncatedInput { offset: usize, needed: usize },
}
