// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Parser and builder for the SOF equalizer configuration blobs.
//!
//! A blob either parses into a fully validated [`FirConfig`] / [`IirConfig`]
//! or is rejected with one [`Error`]; nothing is partially applied. Building
//! performs the same checks so an invalid blob is never emitted.
//!
//! All multi-byte fields are in native endianness.
//!
//! ```
//! use sof_eq::{build_fir, parse_fir, FirConfig, FirResponse, Q1_15};
//!
//! let taps = [0, 0, 16384, 0].map(Q1_15::from_bits).to_vec();
//! let config = FirConfig::new(vec![0, 0], vec![FirResponse::new(0, taps)]);
//! let blob = build_fir(&config).unwrap();
//! assert_eq!(parse_fir(&blob).unwrap(), config);
//! ```

pub mod abi;
mod blob;
mod error;
pub mod fir;
pub mod fixed_point;
pub mod iir;
mod limits;
mod reader;

pub use error::BuildError;
pub use error::Error;
pub use error::ParseError;
pub use error::Result;
pub use fir::build_fir;
pub use fir::build_fir_with_limits;
pub use fir::parse_fir;
pub use fir::parse_fir_with_limits;
pub use fir::FirConfig;
pub use fir::FirResponse;
pub use fixed_point::Q1_15;
pub use fixed_point::Q2_14;
pub use fixed_point::Q2_30;
pub use iir::build_iir;
pub use iir::build_iir_with_limits;
pub use iir::parse_iir;
pub use iir::parse_iir_with_limits;
pub use iir::Biquad;
pub use iir::IirConfig;
pub use iir::IirResponse;
pub use limits::Limits;
pub use limits::PLATFORM_MAX_CHANNELS;
