// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Fixed-point coefficient wrappers.
//!
//! The codecs only carry bit patterns from the wire into typed fields and
//! back. These wrappers keep Q1.15, Q2.30 and Q2.14 values from being mixed
//! with each other or with plain integers without an explicit conversion.
//! They intentionally implement no arithmetic.
#![allow(non_camel_case_types)]

use std::fmt;
use std::num::TryFromIntError;

use serde::Deserialize;
use serde::Serialize;
use zerocopy::AsBytes;
use zerocopy::FromBytes;
use zerocopy::FromZeroes;

macro_rules! fixed_point {
    ($(#[$meta:meta])* $name:ident, $bits:ty, $wide:ty, $int:literal, $frac:literal) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(
            Clone,
            Copy,
            Debug,
            Default,
            PartialEq,
            Eq,
            Hash,
            FromZeroes,
            FromBytes,
            AsBytes,
            Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name($bits);

        impl $name {
            /// Number of integer bits, sign included.
            pub const INTEGER_BITS: u32 = $int;
            /// Number of fractional bits.
            pub const FRACTIONAL_BITS: u32 = $frac;

            /// Wraps a raw bit pattern.
            pub const fn from_bits(bits: $bits) -> Self {
                Self(bits)
            }

            /// Returns the raw bit pattern.
            pub const fn to_bits(self) -> $bits {
                self.0
            }
        }

        impl From<$name> for $bits {
            fn from(v: $name) -> $bits {
                v.0
            }
        }

        impl TryFrom<$wide> for $name {
            type Error = TryFromIntError;

            /// Accepts a raw value only if it fits the storage width.
            fn try_from(raw: $wide) -> Result<Self, Self::Error> {
                <$bits>::try_from(raw).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

fixed_point!(
    /// Q1.15 FIR tap. 16384 is 0.5.
    Q1_15,
    i16,
    i32,
    1,
    15
);

fixed_point!(
    /// Q2.30 biquad feedback/feedforward coefficient.
    Q2_30,
    i32,
    i64,
    2,
    30
);

fixed_point!(
    /// Q2.14 biquad output gain, stored in a 32-bit word.
    Q2_14,
    i32,
    i64,
    2,
    14
);

impl Q2_30 {
    pub const ONE: Self = Self(1 << 30);
}

impl Q2_14 {
    pub const ONE: Self = Self(1 << 14);
}
