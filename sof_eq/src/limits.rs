// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use serde::Deserialize;
use serde::Serialize;

/// Channel count of the default DSP platform.
pub const PLATFORM_MAX_CHANNELS: u32 = 8;

/// Platform bounds that the blob format itself does not carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Upper bound for `channels_in_config`.
    pub max_channels: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_channels: PLATFORM_MAX_CHANNELS,
        }
    }
}

impl Limits {
    pub fn with_max_channels(max_channels: u32) -> Self {
        Self { max_channels }
    }
}
