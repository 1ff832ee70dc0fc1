// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! `sof_eq_fir_config` blobs.
//!
//! ```text
//! u32 size
//! u16 channels_in_config
//! u16 number_of_responses
//! i16 assign_response[channels_in_config]
//! {
//!     i16 length
//!     i16 output_shift
//!     i16 coef[length]        Q1.15
//! }[number_of_responses]
//! ```
//!
//! `channels_in_config` must be even so the coefficient data stays 32-bit
//! aligned, and every filter length is a multiple of four taps.

use std::mem::size_of;

use log::debug;
use log::trace;
use serde::Deserialize;
use serde::Serialize;
use zerocopy::AsBytes;
use zerocopy::FromBytes;
use zerocopy::FromZeroes;

use crate::blob;
use crate::fixed_point::Q1_15;
use crate::reader::Reader;
use crate::Error;
use crate::Limits;
use crate::Result;

/// Max size allowed for a whole FIR blob in bytes.
pub const SOF_EQ_FIR_MAX_SIZE: usize = 4096;

/// Max number of taps of a single FIR response.
pub const SOF_EQ_FIR_MAX_LENGTH: i16 = 192;

/// Number of `i16` words (length, shift) ahead of each tap array.
pub const SOF_EQ_FIR_COEF_NHEADER: usize = 2;

#[repr(C)]
#[derive(FromZeroes, FromBytes, AsBytes)]
struct FirHeader {
    size: u32,
    channels_in_config: u16,
    number_of_responses: u16,
}

#[repr(C)]
#[derive(FromZeroes, FromBytes, AsBytes)]
struct FirCoefHeader {
    length: i16,
    out_shift: i16,
}

/// One FIR tap set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirResponse {
    /// Number of right shifts applied after the convolution.
    pub output_shift: i16,
    pub coefficients: Vec<Q1_15>,
}

impl FirResponse {
    pub fn new(output_shift: i16, coefficients: Vec<Q1_15>) -> Self {
        Self {
            output_shift,
            coefficients,
        }
    }

    /// Number of taps.
    pub fn filter_length(&self) -> usize {
        self.coefficients.len()
    }

    fn encoded_len(&self) -> usize {
        (SOF_EQ_FIR_COEF_NHEADER + self.coefficients.len()) * size_of::<i16>()
    }

    fn read(r: &mut Reader, response: usize) -> Result<Self> {
        let header: FirCoefHeader = r.read()?;
        check_filter_length(response, header.length.into())?;
        // check_filter_length() rejected non-positive lengths.
        let coefficients = r.read_vec(header.length as usize)?;
        Ok(Self::new(header.out_shift, coefficients))
    }

    fn write(&self, out: &mut Vec<u8>) {
        let header = FirCoefHeader {
            length: self.coefficients.len() as i16,
            out_shift: self.output_shift,
        };
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(self.coefficients.as_bytes());
    }
}

/// A decoded FIR EQ configuration.
///
/// Channel `n` is filtered by `responses[assign_response[n]]`. Several
/// channels may point at the same response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirConfig {
    pub assign_response: Vec<i16>,
    pub responses: Vec<FirResponse>,
}

impl FirConfig {
    pub fn new(assign_response: Vec<i16>, responses: Vec<FirResponse>) -> Self {
        Self {
            assign_response,
            responses,
        }
    }

    pub fn channels_in_config(&self) -> usize {
        self.assign_response.len()
    }

    pub fn number_of_responses(&self) -> usize {
        self.responses.len()
    }

    /// The response applied to `channel`, or `None` past `channels_in_config`.
    pub fn response_for_channel(&self, channel: usize) -> Option<&FirResponse> {
        let index = *self.assign_response.get(channel)?;
        self.responses.get(usize::try_from(index).ok()?)
    }

    fn parse(bytes: &[u8], limits: &Limits) -> Result<Self> {
        blob::check_budget(bytes.len(), SOF_EQ_FIR_MAX_SIZE)?;

        let mut r = Reader::new(bytes);
        let header: FirHeader = r.read()?;
        check_channel_count(header.channels_in_config.into(), limits)?;

        let number_of_responses = usize::from(header.number_of_responses);
        let assign_response: Vec<i16> = r.read_vec(header.channels_in_config.into())?;
        check_assignments(&assign_response, number_of_responses)?;

        let responses = (0..number_of_responses)
            .map(|i| FirResponse::read(&mut r, i))
            .collect::<Result<Vec<_>>>()?;

        blob::check_declared_size(header.size, bytes.len())?;
        if r.remaining() != 0 {
            return Err(Error::TrailingData(r.remaining()));
        }

        Ok(Self::new(assign_response, responses))
    }

    fn validate(&self, limits: &Limits) -> Result<usize> {
        let channels = u32::try_from(self.channels_in_config()).unwrap_or(u32::MAX);
        check_channel_count(channels, limits)?;
        if u16::try_from(channels).is_err() {
            return Err(Error::InvalidChannelCount(channels));
        }
        if u16::try_from(self.number_of_responses()).is_err() {
            return Err(Error::TooManyResponses {
                count: u32::try_from(self.number_of_responses()).unwrap_or(u32::MAX),
                max: u16::MAX.into(),
            });
        }
        check_assignments(&self.assign_response, self.number_of_responses())?;
        for (i, response) in self.responses.iter().enumerate() {
            let length = i32::try_from(response.filter_length()).unwrap_or(i32::MAX);
            check_filter_length(i, length)?;
        }

        let len = size_of::<FirHeader>()
            + self.assign_response.as_bytes().len()
            + self
                .responses
                .iter()
                .map(FirResponse::encoded_len)
                .sum::<usize>();
        blob::check_budget(len, SOF_EQ_FIR_MAX_SIZE)?;
        Ok(len)
    }

    fn build(&self, limits: &Limits) -> Result<Vec<u8>> {
        let len = self.validate(limits)?;

        // validate() bounded both counts to u16.
        let header = FirHeader {
            size: blob::declared_size(len)?,
            channels_in_config: self.channels_in_config() as u16,
            number_of_responses: self.number_of_responses() as u16,
        };

        let mut out = Vec::with_capacity(len);
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(self.assign_response.as_bytes());
        for response in &self.responses {
            response.write(&mut out);
        }
        Ok(out)
    }
}

fn check_channel_count(channels: u32, limits: &Limits) -> Result<()> {
    if channels == 0 || channels % 2 != 0 || channels > limits.max_channels {
        return Err(Error::InvalidChannelCount(channels));
    }
    Ok(())
}

fn check_assignments(assign_response: &[i16], number_of_responses: usize) -> Result<()> {
    for (channel, &index) in assign_response.iter().enumerate() {
        if usize::try_from(index).map_or(true, |i| i >= number_of_responses) {
            return Err(Error::InvalidResponseIndex {
                channel,
                index: index.into(),
            });
        }
    }
    Ok(())
}

fn check_filter_length(response: usize, length: i32) -> Result<()> {
    if length <= 0 || length % 4 != 0 || length > i32::from(SOF_EQ_FIR_MAX_LENGTH) {
        return Err(Error::InvalidFilterLength { response, length });
    }
    Ok(())
}

/// Parses a FIR blob with the default platform limits.
pub fn parse_fir(bytes: &[u8]) -> Result<FirConfig> {
    parse_fir_with_limits(bytes, &Limits::default())
}

pub fn parse_fir_with_limits(bytes: &[u8], limits: &Limits) -> Result<FirConfig> {
    match FirConfig::parse(bytes, limits) {
        Ok(config) => {
            trace!(
                "FIR blob: {} channels, {} responses",
                config.channels_in_config(),
                config.number_of_responses()
            );
            Ok(config)
        }
        Err(e) => {
            debug!("rejected FIR blob of {} bytes: {}", bytes.len(), e);
            Err(e)
        }
    }
}

/// Encodes `config` with the default platform limits.
///
/// The same checks as parsing are applied first, so an invalid blob is
/// never produced.
pub fn build_fir(config: &FirConfig) -> Result<Vec<u8>> {
    build_fir_with_limits(config, &Limits::default())
}

pub fn build_fir_with_limits(config: &FirConfig, limits: &Limits) -> Result<Vec<u8>> {
    config.build(limits).map_err(|e| {
        debug!("refused to build FIR blob: {}", e);
        e
    })
}
