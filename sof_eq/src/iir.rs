// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! `sof_eq_iir_config` blobs made of DF2T biquad cascades.
//!
//! ```text
//! u32 size
//! u32 channels_in_config
//! u32 number_of_responses
//! i32 assign_response[channels_in_config]    -1 leaves the channel unequalized
//! {
//!     u32 num_sections
//!     u32 num_sections_in_series
//!     {
//!         i32 a2, a1, b2, b1, b0             Q2.30
//!         i32 output_shift
//!         i32 output_gain                    Q2.14
//!     }[num_sections]
//! }[number_of_responses]
//! ```

use std::mem::size_of;

use log::debug;
use log::trace;
use serde::Deserialize;
use serde::Serialize;
use zerocopy::AsBytes;
use zerocopy::FromBytes;
use zerocopy::FromZeroes;

use crate::blob;
use crate::fixed_point::Q2_14;
use crate::fixed_point::Q2_30;
use crate::reader::Reader;
use crate::Error;
use crate::Limits;
use crate::Result;

/// Max size allowed for a whole IIR blob in bytes.
pub const SOF_EQ_IIR_MAX_SIZE: usize = 1024;

/// A blob can define at most this many responses.
pub const SOF_EQ_IIR_MAX_RESPONSES: u32 = 8;

/// A 22nd order EQ with 11 biquads covers octave bands 1-11 up to 20 kHz.
pub const SOF_EQ_IIR_DF2T_BIQUADS_MAX: u32 = 11;

/// Number of `i32` words in a response header.
pub const SOF_EQ_IIR_NHEADER_DF2T: usize = 2;

/// Number of `i32` words in one biquad.
pub const SOF_EQ_IIR_NBIQUAD_DF2T: usize = 7;

/// `assign_response` value for a channel that is not equalized.
pub const RESPONSE_UNASSIGNED: i32 = -1;

#[repr(C)]
#[derive(FromZeroes, FromBytes, AsBytes)]
struct IirHeader {
    size: u32,
    channels_in_config: u32,
    number_of_responses: u32,
}

#[repr(C)]
#[derive(FromZeroes, FromBytes, AsBytes)]
struct IirResponseHeader {
    num_sections: u32,
    num_sections_in_series: u32,
}

/// One direct form II transposed section, in wire order.
#[repr(C)]
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, FromZeroes, FromBytes, AsBytes, Serialize, Deserialize,
)]
pub struct Biquad {
    pub a2: Q2_30,
    pub a1: Q2_30,
    pub b2: Q2_30,
    pub b1: Q2_30,
    pub b0: Q2_30,
    /// Number of right shifts, negative shifts left.
    pub output_shift: i32,
    pub output_gain: Q2_14,
}

impl Biquad {
    /// Pass-through section: b0 = 1.0, gain = 1.0, everything else zero.
    pub const FLAT: Self = Self {
        a2: Q2_30::from_bits(0),
        a1: Q2_30::from_bits(0),
        b2: Q2_30::from_bits(0),
        b1: Q2_30::from_bits(0),
        b0: Q2_30::ONE,
        output_shift: 0,
        output_gain: Q2_14::ONE,
    };
}

/// One biquad cascade.
///
/// The sections run in groups of `num_sections_in_series`; the groups are
/// summed in parallel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IirResponse {
    pub num_sections_in_series: u32,
    pub biquads: Vec<Biquad>,
}

impl IirResponse {
    pub fn new(num_sections_in_series: u32, biquads: Vec<Biquad>) -> Self {
        Self {
            num_sections_in_series,
            biquads,
        }
    }

    /// A cascade with all sections in series.
    pub fn series(biquads: Vec<Biquad>) -> Self {
        let n = u32::try_from(biquads.len()).unwrap_or(u32::MAX);
        Self::new(n, biquads)
    }

    pub fn num_sections(&self) -> usize {
        self.biquads.len()
    }

    /// Number of parallel groups the sections form.
    pub fn num_parallel_groups(&self) -> usize {
        match self.num_sections_in_series {
            0 => 0,
            n => self.biquads.len() / n as usize,
        }
    }

    fn encoded_len(&self) -> usize {
        let words = SOF_EQ_IIR_NHEADER_DF2T + self.biquads.len() * SOF_EQ_IIR_NBIQUAD_DF2T;
        words * size_of::<i32>()
    }

    fn read(r: &mut Reader, response: usize) -> Result<Self> {
        let header: IirResponseHeader = r.read()?;
        check_cascade_shape(
            response,
            header.num_sections,
            header.num_sections_in_series,
        )?;
        let biquads = r.read_vec(header.num_sections as usize)?;
        Ok(Self::new(header.num_sections_in_series, biquads))
    }

    fn write(&self, out: &mut Vec<u8>) {
        let header = IirResponseHeader {
            num_sections: self.biquads.len() as u32,
            num_sections_in_series: self.num_sections_in_series,
        };
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(self.biquads.as_bytes());
    }
}

/// A decoded IIR EQ configuration.
///
/// Channel `n` uses `responses[assign_response[n]]`, or bypasses the EQ when
/// the entry is [`RESPONSE_UNASSIGNED`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IirConfig {
    pub assign_response: Vec<i32>,
    pub responses: Vec<IirResponse>,
}

impl IirConfig {
    pub fn new(assign_response: Vec<i32>, responses: Vec<IirResponse>) -> Self {
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

    /// The response applied to `channel`; `None` if unequalized or out of
    /// range.
    pub fn response_for_channel(&self, channel: usize) -> Option<&IirResponse> {
        let index = *self.assign_response.get(channel)?;
        self.responses.get(usize::try_from(index).ok()?)
    }

    pub fn is_equalized(&self, channel: usize) -> bool {
        self.response_for_channel(channel).is_some()
    }

    fn parse(bytes: &[u8], limits: &Limits) -> Result<Self> {
        blob::check_budget(bytes.len(), SOF_EQ_IIR_MAX_SIZE)?;

        let mut r = Reader::new(bytes);
        let header: IirHeader = r.read()?;
        check_channel_count(header.channels_in_config, limits)?;
        check_response_count(header.number_of_responses)?;

        let number_of_responses = header.number_of_responses as usize;
        let assign_response: Vec<i32> = r.read_vec(header.channels_in_config as usize)?;
        check_assignments(&assign_response, number_of_responses)?;

        let responses = (0..number_of_responses)
            .map(|i| IirResponse::read(&mut r, i))
            .collect::<Result<Vec<_>>>()?;

        blob::check_declared_size(header.size, bytes.len())?;
        if r.remaining() != 0 {
            return Err(Error::TrailingData(r.remaining()));
        }

        Ok(Self::new(assign_response, responses))
    }

    fn validate(&self, limits: &Limits) -> Result<usize> {
        check_channel_count(
            u32::try_from(self.channels_in_config()).unwrap_or(u32::MAX),
            limits,
        )?;
        check_response_count(u32::try_from(self.number_of_responses()).unwrap_or(u32::MAX))?;
        check_assignments(&self.assign_response, self.number_of_responses())?;
        for (i, response) in self.responses.iter().enumerate() {
            check_cascade_shape(
                i,
                u32::try_from(response.num_sections()).unwrap_or(u32::MAX),
                response.num_sections_in_series,
            )?;
        }

        let len = size_of::<IirHeader>()
            + self.assign_response.as_bytes().len()
            + self
                .responses
                .iter()
                .map(IirResponse::encoded_len)
                .sum::<usize>();
        blob::check_budget(len, SOF_EQ_IIR_MAX_SIZE)?;
        Ok(len)
    }

    fn build(&self, limits: &Limits) -> Result<Vec<u8>> {
        let len = self.validate(limits)?;

        let header = IirHeader {
            size: blob::declared_size(len)?,
            channels_in_config: self.channels_in_config() as u32,
            number_of_responses: self.number_of_responses() as u32,
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
    if channels == 0 || channels > limits.max_channels {
        return Err(Error::InvalidChannelCount(channels));
    }
    Ok(())
}

fn check_response_count(count: u32) -> Result<()> {
    if count > SOF_EQ_IIR_MAX_RESPONSES {
        return Err(Error::TooManyResponses {
            count,
            max: SOF_EQ_IIR_MAX_RESPONSES,
        });
    }
    Ok(())
}

fn check_assignments(assign_response: &[i32], number_of_responses: usize) -> Result<()> {
    for (channel, &index) in assign_response.iter().enumerate() {
        let valid = index == RESPONSE_UNASSIGNED
            || usize::try_from(index).map_or(false, |i| i < number_of_responses);
        if !valid {
            return Err(Error::InvalidResponseIndex { channel, index });
        }
    }
    Ok(())
}

fn check_cascade_shape(
    response: usize,
    num_sections: u32,
    num_sections_in_series: u32,
) -> Result<()> {
    let valid = (1..=SOF_EQ_IIR_DF2T_BIQUADS_MAX).contains(&num_sections)
        && (1..=num_sections).contains(&num_sections_in_series)
        && num_sections % num_sections_in_series == 0;
    if !valid {
        return Err(Error::InvalidCascadeShape {
            response,
            num_sections,
            num_sections_in_series,
        });
    }
    Ok(())
}

/// Parses an IIR blob with the default platform limits.
pub fn parse_iir(bytes: &[u8]) -> Result<IirConfig> {
    parse_iir_with_limits(bytes, &Limits::default())
}

pub fn parse_iir_with_limits(bytes: &[u8], limits: &Limits) -> Result<IirConfig> {
    match IirConfig::parse(bytes, limits) {
        Ok(config) => {
            trace!(
                "IIR blob: {} channels, {} responses",
                config.channels_in_config(),
                config.number_of_responses()
            );
            Ok(config)
        }
        Err(e) => {
            debug!("rejected IIR blob of {} bytes: {}", bytes.len(), e);
            Err(e)
        }
    }
}

/// Encodes `config` with the default platform limits, re-checking every
/// rule `parse_iir` enforces.
pub fn build_iir(config: &IirConfig) -> Result<Vec<u8>> {
    build_iir_with_limits(config, &Limits::default())
}

pub fn build_iir_with_limits(config: &IirConfig, limits: &Limits) -> Result<Vec<u8>> {
    config.build(limits).map_err(|e| {
        debug!("refused to build IIR blob: {}", e);
        e
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn words(blob: &[u8]) -> Vec<i32> {
        blob.chunks_exact(4)
            .map(|c| i32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    fn from_words(words: &[i32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_ne_bytes()).collect()
    }

    fn stereo_flat() -> IirConfig {
        IirConfig::new(vec![0, -1], vec![IirResponse::series(vec![Biquad::FLAT])])
    }

    #[test]
    fn flat_section_layout() {
        assert_eq!(size_of::<Biquad>(), SOF_EQ_IIR_NBIQUAD_DF2T * 4);
        assert_eq!(size_of::<IirResponseHeader>(), SOF_EQ_IIR_NHEADER_DF2T * 4);
        assert_eq!(IirResponse::series(vec![Biquad::FLAT; 3]).encoded_len(), 92);
        assert_eq!(
            words(Biquad::FLAT.as_bytes()),
            vec![0, 0, 0, 0, 1073741824, 0, 16384]
        );
    }

    #[test]
    fn build_stereo_flat() {
        let blob = build_iir(&stereo_flat()).unwrap();
        assert_eq!(
            words(&blob),
            vec![52, 2, 1, 0, -1, 1, 1, 0, 0, 0, 0, 1073741824, 0, 16384]
        );
        let config = parse_iir(&blob).unwrap();
        assert!(config.is_equalized(0));
        assert!(!config.is_equalized(1));
        assert_eq!(config, stereo_flat());
    }

    #[test]
    fn all_channels_unassigned_without_responses() {
        let blob = from_words(&[16, 2, 0, -1, -1]);
        let config = parse_iir(&blob).unwrap();
        assert_eq!(config.number_of_responses(), 0);
        assert!(config.response_for_channel(0).is_none());
    }

    #[test]
    fn odd_channel_count_is_allowed() {
        let config = IirConfig::new(vec![0], stereo_flat().responses);
        let blob = build_iir(&config).unwrap();
        assert_eq!(parse_iir(&blob).unwrap(), config);
    }

    #[test]
    fn zero_channels() {
        let blob = from_words(&[8, 0, 0]);
        assert_eq!(parse_iir(&blob), Err(Error::InvalidChannelCount(0)));
    }

    #[test]
    fn sentinel_below_minus_one() {
        let mut w = words(&build_iir(&stereo_flat()).unwrap());
        w[4] = -2;
        assert_eq!(
            parse_iir(&from_words(&w)),
            Err(Error::InvalidResponseIndex {
                channel: 1,
                index: -2
            })
        );
    }

    #[test]
    fn too_many_responses() {
        let responses = vec![IirResponse::series(vec![Biquad::FLAT]); 9];
        let config = IirConfig::new(vec![0, 8], responses);
        assert_eq!(
            build_iir(&config),
            Err(Error::TooManyResponses { count: 9, max: 8 })
        );

        let blob = from_words(&[12, 2, 9, 0, 0]);
        assert_matches!(parse_iir(&blob), Err(Error::TooManyResponses { count: 9, .. }));
    }

    #[test]
    fn cascade_shapes() {
        assert!(check_cascade_shape(0, 11, 11).is_ok());
        assert!(check_cascade_shape(0, 4, 2).is_ok());
        assert!(check_cascade_shape(0, 1, 1).is_ok());
        for (n, s) in [(0, 0), (12, 12), (12, 1), (3, 0), (3, 4), (3, 2)] {
            assert_eq!(
                check_cascade_shape(5, n, s),
                Err(Error::InvalidCascadeShape {
                    response: 5,
                    num_sections: n,
                    num_sections_in_series: s
                }),
                "{n} sections, {s} in series"
            );
        }
    }

    #[test]
    fn parallel_groups() {
        let response = IirResponse::new(2, vec![Biquad::FLAT; 4]);
        assert_eq!(response.num_parallel_groups(), 2);
        assert_eq!(IirResponse::series(vec![Biquad::FLAT; 3]).num_parallel_groups(), 1);
    }

    #[test]
    fn truncated_biquad() {
        let blob = build_iir(&stereo_flat()).unwrap();
        assert_matches!(
            parse_iir(&blob[..blob.len() - 4]),
            Err(Error::TruncatedInput { needed: 4, .. })
        );
    }

    #[test]
    fn oversized_blob() {
        let responses = vec![IirResponse::series(vec![Biquad::FLAT; 11]); 4];
        let config = IirConfig::new(vec![0, 1, 2, 3], responses);
        assert_matches!(
            build_iir(&config),
            Err(Error::BlobTooLarge {
                max: SOF_EQ_IIR_MAX_SIZE,
                ..
            })
        );
    }

    #[test]
    fn trailing_bytes() {
        let mut w = words(&build_iir(&stereo_flat()).unwrap());
        w.push(0);
        w[0] = 56;
        assert_eq!(parse_iir(&from_words(&w)), Err(Error::TrailingData(4)));
    }

    #[test]
    fn oversized_input() {
        assert_matches!(
            parse_iir(&vec![0; SOF_EQ_IIR_MAX_SIZE + 1]),
            Err(Error::BlobTooLarge {
                size: 1025,
                max: SOF_EQ_IIR_MAX_SIZE,
            })
        );
    }

    #[test]
    fn channel_count_over_platform_limit() {
        let config = IirConfig::new(vec![0, -1, 0, -1], stereo_flat().responses);
        let blob = build_iir_with_limits(&config, &Limits::with_max_channels(4)).unwrap();
        assert_eq!(
            parse_iir_with_limits(&blob, &Limits::with_max_channels(3)),
            Err(Error::InvalidChannelCount(4))
        );
        assert_eq!(parse_iir_with_limits(&blob, &Limits::with_max_channels(4)), Ok(config));
    }
}
