// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::fmt;
use std::fmt::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use log::info;
use sof_eq::abi;
use sof_eq::parse_fir_with_limits;
use sof_eq::parse_iir_with_limits;
use sof_eq::FirConfig;
use sof_eq::IirConfig;
use sof_eq::Limits;
use sof_eq::PLATFORM_MAX_CHANNELS;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Kind {
    Fir,
    Iir,
}

impl Kind {
    fn abi_version(self) -> u32 {
        match self {
            Kind::Fir => abi::SOF_EQ_FIR_ABI_VERSION,
            Kind::Iir => abi::SOF_EQ_IIR_ABI_VERSION,
        }
    }
}

#[derive(Args)]
pub(crate) struct InspectCommand {
    /// Path to the blob file
    path: PathBuf,
    /// Print the decoded configuration as JSON
    #[arg(long)]
    json: bool,
    /// The blob starts with a sof_abi_hdr
    #[arg(long)]
    abi_header: bool,
    /// Maximum channels_in_config of the target platform
    #[arg(long, default_value_t = PLATFORM_MAX_CHANNELS)]
    max_channels: u32,
}

impl InspectCommand {
    pub(crate) fn run(&self, kind: Kind) -> anyhow::Result<String> {
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;

        let payload = if self.abi_header {
            let (header, payload) =
                abi::strip_abi_header(&bytes, kind.abi_version()).context("sof_abi_hdr")?;
            info!(
                "sof_abi_hdr: type {}, abi {}, {} payload bytes",
                header.blob_type, header.abi, header.size
            );
            payload
        } else {
            &bytes[..]
        };

        let limits = Limits::with_max_channels(self.max_channels);
        let output = match kind {
            Kind::Fir => {
                let config = parse_fir_with_limits(payload, &limits).context("FIR blob")?;
                if self.json {
                    serde_json::to_string_pretty(&config)? + "\n"
                } else {
                    describe_fir(&config)?
                }
            }
            Kind::Iir => {
                let config = parse_iir_with_limits(payload, &limits).context("IIR blob")?;
                if self.json {
                    serde_json::to_string_pretty(&config)? + "\n"
                } else {
                    describe_iir(&config)?
                }
            }
        };
        Ok(output)
    }
}

fn describe_fir(config: &FirConfig) -> Result<String, fmt::Error> {
    let mut s = String::new();
    writeln!(
        s,
        "FIR EQ: {} channels, {} responses",
        config.channels_in_config(),
        config.number_of_responses()
    )?;
    for (channel, index) in config.assign_response.iter().enumerate() {
        writeln!(s, "  channel {channel}: response {index}")?;
    }
    for (i, response) in config.responses.iter().enumerate() {
        writeln!(
            s,
            "  response {i}: {} taps, output shift {}",
            response.filter_length(),
            response.output_shift
        )?;
    }
    Ok(s)
}

fn describe_iir(config: &IirConfig) -> Result<String, fmt::Error> {
    let mut s = String::new();
    writeln!(
        s,
        "IIR EQ: {} channels, {} responses",
        config.channels_in_config(),
        config.number_of_responses()
    )?;
    for (channel, index) in config.assign_response.iter().enumerate() {
        if config.is_equalized(channel) {
            writeln!(s, "  channel {channel}: response {index}")?;
        } else {
            writeln!(s, "  channel {channel}: bypass")?;
        }
    }
    for (i, response) in config.responses.iter().enumerate() {
        writeln!(
            s,
            "  response {i}: {} biquads, {} in series",
            response.num_sections(),
            response.num_sections_in_series
        )?;
        for bq in &response.biquads {
            writeln!(
                s,
                "    a2={} a1={} b2={} b1={} b0={} shift={} gain={}",
                bq.a2, bq.a1, bq.b2, bq.b1, bq.b0, bq.output_shift, bq.output_gain
            )?;
        }
    }
    Ok(s)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use sof_eq::build_fir;
    use sof_eq::build_iir;
    use sof_eq::Biquad;
    use sof_eq::FirResponse;
    use sof_eq::IirResponse;
    use sof_eq::Q1_15;
    use tempfile::NamedTempFile;

    use super::*;

    fn command(file: &NamedTempFile) -> InspectCommand {
        InspectCommand {
            path: file.path().to_path_buf(),
            json: false,
            abi_header: false,
            max_channels: PLATFORM_MAX_CHANNELS,
        }
    }

    fn blob_file(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    fn fir_config() -> FirConfig {
        let taps = [0, 0, 16384, 0].map(Q1_15::from_bits).to_vec();
        FirConfig::new(vec![0, 0], vec![FirResponse::new(1, taps)])
    }

    #[test]
    fn describe_fir_blob() {
        let file = blob_file(&build_fir(&fir_config()).unwrap());
        let output = command(&file).run(Kind::Fir).unwrap();
        assert_eq!(
            output,
            "FIR EQ: 2 channels, 1 responses\n  \
             channel 0: response 0\n  \
             channel 1: response 0\n  \
             response 0: 4 taps, output shift 1\n"
        );
    }

    #[test]
    fn fir_json() {
        let file = blob_file(&build_fir(&fir_config()).unwrap());
        let mut cmd = command(&file);
        cmd.json = true;
        let output = cmd.run(Kind::Fir).unwrap();
        let decoded: FirConfig = serde_json::from_str(&output).unwrap();
        assert_eq!(decoded, fir_config());
    }

    #[test]
    fn iir_with_abi_header() {
        let config = IirConfig::new(vec![-1, 0], vec![IirResponse::series(vec![Biquad::FLAT])]);
        let payload = build_iir(&config).unwrap();
        let wrapped = abi::wrap_abi_header(0, abi::SOF_EQ_IIR_ABI_VERSION, &payload).unwrap();
        let file = blob_file(&wrapped);
        let mut cmd = command(&file);
        cmd.abi_header = true;
        let output = cmd.run(Kind::Iir).unwrap();
        assert!(output.starts_with("IIR EQ: 2 channels, 1 responses\n"));
        assert!(output.contains("channel 0: bypass"));
        assert!(output.contains("b0=1073741824 shift=0 gain=16384"));
    }

    #[test]
    fn describe_iir_lines() {
        let config = IirConfig::new(vec![0, -1], vec![IirResponse::series(vec![Biquad::FLAT])]);
        assert_eq!(
            describe_iir(&config).unwrap(),
            "IIR EQ: 2 channels, 1 responses\n  \
             channel 0: response 0\n  \
             channel 1: bypass\n  \
             response 0: 1 biquads, 1 in series\n    \
             a2=0 a1=0 b2=0 b1=0 b0=1073741824 shift=0 gain=16384\n"
        );
    }

    #[test]
    fn rejected_blob_reports_reason() {
        let file = blob_file(&build_fir(&fir_config()).unwrap());
        let mut cmd = command(&file);
        cmd.max_channels = 0;
        let err = cmd.run(Kind::Fir).unwrap_err();
        assert_eq!(format!("{err:#}"), "FIR blob: invalid channels_in_config: 2");
    }

    #[test]
    fn missing_file() {
        let cmd = InspectCommand {
            path: PathBuf::from("/nonexistent/eq.bin"),
            json: false,
            abi_header: false,
            max_channels: PLATFORM_MAX_CHANNELS,
        };
        assert!(cmd.run(Kind::Iir).is_err());
    }
}
