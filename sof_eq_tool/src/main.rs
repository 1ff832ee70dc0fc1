// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

mod inspect;

use clap::Parser;

use inspect::InspectCommand;
use inspect::Kind;

/// Decode and validate SOF EQ configuration blobs.
#[derive(Parser)]
enum Cli {
    /// Inspect a sof_eq_fir_config blob
    Fir(InspectCommand),
    /// Inspect a sof_eq_iir_config blob
    Iir(InspectCommand),
}

trait Command {
    fn run(self) -> anyhow::Result<()>;
}

impl Command for Cli {
    fn run(self) -> anyhow::Result<()> {
        let output = match self {
            Cli::Fir(c) => c.run(Kind::Fir)?,
            Cli::Iir(c) => c.run(Kind::Iir)?,
        };
        print!("{output}");
        Ok(())
    }
}

fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    // Print errors using Display with their context chain.
    if let Err(e) = Cli::parse().run() {
        eprintln!("ERROR: {e:#}");
        std::process::exit(1);
    }
}
