use clap::Args;
use jsys_compression::yaz0;
use miette::{miette, IntoDiagnostic, Result};
use std::{io::Write, path::PathBuf};
use tracing::info;

use super::{create_output, read_input, Compression};

#[derive(Args)]
pub struct CompressArgs {
    /// An input file
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// A target file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// The compression to apply
    #[arg(long, value_enum, default_value_t = Compression::Yaz0)]
    format: Compression,

    /// Yaz0 compression level from 1 to 9
    #[arg(long, default_value_t = yaz0::DEFAULT_LEVEL, value_parser = clap::value_parser!(u8).range(1..=9))]
    level: u8,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl CompressArgs {
    pub fn handle(&self) -> Result<()> {
        if self.format == Compression::None {
            return Err(miette!("choose yaz0 or yay0 to compress"));
        }

        let data = read_input(&self.input)?;
        let compressed = jsys_compression::compress(&data, self.format.into(), self.level)?;
        info!(
            "compressed {} bytes into {} bytes",
            data.len(),
            compressed.len()
        );

        create_output(&self.output, self.overwrite)?
            .write_all(&compressed)
            .into_diagnostic()?;
        Ok(())
    }
}
