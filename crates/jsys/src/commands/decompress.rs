use clap::Args;
use jsys_compression::Format;
use miette::{miette, IntoDiagnostic, Result};
use std::{io::Write, path::PathBuf};
use tracing::info;

use super::{create_output, read_input};

#[derive(Args)]
pub struct DecompressArgs {
    /// A Yaz0 or Yay0 compressed file
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// A target file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl DecompressArgs {
    pub fn handle(&self) -> Result<()> {
        let data = read_input(&self.input)?;
        let format = Format::detect(&data);
        if format == Format::None {
            return Err(miette!("{} is not Yaz0 or Yay0 compressed", self.input.display()));
        }

        let decompressed = jsys_compression::decompress(&data)?;
        info!("decompressed {format} data into {} bytes", decompressed.len());

        create_output(&self.output, self.overwrite)?
            .write_all(&decompressed)
            .into_diagnostic()?;
        Ok(())
    }
}
