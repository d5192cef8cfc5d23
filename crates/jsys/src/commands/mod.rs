pub mod compress;
pub mod decompress;
pub mod rarc;

use clap::ValueEnum;
use jsys_compression::Format;
use miette::{Context, IntoDiagnostic, Result};
use std::{fs::File, path::Path};

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Handle RARC archives
    Rarc {
        #[command(subcommand)]
        command: rarc::RarcCommands,
    },
    /// Compress a file with Yaz0 or Yay0
    Compress(compress::CompressArgs),
    /// Decompress a Yaz0 or Yay0 file
    Decompress(decompress::DecompressArgs),
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Rarc { command } => command.handle(),
            Commands::Compress(compress) => compress.handle(),
            Commands::Decompress(decompress) => decompress.handle(),
        }
    }
}

/// Compression formats accepted on the command line
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Compression {
    #[default]
    None,
    Yaz0,
    Yay0,
}

impl From<Compression> for Format {
    fn from(value: Compression) -> Self {
        match value {
            Compression::None => Format::None,
            Compression::Yaz0 => Format::Yaz0,
            Compression::Yay0 => Format::Yay0,
        }
    }
}

/// Create `path` for writing, refusing to replace an existing file unless `overwrite` is set.
pub(crate) fn create_output(path: &Path, overwrite: bool) -> Result<File> {
    let file = if overwrite {
        File::create(path)
    } else {
        File::create_new(path)
    };
    file.into_diagnostic()
        .context(format!("creating {}", path.display()))
}

pub(crate) fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .into_diagnostic()
        .context(format!("path: {}", path.display()))
}

#[cfg(test)]
mod test {
    use clap::Parser;
    use miette::{IntoDiagnostic, Result};
    use pretty_assertions::assert_eq;
    use std::{fs, path::Path};

    use super::Commands;

    #[derive(Parser)]
    struct Cli {
        #[command(subcommand)]
        command: Commands,
    }

    fn run(args: &[&str]) -> Result<()> {
        let cli = Cli::try_parse_from(std::iter::once("jsys").chain(args.iter().copied()))
            .into_diagnostic()?;
        cli.command.handle()
    }

    fn path(p: &Path) -> &str {
        p.to_str().unwrap()
    }

    #[test]
    fn pack_then_extract() -> Result<()> {
        let dir = tempfile::tempdir().into_diagnostic()?;
        let input = dir.path().join("stage");
        fs::create_dir_all(input.join("map/empty")).into_diagnostic()?;
        fs::write(input.join("scene.bin"), b"scene").into_diagnostic()?;
        fs::write(input.join("map/map.bmd"), vec![7u8; 100]).into_diagnostic()?;

        let archive = dir.path().join("stage.szs");
        run(&[
            "rarc", "pack", "-d", path(&input), "-f", path(&archive),
            "--compression", "yaz0", "--pad",
        ])?;

        let bytes = fs::read(&archive).into_diagnostic()?;
        assert_eq!(&bytes[..4], b"Yaz0");
        assert_eq!(bytes.len() % 32, 0);

        run(&["rarc", "list", "-f", path(&archive)])?;

        let output = dir.path().join("out");
        run(&["rarc", "extract", "-f", path(&archive), "-d", path(&output)])?;
        assert_eq!(fs::read(output.join("scene.bin")).into_diagnostic()?, b"scene");
        assert_eq!(fs::read(output.join("map/map.bmd")).into_diagnostic()?, vec![7u8; 100]);
        assert!(output.join("map/empty").is_dir());

        // without --overwrite existing files are kept
        assert!(run(&["rarc", "extract", "-f", path(&archive), "-d", path(&output)]).is_err());
        run(&[
            "rarc", "extract", "-f", path(&archive), "-d", path(&output), "--overwrite",
        ])?;

        Ok(())
    }

    #[test]
    fn compress_then_decompress() -> Result<()> {
        let dir = tempfile::tempdir().into_diagnostic()?;
        let input = dir.path().join("data.bin");
        let data = b"abcabcabcabc".repeat(20);
        fs::write(&input, &data).into_diagnostic()?;

        for format in ["yaz0", "yay0"] {
            let compressed = dir.path().join(format!("data.{format}"));
            let restored = dir.path().join(format!("data.{format}.bin"));

            run(&["compress", "-i", path(&input), "-o", path(&compressed), "--format", format])?;
            run(&["decompress", "-i", path(&compressed), "-o", path(&restored)])?;
            assert_eq!(fs::read(&restored).into_diagnostic()?, data);
        }

        assert!(run(&["decompress", "-i", path(&input), "-o", path(&dir.path().join("x"))]).is_err());
        assert!(run(&["compress", "-i", path(&input), "-o", path(&dir.path().join("y")), "--level", "10"]).is_err());

        Ok(())
    }
}
