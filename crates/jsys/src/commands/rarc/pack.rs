use clap::Args;
use jsys_compression::yaz0;
use jsys_rarc::{Archive, ByteOrder, File, FolderId, SaveOptions};
use miette::{miette, Context, IntoDiagnostic, Result};
use std::{
    collections::HashMap,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::info;
use walkdir::WalkDir;

use crate::commands::{create_output, read_input, Compression};

#[derive(Args)]
pub struct PackArgs {
    /// An input directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// A target RARC archive
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Name of the root folder, defaults to the name of the input directory
    #[arg(long)]
    root: Option<String>,

    /// Compression applied to the finished archive
    #[arg(long, value_enum, default_value_t = Compression::None)]
    compression: Compression,

    /// Yaz0 compression level from 1 to 9
    #[arg(long, default_value_t = yaz0::DEFAULT_LEVEL, value_parser = clap::value_parser!(u8).range(1..=9))]
    level: u8,

    /// Pad the output to a multiple of 32 bytes
    #[arg(long, default_value_t = false)]
    pad: bool,

    /// Write a little endian archive
    #[arg(long, default_value_t = false)]
    little_endian: bool,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl PackArgs {
    fn root_name(&self) -> Result<String> {
        if let Some(root) = &self.root {
            return Ok(root.clone());
        }

        self.directory
            .canonicalize()
            .into_diagnostic()?
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_owned)
            .ok_or(miette!(
                "unable to name the root after {}, pass --root",
                self.directory.display()
            ))
    }

    fn build(&self) -> Result<Archive> {
        let mut archive = Archive::new(self.root_name()?)?;
        if self.little_endian {
            archive.set_byte_order(ByteOrder::Little);
        }

        let mut folders: HashMap<PathBuf, FolderId> = HashMap::new();
        folders.insert(PathBuf::new(), archive.root());

        for entry in WalkDir::new(&self.directory).min_depth(1).sort_by_file_name() {
            let entry = entry.into_diagnostic()?;
            let relative = entry
                .path()
                .strip_prefix(&self.directory)
                .into_diagnostic()?;
            let parent = relative.parent().unwrap_or(Path::new(""));
            let parent = *folders
                .get(parent)
                .ok_or(miette!("{} was skipped", parent.display()))?;
            let name = entry
                .file_name()
                .to_str()
                .ok_or(miette!("unable to convert {} to a string", relative.display()))?;

            if entry.file_type().is_dir() {
                let id = archive.add_folder(parent, name)?;
                folders.insert(relative.to_path_buf(), id);
            } else {
                info!("packing {}", relative.display());
                let file = File::new(name, read_input(entry.path())?)?;
                archive
                    .add_file(parent, file)
                    .context(format!("adding {}", relative.display()))?;
            }
        }

        Ok(archive)
    }

    pub fn handle(&self) -> Result<()> {
        info!("creating {}", &self.file.display());

        let archive = self.build()?;
        let options = SaveOptions::builder()
            .compression(self.compression.into())
            .level(self.level)
            .pad(self.pad)
            .build();
        let bytes = archive.save(options).context("serializing archive")?;

        create_output(&self.file, self.overwrite)?
            .write_all(&bytes)
            .into_diagnostic()?;
        Ok(())
    }
}
