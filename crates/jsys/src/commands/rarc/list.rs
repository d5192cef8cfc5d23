use bstr::ByteSlice;
use clap::Args;
use itertools::Itertools;
use jsys_compression::Format;
use jsys_rarc::{Archive, FolderId};
use miette::{Context, Result};
use owo_colors::OwoColorize;
use std::{
    fmt::{self, Display},
    path::PathBuf,
};

use crate::commands::read_input;

#[derive(Args)]
pub struct ListArgs {
    /// An input RARC archive, optionally Yaz0 or Yay0 compressed
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Also list the contents of files that are archives themselves
    #[arg(long, default_value_t = false)]
    mounts: bool,
}

/// Tree view of an archive
struct Listing<'a> {
    archive: &'a Archive,
    mounts: bool,
}

impl Listing<'_> {
    fn write_folder(&self, f: &mut fmt::Formatter<'_>, id: FolderId, depth: usize) -> fmt::Result {
        let Some(folder) = self.archive.folder(id) else {
            return Ok(());
        };

        let indent = "  ".repeat(depth);
        writeln!(f, "{indent}{}/", folder.name().blue().bold())?;

        for child in folder.folders() {
            self.write_folder(f, *child, depth + 1)?;
        }

        for file in folder.files() {
            writeln!(
                f,
                "{indent}  {} {}",
                file.name(),
                format!("({} bytes)", file.size()).dimmed()
            )?;

            if self.mounts {
                let mut file = file.clone();
                if let Ok(mounted) = file.mount() {
                    let nested = Listing {
                        archive: mounted,
                        mounts: self.mounts,
                    };
                    nested.write_folder(f, mounted.root(), depth + 2)?;
                }
            }
        }
        Ok(())
    }
}

impl Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_folder(f, self.archive.root(), 0)
    }
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let data = read_input(&self.file)?;
        let archive = Archive::load(&data).context(format!("path: {}", &self.file.display()))?;

        let files = archive.walk_files();
        let extensions = files
            .iter()
            .filter_map(|(_, file)| {
                let name = file.name().to_str_lossy();
                name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
            })
            .counts()
            .into_iter()
            .sorted()
            .map(|(ext, count)| format!("{ext} x{count}"))
            .join(", ");

        println!(
            "{} ({} compression, {:?} endian, {} folders, {} files)",
            self.file.display().green(),
            Format::detect(&data),
            archive.byte_order(),
            archive.folder_count(),
            files.len()
        );
        if !extensions.is_empty() {
            println!("{extensions}");
        }
        print!(
            "{}",
            Listing {
                archive: &archive,
                mounts: self.mounts,
            }
        );
        Ok(())
    }
}
