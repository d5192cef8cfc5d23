use bstr::{BStr, ByteSlice};
use clap::Args;
use jsys_rarc::Archive;
use miette::{miette, Context, IntoDiagnostic, Result};
use std::{
    io::Write,
    path::{Component, Path, PathBuf},
};
use tracing::info;

use crate::commands::create_output;

#[derive(Args)]
pub struct ExtractArgs {
    /// An input RARC archive, optionally Yaz0 or Yay0 compressed
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

/// Join an archive path onto `base`, refusing anything that would leave it.
fn target_path(base: &Path, archive_path: &BStr) -> Result<PathBuf> {
    let mut target = base.to_path_buf();
    for part in archive_path.split_str("/").filter(|part| !part.is_empty()) {
        let part = part.to_path_lossy();
        let mut components = part.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => target.push(name),
            _ => return Err(miette!("refusing to extract unsafe path {archive_path:?}")),
        }
    }
    Ok(target)
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        let archive = Archive::open(&self.file)
            .context(format!("path: {}", &self.file.display()))?;

        for (id, _) in archive.folders() {
            let folder = archive
                .path_of(id)
                .ok_or(miette!("folder {} is detached", id.index()))?;
            let p = target_path(&self.directory, folder.as_bstr())?;
            std::fs::create_dir_all(&p)
                .into_diagnostic()
                .context(format!("creating {}", p.display()))?;
        }

        for (path, file) in archive.walk_files() {
            let p = target_path(&self.directory, path.as_bstr())?;
            info!("writing {}", p.display());

            create_output(&p, self.overwrite)?
                .write_all(file.data())
                .into_diagnostic()
                .context(format!("writing {}", p.display()))?;
        }
        Ok(())
    }
}
