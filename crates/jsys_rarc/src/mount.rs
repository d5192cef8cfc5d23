//! Nested archives and path lookup.
//!
//! A file whose bytes are an archive themselves can be mounted, after which paths can descend
//! into it: `stage.arc/room/map.bmd` names `map.bmd` inside the archive stored as `stage.arc`.
//! Mounted archives are parsed copies, editing them does not change the bytes of the file.

use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::tree::{Archive, Entry, File, FolderId};

/// Position of a file found by a lookup, relative to the archive it was found in
#[derive(Debug, Copy, Clone)]
enum Step {
    /// The file is the target
    Found { folder: FolderId, file: usize },

    /// The file is a mounted archive the rest of the path continues in
    Descend { folder: FolderId, file: usize },
}

fn components(path: &[u8]) -> Vec<&[u8]> {
    path.split(|byte| *byte == b'/')
        .filter(|part| !part.is_empty())
        .collect()
}

impl File {
    /// Parse the file as an archive and keep it mounted.
    ///
    /// Compressed archives are decompressed first. Mounting an already mounted file returns the
    /// existing archive. On failure the file is left as it was.
    #[instrument(skip(self), fields(name = %self.name))]
    pub fn mount(&mut self) -> Result<&mut Archive> {
        if let Entry::Plain(data) = &mut self.entry {
            let archive =
                Archive::load(data).inspect_err(|e| debug!(error = %e, "not an archive"))?;
            let data = std::mem::take(data);
            self.entry = Entry::Mounted(data, Box::new(archive));
            debug!("mounted archive");
        }

        match &mut self.entry {
            Entry::Mounted(_, archive) => Ok(archive.as_mut()),
            Entry::Plain(_) => Err(Error::CustomError(format!("{} is not mounted", self.name))),
        }
    }

    /// Drop the mounted archive, if any.
    pub fn unmount(&mut self) {
        if let Entry::Mounted(data, _) = &mut self.entry {
            self.entry = Entry::Plain(std::mem::take(data));
        }
    }

    pub fn is_mounted(&self) -> bool {
        matches!(self.entry, Entry::Mounted(..))
    }

    pub fn mounted(&self) -> Option<&Archive> {
        match &self.entry {
            Entry::Mounted(_, archive) => Some(archive.as_ref()),
            Entry::Plain(_) => None,
        }
    }

    pub fn mounted_mut(&mut self) -> Option<&mut Archive> {
        match &mut self.entry {
            Entry::Mounted(_, archive) => Some(archive.as_mut()),
            Entry::Plain(_) => None,
        }
    }
}

impl Archive {
    /// Find a folder by its slash separated path from the root.
    ///
    /// An empty path names the root. Lookups never descend into mounted archives.
    pub fn get_folder(&self, path: impl AsRef<[u8]>) -> Option<FolderId> {
        components(path.as_ref())
            .into_iter()
            .try_fold(self.root(), |current, name| {
                self.folders[current.0]
                    .folders
                    .iter()
                    .copied()
                    .find(|child| self.folders[child.0].name.as_slice() == name)
            })
    }

    /// Find a file by its slash separated path from the root.
    ///
    /// Only archives that are already mounted are descended into.
    pub fn get_file(&self, path: impl AsRef<[u8]>) -> Option<&File> {
        let route = self.locate(self.root(), &components(path.as_ref()))?;
        self.follow(&route)
    }

    /// Find a file by its slash separated path from the root, mounting archives along the way.
    ///
    /// A file that does not parse as an archive simply does not match a path that continues
    /// past it.
    pub fn get_file_mut(&mut self, path: impl AsRef<[u8]>) -> Option<&mut File> {
        let components = components(path.as_ref());
        self.mount_along(self.root(), &components);

        let route = self.locate(self.root(), &components)?;
        self.follow_mut(&route)
    }

    fn mount_along(&mut self, folder: FolderId, components: &[&[u8]]) {
        let Some((first, rest)) = components.split_first() else {
            return;
        };
        if rest.is_empty() {
            return;
        }

        if let Some(file) = self.folders[folder.0].file_mut(first) {
            if let Ok(archive) = file.mount() {
                let root = archive.root();
                archive.mount_along(root, rest);
            }
        }

        let children: Vec<FolderId> = self.folders[folder.0]
            .folders
            .iter()
            .copied()
            .filter(|child| self.folders[child.0].name.as_slice() == *first)
            .collect();
        for child in children {
            self.mount_along(child, rest);
        }
    }

    /// Resolve a path to the steps leading to a file, files are preferred over folders.
    fn locate(&self, folder: FolderId, components: &[&[u8]]) -> Option<Vec<Step>> {
        let (first, rest) = components.split_first()?;
        let current = &self.folders[folder.0];

        if let Some(file) = current.files.iter().position(|f| f.name.as_slice() == *first) {
            if rest.is_empty() {
                return Some(vec![Step::Found { folder, file }]);
            }
            if let Some(archive) = current.files[file].mounted() {
                if let Some(mut route) = archive.locate(archive.root(), rest) {
                    route.insert(0, Step::Descend { folder, file });
                    return Some(route);
                }
            }
        }

        current
            .folders
            .iter()
            .filter(|child| self.folders[child.0].name.as_slice() == *first)
            .find_map(|child| self.locate(*child, rest))
    }

    fn follow(&self, route: &[Step]) -> Option<&File> {
        let (step, rest) = route.split_first()?;
        match *step {
            Step::Found { folder, file } => self.folders.get(folder.0)?.files.get(file),
            Step::Descend { folder, file } => self
                .folders
                .get(folder.0)?
                .files
                .get(file)?
                .mounted()?
                .follow(rest),
        }
    }

    fn follow_mut(&mut self, route: &[Step]) -> Option<&mut File> {
        let (step, rest) = route.split_first()?;
        match *step {
            Step::Found { folder, file } => self.folders.get_mut(folder.0)?.files.get_mut(file),
            Step::Descend { folder, file } => self
                .folders
                .get_mut(folder.0)?
                .files
                .get_mut(file)?
                .mounted_mut()?
                .follow_mut(rest),
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::error::Result;
    use crate::tree::{Archive, Entry, File};
    use crate::write::SaveOptions;
    use jsys_compression::Format;

    fn inner() -> Result<Archive> {
        let mut archive = Archive::new("inner")?;
        let room = archive.add_folder(archive.root(), "room")?;
        archive.add_file(room, File::new("map.bmd", b"MAP".to_vec())?)?;
        Ok(archive)
    }

    fn outer(compression: Format) -> Result<Archive> {
        let bytes = inner()?.save(SaveOptions::builder().compression(compression).build())?;

        let mut archive = Archive::new("outer")?;
        let stages = archive.add_folder(archive.root(), "stages")?;
        archive.add_file(stages, File::new("stage.arc", bytes)?)?;
        archive.add_file(stages, File::new("notes.txt", b"hello".to_vec())?)?;
        Ok(archive)
    }

    #[test]
    fn folder_lookup() -> Result<()> {
        let archive = outer(Format::None)?;

        assert_eq!(archive.get_folder(""), Some(archive.root()));
        assert_eq!(archive.get_folder("/stages").map(|id| id.index()), Some(1));
        assert_eq!(archive.get_folder("stages/"), archive.get_folder("stages"));
        assert_eq!(archive.get_folder("missing"), None);
        assert_eq!(archive.get_folder("stages/stage.arc"), None);

        Ok(())
    }

    #[test]
    fn file_lookup_without_mounting() -> Result<()> {
        let archive = outer(Format::None)?;

        assert_eq!(
            archive.get_file("/stages/notes.txt").map(|f| f.data()),
            Some(&b"hello"[..])
        );
        assert!(archive.get_file("").is_none());
        assert!(archive.get_file("stages").is_none());
        assert!(archive.get_file("stages/stage.arc/room/map.bmd").is_none());

        Ok(())
    }

    #[test]
    fn file_lookup_mounts_lazily() -> Result<()> {
        for compression in [Format::None, Format::Yaz0, Format::Yay0] {
            let mut archive = outer(compression)?;

            let map = archive.get_file_mut("stages/stage.arc/room/map.bmd");
            assert_eq!(map.map(|f| f.data().to_vec()), Some(b"MAP".to_vec()));

            let stage = archive.get_file("stages/stage.arc");
            assert!(stage.is_some_and(|f| f.is_mounted()));
            assert!(archive.get_file("stages/stage.arc/room/map.bmd").is_some());
        }

        Ok(())
    }

    #[test]
    fn non_archives_do_not_match_deeper_paths() -> Result<()> {
        let mut archive = outer(Format::None)?;

        assert!(archive.get_file_mut("stages/notes.txt/anything").is_none());
        let notes = archive.get_file("stages/notes.txt");
        assert!(notes.is_some_and(|f| !f.is_mounted()));

        Ok(())
    }

    #[test]
    fn mount_and_unmount() -> Result<()> {
        let bytes = inner()?.save(SaveOptions::default())?;
        let mut file = File::new("stage.arc", bytes.clone())?;

        let mounted = file.mount()?;
        assert_eq!(mounted.folder_count(), 2);
        mounted.add_folder(mounted.root(), "extra")?;

        // edits to the mounted archive are not written back
        assert_eq!(file.data(), bytes.as_slice());
        assert_eq!(file.mount()?.folder_count(), 3);

        file.unmount();
        assert_eq!(file.entry(), &Entry::Plain(bytes));

        Ok(())
    }

    #[test]
    fn failed_mount_leaves_file_alone() -> Result<()> {
        let mut file = File::new("notes.txt", b"hello".to_vec())?;
        assert!(file.mount().is_err());
        assert_eq!(file.entry(), &Entry::Plain(b"hello".to_vec()));
        Ok(())
    }
}
