//! In-memory tree of folders and files.
//!
//! Folders live in a flat arena owned by the [`Archive`] and refer to each other through
//! [`FolderId`]s. The arena order is the order folders are serialized in, the root is always
//! index 0.

use bstr::{BStr, BString, ByteSlice};
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::types::ByteOrder;

/// Name of the navigation entry pointing at the folder itself
pub const CURRENT_DIRECTORY: &str = ".";

/// Name of the navigation entry pointing at the parent folder
pub const PARENT_DIRECTORY: &str = "..";

/// Check that `name` can be stored as a file or folder name.
///
/// Names are byte strings, they do not have to be valid UTF-8.
pub fn validate_name(name: &[u8]) -> Result<()> {
    if name == CURRENT_DIRECTORY.as_bytes() || name == PARENT_DIRECTORY.as_bytes() {
        return Err(Error::ReservedName(name.to_str_lossy().into_owned()));
    }
    if name.is_empty() || name.contains(&b'/') || name.contains(&0) {
        return Err(Error::InvalidName(name.to_str_lossy().into_owned()));
    }
    Ok(())
}

/// Index of a folder inside its [`Archive`]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FolderId(pub(crate) usize);

impl FolderId {
    /// Position of the folder in the archive's flat folder list
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Contents of a [`File`]
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// Raw bytes
    Plain(Vec<u8>),

    /// Raw bytes that were parsed as an archive of their own
    ///
    /// The bytes are kept as they were when the archive was mounted, edits to the mounted archive
    /// are not written back.
    Mounted(Vec<u8>, Box<Archive>),
}

impl Entry {
    /// The bytes of the file
    pub fn data(&self) -> &[u8] {
        match self {
            Entry::Plain(data) | Entry::Mounted(data, _) => data,
        }
    }
}

/// A named blob of bytes inside a [`Folder`]
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub(crate) name: BString,
    pub(crate) entry: Entry,
}

impl File {
    /// Create a file, failing if `name` is not a valid entry name.
    pub fn new(name: impl Into<BString>, data: impl Into<Vec<u8>>) -> Result<File> {
        let name = name.into();
        validate_name(&name)?;
        Ok(File::new_unchecked(name, data.into()))
    }

    /// Names read from an archive are taken as they are.
    pub(crate) fn new_unchecked(name: BString, data: Vec<u8>) -> File {
        File {
            name,
            entry: Entry::Plain(data),
        }
    }

    pub fn name(&self) -> &BStr {
        self.name.as_bstr()
    }

    pub fn data(&self) -> &[u8] {
        self.entry.data()
    }

    pub fn size(&self) -> usize {
        self.data().len()
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Replace the contents of the file, a mounted archive is dropped.
    pub fn set_data(&mut self, data: impl Into<Vec<u8>>) {
        self.entry = Entry::Plain(data.into());
    }

    /// Take the bytes out of the file
    pub fn into_data(self) -> Vec<u8> {
        match self.entry {
            Entry::Plain(data) | Entry::Mounted(data, _) => data,
        }
    }
}

/// A named node of the archive tree
#[derive(Debug, Clone, PartialEq)]
pub struct Folder {
    pub(crate) name: BString,
    pub(crate) parent: Option<FolderId>,
    pub(crate) folders: Vec<FolderId>,
    pub(crate) files: Vec<File>,
}

impl Folder {
    fn new(name: BString, parent: Option<FolderId>) -> Folder {
        Folder {
            name,
            parent,
            folders: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn name(&self) -> &BStr {
        self.name.as_bstr()
    }

    /// The folder this one is attached to, `None` for the root
    pub fn parent(&self) -> Option<FolderId> {
        self.parent
    }

    /// Sub-folders in insertion order
    pub fn folders(&self) -> &[FolderId] {
        &self.folders
    }

    /// Files in insertion order
    pub fn files(&self) -> &[File] {
        &self.files
    }

    pub fn file(&self, name: impl AsRef<[u8]>) -> Option<&File> {
        let name = name.as_ref();
        self.files.iter().find(|file| file.name.as_slice() == name)
    }

    pub fn file_mut(&mut self, name: impl AsRef<[u8]>) -> Option<&mut File> {
        let name = name.as_ref();
        self.files.iter_mut().find(|file| file.name.as_slice() == name)
    }

    /// Number of entries this folder owns, the "." and ".." navigation entries are not counted.
    pub fn entry_count(&self) -> usize {
        self.files.len() + self.folders.len()
    }
}

/// Folder handed to [`Archive::attach`]
#[derive(Debug, Copy, Clone)]
pub enum FolderSource<'a> {
    /// A folder of the archive being attached to, it is moved
    Owned(FolderId),

    /// A folder of another archive, it is copied with everything below it
    Foreign(&'a Archive, FolderId),
}

/// A RARC archive held in memory
///
/// ```
/// # fn doit() -> jsys_rarc::error::Result<()>
/// # {
/// use jsys_rarc::{Archive, File};
///
/// let mut archive = Archive::new("root")?;
/// let models = archive.add_folder(archive.root(), "models")?;
/// archive.add_file(models, File::new("link.bmd", vec![0u8; 16])?)?;
///
/// assert_eq!(archive.get_file("models/link.bmd").map(|f| f.size()), Some(16));
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Archive {
    pub(crate) folders: Vec<Folder>,
    pub(crate) byte_order: ByteOrder,
}

impl Archive {
    /// Create an empty big endian archive whose root is called `root_name`.
    pub fn new(root_name: impl Into<BString>) -> Result<Archive> {
        let root_name = root_name.into();
        validate_name(&root_name)?;
        Ok(Archive {
            folders: vec![Folder::new(root_name, None)],
            byte_order: ByteOrder::default(),
        })
    }

    /// Archives read from a buffer are assembled folder by folder.
    pub(crate) fn with_folder_names(names: Vec<BString>, byte_order: ByteOrder) -> Archive {
        Archive {
            folders: names
                .into_iter()
                .map(|name| Folder::new(name, None))
                .collect(),
            byte_order,
        }
    }

    pub const fn root(&self) -> FolderId {
        FolderId(0)
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn set_byte_order(&mut self, byte_order: ByteOrder) {
        self.byte_order = byte_order;
    }

    /// Number of folders, including the root
    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    pub fn folder(&self, id: FolderId) -> Option<&Folder> {
        self.folders.get(id.0)
    }

    pub fn folder_mut(&mut self, id: FolderId) -> Option<&mut Folder> {
        self.folders.get_mut(id.0)
    }

    /// All folders in the order they are serialized
    pub fn folders(&self) -> impl Iterator<Item = (FolderId, &Folder)> {
        self.folders
            .iter()
            .enumerate()
            .map(|(index, folder)| (FolderId(index), folder))
    }

    fn get(&self, id: FolderId) -> Result<&Folder> {
        self.folders
            .get(id.0)
            .ok_or_else(|| Error::FolderNotFound(format!("#{}", id.0)))
    }

    fn get_mut(&mut self, id: FolderId) -> Result<&mut Folder> {
        self.folders
            .get_mut(id.0)
            .ok_or_else(|| Error::FolderNotFound(format!("#{}", id.0)))
    }

    /// Names of files and folders directly inside `id` must be unique.
    fn ensure_free(&self, id: FolderId, name: &[u8]) -> Result<()> {
        let folder = self.get(id)?;
        let taken = folder.files.iter().any(|file| file.name.as_slice() == name)
            || folder
                .folders
                .iter()
                .any(|child| self.folders[child.0].name.as_slice() == name);

        if taken {
            return Err(Error::DuplicateName(name.to_str_lossy().into_owned()));
        }
        Ok(())
    }

    /// Create an empty folder below `parent`.
    pub fn add_folder(&mut self, parent: FolderId, name: impl Into<BString>) -> Result<FolderId> {
        let name = name.into();
        validate_name(&name)?;
        self.ensure_free(parent, &name)?;

        let id = FolderId(self.folders.len());
        self.folders.push(Folder::new(name, Some(parent)));
        self.folders[parent.0].folders.push(id);
        Ok(id)
    }

    /// Add a file to `folder`, the name must not be taken by a file or folder already in it.
    pub fn add_file(&mut self, folder: FolderId, file: File) -> Result<&mut File> {
        self.ensure_free(folder, &file.name)?;

        let files = &mut self.folders[folder.0].files;
        let index = files.len();
        files.push(file);
        Ok(&mut files[index])
    }

    /// Detach the file called `name` from `folder` and hand it back.
    pub fn remove_file(&mut self, folder: FolderId, name: impl AsRef<[u8]>) -> Result<File> {
        let name = name.as_ref();
        let files = &mut self.get_mut(folder)?.files;
        let index = files
            .iter()
            .position(|file| file.name.as_slice() == name)
            .ok_or_else(|| Error::FileNotFound(name.to_str_lossy().into_owned()))?;
        Ok(files.remove(index))
    }

    pub fn rename_file(
        &mut self,
        folder: FolderId,
        from: impl AsRef<[u8]>,
        to: impl Into<BString>,
    ) -> Result<()> {
        let from = from.as_ref();
        let to = to.into();
        validate_name(&to)?;
        if from != to.as_slice() {
            self.ensure_free(folder, &to)?;
        }

        let file = self
            .get_mut(folder)?
            .file_mut(from)
            .ok_or_else(|| Error::FileNotFound(from.to_str_lossy().into_owned()))?;
        file.name = to;
        Ok(())
    }

    pub fn rename_folder(&mut self, id: FolderId, name: impl Into<BString>) -> Result<()> {
        let name = name.into();
        validate_name(&name)?;

        let current = self.get(id)?;
        if let Some(parent) = current.parent {
            if current.name != name {
                self.ensure_free(parent, &name)?;
            }
        }

        self.folders[id.0].name = name;
        Ok(())
    }

    /// Attach a folder below `parent`.
    ///
    /// A folder of this archive is moved: it is detached from its current parent first, and
    /// attaching it below itself or one of its descendants fails with [`Error::CyclicAttach`].
    /// A folder of another archive is deep copied, the source is left untouched.
    ///
    /// Returns the id of the attached folder in this archive.
    #[instrument(skip(self, source), err)]
    pub fn attach(&mut self, parent: FolderId, source: FolderSource<'_>) -> Result<FolderId> {
        self.get(parent)?;

        match source {
            FolderSource::Owned(child) => {
                let name = self.get(child)?.name.clone();
                let mut ancestor = Some(parent);
                while let Some(id) = ancestor {
                    if id == child {
                        return Err(Error::CyclicAttach);
                    }
                    ancestor = self.folders[id.0].parent;
                }

                if self.folders[child.0].parent == Some(parent) {
                    return Ok(child);
                }
                self.ensure_free(parent, &name)?;

                if let Some(old) = self.folders[child.0].parent {
                    self.folders[old.0].folders.retain(|id| *id != child);
                }
                self.folders[child.0].parent = Some(parent);
                self.folders[parent.0].folders.push(child);
                debug!(folder = %name, "moved folder");
                Ok(child)
            }
            FolderSource::Foreign(archive, folder) => {
                let name = &archive.get(folder)?.name;
                self.ensure_free(parent, name)?;

                let id = self.copy_from(parent, archive, folder);
                debug!(folder = %name, copied = self.folders.len() - id.0, "copied folder");
                Ok(id)
            }
        }
    }

    fn copy_from(&mut self, parent: FolderId, archive: &Archive, folder: FolderId) -> FolderId {
        let source = &archive.folders[folder.0];
        let id = FolderId(self.folders.len());

        let mut copy = Folder::new(source.name.clone(), Some(parent));
        copy.files = source.files.clone();
        self.folders.push(copy);
        self.folders[parent.0].folders.push(id);

        for child in &source.folders {
            self.copy_from(id, archive, *child);
        }
        id
    }

    /// Insert a new root called `name` above the current one.
    ///
    /// Every existing folder moves one position down the flat list. Returns the new id of the
    /// former root.
    pub fn reroot(&mut self, name: impl Into<BString>) -> Result<FolderId> {
        let name = name.into();
        validate_name(&name)?;

        let shift = |id: FolderId| FolderId(id.0 + 1);
        for folder in &mut self.folders {
            folder.parent = Some(folder.parent.map_or(FolderId(0), shift));
            folder.folders.iter_mut().for_each(|id| *id = shift(*id));
        }

        let mut root = Folder::new(name, None);
        root.folders.push(FolderId(1));
        self.folders.insert(0, root);
        Ok(FolderId(1))
    }

    /// Slash separated path of a folder, the root's name is left out.
    pub fn path_of(&self, id: FolderId) -> Option<BString> {
        let mut parts = Vec::new();
        let mut current = self.folder(id)?;
        while let Some(parent) = current.parent {
            parts.push(current.name.as_slice());
            current = self.folder(parent)?;
        }
        parts.reverse();
        Some(BString::from(parts.join(&b'/')))
    }

    /// Every file of the archive with its path, depth first from the root.
    pub fn walk_files(&self) -> Vec<(BString, &File)> {
        let mut out = Vec::new();
        self.walk_folder(self.root(), BString::default(), &mut out);
        out
    }

    fn walk_folder<'a>(
        &'a self,
        id: FolderId,
        prefix: BString,
        out: &mut Vec<(BString, &'a File)>,
    ) {
        let folder = &self.folders[id.0];
        for file in &folder.files {
            let mut path = prefix.clone();
            path.extend_from_slice(&file.name);
            out.push((path, file));
        }
        for child in &folder.folders {
            let mut path = prefix.clone();
            path.extend_from_slice(&self.folders[child.0].name);
            path.push(b'/');
            self.walk_folder(*child, path, out);
        }
    }
}
