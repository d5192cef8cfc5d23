//! Reading RARC archives
//!

use binrw::{BinRead, Endian};
use bstr::BString;
use std::{
    io::{Cursor, Read},
    path::Path,
};
use tracing::{debug, instrument, trace};

use crate::{
    error::{Error, Result},
    tree::{Archive, File, FolderId, CURRENT_DIRECTORY, PARENT_DIRECTORY},
    types::{
        ByteOrder, DirectoryRecord, EntryRecord, FsHeader, RarcHeader, DIRECTORY_RECORD_SIZE,
        ENTRY_RECORD_SIZE, FS_HEADER_SIZE, HEADER_SIZE, NO_DIRECTORY,
    },
};

/// Borrow `length` bytes at `offset`, failing with [`Error::Truncated`] instead of panicking.
fn slice<'a>(data: &'a [u8], section: &'static str, offset: u64, length: u64) -> Result<&'a [u8]> {
    let truncated = || Error::Truncated {
        section,
        offset,
        length,
        available: data.len() as u64,
    };

    let end = offset.checked_add(length).ok_or_else(truncated)?;
    if end > data.len() as u64 {
        return Err(truncated());
    }
    Ok(&data[offset as usize..end as usize])
}

/// Read a NUL terminated name, a name without terminator runs to the end of the table.
///
/// The bytes are kept as stored, names are usually Shift-JIS rather than UTF-8.
fn read_name(strings: &[u8], offset: u64) -> Result<BString> {
    let tail = strings.get(offset as usize..).ok_or(Error::Truncated {
        section: "string table",
        offset,
        length: 1,
        available: strings.len() as u64,
    })?;

    let end = tail.iter().position(|b| *b == 0).unwrap_or(tail.len());
    Ok(BString::from(&tail[..end]))
}

fn read_table<T>(table: &[u8], count: u32, endian: Endian) -> Result<Vec<T>>
where
    T: for<'a> BinRead<Args<'a> = ()>,
{
    let mut reader = Cursor::new(table);
    (0..count)
        .map(|_| T::read_options(&mut reader, endian, ()).map_err(Error::from))
        .collect()
}

impl Archive {
    /// Parse an archive held in memory.
    ///
    /// Yaz0 and Yay0 compressed archives are decompressed first. The byte order is taken from
    /// the signature and kept for [`Archive::save`].
    #[instrument(skip_all, fields(size = data.len()), err)]
    pub fn load(data: &[u8]) -> Result<Archive> {
        let data = jsys_compression::decompress(data)?;
        parse(&data)
    }

    /// Read a whole archive from `reader`.
    pub fn read<R: Read>(mut reader: R) -> Result<Archive> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Archive::load(&data)
    }

    /// Read the archive stored at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
    pub fn open(path: impl AsRef<Path>) -> Result<Archive> {
        let data = std::fs::read(path)?;
        Archive::load(&data)
    }
}

fn parse(data: &[u8]) -> Result<Archive> {
    let magic = slice(data, "header", 0, 4)?;
    let byte_order = ByteOrder::detect([magic[0], magic[1], magic[2], magic[3]])
        .ok_or(Error::InvalidArchive)?;
    let endian = Endian::from(byte_order);

    let mut reader = Cursor::new(slice(data, "header", 0, HEADER_SIZE as u64)?);
    let header = RarcHeader::read_options(&mut reader, endian, ())?;

    let fs_start = header.fs_offset as u64;
    let mut reader = Cursor::new(slice(
        data,
        "file system header",
        fs_start,
        FS_HEADER_SIZE as u64,
    )?);
    let fs = FsHeader::read_options(&mut reader, endian, ())?;
    debug!(?byte_order, ?header, ?fs, "read rarc headers");

    let directories: Vec<DirectoryRecord> = read_table(
        slice(
            data,
            "directory table",
            fs_start + fs.directory_offset as u64,
            fs.directory_count as u64 * DIRECTORY_RECORD_SIZE as u64,
        )?,
        fs.directory_count,
        endian,
    )?;
    let entries: Vec<EntryRecord> = read_table(
        slice(
            data,
            "entry table",
            fs_start + fs.entry_offset as u64,
            fs.entry_count as u64 * ENTRY_RECORD_SIZE as u64,
        )?,
        fs.entry_count,
        endian,
    )?;
    let strings = slice(
        data,
        "string table",
        fs_start + fs.string_table_offset as u64,
        fs.string_table_size as u64,
    )?;

    if directories.is_empty() {
        return Err(Error::InvalidArchive);
    }

    let names = directories
        .iter()
        .map(|record| read_name(strings, record.name_offset as u64))
        .collect::<Result<Vec<_>>>()?;
    let mut archive = Archive::with_folder_names(names, byte_order);

    let data_start = header.data_offset();
    for (index, record) in directories.iter().enumerate() {
        let first = record.first_entry as u64;
        let count = record.entry_count as u64;
        if first + count > entries.len() as u64 {
            return Err(Error::Truncated {
                section: "entry table",
                offset: first * ENTRY_RECORD_SIZE as u64,
                length: count * ENTRY_RECORD_SIZE as u64,
                available: entries.len() as u64 * ENTRY_RECORD_SIZE as u64,
            });
        }

        for entry in &entries[first as usize..(first + count) as usize] {
            let name = read_name(strings, entry.name_offset as u64)?;

            if entry.is_file() {
                let bytes = slice(
                    data,
                    "file data",
                    data_start + entry.data as u64,
                    entry.size as u64,
                )?;
                trace!(folder = index, %name, size = entry.size, "file");
                archive.folders[index]
                    .files
                    .push(File::new_unchecked(name, bytes.to_vec()));
            } else if entry.is_directory() {
                if name.as_slice() == CURRENT_DIRECTORY.as_bytes()
                    || name.as_slice() == PARENT_DIRECTORY.as_bytes()
                    || entry.data == NO_DIRECTORY
                {
                    continue;
                }

                let child = entry.data as usize;
                if child >= archive.folders.len() {
                    return Err(Error::InvalidDirectoryIndex(entry.data));
                }
                if child == 0 || archive.folders[child].parent.is_some() {
                    return Err(Error::DirectoryLinkedTwice(entry.data));
                }

                trace!(folder = index, child, %name, "directory");
                archive.folders[child].parent = Some(FolderId(index));
                archive.folders[index].folders.push(FolderId(child));
            } else {
                debug!(folder = index, %name, attributes = entry.attributes, "skipping entry");
            }
        }
    }

    check_reachable(&archive)?;
    debug!(
        folders = archive.folders.len(),
        files = archive.folders.iter().map(|f| f.files.len()).sum::<usize>(),
        "loaded archive"
    );
    Ok(archive)
}

/// Every directory has to hang below the root, cycles leave directories unreachable.
fn check_reachable(archive: &Archive) -> Result<()> {
    let mut seen = vec![false; archive.folders.len()];
    let mut pending = vec![archive.root()];

    while let Some(id) = pending.pop() {
        if std::mem::replace(&mut seen[id.0], true) {
            continue;
        }
        pending.extend(archive.folders[id.0].folders.iter().copied());
    }

    match seen.iter().position(|seen| !seen) {
        Some(index) => Err(Error::UnreachableDirectory(index)),
        None => Ok(()),
    }
}
