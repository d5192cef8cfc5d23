//! Writing RARC archives
//!
//! Saving happens in two passes. [`Layout::plan`] walks the tree once and decides where every
//! section, name and file ends up, then the writer fills a buffer of exactly that size. The
//! writer checks each section against the plan, so the two can never silently disagree.

use binrw::{BinWrite, Endian};
use bon::Builder;
use bstr::{BStr, ByteSlice};
use byteorder::{BigEndian, ByteOrder as _};
use indexmap::IndexMap;
use jsys_compression::{yaz0, Format};
use std::{
    fs,
    io::{Cursor, Seek, SeekFrom, Write},
    path::Path,
};
use tracing::{debug, instrument};

use crate::{
    error::{Error, Result},
    hash::name_hash,
    tree::{Archive, CURRENT_DIRECTORY, PARENT_DIRECTORY},
    types::{
        align, DirectoryRecord, EntryRecord, FsHeader, RarcHeader, ATTR_DIRECTORY, ATTR_FILE,
        ATTR_PRELOAD_MRAM, DIRECTORY_RECORD_SIZE, ENTRY_RECORD_SIZE, FS_HEADER_SIZE, HEADER_SIZE,
        NO_DIRECTORY, NO_FILE_ID, ROOT_ID,
    },
};

/// Options for how the archive should be written
#[derive(Debug, Clone, Copy, Builder)]
pub struct SaveOptions {
    /// Compression applied to the whole serialized archive
    #[builder(default)]
    pub compression: Format,

    /// Yaz0 compression level, see [`yaz0::window_for_level`]
    #[builder(default = yaz0::DEFAULT_LEVEL)]
    pub level: u8,

    /// Pad the output to a multiple of 32 bytes
    #[builder(default)]
    pub pad: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        SaveOptions::builder().build()
    }
}

/// A contiguous region of the serialized archive
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Section {
    /// Absolute offset from the start of the archive
    pub offset: u64,

    /// Size including the padding to the next section
    pub size: u64,
}

impl Section {
    fn after(previous: Section, size: u64) -> Section {
        Section {
            offset: previous.end(),
            size,
        }
    }

    pub const fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// Names in first-seen order with their offsets, "." and ".." always come first.
#[derive(Debug, Clone)]
struct StringTable {
    offsets: IndexMap<Vec<u8>, u64>,
    size: u64,
}

impl StringTable {
    fn new() -> StringTable {
        let mut table = StringTable {
            offsets: IndexMap::new(),
            size: 0,
        };
        table.intern(CURRENT_DIRECTORY.as_bytes());
        table.intern(PARENT_DIRECTORY.as_bytes());
        table
    }

    fn intern(&mut self, name: &[u8]) {
        if !self.offsets.contains_key(name) {
            self.offsets.insert(name.to_vec(), self.size);
            self.size += name.len() as u64 + 1;
        }
    }
}

/// Where everything of an archive goes when it is serialized
#[derive(Debug, Clone)]
pub struct Layout {
    /// Directory records
    pub directories: Section,

    /// Entry records, including the navigation entries of every folder
    pub entries: Section,

    /// NUL terminated names
    pub strings: Section,

    /// File data, every file padded to 32 bytes
    pub data: Section,

    /// Total number of entry records
    pub entry_count: u64,

    strings_table: StringTable,
    first_entries: Vec<u64>,
    data_offsets: Vec<Vec<u64>>,
}

impl Layout {
    /// Decide the position of every section, name and file of `archive`.
    #[instrument(skip_all, err)]
    pub fn plan(archive: &Archive) -> Result<Layout> {
        let mut strings = StringTable::new();
        let mut first_entries = Vec::with_capacity(archive.folder_count());
        let mut data_offsets = Vec::with_capacity(archive.folder_count());
        let mut entry_count = 0u64;
        let mut data_size = 0u64;

        for (_, folder) in archive.folders() {
            strings.intern(folder.name());
            first_entries.push(entry_count);
            entry_count += folder.entry_count() as u64 + 2;

            let mut offsets = Vec::with_capacity(folder.files().len());
            for file in folder.files() {
                strings.intern(file.name());
                offsets.push(data_size);
                data_size += align(file.size() as u64);
            }
            data_offsets.push(offsets);
        }

        let header = Section {
            offset: 0,
            size: (HEADER_SIZE + FS_HEADER_SIZE) as u64,
        };
        let directories = Section::after(
            header,
            align(archive.folder_count() as u64 * DIRECTORY_RECORD_SIZE as u64),
        );
        let entries = Section::after(directories, align(entry_count * ENTRY_RECORD_SIZE as u64));
        let strings_section = Section::after(entries, align(strings.size));
        let data = Section::after(strings_section, data_size);

        let layout = Layout {
            directories,
            entries,
            strings: strings_section,
            data,
            entry_count,
            strings_table: strings,
            first_entries,
            data_offsets,
        };

        // everything that ends up in a u32 field is bounded by the total size
        check_u32("archive size", layout.total_size())?;
        check_u16("entry count", entry_count)?;
        debug!(
            directories = ?layout.directories,
            entries = ?layout.entries,
            strings = ?layout.strings,
            data = ?layout.data,
            "planned layout"
        );
        Ok(layout)
    }

    /// Size of the serialized archive before compression
    pub const fn total_size(&self) -> u64 {
        self.data.end()
    }

    /// Names in the order they are written
    pub fn names(&self) -> impl Iterator<Item = &BStr> {
        self.strings_table.offsets.keys().map(|name| name.as_bstr())
    }

    /// Offset of `name` inside the string table
    pub fn name_offset(&self, name: impl AsRef<[u8]>) -> Option<u64> {
        self.strings_table.offsets.get(name.as_ref()).copied()
    }

    fn planned_name_offset(&self, name: &[u8]) -> Result<u64> {
        self.name_offset(name).ok_or_else(|| {
            Error::CustomError(format!("{:?} missing from the string table", name.as_bstr()))
        })
    }
}

fn check_u32(field: &'static str, value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::LayoutOverflow { field, value })
}

fn check_u16(field: &'static str, value: u64) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::LayoutOverflow { field, value })
}

/// Fail with [`Error::SizeMismatch`] unless the writer stopped where the plan said it would.
fn expect_position<W: Seek>(writer: &mut W, section: &'static str, expected: u64) -> Result<()> {
    let actual = writer.stream_position()?;
    if actual != expected {
        return Err(Error::SizeMismatch {
            section,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Directory id written for folder `index`: "ROOT" for the root, otherwise the first four
/// characters of the name uppercased and padded with spaces.
fn directory_id(index: usize, name: &[u8]) -> u32 {
    if index == 0 {
        return ROOT_ID;
    }

    let mut id = [b' '; 4];
    for (slot, byte) in id.iter_mut().zip(name) {
        *slot = byte.to_ascii_uppercase();
    }
    BigEndian::read_u32(&id)
}

impl Archive {
    /// Plan the serialized layout of the archive without writing it.
    pub fn layout(&self) -> Result<Layout> {
        Layout::plan(self)
    }

    /// Serialize the archive, compressing it as requested.
    #[instrument(skip(self), err)]
    pub fn save(&self, options: SaveOptions) -> Result<Vec<u8>> {
        let layout = self.layout()?;
        let serialized = self.serialize(&layout)?;

        let mut out = jsys_compression::compress(&serialized, options.compression, options.level)?
            .into_owned();
        if options.pad {
            out.resize(align(out.len() as u64) as usize, 0);
        }

        debug!(
            serialized = serialized.len(),
            output = out.len(),
            compression = %options.compression,
            "saved archive"
        );
        Ok(out)
    }

    /// Serialize the archive into `writer`.
    pub fn write<W: Write>(&self, mut writer: W, options: SaveOptions) -> Result<W> {
        writer.write_all(&self.save(options)?)?;
        Ok(writer)
    }

    /// Serialize the archive into the file at `path`, replacing it if it exists.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()), err)]
    pub fn save_to_file(&self, path: impl AsRef<Path>, options: SaveOptions) -> Result<()> {
        fs::write(path, self.save(options)?)?;
        Ok(())
    }

    fn serialize(&self, layout: &Layout) -> Result<Vec<u8>> {
        let endian = Endian::from(self.byte_order);
        let total_size = layout.total_size();
        let mut writer = Cursor::new(vec![0u8; total_size as usize]);

        let header = RarcHeader {
            total_size: check_u32("archive size", total_size)?,
            fs_size: check_u32("file system size", layout.data.offset - HEADER_SIZE as u64)?,
            data_size: check_u32("data size", layout.data.size)?,
            mram_size: check_u32("data size", layout.data.size)?,
            ..Default::default()
        };
        header.write_options(&mut writer, endian, ())?;

        let fs_start = HEADER_SIZE as u64;
        let fs = FsHeader {
            directory_count: check_u32("directory count", self.folders.len() as u64)?,
            directory_offset: check_u32("directory offset", layout.directories.offset - fs_start)?,
            entry_count: check_u32("entry count", layout.entry_count)?,
            entry_offset: check_u32("entry offset", layout.entries.offset - fs_start)?,
            string_table_size: check_u32("string table size", layout.strings.size)?,
            string_table_offset: check_u32("string table offset", layout.strings.offset - fs_start)?,
            entry_count_short: check_u16("entry count", layout.entry_count)?,
            ..Default::default()
        };
        fs.write_options(&mut writer, endian, ())?;
        expect_position(&mut writer, "header", layout.directories.offset)?;

        for (index, folder) in self.folders.iter().enumerate() {
            DirectoryRecord {
                id: directory_id(index, &folder.name),
                name_offset: check_u32("name offset", layout.planned_name_offset(&folder.name)?)?,
                name_hash: name_hash(&folder.name),
                entry_count: check_u16("folder entry count", folder.entry_count() as u64 + 2)?,
                first_entry: check_u32("first entry", layout.first_entries[index])?,
            }
            .write_options(&mut writer, endian, ())?;
        }
        expect_position(
            &mut writer,
            "directory table",
            layout.directories.offset + self.folders.len() as u64 * DIRECTORY_RECORD_SIZE as u64,
        )?;

        writer.seek(SeekFrom::Start(layout.entries.offset))?;
        let mut entry_index = 0u64;
        for (index, folder) in self.folders.iter().enumerate() {
            let mut records = Vec::with_capacity(folder.entry_count() + 2);

            for (file, data_offset) in folder.files.iter().zip(&layout.data_offsets[index]) {
                records.push(EntryRecord {
                    id: check_u16("file id", entry_index + records.len() as u64)?,
                    name_hash: name_hash(&file.name),
                    attributes: ATTR_FILE | ATTR_PRELOAD_MRAM,
                    name_offset: check_u16("name offset", layout.planned_name_offset(&file.name)?)?,
                    data: check_u32("data offset", *data_offset)?,
                    size: check_u32("file size", file.size() as u64)?,
                    ..Default::default()
                });
            }

            for child in &folder.folders {
                let name = &self.folders[child.0].name;
                records.push(directory_link(name, child.0 as u32, layout)?);
            }

            records.push(directory_link(CURRENT_DIRECTORY.as_bytes(), index as u32, layout)?);
            let parent = folder.parent.map_or(NO_DIRECTORY, |parent| parent.0 as u32);
            records.push(directory_link(PARENT_DIRECTORY.as_bytes(), parent, layout)?);

            entry_index += records.len() as u64;
            for record in records {
                record.write_options(&mut writer, endian, ())?;
            }
        }
        expect_position(
            &mut writer,
            "entry table",
            layout.entries.offset + layout.entry_count * ENTRY_RECORD_SIZE as u64,
        )?;

        writer.seek(SeekFrom::Start(layout.strings.offset))?;
        for name in layout.names() {
            writer.write_all(name)?;
            writer.write_all(&[0])?;
        }
        expect_position(
            &mut writer,
            "string table",
            layout.strings.offset + layout.strings_table.size,
        )?;

        for (index, folder) in self.folders.iter().enumerate() {
            for (file, data_offset) in folder.files.iter().zip(&layout.data_offsets[index]) {
                let start = layout.data.offset + data_offset;
                writer.seek(SeekFrom::Start(start))?;
                writer.write_all(file.data())?;
                expect_position(&mut writer, "file data", start + file.size() as u64)?;
            }
        }

        let buffer = writer.into_inner();
        if buffer.len() as u64 != total_size {
            return Err(Error::SizeMismatch {
                section: "archive",
                expected: total_size,
                actual: buffer.len() as u64,
            });
        }
        Ok(buffer)
    }
}

fn directory_link(name: &[u8], target: u32, layout: &Layout) -> Result<EntryRecord> {
    Ok(EntryRecord {
        id: NO_FILE_ID,
        name_hash: name_hash(name),
        attributes: ATTR_DIRECTORY,
        name_offset: check_u16("name offset", layout.planned_name_offset(name)?)?,
        data: target,
        size: DIRECTORY_RECORD_SIZE,
        ..Default::default()
    })
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use crate::error::Result;
    use crate::read::test::SMALL_ARCHIVE;
    use crate::tree::{Archive, File};
    use crate::types::ByteOrder;
    use crate::write::{directory_id, Layout, Section, SaveOptions};
    use jsys_compression::{yaz0, Format};

    fn small() -> Result<Archive> {
        let mut archive = Archive::new("root")?;
        let root = archive.root();
        archive.add_file(root, File::new("a.txt", b"AB".to_vec())?)?;
        archive.add_folder(root, "sub")?;
        Ok(archive)
    }

    #[test]
    fn default_options() {
        let options = SaveOptions::default();
        assert_eq!(options.compression, Format::None);
        assert_eq!(options.level, yaz0::DEFAULT_LEVEL);
        assert!(!options.pad);
    }

    #[test]
    fn directory_ids() {
        assert_eq!(directory_id(0, b"anything"), 0x524F_4F54);
        assert_eq!(directory_id(1, b"sub"), u32::from_be_bytes(*b"SUB "));
        assert_eq!(directory_id(2, b"models"), u32::from_be_bytes(*b"MODE"));
        assert_eq!(directory_id(3, b"\x83\x41"), u32::from_be_bytes(*b"\x83\x41  "));
    }

    #[test]
    fn plan_small_archive() -> Result<()> {
        let layout = Layout::plan(&small()?)?;

        assert_eq!(layout.directories, Section { offset: 0x40, size: 0x20 });
        assert_eq!(layout.entries, Section { offset: 0x60, size: 0x80 });
        assert_eq!(layout.strings, Section { offset: 0xE0, size: 0x20 });
        assert_eq!(layout.data, Section { offset: 0x100, size: 0x20 });
        assert_eq!(layout.total_size(), 0x120);
        assert_eq!(layout.entry_count, 6);
        assert_eq!(
            layout.names().collect::<Vec<_>>(),
            vec![".", "..", "root", "a.txt", "sub"]
        );
        assert_eq!(layout.name_offset("a.txt"), Some(10));

        Ok(())
    }

    #[traced_test]
    #[test]
    fn write_small_archive() -> Result<()> {
        let actual = small()?.save(SaveOptions::default())?;
        assert_eq!(actual, SMALL_ARCHIVE.to_vec());
        Ok(())
    }

    #[test]
    fn names_are_shared() -> Result<()> {
        let mut archive = Archive::new("root")?;
        let root = archive.root();
        let a = archive.add_folder(root, "a")?;
        let b = archive.add_folder(root, "b")?;
        archive.add_file(a, File::new("same.bin", vec![1])?)?;
        archive.add_file(b, File::new("same.bin", vec![2])?)?;
        archive.add_folder(b, "a")?;

        let layout = archive.layout()?;
        assert_eq!(
            layout.names().collect::<Vec<_>>(),
            vec![".", "..", "root", "a", "same.bin", "b"]
        );

        Ok(())
    }

    #[test]
    fn little_endian_header() -> Result<()> {
        let mut archive = small()?;
        archive.set_byte_order(ByteOrder::Little);
        let actual = archive.save(SaveOptions::default())?;

        assert_eq!(&actual[0x00..0x08], b"CRAR\x20\x01\x00\x00");
        // directory ids are swapped along with everything else
        assert_eq!(&actual[0x40..0x44], b"TOOR");
        assert_eq!(&actual[0x50..0x54], b" BUS");
        assert_eq!(actual.len(), SMALL_ARCHIVE.len());

        Ok(())
    }

    #[test]
    fn padded_compressed_output() -> Result<()> {
        let archive = small()?;
        for compression in [Format::Yaz0, Format::Yay0] {
            let options = SaveOptions::builder()
                .compression(compression)
                .pad(true)
                .build();
            let actual = archive.save(options)?;

            assert_eq!(Format::detect(&actual), compression);
            assert_eq!(actual.len() % 32, 0);
            assert_eq!(Archive::load(&actual)?, archive);
        }

        Ok(())
    }

    #[test]
    fn file_data_is_aligned() -> Result<()> {
        let mut archive = Archive::new("root")?;
        let root = archive.root();
        archive.add_file(root, File::new("one", vec![1u8; 33])?)?;
        archive.add_file(root, File::new("two", vec![2u8; 1])?)?;
        archive.add_file(root, File::new("empty", vec![])?)?;

        let layout = archive.layout()?;
        assert_eq!(layout.data.size, 0x60);

        let bytes = archive.save(SaveOptions::default())?;
        let data = &bytes[layout.data.offset as usize..];
        assert_eq!(&data[..33], &[1u8; 33]);
        assert_eq!(data[0x40], 2);
        assert_eq!(Archive::load(&bytes)?, archive);

        Ok(())
    }
}
