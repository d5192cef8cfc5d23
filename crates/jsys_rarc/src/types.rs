//! Base types for structure of RARC file.
//!
//! None of the records carry a fixed byte order, they are read and written with the
//! [`binrw::Endian`] derived from the archive's [`ByteOrder`].

use binrw::{BinRead, BinWrite, Endian};

/// "RARC" read as a big endian u32
pub const MAGIC: u32 = 0x5241_5243;

/// Size of the global header
pub const HEADER_SIZE: u32 = 0x20;

/// Size of the file system header that follows the global header
pub const FS_HEADER_SIZE: u32 = 0x20;

/// Size of a single [`DirectoryRecord`]
pub const DIRECTORY_RECORD_SIZE: u32 = 0x10;

/// Size of a single [`EntryRecord`]
pub const ENTRY_RECORD_SIZE: u32 = 0x14;

/// Every section and every file's data starts on this boundary
pub const ALIGNMENT: u32 = 0x20;

/// Identifier stored for the root directory, "ROOT"
pub const ROOT_ID: u32 = 0x524F_4F54;

/// Directory link that points nowhere, used by the root's ".." entry
pub const NO_DIRECTORY: u32 = u32::MAX;

/// Identifier stored for entries that are not files
pub const NO_FILE_ID: u16 = u16::MAX;

/// Entry is a file
pub const ATTR_FILE: u8 = 0x01;
/// Entry is a link to a directory
pub const ATTR_DIRECTORY: u8 = 0x02;
/// File data is compressed
pub const ATTR_COMPRESSED: u8 = 0x04;
/// File is preloaded to main memory
pub const ATTR_PRELOAD_MRAM: u8 = 0x10;
/// File is preloaded to auxiliary memory
pub const ATTR_PRELOAD_ARAM: u8 = 0x20;
/// File is read from disc on demand
pub const ATTR_LOAD_DVD: u8 = 0x40;
/// Compressed file data uses Yaz0 rather than Yay0
pub const ATTR_YAZ0: u8 = 0x80;

/// Round `value` up to the next multiple of [`ALIGNMENT`].
pub const fn align(value: u64) -> u64 {
    let alignment = ALIGNMENT as u64;
    value.div_ceil(alignment) * alignment
}

/// Byte order of every multi-byte field in an archive
///
/// Big endian archives start with "RARC", little endian ones with "CRAR".
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Used by GameCube and Wii titles
    #[default]
    Big,

    /// Used by a handful of later ports
    Little,
}

impl ByteOrder {
    /// Detect the byte order from the first four bytes of an archive.
    pub fn detect(magic: [u8; 4]) -> Option<ByteOrder> {
        match u32::from_be_bytes(magic) {
            MAGIC => Some(ByteOrder::Big),
            m if m == MAGIC.swap_bytes() => Some(ByteOrder::Little),
            _ => None,
        }
    }
}

impl From<ByteOrder> for Endian {
    fn from(value: ByteOrder) -> Self {
        match value {
            ByteOrder::Big => Endian::Big,
            ByteOrder::Little => Endian::Little,
        }
    }
}

/// RARC global header
///
/// Offsets in this header are relative to the start of the file.
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
pub struct RarcHeader {
    /// Always [`MAGIC`] when read in the archive's byte order
    pub magic: u32,

    /// Size of the whole archive
    pub total_size: u32,

    /// Offset of the file system header, always [`HEADER_SIZE`]
    pub fs_offset: u32,

    /// Size of everything between the file system header and the data section
    pub fs_size: u32,

    /// Size of the data section
    pub data_size: u32,

    /// Bytes of file data preloaded to main memory
    pub mram_size: u32,

    /// Bytes of file data preloaded to auxiliary memory
    pub aram_size: u32,

    #[allow(dead_code)]
    pub reserved: u32,
}

impl Default for RarcHeader {
    fn default() -> Self {
        Self {
            magic: MAGIC,
            total_size: Default::default(),
            fs_offset: HEADER_SIZE,
            fs_size: Default::default(),
            data_size: Default::default(),
            mram_size: Default::default(),
            aram_size: Default::default(),
            reserved: Default::default(),
        }
    }
}

impl RarcHeader {
    /// Absolute offset of the data section
    pub fn data_offset(&self) -> u64 {
        self.fs_offset as u64 + self.fs_size as u64
    }
}

/// File system header
///
/// Offsets in this header are relative to the start of the header itself.
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
pub struct FsHeader {
    /// Number of [`DirectoryRecord`]s
    pub directory_count: u32,

    /// Offset of the directory table
    pub directory_offset: u32,

    /// Number of [`EntryRecord`]s
    pub entry_count: u32,

    /// Offset of the entry table
    pub entry_offset: u32,

    /// Size of the string table, padded
    pub string_table_size: u32,

    /// Offset of the string table
    pub string_table_offset: u32,

    /// Number of entries again, as a u16
    pub entry_count_short: u16,

    /// Set when file ids match their entry indices
    pub synced_ids: u8,

    #[allow(dead_code)]
    pub reserved0: u8,

    #[allow(dead_code)]
    pub reserved1: u32,
}

/// RARC directory record
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
pub struct DirectoryRecord {
    /// "ROOT" for the first directory, otherwise the first four characters of the name uppercased
    pub id: u32,

    /// Offset of the name in the string table
    pub name_offset: u32,

    /// [`crate::name_hash`] of the name
    pub name_hash: u16,

    /// Number of entries including "." and ".."
    pub entry_count: u16,

    /// Index of the first entry in the entry table
    pub first_entry: u32,
}

/// RARC entry record
///
/// Files point into the data section, directory links point at a [`DirectoryRecord`].
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
pub struct EntryRecord {
    /// File index, [`NO_FILE_ID`] for directory links
    pub id: u16,

    /// [`crate::name_hash`] of the name
    pub name_hash: u16,

    /// Combination of the `ATTR_*` flags
    pub attributes: u8,

    #[allow(dead_code)]
    pub reserved0: u8,

    /// Offset of the name in the string table
    pub name_offset: u16,

    /// Offset of the data relative to the data section, or the linked directory's index
    pub data: u32,

    /// Size of the data, [`DIRECTORY_RECORD_SIZE`] for directory links
    pub size: u32,

    #[allow(dead_code)]
    pub reserved1: u32,
}

impl EntryRecord {
    /// Returns true if this entry is a file.
    pub const fn is_file(&self) -> bool {
        self.attributes & ATTR_FILE != 0
    }

    /// Returns true if this entry links to a directory.
    pub const fn is_directory(&self) -> bool {
        self.attributes & ATTR_DIRECTORY != 0
    }
}
