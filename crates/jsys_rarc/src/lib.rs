//! This library handles reading from and creating **RARC** archives used by GameCube and Wii titles.
//!
//! # RARC Archive Format Documentation
//!
//! A RARC archive (usually `.arc`, or `.szs` when Yaz0 compressed) stores a tree of folders and
//! files in a single buffer. Every multi-byte field uses the archive's byte order, which is big
//! endian on console and recognized from the signature.
//!
//! ## File Structure
//!
//! The archive is made of a global header, a file system header and four sections. Every section
//! starts on a 32 byte boundary.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: 0x52415243 ("RARC")                               |
//! | 0x0004         | Total size             | 4 bytes: Size of the whole archive                         |
//! | 0x0008         | FS header offset       | 4 bytes: Always 0x20                                       |
//! | 0x000C         | FS size                | 4 bytes: Size from the FS header up to the data section    |
//! | 0x0010         | Data size              | 4 bytes: Size of the data section                          |
//! | 0x0014         | MRAM size              | 4 bytes: Bytes preloaded to main memory                    |
//! | 0x0018         | ARAM size              | 4 bytes: Bytes preloaded to auxiliary memory               |
//! | 0x001C         | Reserved               | 4 bytes: Zero                                              |
//!
//! ### File System Header
//!
//! Offsets are relative to the start of this header.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Directory count        | 4 bytes: Number of directory records                       |
//! | 0x0004         | Directory offset       | 4 bytes: Offset of the directory table                     |
//! | 0x0008         | Entry count            | 4 bytes: Number of entry records                           |
//! | 0x000C         | Entry offset           | 4 bytes: Offset of the entry table                         |
//! | 0x0010         | String table size      | 4 bytes: Size of the string table, padded                  |
//! | 0x0014         | String table offset    | 4 bytes: Offset of the string table                        |
//! | 0x0018         | Entry count            | 2 bytes: Number of entry records again                     |
//! | 0x001A         | Synced ids             | 1 byte: File ids match entry indices                       |
//! | 0x001B         | Reserved               | 5 bytes: Zero                                              |
//!
//! ### Directory Records
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Identifier             | 4 bytes: "ROOT" or the first four letters, uppercased      |
//! | 0x0004         | Name offset            | 4 bytes: Offset into the string table                      |
//! | 0x0008         | Name hash              | 2 bytes: See [`name_hash`]                                 |
//! | 0x000A         | Entry count            | 2 bytes: Entries of the directory, "." and ".." included   |
//! | 0x000C         | First entry            | 4 bytes: Index of the first entry record                   |
//!
//! The first directory record is the root. A directory's entries are contiguous: its files,
//! then links to its sub-directories, then "." and "..".
//!
//! ### Entry Records
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Identifier             | 2 bytes: File index, 0xFFFF for directory links            |
//! | 0x0002         | Name hash              | 2 bytes: See [`name_hash`]                                 |
//! | 0x0004         | Attributes             | 1 byte: 0x01 file, 0x02 directory, see [`types`]           |
//! | 0x0005         | Reserved               | 1 byte: Zero                                               |
//! | 0x0006         | Name offset            | 2 bytes: Offset into the string table                      |
//! | 0x0008         | Data                   | 4 bytes: Data offset for files, directory index for links  |
//! | 0x000C         | Size                   | 4 bytes: Data size for files, 0x10 for links               |
//! | 0x0010         | Reserved               | 4 bytes: Zero                                              |
//!
//! File data offsets are relative to the data section. The ".." link of the root holds
//! 0xFFFFFFFF.
//!
//! ### String Table
//!
//! NUL terminated names, starting with "." at offset 0 and ".." at offset 2. Every name is stored
//! once no matter how many entries use it. Names are kept as raw bytes, archives from Japanese
//! releases store them in Shift-JIS.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.arc`, `.rarc`, `.szs` when compressed
//! - **Endianness**: Big-endian ("RARC"), little-endian archives start with "CRAR"
//! - **Compression**: The whole archive may be wrapped in Yaz0 or Yay0, see [`jsys_compression`]
//!

pub mod error;
pub mod hash;
mod mount;
pub mod read;
pub mod tree;
pub mod types;
pub mod write;

pub use bstr::{BStr, BString, ByteSlice};
pub use hash::name_hash;
pub use jsys_compression::Format;
pub use tree::{Archive, Entry, File, Folder, FolderId, FolderSource};
pub use types::ByteOrder;
pub use write::{Layout, SaveOptions};
