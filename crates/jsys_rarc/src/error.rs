//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// Transparent warpper for [`jsys_compression::error::Error`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    Compression(#[from] jsys_compression::error::Error),

    /// file is an invalid rarc archive
    #[error("file is an invalid rarc archive")]
    InvalidArchive,

    /// a section of the archive lies outside of the buffer
    #[error("{section} truncated: {length} bytes at offset {offset:#x} exceed the {available} bytes available")]
    Truncated {
        /// Which part of the archive was being read
        section: &'static str,
        /// Start of the read
        offset: u64,
        /// Length of the read
        length: u64,
        /// Size of the buffer
        available: u64,
    },

    /// a directory link points past the directory table
    #[error("directory link to index {0} is outside the directory table")]
    InvalidDirectoryIndex(u32),

    /// a directory is linked from more than one place
    #[error("directory {0} is linked more than once")]
    DirectoryLinkedTwice(u32),

    /// a directory cannot be reached from the root
    #[error("directory {0} is not reachable from the root")]
    UnreachableDirectory(usize),

    /// serializing did not produce the layout that was planned for it
    #[error("{section} does not match its planned layout: expected end {expected:#x}, got {actual:#x}")]
    #[diagnostic(help("this is a bug in the layout planner"))]
    SizeMismatch {
        /// Section being written
        section: &'static str,
        /// Offset the plan expected the section to end at
        expected: u64,
        /// Offset the writer ended at
        actual: u64,
    },

    /// a value does not fit into the width of its on-disk field
    #[error("{field} of {value} does not fit into the archive format")]
    LayoutOverflow {
        /// Field that overflowed
        field: &'static str,
        /// Value that was too large
        value: u64,
    },

    /// the name is reserved for navigation entries
    #[error("name {0:?} is reserved")]
    ReservedName(String),

    /// the name cannot be stored in an archive
    #[error("name {0:?} is not a valid entry name")]
    #[diagnostic(help("names must be non-empty and cannot contain '/' or NUL"))]
    InvalidName(String),

    /// an entry with this name already exists in the folder
    #[error("an entry named {0:?} already exists")]
    DuplicateName(String),

    /// the folder would become its own ancestor
    #[error("attaching a folder below itself")]
    CyclicAttach,

    /// unable to find requested folder
    #[error("unable to find folder {0}")]
    FolderNotFound(String),

    /// unable to find requested file
    #[error("unable to find file {0}")]
    FileNotFound(String),

    /// {0}
    #[error("{0}")]
    CustomError(String),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
