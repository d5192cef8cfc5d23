//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// data does not start with a known compression signature
    #[error("data does not start with a Yaz0 or Yay0 signature")]
    #[diagnostic(help("uncompressed data has to be handled with `Format::None`"))]
    InvalidMagic,

    /// a read went past the end of the compressed input
    #[error("compressed input truncated: needed {needed} bytes at offset {offset:#x}, only {available} available")]
    Truncated {
        /// Offset of the attempted read
        offset: usize,
        /// Number of bytes the read needed
        needed: usize,
        /// Total size of the input
        available: usize,
    },

    /// input is larger than the 32 bit size field can describe
    #[error("input of {0} bytes is too large to compress")]
    InputTooLarge(usize),

    /// a back-reference points before the start of the output
    #[error("back-reference distance {distance} exceeds the {produced} bytes produced so far")]
    InvalidBackReference {
        /// Distance encoded in the token
        distance: usize,
        /// Bytes already written to the output
        produced: usize,
    },
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
