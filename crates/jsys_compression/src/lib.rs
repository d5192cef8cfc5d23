//! This library handles the **Yaz0** and **Yay0** compression formats used by GameCube and Wii titles.
//!
//! # Compression Format Documentation
//!
//! Both formats are LZ77 style schemes: the output is built from literal bytes and back-references
//! into the bytes already produced. They share a 16 byte header starting with a signature and the
//! big endian size of the decompressed data.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: "Yaz0" or "Yay0"                                  |
//! | 0x0004         | Decompressed size      | 4 bytes: Size of the data after decompression              |
//! | 0x0008         | Codec specific         | 8 bytes: Reserved for Yaz0, section offsets for Yay0       |
//!
//! ### Back-references
//!
//! Both codecs encode a back-reference as a 16 bit token. The high nibble holds the length minus
//! two; a zero nibble means the length is stored in an extra byte plus `0x12`. The low 12 bits hold
//! the distance minus one, so a back-reference can reach at most 4096 bytes behind the current
//! position. Lengths are limited to `0x111` bytes. A back-reference may overlap the bytes it is
//! producing.
//!
//! See [`yaz0`] and [`yay0`] for the layout of the symbol streams.
//!
//! ## Additional Information
//!
//! - **File Extension**: usually `.szs` for Yaz0 compressed archives, `.szp` for Yay0
//! - **Endianness**: Big-endian for all multi-byte integers
//!

pub mod error;
mod lz;
pub mod yay0;
pub mod yaz0;

use std::{borrow::Cow, fmt};

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

pub use lz::{MAX_DISTANCE, MAX_MATCH, MIN_MATCH};

/// Identifies how a buffer is compressed
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Format {
    /// Stores the data as it is
    #[default]
    None,

    /// Compress the data using Yaz0
    Yaz0,

    /// Compress the data using Yay0
    Yay0,
}

impl Format {
    /// Detect the format of `data` from its signature.
    pub fn detect(data: &[u8]) -> Format {
        match data.get(..4) {
            Some(magic) if magic == yaz0::MAGIC => Format::Yaz0,
            Some(magic) if magic == yay0::MAGIC => Format::Yay0,
            _ => Format::None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Format::None => "none",
            Format::Yaz0 => "Yaz0",
            Format::Yay0 => "Yay0",
        };
        write!(f, "{}", s)
    }
}

/// Read the decompressed size from the header of a Yaz0 or Yay0 stream without decoding it.
pub fn decompressed_size(data: &[u8]) -> Result<u32> {
    if Format::detect(data) == Format::None {
        return Err(Error::InvalidMagic);
    }

    let field = data.get(4..8).ok_or(Error::Truncated {
        offset: 4,
        needed: 4,
        available: data.len(),
    })?;
    Ok(BigEndian::read_u32(field))
}

/// Decompress `data` based on its signature, data without a known signature is returned as is.
pub fn decompress(data: &[u8]) -> Result<Cow<'_, [u8]>> {
    Ok(match Format::detect(data) {
        Format::None => Cow::Borrowed(data),
        Format::Yaz0 => Cow::Owned(yaz0::decompress(data)?),
        Format::Yay0 => Cow::Owned(yay0::decompress(data)?),
    })
}

/// Compress `data` with the requested format.
///
/// `level` only applies to [`Format::Yaz0`], see [`yaz0::window_for_level`].
pub fn compress(data: &[u8], format: Format, level: u8) -> Result<Cow<'_, [u8]>> {
    Ok(match format {
        Format::None => Cow::Borrowed(data),
        Format::Yaz0 => Cow::Owned(yaz0::compress(data, level)?),
        Format::Yay0 => Cow::Owned(yay0::compress(data)?),
    })
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::{compress, decompress, decompressed_size, error::Error, Format};

    #[test]
    fn detect_formats() {
        assert_eq!(Format::detect(b"Yaz0\0\0\0\x10"), Format::Yaz0);
        assert_eq!(Format::detect(b"Yay0\0\0\0\x10"), Format::Yay0);
        assert_eq!(Format::detect(b"RARC"), Format::None);
        assert_eq!(Format::detect(b"Ya"), Format::None);
    }

    #[test]
    fn read_decompressed_size() -> crate::error::Result<()> {
        assert_eq!(decompressed_size(b"Yaz0\x00\x01\x02\x03")?, 0x00010203);
        assert!(matches!(
            decompressed_size(b"Yay0\x00\x01"),
            Err(Error::Truncated { .. })
        ));
        assert!(matches!(
            decompressed_size(b"RARC\x00\x00\x00\x00"),
            Err(Error::InvalidMagic)
        ));
        Ok(())
    }

    #[test]
    fn uncompressed_passes_through() -> crate::error::Result<()> {
        let data = b"plain bytes";
        assert_eq!(compress(data, Format::None, 7)?.as_ref(), data);
        assert_eq!(decompress(data)?.as_ref(), data);
        Ok(())
    }

    #[test]
    fn dispatch_round_trip() -> crate::error::Result<()> {
        let data = b"abcabcabcabcabcabcabc".repeat(8);
        for format in [Format::Yaz0, Format::Yay0] {
            let compressed = compress(&data, format, 9)?;
            assert_eq!(Format::detect(&compressed), format);
            assert_eq!(decompress(&compressed)?.as_ref(), data.as_slice());
        }
        Ok(())
    }
}
