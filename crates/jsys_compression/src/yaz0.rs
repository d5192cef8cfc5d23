//! Yaz0 compression and decompression.
//!
//! | Offset (bytes) | Field             | Description                                  |
//! |----------------|-------------------|----------------------------------------------|
//! | 0x0000         | Magic number      | 4 bytes: "Yaz0"                              |
//! | 0x0004         | Decompressed size | 4 bytes: big endian size of the output       |
//! | 0x0008         | Reserved          | 8 bytes: zero                                |
//! | 0x0010         | Data              | Interleaved control bytes and symbols        |
//!
//! Every control byte describes the next eight symbols, most significant bit first. A set bit
//! copies one literal byte, a clear bit reads a two byte back-reference `LD DD`: `L + 2` is the
//! length and `DDD + 1` the distance. When `L` is zero a third byte follows and the length is that
//! byte plus `0x12`.

use byteorder::{BigEndian, ByteOrder};
use tracing::{debug, instrument};

use crate::{
    error::{Error, Result},
    lz::{copy_back_reference, find_match, initial_capacity, Source, MAX_DISTANCE},
};

/// Signature at the start of every Yaz0 stream
pub const MAGIC: [u8; 4] = *b"Yaz0";

/// Size of the Yaz0 header
pub const HEADER_SIZE: usize = 0x10;

/// Level used when none is requested
pub const DEFAULT_LEVEL: u8 = 7;

/// Search window used for a compression level, levels are clamped to `1..=9`.
///
/// Level 9 searches the whole 4 KiB the format can address.
pub fn window_for_level(level: u8) -> usize {
    let level = level.clamp(1, 9) as usize;
    MAX_DISTANCE * level / 9
}

/// Decompress a complete Yaz0 stream, header included.
#[instrument(skip_all, fields(input = src.len()), err)]
pub fn decompress(src: &[u8]) -> Result<Vec<u8>> {
    let mut source = Source::new(src, 0);
    if source.take(MAGIC.len())? != MAGIC {
        return Err(Error::InvalidMagic);
    }

    let size = source.u32()? as usize;
    source.take(8)?;
    debug!(size, "decompressing yaz0");

    let mut out = Vec::with_capacity(initial_capacity(size, src.len()));
    let mut flags = 0u8;
    let mut remaining = 0;

    while out.len() < size {
        if remaining == 0 {
            flags = source.byte()?;
            remaining = 8;
        }

        if flags & 0x80 != 0 {
            out.push(source.byte()?);
        } else {
            let token = source.u16()?;
            let distance = (token & 0x0FFF) as usize + 1;
            let length = match token >> 12 {
                0 => source.byte()? as usize + 0x12,
                n => n as usize + 2,
            };
            copy_back_reference(&mut out, distance, length, size)?;
        }

        flags <<= 1;
        remaining -= 1;
    }

    Ok(out)
}

/// Compress `src` into a Yaz0 stream.
///
/// This is a greedy encoder, the `level` only controls how far back matches are searched.
#[instrument(skip(src), fields(input = src.len()), err)]
pub fn compress(src: &[u8], level: u8) -> Result<Vec<u8>> {
    let size = u32::try_from(src.len()).map_err(|_| Error::InputTooLarge(src.len()))?;
    let window = window_for_level(level);

    let mut out = Vec::with_capacity(HEADER_SIZE + src.len() + src.len() / 8 + 1);
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&[0u8; 12]);
    BigEndian::write_u32(&mut out[4..8], size);

    let mut pos = 0;
    while pos < src.len() {
        let flag_index = out.len();
        out.push(0);

        for bit in 0..8 {
            if pos >= src.len() {
                break;
            }

            match find_match(src, pos, window) {
                Some(found) => {
                    let (token, extra) = found.token();
                    out.extend_from_slice(&token.to_be_bytes());
                    if let Some(extra) = extra {
                        out.push(extra);
                    }
                    pos += found.length;
                }
                None => {
                    out[flag_index] |= 0x80 >> bit;
                    out.push(src[pos]);
                    pos += 1;
                }
            }
        }
    }

    debug!(output = out.len(), window, "compressed yaz0");
    Ok(out)
}
