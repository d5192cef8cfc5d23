//! Yay0 compression and decompression.
//!
//! Unlike Yaz0 the symbols of a Yay0 stream are split into three sections which are consumed
//! independently while decoding.
//!
//! | Offset (bytes) | Field             | Description                                        |
//! |----------------|-------------------|----------------------------------------------------|
//! | 0x0000         | Magic number      | 4 bytes: "Yay0"                                    |
//! | 0x0004         | Decompressed size | 4 bytes: big endian size of the output             |
//! | 0x0008         | Link offset       | 4 bytes: offset of the back-reference section      |
//! | 0x000C         | Chunk offset      | 4 bytes: offset of the literal section             |
//! | 0x0010         | Masks             | Big endian 32 bit words of flag bits               |
//!
//! - **Masks**: one bit per symbol, most significant first. A set bit copies the next byte of the
//!   chunk section, a clear bit consumes the next link.
//! - **Links**: 16 bit tokens `LDDD`, `L + 2` is the length and `DDD + 1` the distance. A zero `L`
//!   takes the length from the next chunk byte plus `0x12`.
//! - **Chunks**: literal bytes and extended lengths, in symbol order.

use byteorder::{BigEndian, WriteBytesExt};
use tracing::{debug, instrument};

use crate::{
    error::{Error, Result},
    lz::{copy_back_reference, find_match, initial_capacity, Source, MAX_DISTANCE},
};

/// Signature at the start of every Yay0 stream
pub const MAGIC: [u8; 4] = *b"Yay0";

/// Size of the Yay0 header, the mask section always starts here
pub const HEADER_SIZE: usize = 0x10;

/// Decompress a complete Yay0 stream, header included.
#[instrument(skip_all, fields(input = src.len()), err)]
pub fn decompress(src: &[u8]) -> Result<Vec<u8>> {
    let mut header = Source::new(src, 0);
    if header.take(MAGIC.len())? != MAGIC {
        return Err(Error::InvalidMagic);
    }

    let size = header.u32()? as usize;
    let link_offset = header.u32()? as usize;
    let chunk_offset = header.u32()? as usize;
    debug!(size, link_offset, chunk_offset, "decompressing yay0");

    let mut masks = Source::new(src, HEADER_SIZE);
    let mut links = Source::new(src, link_offset);
    let mut chunks = Source::new(src, chunk_offset);

    let mut out = Vec::with_capacity(initial_capacity(size, src.len()));
    let mut mask = 0u32;
    let mut remaining = 0;

    while out.len() < size {
        if remaining == 0 {
            mask = masks.u32()?;
            remaining = 32;
        }

        if mask & 0x8000_0000 != 0 {
            out.push(chunks.byte()?);
        } else {
            let link = links.u16()?;
            let distance = (link & 0x0FFF) as usize + 1;
            let length = match link >> 12 {
                0 => chunks.byte()? as usize + 0x12,
                n => n as usize + 2,
            };
            copy_back_reference(&mut out, distance, length, size)?;
        }

        mask <<= 1;
        remaining -= 1;
    }

    Ok(out)
}

/// Compress `src` into a Yay0 stream.
///
/// Matches are searched over the full 4 KiB window the link format can address.
#[instrument(skip_all, fields(input = src.len()), err)]
pub fn compress(src: &[u8]) -> Result<Vec<u8>> {
    let size = u32::try_from(src.len()).map_err(|_| Error::InputTooLarge(src.len()))?;

    let mut masks: Vec<u32> = Vec::with_capacity(src.len() / 32 + 1);
    let mut links: Vec<u16> = Vec::with_capacity(src.len() / 2);
    let mut chunks: Vec<u8> = Vec::with_capacity(src.len());

    let mut mask = 0u32;
    let mut mask_bits = 0;
    let mut pos = 0;

    while pos < src.len() {
        mask <<= 1;

        match find_match(src, pos, MAX_DISTANCE) {
            Some(found) => {
                let (link, extra) = found.token();
                links.push(link);
                if let Some(extra) = extra {
                    chunks.push(extra);
                }
                pos += found.length;
            }
            None => {
                mask |= 1;
                chunks.push(src[pos]);
                pos += 1;
            }
        }

        mask_bits += 1;
        if mask_bits == 32 {
            masks.push(mask);
            mask = 0;
            mask_bits = 0;
        }
    }

    if mask_bits > 0 {
        masks.push(mask << (32 - mask_bits));
    }

    let link_offset = HEADER_SIZE + masks.len() * 4;
    let chunk_offset = link_offset + links.len() * 2;

    let mut out = Vec::with_capacity(chunk_offset + chunks.len());
    out.extend_from_slice(&MAGIC);
    out.write_u32::<BigEndian>(size)?;
    out.write_u32::<BigEndian>(link_offset as u32)?;
    out.write_u32::<BigEndian>(chunk_offset as u32)?;
    for mask in &masks {
        out.write_u32::<BigEndian>(*mask)?;
    }
    for link in &links {
        out.write_u16::<BigEndian>(*link)?;
    }
    out.extend_from_slice(&chunks);

    debug!(
        output = out.len(),
        masks = masks.len(),
        links = links.len(),
        chunks = chunks.len(),
        "compressed yay0"
    );
    Ok(out)
}
