//! Sliding window helpers shared by the Yaz0 and Yay0 codecs.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

/// Shortest run worth encoding as a back-reference
pub const MIN_MATCH: usize = 3;

/// Longest run a single back-reference can describe (`0xFF + 0x12`)
pub const MAX_MATCH: usize = 0x111;

/// Largest distance the 12 bit offset field can describe
pub const MAX_DISTANCE: usize = 0x1000;

/// Lengths below this fit in the high nibble of a token
pub(crate) const SHORT_MATCH_LIMIT: usize = 0x12;

/// A run of previously produced bytes that repeats at the current position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Match {
    pub distance: usize,
    pub length: usize,
}

impl Match {
    /// Encode the match into a 16 bit token, returning the extra length byte when the length
    /// doesn't fit in the high nibble.
    pub fn token(&self) -> (u16, Option<u8>) {
        let offset = ((self.distance - 1) & 0x0FFF) as u16;
        if self.length < SHORT_MATCH_LIMIT {
            (offset | (((self.length - 2) as u16) << 12), None)
        } else {
            (offset, Some((self.length - SHORT_MATCH_LIMIT) as u8))
        }
    }
}

/// Greedy search for the longest match at `pos` looking back at most `window` bytes.
///
/// Candidates are checked nearest first with a two byte prefix test before extending byte by
/// byte. The run may overlap the current position, the decoders copy byte-wise so the repeated
/// pattern is reproduced.
pub(crate) fn find_match(src: &[u8], pos: usize, window: usize) -> Option<Match> {
    let max_length = MAX_MATCH.min(src.len().saturating_sub(pos));
    if max_length < MIN_MATCH {
        return None;
    }

    let window = window.min(MAX_DISTANCE).min(pos);
    let mut best: Option<Match> = None;

    for distance in 1..=window {
        let start = pos - distance;
        if src[start] != src[pos] || src[start + 1] != src[pos + 1] {
            continue;
        }

        let mut length = 2;
        while length < max_length && src[start + length] == src[pos + length] {
            length += 1;
        }

        if length >= MIN_MATCH && best.map_or(true, |m| length > m.length) {
            best = Some(Match { distance, length });
            if length == max_length {
                break;
            }
        }
    }

    best
}

/// Bounds checked big endian reader over a compressed buffer
pub(crate) struct Source<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Source<'a> {
    pub fn new(data: &'a [u8], pos: usize) -> Self {
        Source { data, pos }
    }

    pub fn take(&mut self, needed: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(needed)
            .filter(|end| *end <= self.data.len())
            .ok_or(Error::Truncated {
                offset: self.pos,
                needed,
                available: self.data.len(),
            })?;

        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    pub fn u32(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }
}

/// Append `length` bytes starting `distance` bytes back, never growing `out` beyond `limit`.
pub(crate) fn copy_back_reference(
    out: &mut Vec<u8>,
    distance: usize,
    length: usize,
    limit: usize,
) -> Result<()> {
    let produced = out.len();
    if distance == 0 || distance > produced {
        return Err(Error::InvalidBackReference { distance, produced });
    }

    let start = produced - distance;
    let length = length.min(limit.saturating_sub(produced));
    for i in 0..length {
        let byte = out[start + i];
        out.push(byte);
    }

    Ok(())
}

/// Output buffers are sized from the header, but never trust it for more than the input could
/// possibly expand to.
pub(crate) fn initial_capacity(declared: usize, input: usize) -> usize {
    declared.min(input.saturating_mul(MAX_MATCH))
}
