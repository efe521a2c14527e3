//! Chunked transfer-coding delimiters (rfc7230 section 4.1).
//!
//! One chunk is `hex-size [; ext-name [= ext-val]] CRLF` followed by
//! `size` bytes of data and a CRLF. The final chunk has size 0 and may
//! carry trailer headers before the terminating CRLF.

use crate::error::{Advance, Error, Result};
use crate::header::{parse_headers, HdrVals, HeaderList};
use crate::token::{parse_token_list, Token, TokenFlags};
use crate::util::{hex_value, Hex};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum ChunkState {
    #[default]
    Delimiter,
    Trailer,
}

/// One parsed chunk delimiter. `T` is the trailer header slot count;
/// trailers beyond it are counted but not stored.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkHead<const T: usize = 0> {
    /// The size token, chunk extensions attached as token params.
    pub val: Token,
    /// Chunk size in bytes, not counting the closing CRLF.
    pub size: u64,
    /// Trailer headers, populated only for the final chunk.
    pub trailers: HeaderList<T>,
    state: ChunkState,
}

impl<const T: usize> ChunkHead<T> {
    pub fn reset(&mut self) {
        *self = ChunkHead::default();
    }

    /// True if more chunks follow this one.
    pub fn more(&self) -> bool {
        self.size > 0
    }
}

/// Parse one chunk delimiter (and, for the final chunk, its trailers).
///
/// On [`Advance::Done`] the offset is the first byte of chunk data; the
/// caller skips the data with `offset + size + 2` (the closing CRLF is
/// always included; for the final chunk the reported offset lies
/// *before* the terminating CRLF so the same arithmetic applies).
pub fn parse_chunk<const T: usize>(
    buf: &[u8],
    offs: usize,
    chunk: &mut ChunkHead<T>,
) -> Result<Advance> {
    const FLAGS: TokenFlags = TokenFlags {
        allow_params: true,
        ..TokenFlags::NONE
    };

    let mut offs = offs;
    loop {
        match chunk.state {
            ChunkState::Delimiter => {
                let adv = match parse_token_list(buf, offs, &mut chunk.val, FLAGS) {
                    Ok(v) => v,
                    Err(e) => {
                        chunk.reset();
                        return Err(e);
                    }
                };
                match adv {
                    Advance::Done(next) => {
                        let size = match hex_value(chunk.val.v.slice(buf)) {
                            Hex::Val(v) => v,
                            Hex::NotHex => return Err(Error::NotNumber(chunk.val.v.offs())),
                            Hex::TooBig => return Err(Error::NumTooBig(chunk.val.v.offs())),
                        };
                        chunk.size = size;
                        if size == 0 {
                            trace!("last chunk, parsing trailer");
                            chunk.state = ChunkState::Trailer;
                            offs = next;
                            continue;
                        }
                        return Ok(Advance::Done(next));
                    }
                    Advance::More(n) => return Ok(Advance::More(n)),
                    // a bare empty line where a chunk size belongs
                    Advance::Empty(n) => {
                        chunk.reset();
                        return Err(Error::NotNumber(n));
                    }
                    other => return Err(Error::Bug(other.offset())),
                }
            }
            ChunkState::Trailer => {
                let adv = parse_headers(buf, offs, &mut chunk.trailers, None::<&mut HdrVals>)?;
                return match adv {
                    // step back before the final CRLF so the caller's
                    // size + 2 skip lands past the body
                    Advance::Done(n) | Advance::Empty(n) => Ok(Advance::Done(n - 2)),
                    Advance::More(n) => Ok(Advance::More(n)),
                    other => Err(Error::Bug(other.offset())),
                };
            }
        }
    }
}
