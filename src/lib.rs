//! Incremental, zero-copy HTTP/1.x message parsing.
//!
//! Built for proxies, gateways and intercepting middleboxes that see
//! message streams in arbitrary fragments: every parser here consumes a
//! caller-owned byte buffer at an offset and either finishes, asks for
//! more bytes with a well-defined resume offset, or fails pointing at the
//! offending byte. Nothing is copied and nothing is allocated: parsed
//! elements are [`Span`]s (offset + length) into the caller's buffer, and
//! all parser state lives in plain `Copy` structs the caller owns.
//!
//! Headers relevant to WebSocket upgrades and transfer negotiation
//! (Content-Length, Transfer-Encoding, Upgrade, the `Sec-WebSocket-*`
//! family, Host, Origin, Connection, Server, Content-Encoding) are
//! recognised and their values parsed into typed aggregates; everything
//! else is captured as raw spans.
//!
//! ```
//! use peck::{parse_msg, Advance, Msg, MsgFlags};
//!
//! let buf = b"HTTP/1.1 200 OK\r\nContent-Length: 12\r\n\r\nHello world!";
//! let mut msg = Msg::<10>::new();
//!
//! let adv = parse_msg(buf, 0, &mut msg, MsgFlags::NONE).unwrap();
//! assert_eq!(adv, Advance::Done(buf.len()));
//! assert_eq!(msg.fline.status, 200);
//! assert_eq!(msg.vals.clen.val, 12);
//! assert_eq!(msg.body.slice(buf), b"Hello world!");
//! ```
//!
//! When a parser returns [`Advance::More`], append the newly received
//! bytes to the *same* buffer and call again with the returned offset and
//! the same state struct. Buffers may only grow by appending, and a
//! message must fit in 64 KiB (offsets are 16-bit).
//!
//! There is no I/O, no threading and no shared mutable state in this
//! crate; distinct messages on distinct buffers parse concurrently
//! without synchronisation.

#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::uninlined_format_args)]

#[macro_use]
extern crate log;

mod error;
pub use error::{Advance, Error, Result};

mod span;
pub use span::{Offs, Span};

mod util;

mod token;
pub use token::{parse_token_list, parse_token_param, skip_quoted, Token, TokenFlags, TokenParam};

mod values;
pub use values::{
    parse_all_values, parse_uint_value, TokenClass, TokenVal, TokenVals, TrEnc, UIntVal, UpgProto,
    WsExt, WsProto,
};

mod method;
pub use method::{method_kind, Method};

mod header;
pub use header::{
    hdr_kind, parse_hdr_line, parse_headers, HdrFlags, HdrKind, HdrVals, Header, HeaderList,
};

mod first_line;
pub use first_line::{parse_first_line, FirstLine};

mod chunk;
pub use chunk::{parse_chunk, ChunkHead};

mod msg;
pub use msg::{parse_msg, skip_body, Msg, MsgFlags, MsgState};
