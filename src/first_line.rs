//! Start-line parsing for requests and responses.
//!
//! ```text
//! request:  METHOD SP uri SP version CRLF
//! response: version SP 3DIGIT SP reason CRLF
//! ```
//!
//! A response is recognised by the case-sensitive `HTTP/` prefix; version
//! forms `HTTP/1.0`, `HTTP/1.1`, `HTTP/2.0` and `HTTP/2` are accepted.

use crate::error::{Advance, Error, Result};
use crate::method::{method_kind, Method};
use crate::span::Span;
use crate::util::{skip_crlf, skip_line, skip_token, Eol};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum FlState {
    #[default]
    Init,
    ReqMethod,
    ReqUri,
    ReqVer,
    ReqEol,
    RplReason,
    Fin,
}

/// The parsed first line of a message.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstLine {
    /// Response status code, 0 for requests.
    pub status: u16,
    /// Numeric request method, `Undef` for responses.
    pub method_no: Method,
    /// Request method, empty for responses.
    pub method: Span,
    /// Request URI, captured as an opaque span.
    pub uri: Span,
    /// HTTP version, present for both requests and responses.
    pub version: Span,
    /// The status digits as text, empty for requests.
    pub status_code: Span,
    /// Reason phrase, untrimmed.
    pub reason: Span,
    state: FlState,
}

impl FirstLine {
    pub fn reset(&mut self) {
        *self = FirstLine::default();
    }

    /// True if the line is a request line.
    pub fn is_request(&self) -> bool {
        self.status == 0
    }

    /// Nothing parsed yet.
    pub fn is_empty(&self) -> bool {
        self.state == FlState::Init
    }

    pub fn parsed(&self) -> bool {
        self.state == FlState::Fin
    }

    /// Parsing started but needs more input.
    pub fn pending(&self) -> bool {
        !matches!(self.state, FlState::Init | FlState::Fin)
    }
}

const VER_PREFIX: &[u8] = b"HTTP/";

// Enough bytes to classify request vs response without risking a
// mis-read of a short prefix: "HTTP/1.0 " + status + SP + CRLF.
const MIN_LINE: usize = VER_PREFIX.len() + 4 + 3 + 3;

/// Parse the first line of a message starting at `offs`.
pub fn parse_first_line(buf: &[u8], offs: usize, fl: &mut FirstLine) -> Result<Advance> {
    let mut i = offs;
    loop {
        match fl.state {
            FlState::Init => {
                if buf.len().saturating_sub(i) < MIN_LINE {
                    return Ok(Advance::More(i));
                }
                if buf[i..].starts_with(VER_PREFIX) {
                    return parse_response_line(buf, i, fl);
                }
                fl.state = FlState::ReqMethod;
                fl.method.set(i, i);
            }
            FlState::ReqMethod => {
                i = skip_token(buf, i);
                if i >= buf.len() {
                    return Ok(Advance::More(i));
                }
                if buf[i] != b' ' {
                    return Err(Error::BadChar(i));
                }
                fl.method.extend(i);
                if fl.method.is_empty() {
                    return Err(Error::BadChar(i));
                }
                fl.method_no = method_kind(fl.method.slice(buf));
                i += 1;
                fl.state = FlState::ReqUri;
                fl.uri.set(i, i);
            }
            FlState::ReqUri => {
                i = skip_token(buf, i);
                if i >= buf.len() {
                    return Ok(Advance::More(i));
                }
                if buf[i] != b' ' {
                    return Err(Error::BadChar(i));
                }
                fl.uri.extend(i);
                if fl.uri.is_empty() {
                    return Err(Error::BadChar(i));
                }
                i += 1;
                fl.state = FlState::ReqVer;
                fl.version.set(i, i);
            }
            FlState::ReqVer => {
                i = skip_token(buf, i);
                if i >= buf.len() {
                    return Ok(Advance::More(i));
                }
                if buf[i] != b'\r' && buf[i] != b'\n' {
                    // trailing space or tab before the line end
                    return Err(Error::BadChar(i));
                }
                fl.version.extend(i);
                if fl.version.is_empty() {
                    return Err(Error::BadChar(i));
                }
                fl.state = FlState::ReqEol;
            }
            FlState::ReqEol => match skip_crlf(buf, i) {
                Eol::At { next, .. } => {
                    fl.state = FlState::Fin;
                    return Ok(Advance::Done(next));
                }
                Eol::Short(n) => return Ok(Advance::More(n)),
                Eol::Missing(n) => return Err(Error::BadChar(n)),
            },
            FlState::RplReason => match skip_line(buf, i) {
                Eol::At { next, len } => {
                    fl.reason.extend(next - len);
                    fl.state = FlState::Fin;
                    return Ok(Advance::Done(next));
                }
                Eol::Short(n) => return Ok(Advance::More(n)),
                Eol::Missing(n) => return Err(Error::Bug(n)),
            },
            FlState::Fin => return Ok(Advance::Done(i)),
        }
    }
}

/// Parse `HTTP/x[.y] SP 3DIGIT SP reason CRLF` from the line start. Up to
/// the reason phrase nothing is carried across calls: a short buffer
/// re-classifies from `start` on the next call.
fn parse_response_line(buf: &[u8], start: usize, fl: &mut FirstLine) -> Result<Advance> {
    let mut l = start + VER_PREFIX.len();
    let mut seen_dot = false;
    loop {
        if l >= buf.len() {
            return Ok(Advance::More(start));
        }
        match buf[l] {
            b'.' => {
                if seen_dot {
                    return Err(Error::BadChar(l));
                }
                seen_dot = true;
            }
            b' ' => break,
            b'0'..=b'9' => {}
            _ => return Err(Error::BadChar(l)),
        }
        l += 1;
    }
    fl.version.set(start, l);

    // exactly three digits and a single space
    let i = l + 1;
    if i + 4 > buf.len() {
        return Ok(Advance::More(start));
    }
    if buf[i + 3] != b' ' || !buf[i..i + 3].iter().all(|c| c.is_ascii_digit()) {
        return Err(Error::BadChar(i));
    }
    fl.status_code.set(i, i + 3);
    fl.status = (buf[i] - b'0') as u16 * 100
        + (buf[i + 1] - b'0') as u16 * 10
        + (buf[i + 2] - b'0') as u16;

    let i = i + 4;
    fl.reason.set(i, i);
    fl.state = FlState::RplReason;
    match skip_line(buf, i) {
        Eol::At { next, len } => {
            fl.reason.extend(next - len);
            fl.state = FlState::Fin;
            Ok(Advance::Done(next))
        }
        Eol::Short(n) => Ok(Advance::More(n)),
        Eol::Missing(n) => Err(Error::Bug(n)),
    }
}
