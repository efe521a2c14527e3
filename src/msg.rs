//! Whole-message parsing: first line, headers, body delimitation.

use crate::error::{Advance, Error, Result};
use crate::first_line::{parse_first_line, FirstLine};
use crate::header::{parse_headers, HdrKind, HdrVals, HeaderList};
use crate::chunk::{parse_chunk, ChunkHead};
use crate::method::Method;
use crate::span::Span;
use crate::values::TrEnc;

/// Message parser state. Also doubles as the answer of
/// [`Msg::body_type`]: the body states name how the body is delimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MsgState {
    #[default]
    Init,
    FirstLine,
    Headers,
    BodyInit,
    /// No body is allowed; a Content-Length, if any, is ignored.
    NoBody,
    /// Body of Content-Length bytes.
    BodyCLen,
    /// Chunked transfer coding, between chunks.
    BodyChunked,
    /// Chunked transfer coding, skipping chunk data.
    BodyChunkedData,
    /// Body extends until the connection closes.
    BodyEOF,
    Err,
    Fin,
}

/// Flags for [`parse_msg`] / [`skip_body`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MsgFlags {
    /// Stop after the headers; the body span is left empty at the body
    /// start and [`skip_body`] can consume it later.
    pub skip_body: bool,
    /// The buffer holds everything that will ever arrive (EOF seen).
    pub no_more_data: bool,
}

impl MsgFlags {
    pub const NONE: MsgFlags = MsgFlags {
        skip_body: false,
        no_more_data: false,
    };
}

/// A fully or partially parsed message. All spans index the buffer the
/// caller keeps feeding; `H` is the header slot count.
#[derive(Debug, Clone, Copy, Default)]
pub struct Msg<const H: usize = 10> {
    /// Request/response line.
    pub fline: FirstLine,
    /// Values of the recognised headers.
    pub vals: HdrVals,
    pub headers: HeaderList<H>,
    /// The message body; empty if there is none or parsing skipped it.
    pub body: Span,
    /// The chunk delimiter parsed last, including trailer headers once
    /// the final chunk is reached.
    pub last_chunk: ChunkHead,
    /// The whole message `[start, end)`, set on completion.
    pub raw: Span,
    state: MsgState,
    start: usize,
}

impl<const H: usize> Msg<H> {
    pub fn new() -> Self {
        Msg::default()
    }

    /// Make the message reusable for a fresh parse.
    pub fn reset(&mut self) {
        *self = Msg::default();
    }

    /// Fully parsed, including the body.
    pub fn parsed(&self) -> bool {
        self.state == MsgState::Fin
    }

    /// The header block is fully parsed.
    pub fn parsed_headers(&self) -> bool {
        matches!(
            self.state,
            MsgState::Fin
                | MsgState::BodyInit
                | MsgState::NoBody
                | MsgState::BodyCLen
                | MsgState::BodyChunked
                | MsgState::BodyChunkedData
                | MsgState::BodyEOF
        )
    }

    /// Parsing failed; reset before reuse.
    pub fn failed(&self) -> bool {
        self.state == MsgState::Err
    }

    pub fn state(&self) -> MsgState {
        self.state
    }

    pub fn is_request(&self) -> bool {
        self.fline.is_request()
    }

    /// The numeric request method; `Undef` for responses.
    pub fn method(&self) -> Method {
        if self.is_request() {
            self.fline.method_no
        } else {
            Method::Undef
        }
    }

    /// How the body is delimited, per rfc7230 section 3.3.3.
    ///
    /// For responses pass the method of the request being answered
    /// (`Undef` if unknown, but note that replies to HEAD and CONNECT
    /// cannot be framed correctly without it).
    pub fn body_type(&self, prev_method: Method) -> MsgState {
        if !self.is_request() {
            if (self.fline.status > 99 && self.fline.status < 200)
                || self.fline.status == 204
                || self.fline.status == 304
                || prev_method == Method::Head
            {
                return MsgState::NoBody;
            }
            // 2xx to CONNECT opens a tunnel (rfc7231 section 4.3.6)
            if prev_method == Method::Connect && (200..=299).contains(&self.fline.status) {
                return MsgState::BodyEOF;
            }
        }

        // Transfer-Encoding has priority over Content-Length
        if self.headers.flags.test(HdrKind::TransferEncoding) {
            let chunked_last = self.vals.tr_enc.kinds().contains(TrEnc::CHUNKED)
                && self
                    .vals
                    .tr_enc
                    .last()
                    .map(|v| v.kind == TrEnc::CHUNKED)
                    .unwrap_or(false);
            if chunked_last {
                return MsgState::BodyChunked;
            }
            // present but chunked is not the final coding: no way to
            // delimit, read until the peer closes (for requests too)
            return MsgState::BodyEOF;
        }

        if self.headers.flags.test(HdrKind::ContentLength) {
            return MsgState::BodyCLen;
        }

        if self.is_request() {
            MsgState::NoBody
        } else {
            MsgState::BodyEOF
        }
    }
}

/// Parse one HTTP/1.x message from `buf` starting at `offs`.
///
/// On [`Advance::More`] append the received bytes to the *same* buffer
/// and call again with the returned offset and the same `msg`. On
/// [`Advance::Done`] the offset points past the message and `msg`
/// describes every recognised element as spans into the buffer.
///
/// With [`MsgFlags::skip_body`] parsing stops after the headers (the
/// returned offset is the body start); [`skip_body`] picks up from
/// there. With [`MsgFlags::no_more_data`] the buffer end is treated as
/// the connection end: close-delimited bodies complete, anything else
/// still missing input fails with [`Error::Truncated`].
pub fn parse_msg<const H: usize>(
    buf: &[u8],
    offs: usize,
    msg: &mut Msg<H>,
    flags: MsgFlags,
) -> Result<Advance> {
    let mut o = offs;
    loop {
        match msg.state {
            MsgState::Init => {
                msg.start = offs;
                msg.state = MsgState::FirstLine;
            }
            MsgState::FirstLine => match parse_first_line(buf, o, &mut msg.fline) {
                Ok(Advance::Done(n)) => {
                    o = n;
                    msg.state = MsgState::Headers;
                }
                Ok(Advance::More(n)) => return more_or_trunc(msg, n, flags),
                Ok(other) => return fail(msg, Error::Bug(other.offset())),
                Err(e) => return fail(msg, e),
            },
            MsgState::Headers => {
                match parse_headers(buf, o, &mut msg.headers, Some(&mut msg.vals)) {
                    // an empty header block still ends the headers
                    Ok(Advance::Done(n)) | Ok(Advance::Empty(n)) => {
                        o = n;
                        msg.state = MsgState::BodyInit;
                    }
                    Ok(Advance::More(n)) => return more_or_trunc(msg, n, flags),
                    Ok(other) => return fail(msg, Error::Bug(other.offset())),
                    Err(e) => return fail(msg, e),
                }
            }
            MsgState::BodyInit => {
                if flags.skip_body {
                    msg.body.set(o, o);
                    msg.raw.set(msg.start, o);
                    return Ok(Advance::Done(o));
                }
                return skip_body(buf, o, msg, flags);
            }
            MsgState::NoBody
            | MsgState::BodyCLen
            | MsgState::BodyChunked
            | MsgState::BodyChunkedData
            | MsgState::BodyEOF => return skip_body(buf, o, msg, flags),
            MsgState::Fin => return Ok(Advance::Done(o)),
            MsgState::Err => return Err(Error::Bug(o)),
        }
    }
}

/// Determine the body framing and consume (or continue consuming) the
/// body. Requires a message with parsed headers; exposed for callers
/// that passed [`MsgFlags::skip_body`] to [`parse_msg`] and consume the
/// body later.
pub fn skip_body<const H: usize>(
    buf: &[u8],
    offs: usize,
    msg: &mut Msg<H>,
    flags: MsgFlags,
) -> Result<Advance> {
    let mut o = offs;
    loop {
        match msg.state {
            MsgState::BodyInit => {
                msg.body.set(o, o);
                let mode = msg.body_type(Method::Undef);
                debug!("body delimited as {:?}", mode);
                match mode {
                    MsgState::Err => return fail(msg, Error::NoContentLength(o)),
                    MsgState::NoBody
                    | MsgState::BodyCLen
                    | MsgState::BodyChunked
                    | MsgState::BodyEOF => msg.state = mode,
                    _ => return fail(msg, Error::Bug(o)),
                }
            }
            MsgState::NoBody => {
                // a body length header, if present, is ignored
                msg.body.reset();
                return finish(msg, o);
            }
            MsgState::BodyCLen => {
                if flags.skip_body {
                    return finish(msg, o);
                }
                if !msg.vals.clen.parsed() {
                    return fail(msg, Error::Bug(o));
                }
                let end = o.checked_add(msg.vals.clen.val as usize);
                match end {
                    Some(end) if end <= buf.len() => {
                        o = end;
                        msg.body.extend(o);
                        return finish(msg, o);
                    }
                    _ => {
                        if !msg.body.contains(o) {
                            msg.body.extend(o);
                        }
                        if flags.no_more_data {
                            msg.body.extend(buf.len());
                            return fail(msg, Error::Truncated(buf.len()));
                        }
                        // keep the start-of-body offset for the retry
                        return Ok(Advance::More(o));
                    }
                }
            }
            MsgState::BodyEOF => {
                if flags.no_more_data {
                    // the buffer end is the body end
                    o = buf.len();
                    msg.body.extend(o);
                    return finish(msg, o);
                }
                if !msg.body.contains(o) {
                    msg.body.extend(o);
                }
                return Ok(Advance::More(o));
            }
            MsgState::BodyChunked => {
                if flags.skip_body {
                    return finish(msg, o);
                }
                match parse_chunk(buf, o, &mut msg.last_chunk) {
                    Ok(Advance::Done(n)) => {
                        trace!("chunk of {} bytes", msg.last_chunk.size);
                        msg.state = MsgState::BodyChunkedData;
                        o = n;
                    }
                    Ok(Advance::More(n)) => return Ok(Advance::More(n)),
                    Ok(other) => return fail(msg, Error::Bug(other.offset())),
                    Err(e) => return fail(msg, e),
                }
            }
            MsgState::BodyChunkedData => {
                if flags.skip_body {
                    return finish(msg, o);
                }
                // chunk data plus the delimiting CRLF
                let next = o
                    .checked_add(msg.last_chunk.size as usize)
                    .and_then(|n| n.checked_add(2));
                match next {
                    Some(next) if next <= buf.len() => {
                        o = next;
                        if msg.last_chunk.size == 0 {
                            // the empty chunk ends the body
                            msg.body.extend(o);
                            return finish(msg, o);
                        }
                        msg.last_chunk.reset();
                        msg.state = MsgState::BodyChunked;
                    }
                    _ => {
                        if !msg.body.contains(o) {
                            msg.body.extend(o);
                        }
                        if flags.no_more_data {
                            msg.body.extend(buf.len());
                            return fail(msg, Error::Truncated(buf.len()));
                        }
                        return Ok(Advance::More(o));
                    }
                }
            }
            _ => return Err(Error::Bug(o)),
        }
    }
}

fn finish<const H: usize>(msg: &mut Msg<H>, o: usize) -> Result<Advance> {
    msg.raw.set(msg.start, o);
    msg.state = MsgState::Fin;
    Ok(Advance::Done(o))
}

fn fail<const H: usize>(msg: &mut Msg<H>, e: Error) -> Result<Advance> {
    msg.state = MsgState::Err;
    Err(e)
}

fn more_or_trunc<const H: usize>(msg: &mut Msg<H>, n: usize, flags: MsgFlags) -> Result<Advance> {
    if flags.no_more_data {
        return fail(msg, Error::Truncated(n));
    }
    Ok(Advance::More(n))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::header::HdrFlags;
    use crate::values::UpgProto;
    use proptest::prelude::*;

    fn parse_all(buf: &[u8], flags: MsgFlags) -> (Msg<10>, Result<Advance>) {
        let mut msg = Msg::<10>::new();
        let res = parse_msg(buf, 0, &mut msg, flags);
        (msg, res)
    }

    /// Feed the buffer one byte at a time, then finish with the full
    /// buffer and the real flags.
    fn parse_pieces(buf: &[u8], flags: MsgFlags) -> (Msg<10>, Result<Advance>) {
        let mut msg = Msg::<10>::new();
        let mut o = 0;
        for end in 1..buf.len() {
            match parse_msg(&buf[..end], o, &mut msg, MsgFlags::NONE) {
                Ok(Advance::More(n)) => {
                    assert!(n >= o || n == 0);
                    o = n;
                }
                other => return (msg, other),
            }
        }
        let res = parse_msg(buf, o, &mut msg, flags);
        (msg, res)
    }

    struct MsgCase {
        buf: &'static [u8],
        flags: MsgFlags,
        hdrs: usize,
        hdrf: HdrFlags,
        status: u16,
        method: Method,
    }

    const NO_FLAGS: MsgFlags = MsgFlags::NONE;
    const EOF: MsgFlags = MsgFlags {
        skip_body: false,
        no_more_data: true,
    };

    fn msg_cases() -> Vec<MsgCase> {
        vec![
            MsgCase {
                buf: b"HTTP/1.1 200 OK\r\n\
                    Date: Sun, 10 Oct 2010 23:26:07 GMT\r\n\
                    Server: Apache/2.2.8 (Ubuntu) mod_ssl/2.2.8 OpenSSL/0.9.8g\r\n\
                    Last-Modified: Sun, 26 Sep 2010 22:04:35 GMT\r\n\
                    ETag: \"45b6-834-49130cc1182c0\"\r\n\
                    Accept-Ranges: bytes\r\n\
                    Content-Length: 12\r\n\
                    Connection: close\r\n\
                    Content-Type: text/html\r\n\
                    \r\n\
                    Hello world!",
                flags: NO_FLAGS,
                hdrs: 8,
                hdrf: HdrFlags::of(HdrKind::Server)
                    | HdrFlags::of(HdrKind::ContentLength)
                    | HdrFlags::of(HdrKind::Connection)
                    | HdrFlags::of(HdrKind::Other),
                status: 200,
                method: Method::Undef,
            },
            MsgCase {
                buf: b"PUT /files/129742 HTTP/1.1\r\n\
                    Host: example.com\r\n\
                    User-Agent: Chrome/54.0.2803.1\r\n\
                    Content-Length: 20\r\n\
                    \r\n\
                    This is the payload.",
                flags: NO_FLAGS,
                hdrs: 3,
                hdrf: HdrFlags::of(HdrKind::Host)
                    | HdrFlags::of(HdrKind::ContentLength)
                    | HdrFlags::of(HdrKind::Other),
                status: 0,
                method: Method::Put,
            },
            MsgCase {
                buf: b"GET / HTTP/1.1\r\nHost: www.example.org\r\n\r\n",
                flags: NO_FLAGS,
                hdrs: 1,
                hdrf: HdrFlags::of(HdrKind::Host),
                status: 0,
                method: Method::Get,
            },
            MsgCase {
                buf: b"GET / HTTP/1.1\r\n\
                    Host: www.example.org\r\n\
                    Content-Length: 0\r\n\
                    \r\n",
                flags: NO_FLAGS,
                hdrs: 2,
                hdrf: HdrFlags::of(HdrKind::Host) | HdrFlags::of(HdrKind::ContentLength),
                status: 0,
                method: Method::Get,
            },
            MsgCase {
                buf: b"HTTP/1.1 200 OK\r\n\
                    Date: Mon, 22 Mar 2004 11:15:03 GMT\r\n\
                    Content-Type: text/html\r\n\
                    Transfer-Encoding: chunked\r\n\
                    Trailer: Expires\r\n\
                    \r\n\
                    28\r\n\
                    <html><body><p>The file you requested is\r\n\
                    5\r\n3,400\r\n\
                    21\r\n\
                    bytes long and was last modified:\r\n\
                    1d\r\n\
                    Sat, 20 Mar 2004 21:12:00 GMT\r\n\
                    13\r\n\
                    .</p></body></html>\r\n\
                    0\r\n\
                    Expires: Sat, 27 Mar 2004 21:12:00 GMT\r\n\
                    \r\n",
                flags: NO_FLAGS,
                hdrs: 4,
                hdrf: HdrFlags::of(HdrKind::TransferEncoding) | HdrFlags::of(HdrKind::Other),
                status: 200,
                method: Method::Undef,
            },
            MsgCase {
                buf: b"PUT /test1 HTTP/1.1\r\n\
                    Host: example.com\r\n\
                    User-Agent: FooBar\r\n\
                    Transfer-Encoding: plain, chunked\r\n\
                    \r\n\
                    4\r\nWiki\r\n\
                    6\r\npedia \r\n\
                    E\r\nin \r\n\r\nchunks.\r\n\
                    0\r\n\r\n",
                flags: NO_FLAGS,
                hdrs: 3,
                hdrf: HdrFlags::of(HdrKind::Host)
                    | HdrFlags::of(HdrKind::TransferEncoding)
                    | HdrFlags::of(HdrKind::Other),
                status: 0,
                method: Method::Put,
            },
            MsgCase {
                buf: b"PUT /test2 HTTP/1.1\r\n\
                    Transfer-Encoding: plain\r\n\
                    Host: example2.com\r\n\
                    User-Agent: FooBar2\r\n\
                    Transfer-Encoding: chunked  \r\n\
                    \r\n\
                    4\r\nWiki\r\n\
                    0\r\n\r\n",
                flags: NO_FLAGS,
                hdrs: 4,
                hdrf: HdrFlags::of(HdrKind::Host)
                    | HdrFlags::of(HdrKind::TransferEncoding)
                    | HdrFlags::of(HdrKind::Other),
                status: 0,
                method: Method::Put,
            },
            MsgCase {
                buf: b"HTTP/1.1 200 OK\r\n\
                    Date: Sun, 20 Oct 2021 20:20:20 GMT\r\n\
                    Server: TestServer\r\n\
                    Accept-Ranges: bytes\r\n\
                    Connection: close\r\n\
                    Content-Type: text/html\r\n\
                    \r\n\
                    Hello world!",
                flags: EOF,
                hdrs: 5,
                hdrf: HdrFlags::of(HdrKind::Server)
                    | HdrFlags::of(HdrKind::Connection)
                    | HdrFlags::of(HdrKind::Other),
                status: 200,
                method: Method::Undef,
            },
        ]
    }

    #[test]
    fn test_parse_msg() {
        for case in msg_cases() {
            for parse in [parse_all, parse_pieces] {
                let (msg, res) = parse(case.buf, case.flags);
                assert_eq!(
                    res,
                    Ok(Advance::Done(case.buf.len())),
                    "{:?}",
                    String::from_utf8_lossy(case.buf)
                );
                assert!(msg.parsed());
                assert_eq!(msg.headers.count(), case.hdrs);
                assert_eq!(msg.headers.flags, case.hdrf);
                assert_eq!(msg.fline.status, case.status);
                assert_eq!(msg.method(), case.method);
                assert_eq!(msg.raw.offs(), 0);
                assert_eq!(msg.raw.end(), case.buf.len());
            }
        }
    }

    #[test]
    fn test_clen_body_span() {
        let buf = b"HTTP/1.1 200 OK\r\nContent-Length: 12\r\nConnection: close\r\n\r\nHello world!";
        let (msg, res) = parse_all(buf, MsgFlags::NONE);
        assert_eq!(res, Ok(Advance::Done(buf.len())));
        assert_eq!(msg.fline.status, 200);
        assert_eq!(msg.method(), Method::Undef);
        assert_eq!(msg.body.slice(buf), b"Hello world!");
        assert!(msg
            .headers
            .flags
            .all(&[HdrKind::ContentLength, HdrKind::Connection]));
        assert_eq!(msg.vals.clen.val, 12);
    }

    #[test]
    fn test_no_body_request() {
        let buf = b"GET / HTTP/1.1\r\nHost: www.example.org\r\n\r\n";
        let (msg, res) = parse_all(buf, MsgFlags::NONE);
        assert_eq!(res, Ok(Advance::Done(buf.len())));
        assert_eq!(msg.method(), Method::Get);
        assert_eq!(msg.fline.uri.slice(buf), b"/");
        assert_eq!(msg.fline.version.slice(buf), b"HTTP/1.1");
        assert!(msg.body.is_empty());
        assert_eq!(msg.headers.count(), 1);
    }

    #[test]
    fn test_chunked_with_trailer() {
        let buf = b"HTTP/1.1 200 OK\r\n\
            Transfer-Encoding: chunked\r\n\
            Trailer: Expires\r\n\
            \r\n\
            5\r\nhello\r\n\
            0\r\nExpires: 0\r\n\r\n";
        for parse in [parse_all, parse_pieces] {
            let (msg, res) = parse(buf, MsgFlags::NONE);
            assert_eq!(res, Ok(Advance::Done(buf.len())));
            let body_start = buf.len() - 27;
            assert_eq!(msg.body.offs(), body_start);
            assert_eq!(msg.body.end(), buf.len());
            assert_eq!(msg.last_chunk.size, 0);
            assert_eq!(msg.last_chunk.trailers.count(), 1);
            // the first-occurrence table keeps recognised kinds only
            assert!(msg.last_chunk.trailers.first(HdrKind::Other).is_none());
        }
    }

    #[test]
    fn test_websocket_upgrade() {
        let buf = b"GET /chat HTTP/1.1\r\n\
            Host: ex.com\r\n\
            Upgrade: websocket\r\n\
            Connection: Upgrade\r\n\
            Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
            Sec-WebSocket-Version: 13\r\n\
            \r\n";
        let (msg, res) = parse_all(buf, MsgFlags::NONE);
        assert_eq!(res, Ok(Advance::Done(buf.len())));
        assert!(msg.vals.upgrade.kinds().contains(UpgProto::WEBSOCKET));
        assert_eq!(msg.vals.upgrade.count(), 1);
        assert_eq!(msg.vals.upgrade.get(0).unwrap().kind, UpgProto::WEBSOCKET);
        assert!(msg.headers.flags.all(&[
            HdrKind::Host,
            HdrKind::Upgrade,
            HdrKind::Connection,
            HdrKind::WsKey,
            HdrKind::WsVersion,
        ]));
        let key = msg.headers.first(HdrKind::WsKey).unwrap();
        assert_eq!(key.val.slice(buf), b"dGhlIHNhbXBsZSBub25jZQ==");
    }

    #[test]
    fn test_connect_tunnel() {
        let buf = b"HTTP/1.1 200 Connection established\r\n\r\n";
        let mut msg = Msg::<10>::new();
        let res = parse_msg(buf, 0, &mut msg, MsgFlags::NONE).unwrap();
        // close-delimited tunnel data follows; only EOF ends it
        assert_eq!(res, Advance::More(buf.len()));
        assert!(msg.parsed_headers());
        assert_eq!(msg.body_type(Method::Connect), MsgState::BodyEOF);

        let res = parse_msg(buf, buf.len(), &mut msg, EOF).unwrap();
        assert_eq!(res, Advance::Done(buf.len()));
        assert!(msg.parsed());
    }

    #[test]
    fn test_head_response_ignores_clen() {
        let buf = b"HTTP/1.1 200 OK\r\nContent-Length: 999\r\n\r\n";
        let mut msg = Msg::<10>::new();
        // headers first, body framing decided by the caller
        let res = parse_msg(
            buf,
            0,
            &mut msg,
            MsgFlags {
                skip_body: true,
                no_more_data: false,
            },
        )
        .unwrap();
        assert_eq!(res, Advance::Done(buf.len()));
        assert_eq!(msg.body_type(Method::Head), MsgState::NoBody);
        assert!(msg.body.is_empty());
        assert_eq!(msg.vals.clen.val, 999);
        assert!(!msg.parsed() && msg.parsed_headers());
    }

    #[test]
    fn test_body_type_matrix() {
        let parse_skip = |buf: &'static [u8]| -> Msg<10> {
            let mut msg = Msg::<10>::new();
            let flags = MsgFlags {
                skip_body: true,
                no_more_data: false,
            };
            parse_msg(buf, 0, &mut msg, flags).unwrap();
            assert!(msg.parsed_headers());
            msg
        };

        // 1xx/204/304 never have a body
        for status in ["100 Continue", "204 No Content", "304 Not Modified"] {
            let line = format!("HTTP/1.1 {}\r\nContent-Length: 5\r\n\r\n", status);
            let buf = Box::leak(line.into_bytes().into_boxed_slice());
            assert_eq!(parse_skip(buf).body_type(Method::Undef), MsgState::NoBody);
        }

        // chunked last wins over Content-Length
        let m = parse_skip(
            b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nTransfer-Encoding: gzip, chunked\r\n\r\n",
        );
        assert_eq!(m.body_type(Method::Undef), MsgState::BodyChunked);

        // transfer-encoding without chunked last: close delimited
        let m = parse_skip(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: gzip\r\n\r\n");
        assert_eq!(m.body_type(Method::Undef), MsgState::BodyEOF);
        let m = parse_skip(b"PUT /x HTTP/1.1\r\nTransfer-Encoding: gzip\r\n\r\n");
        assert_eq!(m.body_type(Method::Undef), MsgState::BodyEOF);

        // chunked, then a later header makes another coding final
        let m = parse_skip(b"PUT /x HTTP/1.1\r\nTransfer-Encoding: chunked, gzip\r\n\r\n");
        assert_eq!(m.body_type(Method::Undef), MsgState::BodyEOF);

        // plain Content-Length
        let m = parse_skip(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\n");
        assert_eq!(m.body_type(Method::Undef), MsgState::BodyCLen);

        // no length information at all
        let m = parse_skip(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n");
        assert_eq!(m.body_type(Method::Undef), MsgState::NoBody);
        let m = parse_skip(b"HTTP/1.1 200 OK\r\nServer: x\r\n\r\n");
        assert_eq!(m.body_type(Method::Undef), MsgState::BodyEOF);
    }

    #[test]
    fn test_skip_body_later() {
        let buf = b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\nBODY";
        let mut msg = Msg::<10>::new();
        let flags = MsgFlags {
            skip_body: true,
            no_more_data: false,
        };
        let res = parse_msg(buf, 0, &mut msg, flags).unwrap();
        let body_start = buf.len() - 4;
        assert_eq!(res, Advance::Done(body_start));
        assert!(!msg.parsed());

        let res = skip_body(buf, body_start, &mut msg, MsgFlags::NONE).unwrap();
        assert_eq!(res, Advance::Done(buf.len()));
        assert!(msg.parsed());
        assert_eq!(msg.body.slice(buf), b"BODY");
    }

    #[test]
    fn test_truncated_clen_body() {
        let buf = b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort";
        let mut msg = Msg::<10>::new();
        let res = parse_msg(buf, 0, &mut msg, MsgFlags::NONE).unwrap();
        let body_start = buf.len() - 5;
        assert_eq!(res, Advance::More(body_start));

        let res = parse_msg(buf, body_start, &mut msg, EOF);
        assert_eq!(res, Err(Error::Truncated(buf.len())));
        assert!(msg.failed());
        assert_eq!(msg.body.offs(), body_start);
        assert_eq!(msg.body.end(), buf.len());
    }

    #[test]
    fn test_truncated_headers() {
        let buf = b"GET / HTTP/1.1\r\nHost: incompl";
        let mut msg = Msg::<10>::new();
        let res = parse_msg(buf, 0, &mut msg, EOF);
        assert!(matches!(res, Err(Error::Truncated(_))));
    }

    #[test]
    fn test_zero_header_message() {
        let buf = b"HTTP/1.1 200 Connection established\r\n\r\n";
        let (msg, res) = parse_all(buf, EOF);
        assert_eq!(res, Ok(Advance::Done(buf.len())));
        assert_eq!(msg.headers.count(), 0);
        assert!(msg.parsed());
    }

    #[test]
    fn test_parsed_idempotent() {
        let buf = b"GET / HTTP/1.1\r\nHost: x\r\n\r\ntrailing garbage";
        let end = buf.len() - 16;
        let mut msg = Msg::<10>::new();
        assert_eq!(
            parse_msg(buf, 0, &mut msg, MsgFlags::NONE),
            Ok(Advance::Done(end))
        );
        assert_eq!(
            parse_msg(buf, end, &mut msg, MsgFlags::NONE),
            Ok(Advance::Done(end))
        );
    }

    #[test]
    fn test_reset_round_trip() {
        let buf = b"GET / HTTP/1.1\r\nHost: x\r\n\r\n";
        let mut msg = Msg::<10>::new();
        let first = parse_msg(buf, 0, &mut msg, MsgFlags::NONE);
        let count = msg.headers.count();
        msg.reset();
        let second = parse_msg(buf, 0, &mut msg, MsgFlags::NONE);
        assert_eq!(first, second);
        assert_eq!(msg.headers.count(), count);
    }

    #[test]
    fn test_offset_base() {
        // the message does not have to start at offset 0
        let mut buf = b"garbage!".to_vec();
        let start = buf.len();
        buf.extend_from_slice(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n");
        let mut msg = Msg::<10>::new();
        let res = parse_msg(&buf, start, &mut msg, MsgFlags::NONE).unwrap();
        assert_eq!(res, Advance::Done(buf.len()));
        assert_eq!(msg.raw.offs(), start);
        assert_eq!(msg.raw.end(), buf.len());
        assert_eq!(msg.fline.uri.slice(&buf), b"/");
    }

    #[test]
    fn test_bad_message_is_terminal() {
        let buf = b"GET / HTTP/1.1\r\nBad\x01name: x\r\n\r\n";
        let mut msg = Msg::<10>::new();
        let res = parse_msg(buf, 0, &mut msg, MsgFlags::NONE);
        assert!(matches!(res, Err(Error::BadChar(_))));
        assert!(msg.failed());
        assert!(matches!(
            parse_msg(buf, 0, &mut msg, MsgFlags::NONE),
            Err(Error::Bug(_))
        ));
    }

    proptest! {
        /// Feeding any partition of a valid message yields the same
        /// outcome as the one-shot parse.
        #[test]
        fn prop_partition_equivalence(mut cuts in proptest::collection::vec(1usize..70, 0..6)) {
            let buf: &[u8] = b"PUT /test1 HTTP/1.1\r\n\
                Host: example.com\r\n\
                Transfer-Encoding: chunked\r\n\
                \r\n\
                4\r\nWiki\r\n\
                0\r\n\r\n";
            cuts.retain(|c| *c < buf.len());
            cuts.sort_unstable();

            let mut msg = Msg::<10>::new();
            let mut o = 0;
            for cut in cuts {
                match parse_msg(&buf[..cut], o, &mut msg, MsgFlags::NONE).unwrap() {
                    Advance::More(n) => {
                        prop_assert!(n >= o);
                        o = n;
                    }
                    Advance::Done(_) => unreachable!("cut before the end"),
                    other => panic!("unexpected {:?}", other),
                }
            }
            let res = parse_msg(buf, o, &mut msg, MsgFlags::NONE).unwrap();
            prop_assert_eq!(res, Advance::Done(buf.len()));
            prop_assert!(msg.parsed());
            prop_assert_eq!(msg.headers.count(), 2);
        }
    }
}
