//! Header line and header block parsing.
//!
//! Grammar per line: `name SP* ":" LWS* value LWS* CRLF`. Values of the
//! recognised headers are handed to their dedicated parsers
//! ([`crate::values`]); everything else is consumed as a raw, trimmed
//! span with obs-fold continuations folded in.

use core::fmt;

use once_cell::sync::Lazy;

use crate::error::{Advance, Error, Result};
use crate::span::Span;
use crate::util::{skip_lws, skip_token, skip_token_until, skip_ws, Lws};
use crate::values::{
    parse_all_values, parse_uint_value, TokenClass, TokenVals, TrEnc, UIntVal, UpgProto, WsExt,
    WsProto,
};

/// The header names this parser knows about, plus `Other` for everything
/// else and `None` for "not parsed".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HdrKind {
    #[default]
    None = 0,
    ContentLength,
    TransferEncoding,
    Upgrade,
    ContentEncoding,
    Host,
    Server,
    Origin,
    Connection,
    WsKey,
    WsProtocol,
    WsAccept,
    WsVersion,
    WsExtensions,
    Other,
}

impl HdrKind {
    pub fn name(&self) -> &'static str {
        match self {
            HdrKind::None => "none",
            HdrKind::ContentLength => "Content-Length",
            HdrKind::TransferEncoding => "Transfer-Encoding",
            HdrKind::Upgrade => "Upgrade",
            HdrKind::ContentEncoding => "Content-Encoding",
            HdrKind::Host => "Host",
            HdrKind::Server => "Server",
            HdrKind::Origin => "Origin",
            HdrKind::Connection => "Connection",
            HdrKind::WsKey => "Sec-WebSocket-Key",
            HdrKind::WsProtocol => "Sec-WebSocket-Protocol",
            HdrKind::WsAccept => "Sec-WebSocket-Accept",
            HdrKind::WsVersion => "Sec-WebSocket-Version",
            HdrKind::WsExtensions => "Sec-WebSocket-Extensions",
            HdrKind::Other => "other",
        }
    }
}

impl fmt::Display for HdrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of [`HdrKind`]s packed into one machine word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HdrFlags(u16);

impl HdrFlags {
    pub const NONE: HdrFlags = HdrFlags(0);

    /// The one-bit set for a kind.
    pub const fn of(k: HdrKind) -> HdrFlags {
        HdrFlags(1 << k as u16)
    }

    pub fn set(&mut self, k: HdrKind) {
        self.0 |= 1 << k as u16;
    }

    pub fn clear(&mut self, k: HdrKind) {
        self.0 &= !(1 << k as u16);
    }

    pub fn test(&self, k: HdrKind) -> bool {
        self.0 & (1 << k as u16) != 0
    }

    pub fn any(&self, kinds: &[HdrKind]) -> bool {
        kinds.iter().any(|k| self.test(*k))
    }

    pub fn all(&self, kinds: &[HdrKind]) -> bool {
        kinds.iter().all(|k| self.test(*k))
    }
}

impl core::ops::BitOr for HdrFlags {
    type Output = HdrFlags;
    fn bitor(self, rhs: HdrFlags) -> HdrFlags {
        HdrFlags(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for HdrFlags {
    fn bitor_assign(&mut self, rhs: HdrFlags) {
        self.0 |= rhs.0;
    }
}

const HDR_NAMES: [(&[u8], HdrKind); 13] = [
    (b"content-length", HdrKind::ContentLength),
    (b"transfer-encoding", HdrKind::TransferEncoding),
    (b"upgrade", HdrKind::Upgrade),
    (b"content-encoding", HdrKind::ContentEncoding),
    (b"host", HdrKind::Host),
    (b"server", HdrKind::Server),
    (b"origin", HdrKind::Origin),
    (b"connection", HdrKind::Connection),
    (b"sec-websocket-key", HdrKind::WsKey),
    (b"sec-websocket-protocol", HdrKind::WsProtocol),
    (b"sec-websocket-accept", HdrKind::WsAccept),
    (b"sec-websocket-version", HdrKind::WsVersion),
    (b"sec-websocket-extensions", HdrKind::WsExtensions),
];

// Hash bit widths chosen so no bucket holds more than two entries; the
// distribution test below guards the choice when names are added.
const HN_BITS_FCHAR: u32 = 5;
const HN_BITS_LEN: u32 = 2;
const HN_BUCKETS: usize = 1 << (HN_BITS_FCHAR + HN_BITS_LEN);

type Bucket = [Option<(&'static [u8], HdrKind)>; 2];

static HDR_LOOKUP: Lazy<[Bucket; HN_BUCKETS]> = Lazy::new(|| {
    let mut tbl = [[None; 2]; HN_BUCKETS];
    for (name, kind) in HDR_NAMES {
        let bucket = &mut tbl[hash_hdr_name(name)];
        let slot = bucket
            .iter_mut()
            .find(|s| s.is_none())
            .expect("header lookup bucket overflow");
        *slot = Some((name, kind));
    }
    tbl
});

fn hash_hdr_name(n: &[u8]) -> usize {
    const MC: usize = (1 << HN_BITS_FCHAR) - 1;
    const ML: usize = (1 << HN_BITS_LEN) - 1;
    (n[0].to_ascii_lowercase() as usize & MC) | ((n.len() & ML) << HN_BITS_FCHAR)
}

/// Map a header name (no surrounding whitespace) to its kind.
/// Case-insensitive.
pub fn hdr_kind(name: &[u8]) -> HdrKind {
    if name.is_empty() {
        return HdrKind::Other;
    }
    for entry in HDR_LOOKUP[hash_hdr_name(name)].iter().flatten() {
        if name.eq_ignore_ascii_case(entry.0) {
            return entry.1;
        }
    }
    HdrKind::Other
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum HdrState {
    #[default]
    Init,
    Name,
    /// Whitespace between the name and the colon.
    NameEnd,
    /// Colon consumed, before the value.
    BodyStart,
    Val,
    ValEnd,
    /// Resuming inside a dedicated value parser.
    InCLen,
    InUpgrade,
    InTrEnc,
    InWsProto,
    InWsExt,
    Fin,
}

/// One partially or fully parsed header line.
#[derive(Debug, Clone, Copy, Default)]
pub struct Header {
    pub kind: HdrKind,
    pub name: Span,
    /// Trimmed value. For headers with a dedicated value parser this is
    /// the span that parser reported as its last parsed content.
    pub val: Span,
    state: HdrState,
}

impl Header {
    pub fn reset(&mut self) {
        *self = Header::default();
    }

    /// True if the header was never parsed.
    pub fn missing(&self) -> bool {
        self.kind == HdrKind::None
    }
}

/// Parsed values of the recognised headers. `V` is the slot count handed
/// to each multi-value aggregate.
#[derive(Debug, Clone, Copy, Default)]
pub struct HdrVals<const V: usize = 0> {
    pub clen: UIntVal,
    pub upgrade: TokenVals<UpgProto, V>,
    pub tr_enc: TokenVals<TrEnc, V>,
    pub ws_proto: TokenVals<WsProto, V>,
    pub ws_ext: TokenVals<WsExt, V>,
}

impl<const V: usize> HdrVals<V> {
    pub fn reset(&mut self) {
        *self = HdrVals::default();
    }
}

/// Parse one header line.
///
/// [`Advance::Empty`] reports the empty line that terminates a header
/// block, with the offset past its line end. When `vals` is given, the
/// values of recognised headers are parsed into it as a side effect.
pub fn parse_hdr_line<const V: usize>(
    buf: &[u8],
    offs: usize,
    h: &mut Header,
    mut vals: Option<&mut HdrVals<V>>,
) -> Result<Advance> {
    let mut i = offs;
    while i < buf.len() {
        match h.state {
            HdrState::Init => match buf[i] {
                b'\r' => {
                    if buf.len() - i < 2 {
                        return Ok(Advance::More(i));
                    }
                    h.state = HdrState::Fin;
                    let n = if buf[i + 1] == b'\n' { i + 2 } else { i + 1 };
                    return Ok(Advance::Empty(n));
                }
                b'\n' => {
                    h.state = HdrState::Fin;
                    return Ok(Advance::Empty(i + 1));
                }
                _ => {
                    h.state = HdrState::Name;
                    h.name.set(i, i);
                }
            },
            HdrState::Name => {
                i = skip_token_until(buf, i, b':');
                if i >= buf.len() {
                    return Ok(Advance::More(i));
                }
                match buf[i] {
                    b' ' | b'\t' => {
                        h.name.extend(i);
                        if h.name.is_empty() {
                            return Err(Error::BadChar(i));
                        }
                        h.state = HdrState::NameEnd;
                        i += 1;
                    }
                    b':' => {
                        h.name.extend(i);
                        if h.name.is_empty() {
                            return Err(Error::BadChar(i));
                        }
                        h.kind = hdr_kind(h.name.slice(buf));
                        h.state = HdrState::BodyStart;
                        i += 1;
                        if let Some(v) = vals.as_deref_mut() {
                            if let Some(adv) = dispatch_value(buf, i, h, v)? {
                                return Ok(adv);
                            }
                        }
                    }
                    _ => return Err(Error::BadChar(i)),
                }
            }
            HdrState::NameEnd => {
                i = skip_ws(buf, i);
                if i >= buf.len() {
                    return Ok(Advance::More(i));
                }
                if buf[i] != b':' {
                    return Err(Error::BadChar(i));
                }
                h.kind = hdr_kind(h.name.slice(buf));
                h.state = HdrState::BodyStart;
                i += 1;
                if let Some(v) = vals.as_deref_mut() {
                    if let Some(adv) = dispatch_value(buf, i, h, v)? {
                        return Ok(adv);
                    }
                }
            }
            HdrState::BodyStart => match skip_lws(buf, i) {
                Lws::Ws(n) => {
                    h.state = HdrState::Val;
                    h.val.set(n, n);
                    i = n + 1;
                }
                Lws::Eol { at, len } => {
                    // empty value
                    h.state = HdrState::Fin;
                    return Ok(Advance::Done(at + len));
                }
                Lws::Short(n) => return Ok(Advance::More(n)),
            },
            HdrState::Val => {
                i = skip_token(buf, i);
                if i >= buf.len() {
                    return Ok(Advance::More(i));
                }
                h.val.extend(i);
                h.state = HdrState::ValEnd;
            }
            HdrState::ValEnd => match skip_lws(buf, i) {
                Lws::Ws(n) => {
                    h.state = HdrState::Val;
                    i = n + 1;
                }
                Lws::Eol { at, len } => {
                    h.state = HdrState::Fin;
                    return Ok(Advance::Done(at + len));
                }
                Lws::Short(n) => return Ok(Advance::More(n)),
            },
            HdrState::InCLen => {
                let v = vals.as_deref_mut().ok_or(Error::Bug(i))?;
                return resume_clen(buf, i, h, v);
            }
            HdrState::InUpgrade => {
                let v = vals.as_deref_mut().ok_or(Error::Bug(i))?;
                return resume_tokens(buf, i, h, &mut v.upgrade);
            }
            HdrState::InTrEnc => {
                let v = vals.as_deref_mut().ok_or(Error::Bug(i))?;
                return resume_tokens(buf, i, h, &mut v.tr_enc);
            }
            HdrState::InWsProto => {
                let v = vals.as_deref_mut().ok_or(Error::Bug(i))?;
                return resume_tokens(buf, i, h, &mut v.ws_proto);
            }
            HdrState::InWsExt => {
                let v = vals.as_deref_mut().ok_or(Error::Bug(i))?;
                return resume_tokens(buf, i, h, &mut v.ws_ext);
            }
            HdrState::Fin => return Err(Error::Bug(i)),
        }
    }
    Ok(Advance::More(i))
}

/// Hand the value of a recognised header to its dedicated parser.
/// `Ok(None)` means the kind has none and the generic scan applies.
fn dispatch_value<const V: usize>(
    buf: &[u8],
    o: usize,
    h: &mut Header,
    vals: &mut HdrVals<V>,
) -> Result<Option<Advance>> {
    match h.kind {
        // only the first Content-Length value is parsed; repeats fall
        // through to the generic scan
        HdrKind::ContentLength if !vals.clen.parsed() => {
            h.state = HdrState::InCLen;
            resume_clen(buf, o, h, vals).map(Some)
        }
        HdrKind::Upgrade => {
            vals.upgrade.note_header();
            h.state = HdrState::InUpgrade;
            resume_tokens(buf, o, h, &mut vals.upgrade).map(Some)
        }
        HdrKind::TransferEncoding => {
            vals.tr_enc.note_header();
            h.state = HdrState::InTrEnc;
            resume_tokens(buf, o, h, &mut vals.tr_enc).map(Some)
        }
        HdrKind::WsProtocol => {
            vals.ws_proto.note_header();
            h.state = HdrState::InWsProto;
            resume_tokens(buf, o, h, &mut vals.ws_proto).map(Some)
        }
        HdrKind::WsExtensions => {
            vals.ws_ext.note_header();
            h.state = HdrState::InWsExt;
            resume_tokens(buf, o, h, &mut vals.ws_ext).map(Some)
        }
        _ => Ok(None),
    }
}

fn resume_clen<const V: usize>(
    buf: &[u8],
    o: usize,
    h: &mut Header,
    vals: &mut HdrVals<V>,
) -> Result<Advance> {
    let adv = parse_uint_value(buf, o, &mut vals.clen)?;
    if adv.is_done() {
        h.val = vals.clen.sval;
        h.state = HdrState::Fin;
    }
    Ok(adv)
}

fn resume_tokens<K: TokenClass, const N: usize>(
    buf: &[u8],
    o: usize,
    h: &mut Header,
    set: &mut TokenVals<K, N>,
) -> Result<Advance> {
    match parse_all_values(buf, o, set)? {
        Advance::Done(n) => {
            h.val = set.last_parsed();
            h.state = HdrState::Fin;
            Ok(Advance::Done(n))
        }
        Advance::More(n) => Ok(Advance::More(n)),
        // valueless header line
        Advance::Empty(n) => {
            h.state = HdrState::Fin;
            Ok(Advance::Done(n))
        }
        adv => Err(Error::Bug(adv.offset())),
    }
}

/// Slots in the first-occurrence table: one per recognised kind.
const FIRST_SLOTS: usize = HdrKind::Other as usize - 1;

/// A parsed header block.
///
/// `N` headers are stored; further ones are parsed through a scratch slot
/// and only counted. The first occurrence of each *recognised* kind is
/// additionally copied into a by-kind table ([`HeaderList::first`]).
#[derive(Debug, Clone, Copy)]
pub struct HeaderList<const N: usize = 10> {
    /// Kinds seen, as a bitmask.
    pub flags: HdrFlags,
    count: usize,
    hdrs: [Header; N],
    first: [Header; FIRST_SLOTS],
    scratch: Header,
}

impl<const N: usize> Default for HeaderList<N> {
    fn default() -> Self {
        HeaderList {
            flags: HdrFlags::NONE,
            count: 0,
            hdrs: [Header::default(); N],
            first: [Header::default(); FIRST_SLOTS],
            scratch: Header::default(),
        }
    }
}

impl<const N: usize> HeaderList<N> {
    pub fn reset(&mut self) {
        *self = HeaderList::default();
    }

    /// Total number of headers found; may exceed the slot array.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The stored headers, in message order.
    pub fn headers(&self) -> &[Header] {
        &self.hdrs[..self.count.min(N)]
    }

    pub fn get(&self, n: usize) -> Option<&Header> {
        self.headers().get(n)
    }

    /// First occurrence of a recognised kind, if the message carried one.
    pub fn first(&self, k: HdrKind) -> Option<&Header> {
        let i = (k as usize).checked_sub(1)?;
        let h = self.first.get(i)?;
        if h.missing() {
            None
        } else {
            Some(h)
        }
    }

    fn note_first(&mut self, h: &Header) {
        let i = h.kind as usize;
        if (1..=FIRST_SLOTS).contains(&i) && self.first[i - 1].missing() {
            self.first[i - 1] = *h;
        }
    }
}

/// Drive [`parse_hdr_line`] over successive lines until the empty line
/// that terminates the block. Returns [`Advance::Done`] past that line,
/// or [`Advance::Empty`] if the block contained no headers at all.
pub fn parse_headers<const N: usize, const V: usize>(
    buf: &[u8],
    offs: usize,
    hl: &mut HeaderList<N>,
    mut vals: Option<&mut HdrVals<V>>,
) -> Result<Advance> {
    let mut i = offs;
    while i < buf.len() {
        let use_scratch = hl.count >= N;
        let (res, parsed) = {
            let h = if use_scratch {
                &mut hl.scratch
            } else {
                &mut hl.hdrs[hl.count]
            };
            let res = parse_hdr_line(buf, i, h, vals.as_deref_mut())?;
            (res, *h)
        };
        match res {
            Advance::Done(n) => {
                hl.flags.set(parsed.kind);
                hl.note_first(&parsed);
                if use_scratch {
                    hl.scratch.reset();
                }
                hl.count += 1;
                i = n;
            }
            Advance::Empty(n) => {
                if hl.count > 0 {
                    // end of the header block
                    return Ok(Advance::Done(n));
                }
                return Ok(Advance::Empty(n));
            }
            other => return Ok(other),
        }
    }
    Ok(Advance::More(i))
}
