//! Value parsers for the recognised multi-valued headers and for
//! Content-Length.
//!
//! Each multi-valued header (Upgrade, Transfer-Encoding,
//! Sec-WebSocket-Protocol, Sec-WebSocket-Extensions) treats its body as a
//! token list and resolves every token against a small case-insensitive
//! table into a bit-flag set. The aggregates accumulate across *all*
//! occurrences of the header in a message.

use core::ops::{BitOr, BitOrAssign};

use crate::error::{Advance, Error, Result};
use crate::span::Span;
use crate::token::{parse_token_list, Token, TokenFlags};
use crate::util::{skip_lws, Lws};

/// A resolvable token class: the list grammar for one header and the
/// table mapping its tokens to bit flags.
pub trait TokenClass: Copy + Default + PartialEq + BitOrAssign + core::fmt::Debug {
    /// Token-list grammar for this header's value.
    const FLAGS: TokenFlags;
    /// Resolve a raw token to its flag; unknown tokens map to the class's
    /// `OTHER` flag.
    fn resolve(name: &[u8]) -> Self;
}

macro_rules! flag_set {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name(pub u16);

        impl $name {
            /// True if any flag of `other` is set in `self`.
            pub fn contains(self, other: $name) -> bool {
                self.0 & other.0 != 0
            }

            pub fn is_empty(self) -> bool {
                self.0 == 0
            }
        }

        impl BitOr for $name {
            type Output = $name;
            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: $name) {
                self.0 |= rhs.0;
            }
        }
    };
}

flag_set! {
    /// Upgrade protocols (iana http-upgrade-tokens).
    UpgProto
}

impl UpgProto {
    pub const NONE: UpgProto = UpgProto(0);
    pub const WEBSOCKET: UpgProto = UpgProto(1 << 0);
    pub const HTTP2: UpgProto = UpgProto(1 << 1);
    pub const OTHER: UpgProto = UpgProto(1 << 2);
}

impl TokenClass for UpgProto {
    const FLAGS: TokenFlags = TokenFlags {
        comma_sep: true,
        allow_slash: true,
        ..TokenFlags::NONE
    };

    fn resolve(name: &[u8]) -> UpgProto {
        const TABLE: &[(&[u8], UpgProto)] = &[
            (b"websocket", UpgProto::WEBSOCKET),
            (b"h2c", UpgProto::HTTP2),
            (b"http/2.0", UpgProto::HTTP2),
        ];
        lookup(TABLE, name, UpgProto::OTHER)
    }
}

flag_set! {
    /// Transfer codings (rfc7230 section 4 and the iana transfer-coding
    /// registry).
    TrEnc
}

impl TrEnc {
    pub const NONE: TrEnc = TrEnc(0);
    pub const CHUNKED: TrEnc = TrEnc(1 << 0);
    pub const COMPRESS: TrEnc = TrEnc(1 << 1);
    pub const DEFLATE: TrEnc = TrEnc(1 << 2);
    pub const GZIP: TrEnc = TrEnc(1 << 3);
    pub const IDENTITY: TrEnc = TrEnc(1 << 4);
    /// Not an actual coding, used in TE.
    pub const TRAILERS: TrEnc = TrEnc(1 << 5);
    pub const X_COMPRESS: TrEnc = TrEnc(1 << 6);
    pub const X_GZIP: TrEnc = TrEnc(1 << 7);
    pub const OTHER: TrEnc = TrEnc(1 << 8);
}

impl TokenClass for TrEnc {
    const FLAGS: TokenFlags = TokenFlags {
        comma_sep: true,
        allow_params: true,
        ..TokenFlags::NONE
    };

    fn resolve(name: &[u8]) -> TrEnc {
        const TABLE: &[(&[u8], TrEnc)] = &[
            (b"chunked", TrEnc::CHUNKED),
            (b"compress", TrEnc::COMPRESS),
            (b"deflate", TrEnc::DEFLATE),
            (b"gzip", TrEnc::GZIP),
            (b"identity", TrEnc::IDENTITY),
            (b"trailers", TrEnc::TRAILERS),
            (b"x-compress", TrEnc::X_COMPRESS),
            (b"x-gzip", TrEnc::X_GZIP),
        ];
        lookup(TABLE, name, TrEnc::OTHER)
    }
}

flag_set! {
    /// WebSocket sub-protocols (iana websocket subprotocol-name registry).
    WsProto
}

impl WsProto {
    pub const NONE: WsProto = WsProto(0);
    pub const SIP: WsProto = WsProto(1 << 0);
    pub const XMPP: WsProto = WsProto(1 << 1);
    pub const MSRP: WsProto = WsProto(1 << 2);
    pub const OTHER: WsProto = WsProto(1 << 3);
}

impl TokenClass for WsProto {
    const FLAGS: TokenFlags = TokenFlags {
        comma_sep: true,
        ..TokenFlags::NONE
    };

    fn resolve(name: &[u8]) -> WsProto {
        const TABLE: &[(&[u8], WsProto)] = &[
            (b"sip", WsProto::SIP),
            (b"xmpp", WsProto::XMPP),
            (b"msrp", WsProto::MSRP),
        ];
        lookup(TABLE, name, WsProto::OTHER)
    }
}

flag_set! {
    /// WebSocket extensions (iana websocket extension-name registry).
    WsExt
}

impl WsExt {
    pub const NONE: WsExt = WsExt(0);
    pub const PERMESSAGE_DEFLATE: WsExt = WsExt(1 << 0);
    pub const OTHER: WsExt = WsExt(1 << 1);
}

impl TokenClass for WsExt {
    const FLAGS: TokenFlags = TokenFlags {
        comma_sep: true,
        allow_params: true,
        ..TokenFlags::NONE
    };

    fn resolve(name: &[u8]) -> WsExt {
        const TABLE: &[(&[u8], WsExt)] = &[(b"permessage-deflate", WsExt::PERMESSAGE_DEFLATE)];
        lookup(TABLE, name, WsExt::OTHER)
    }
}

fn lookup<K: Copy>(table: &[(&[u8], K)], name: &[u8], other: K) -> K {
    table
        .iter()
        .find(|(n, _)| name.eq_ignore_ascii_case(n))
        .map(|&(_, k)| k)
        .unwrap_or(other)
}

/// One resolved header value: the raw token plus its flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenVal<K: TokenClass> {
    pub tok: Token,
    pub kind: K,
}

impl<K: TokenClass> TokenVal<K> {
    pub fn reset(&mut self) {
        *self = TokenVal::default();
    }
}

/// Accumulated values of one multi-valued header kind across a message.
///
/// `N` bounds the stored values; further values are still counted,
/// resolved and OR-ed into [`kinds`][TokenVals::kinds] via a scratch slot.
/// With `N == 0` the first value is remembered anyway and is available
/// through `get(0)`.
#[derive(Debug, Clone, Copy)]
pub struct TokenVals<K: TokenClass, const N: usize = 0> {
    vals: [TokenVal<K>; N],
    n: usize,
    hdr_no: usize,
    kinds: K,
    last_parsed: Span,
    first: TokenVal<K>,
    last: TokenVal<K>,
    tmp: TokenVal<K>,
}

impl<K: TokenClass, const N: usize> Default for TokenVals<K, N> {
    fn default() -> Self {
        TokenVals {
            vals: [TokenVal::default(); N],
            n: 0,
            hdr_no: 0,
            kinds: K::default(),
            last_parsed: Span::default(),
            first: TokenVal::default(),
            last: TokenVal::default(),
            tmp: TokenVal::default(),
        }
    }
}

impl<K: TokenClass, const N: usize> TokenVals<K, N> {
    pub fn reset(&mut self) {
        *self = TokenVals::default();
    }

    /// Number of stored values: `min(count, N)`.
    pub fn vals(&self) -> usize {
        self.n.min(N)
    }

    /// Total number of values found; may exceed the slot array.
    pub fn count(&self) -> usize {
        self.n
    }

    /// Number of header lines that contributed values.
    pub fn hdr_count(&self) -> usize {
        self.hdr_no
    }

    /// Cumulative OR of the resolved flags of every value seen.
    pub fn kinds(&self) -> K {
        self.kinds
    }

    /// Span of the content parsed by the most recent parse call.
    pub fn last_parsed(&self) -> Span {
        self.last_parsed
    }

    /// True if values were found that did not fit the slot array.
    pub fn more(&self) -> bool {
        self.n > N
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn parsed(&self) -> bool {
        self.n > 0
    }

    /// The n-th value. Beyond the slot array only the first value is
    /// recoverable (it is remembered even with no slots at all).
    pub fn get(&self, n: usize) -> Option<&TokenVal<K>> {
        if n < self.vals() {
            return Some(&self.vals[n]);
        }
        if self.is_empty() {
            return None;
        }
        if n == 0 {
            return Some(&self.first);
        }
        None
    }

    /// The most recently parsed value (drives the "final coding" check
    /// for Transfer-Encoding).
    pub fn last(&self) -> Option<&TokenVal<K>> {
        if self.is_empty() {
            None
        } else {
            Some(&self.last)
        }
    }

    pub(crate) fn note_header(&mut self) {
        self.hdr_no += 1;
    }
}

/// Parse all values of one header line into the aggregate, resolving each
/// token as it completes. Returns [`Advance::Done`] past the line end,
/// [`Advance::More`] to resume (the partial token is kept in the
/// aggregate's scratch state), or [`Advance::Empty`] for a valueless
/// header.
pub fn parse_all_values<K: TokenClass, const N: usize>(
    buf: &[u8],
    offs: usize,
    set: &mut TokenVals<K, N>,
) -> Result<Advance> {
    let mut o = offs;
    let mut in_call = 0;
    set.last_parsed.reset();
    loop {
        let use_tmp = set.n >= N;
        let res = {
            let slot = if use_tmp {
                &mut set.tmp
            } else {
                &mut set.vals[set.n]
            };
            let res = parse_token_list(buf, o, &mut slot.tok, K::FLAGS);
            match res {
                Ok(Advance::Done(_)) | Ok(Advance::NextVal(_)) => {
                    slot.kind = K::resolve(slot.tok.v.slice(buf));
                }
                Err(_) => slot.reset(),
                _ => {}
            }
            res
        };
        match res? {
            adv @ (Advance::Done(_) | Advance::NextVal(_)) => {
                let val = if use_tmp { set.tmp } else { set.vals[set.n] };
                if in_call == 0 {
                    set.last_parsed = val.tok.v;
                } else {
                    set.last_parsed.extend(val.tok.v.end());
                }
                set.kinds |= val.kind;
                in_call += 1;
                set.n += 1;
                if set.n == 1 && N == 0 {
                    set.first = val;
                }
                set.last = val;
                if use_tmp {
                    set.tmp.reset();
                }
                match adv {
                    Advance::NextVal(n) => o = n,
                    Advance::Done(n) => return Ok(Advance::Done(n)),
                    _ => unreachable!(),
                }
            }
            Advance::More(n) => return Ok(Advance::More(n)),
            Advance::Empty(n) => return Ok(Advance::Empty(n)),
            Advance::EndOfLine(n) => return Err(Error::Bug(n)),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum UIntState {
    #[default]
    Init,
    /// Accumulating digits.
    Num,
    /// Digits done, expecting only whitespace to the line end.
    End,
    Fin,
}

/// A parsed unsigned decimal header value (Content-Length).
#[derive(Debug, Default, Clone, Copy)]
pub struct UIntVal {
    /// Span of the digits, whitespace stripped.
    pub sval: Span,
    pub val: u64,
    state: UIntState,
}

impl UIntVal {
    pub fn reset(&mut self) {
        *self = UIntVal::default();
    }

    pub fn parsed(&self) -> bool {
        self.state == UIntState::Fin
    }

    pub fn pending(&self) -> bool {
        matches!(self.state, UIntState::Num | UIntState::End)
    }
}

/// Parse an unsigned decimal header value up to the line end. LWS (with
/// folds) is allowed around the digits.
pub fn parse_uint_value(buf: &[u8], offs: usize, v: &mut UIntVal) -> Result<Advance> {
    if v.state == UIntState::Fin {
        return Ok(Advance::Done(offs));
    }
    let mut i = offs;
    while i < buf.len() {
        let c = buf[i];
        match v.state {
            UIntState::Init => match c {
                b' ' | b'\t' | b'\r' | b'\n' => match skip_lws(buf, i) {
                    Lws::Ws(n) => i = n,
                    // empty value
                    Lws::Eol { at, .. } => return Err(Error::NotNumber(at)),
                    Lws::Short(n) => return Ok(Advance::More(n)),
                },
                b'0'..=b'9' => {
                    v.sval.set(i, i);
                    v.state = UIntState::Num;
                }
                _ => return Err(Error::NotNumber(i)),
            },
            UIntState::Num => match c {
                b'0'..=b'9' => {
                    let d = (c - b'0') as u64;
                    if v.val > (u64::MAX - d) / 10 {
                        return Err(Error::NumTooBig(i));
                    }
                    v.val = v.val * 10 + d;
                    i += 1;
                }
                b' ' | b'\t' | b'\r' | b'\n' => {
                    v.sval.extend(i);
                    v.state = UIntState::End;
                }
                _ => return Err(Error::NotNumber(i)),
            },
            UIntState::End => match skip_lws(buf, i) {
                // something after the digits that is not a line end
                Lws::Ws(n) => return Err(Error::BadChar(n)),
                Lws::Eol { at, len } => {
                    v.state = UIntState::Fin;
                    return Ok(Advance::Done(at + len));
                }
                Lws::Short(n) => return Ok(Advance::More(n)),
            },
            UIntState::Fin => return Ok(Advance::Done(i)),
        }
    }
    Ok(Advance::More(i))
}
