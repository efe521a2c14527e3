//! Resumable parsing of comma/space separated token lists with optional
//! `name/suffix` splits and `;name=value` parameters.
//!
//! Grammar (rfc7230 3.2.6 tokens, liberally delimited):
//!
//! ```text
//! token-list := *( *LWS token *LWS ( "," | SP | eol ) )
//! token      := tchar+ [ "/" tchar+ ]       ; "/" only with allow_slash
//!               [ *( ";" param ) ]          ; only with allow_params
//! param      := tchar+ [ *WS "=" *WS ( token | quoted-string ) ]
//! ```

use crate::error::{Advance, Error, Result};
use crate::span::{Offs, Span};
use crate::util::{is_token_byte, skip_lws, Lws};

/// Grammar switches for [`parse_token_list`] and [`parse_token_param`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TokenFlags {
    /// Tokens may be separated by commas.
    pub comma_sep: bool,
    /// Tokens may be separated by bare whitespace.
    pub sp_sep: bool,
    /// `/` is allowed inside a token (`proto/version`).
    pub allow_slash: bool,
    /// `;name[=value]` parameters may trail a token.
    pub allow_params: bool,
    /// The caller asserts no further bytes will ever arrive; end of buffer
    /// is then a valid terminator of the last token.
    pub input_end: bool,
}

impl TokenFlags {
    pub const NONE: TokenFlags = TokenFlags {
        comma_sep: false,
        sp_sep: false,
        allow_slash: false,
        allow_params: false,
        input_end: false,
    };

    pub(crate) fn with_input_end(mut self) -> TokenFlags {
        self.input_end = true;
        self
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum TokState {
    #[default]
    Init,
    /// Inside the token name.
    Name,
    /// Whitespace after a token.
    Ws,
    /// Separator consumed, looking for the next token.
    SepSeen,
    /// `;` consumed, parsing parameters.
    ParamSeen,
    Fin,
    Err,
}

/// One parsed token, complete with the internal state that allows parsing
/// to resume mid-token when the buffer runs out.
///
/// `P` is the number of parameter slots stored inline; parameters beyond
/// the array are still counted and can be recovered with [`Token::param`].
#[derive(Debug, Clone, Copy)]
pub struct Token<const P: usize = 0> {
    /// The complete token (`name/suffix`, params excluded).
    pub v: Span,
    /// Offset of the first `/` inside the token, 0 if none.
    pub sep_offs: Offs,
    /// The complete parameter region (`a=1;b=2`).
    pub params: Span,
    /// Number of parameters found (may exceed `P`).
    pub params_no: u16,
    /// The most recently parsed parameter.
    pub last_param: TokenParam,
    /// Parsed parameters that fit the inline array.
    pub param_lst: [TokenParam; P],
    state: TokState,
}

impl<const P: usize> Default for Token<P> {
    fn default() -> Self {
        Token {
            v: Span::default(),
            sep_offs: 0,
            params: Span::default(),
            params_no: 0,
            last_param: TokenParam::default(),
            param_lst: [TokenParam::default(); P],
            state: TokState::Init,
        }
    }
}

impl<const P: usize> Token<P> {
    pub fn reset(&mut self) {
        *self = Token::default();
    }

    /// Nothing parsed yet.
    pub fn is_empty(&self) -> bool {
        self.state == TokState::Init
    }

    /// A complete token is available.
    pub fn parsed(&self) -> bool {
        matches!(
            self.state,
            TokState::Fin | TokState::Ws | TokState::SepSeen
        )
    }

    /// Parsing ended, successfully or not.
    pub fn finished(&self) -> bool {
        matches!(self.state, TokState::Fin | TokState::Err)
    }

    /// Parsing started but needs more input.
    pub fn pending(&self) -> bool {
        !matches!(
            self.state,
            TokState::Init | TokState::Fin | TokState::Err
        )
    }

    /// The name part: for `HTTP/1.1` just `HTTP`.
    pub fn name(&self) -> Span {
        if self.sep_offs != 0 {
            Span::new(self.v.offs(), self.sep_offs as usize)
        } else {
            self.v
        }
    }

    /// The suffix part: for `HTTP/1.1` just `1.1`, empty if none.
    pub fn suffix(&self) -> Span {
        if self.sep_offs != 0 {
            Span::new(self.sep_offs as usize + 1, self.v.end())
        } else {
            Span::default()
        }
    }

    /// The n-th parameter (from 0). Parameters beyond the inline array are
    /// recovered by re-scanning the parameter region. `Ok(None)` when
    /// there are fewer than `n + 1` parameters.
    pub fn param(&self, buf: &[u8], n: usize, flags: TokenFlags) -> Result<Option<TokenParam>> {
        if n >= self.params_no as usize || self.params.is_empty() {
            return Ok(None);
        }
        if n < P {
            return Ok(Some(self.param_lst[n]));
        }
        let buf = &buf[..self.params.end()];
        let mut o = self.params.offs();
        let mut i = 0;
        loop {
            let mut param = TokenParam::default();
            let adv = parse_token_param(buf, o, &mut param, flags.with_input_end())?;
            if i == n {
                return Ok(match adv {
                    Advance::Done(_) | Advance::NextVal(_) => Some(param),
                    Advance::EndOfLine(_) if !param.all.is_empty() => Some(param),
                    _ => None,
                });
            }
            match adv {
                Advance::NextVal(next) => {
                    o = next;
                    i += 1;
                }
                // list ended before reaching n
                _ => return Ok(None),
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum ParamState {
    #[default]
    Init,
    /// Inside the parameter name.
    Name,
    /// After the name, looking for `=`, `;` or a separator.
    EqNext,
    /// `=` consumed, looking for the value.
    ValNext,
    /// Inside an unquoted value.
    Val,
    /// Inside a quoted value.
    Quoted,
    /// After the value, looking for `;` or a separator.
    SemiNext,
    /// `;` consumed, looking for the next parameter.
    ParamNext,
    /// Like `Init` but for a follow-up parameter.
    InitNext,
    Fin,
    Err,
}

/// One token parameter, e.g. the `q=0.5` of `gzip;q=0.5`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TokenParam {
    /// The complete `name=value` region.
    pub all: Span,
    /// Parameter name, whitespace stripped.
    pub name: Span,
    /// Parameter value, whitespace stripped (quotes kept).
    pub val: Span,
    state: ParamState,
}

impl TokenParam {
    pub fn reset(&mut self) {
        *self = TokenParam::default();
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

/// Extract one token from a separated list.
///
/// Iteration protocol: [`Advance::Done`] means the token is parsed and the
/// list is complete (the offset points past the line end when the list
/// consumed one). [`Advance::NextVal`] means the token is parsed and at
/// least one more follows at the offset; re-enter with a reset token.
/// [`Advance::More`] means the buffer ran out; append bytes and re-enter
/// with the *same* token and the returned offset. [`Advance::Empty`] means
/// the line ended before any token.
pub fn parse_token_list<const P: usize>(
    buf: &[u8],
    offs: usize,
    tok: &mut Token<P>,
    flags: TokenFlags,
) -> Result<Advance> {
    if tok.state == TokState::Fin {
        // called again after finishing
        return Ok(Advance::Done(offs));
    }

    let mut i = offs;
    while i < buf.len() {
        let c = buf[i];
        match tok.state {
            TokState::Init => match c {
                b' ' | b'\t' | b'\r' | b'\n' => match skip_lws(buf, i) {
                    Lws::Ws(n) => {
                        i = n;
                        continue;
                    }
                    Lws::Eol { at, len } => return end_of_list(tok, at + len),
                    Lws::Short(n) => {
                        i = n;
                        break;
                    }
                },
                b',' => {
                    if !flags.comma_sep {
                        tok.state = TokState::Err;
                        return Err(Error::BadChar(i));
                    }
                    // skip over extra ','
                }
                b'(' | b')' | b'<' | b'>' | b'@' | b';' | b':' | b'\\' | b'"' | b'[' | b']'
                | b'?' | b'=' | b'{' | b'}' | b'/' => {
                    tok.state = TokState::Err;
                    return Err(Error::BadChar(i));
                }
                _ => {
                    if !is_token_byte(c) {
                        tok.state = TokState::Err;
                        return Err(Error::BadChar(i));
                    }
                    tok.v.set(i, i);
                    tok.state = TokState::Name;
                }
            },
            TokState::Name => match c {
                b' ' | b'\t' | b'\r' | b'\n' => match skip_lws(buf, i) {
                    // resume before the whitespace
                    Lws::Short(_) => break,
                    Lws::Ws(n) => {
                        tok.v.extend(i);
                        tok.state = TokState::Ws;
                        i = n;
                        continue;
                    }
                    Lws::Eol { at, len } => {
                        tok.v.extend(i);
                        tok.state = TokState::Ws;
                        return end_of_list(tok, at + len);
                    }
                },
                b',' => {
                    if !flags.comma_sep {
                        tok.state = TokState::Err;
                        return Err(Error::BadChar(i));
                    }
                    tok.v.extend(i);
                    tok.state = TokState::SepSeen;
                }
                b'(' | b')' | b'<' | b'>' | b'@' | b':' | b'\\' | b'"' | b'[' | b']' | b'?'
                | b'=' | b'{' | b'}' => {
                    tok.state = TokState::Err;
                    return Err(Error::BadChar(i));
                }
                b'/' => {
                    if !flags.allow_slash {
                        tok.state = TokState::Err;
                        return Err(Error::BadChar(i));
                    }
                    if tok.sep_offs == 0 {
                        // only the first '/' splits name/suffix
                        tok.sep_offs = i as Offs;
                    }
                }
                b';' => {
                    if !flags.allow_params {
                        tok.state = TokState::Err;
                        return Err(Error::BadChar(i));
                    }
                    tok.v.extend(i);
                    tok.state = TokState::ParamSeen;
                }
                _ => {
                    if !is_token_byte(c) {
                        tok.state = TokState::Err;
                        return Err(Error::BadChar(i));
                    }
                }
            },
            TokState::Ws => match c {
                b' ' | b'\t' | b'\r' | b'\n' => match skip_lws(buf, i) {
                    Lws::Short(_) => break,
                    Lws::Ws(n) => {
                        i = n;
                        continue;
                    }
                    Lws::Eol { at, len } => return end_of_list(tok, at + len),
                },
                b',' => {
                    if !flags.comma_sep {
                        tok.state = TokState::Err;
                        return Err(Error::BadChar(i));
                    }
                    tok.state = TokState::SepSeen;
                }
                b';' => {
                    if !flags.allow_params {
                        tok.state = TokState::Err;
                        return Err(Error::BadChar(i));
                    }
                    tok.state = TokState::ParamSeen;
                }
                _ => {
                    // first non-whitespace: a new token without a comma
                    if flags.sp_sep {
                        return Ok(Advance::NextVal(i));
                    }
                    tok.state = TokState::Err;
                    return Err(Error::BadChar(i));
                }
            },
            TokState::SepSeen => match c {
                b' ' | b'\t' | b'\r' | b'\n' => match skip_lws(buf, i) {
                    Lws::Short(_) => break,
                    Lws::Ws(n) => {
                        i = n;
                        continue;
                    }
                    Lws::Eol { at, len } => return end_of_list(tok, at + len),
                },
                b',' => {
                    if !flags.comma_sep {
                        tok.state = TokState::Err;
                        return Err(Error::BadChar(i));
                    }
                    // ignore repeated ','
                }
                b'(' | b')' | b'<' | b'>' | b'@' | b';' | b':' | b'\\' | b'"' | b'[' | b']'
                | b'?' | b'=' | b'{' | b'}' | b'/' => {
                    tok.state = TokState::Err;
                    return Err(Error::BadChar(i));
                }
                _ => return Ok(Advance::NextVal(i)),
            },
            TokState::ParamSeen => {
                let adv = match parse_token_param(buf, i, &mut tok.last_param, flags) {
                    Ok(v) => v,
                    Err(e) => {
                        tok.state = TokState::Err;
                        return Err(e);
                    }
                };
                if let Advance::More(n) = adv {
                    i = n;
                    break;
                }
                if !tok.last_param.all.is_empty() {
                    if (tok.params_no as usize) < P {
                        tok.param_lst[tok.params_no as usize] = tok.last_param;
                    }
                    tok.params_no += 1;
                    if tok.params.is_empty() {
                        tok.params = tok.last_param.all;
                    } else {
                        tok.params.extend(tok.last_param.all.end());
                    }
                }
                match adv {
                    Advance::NextVal(n) => {
                        i = n;
                        continue;
                    }
                    Advance::Done(n) => {
                        // n is the separator position
                        tok.state = TokState::SepSeen;
                        i = n + 1;
                        if i >= buf.len() {
                            break;
                        }
                        continue;
                    }
                    Advance::EndOfLine(n) => return end_of_list(tok, n),
                    _ => {
                        tok.state = TokState::Err;
                        return Err(Error::Bug(i));
                    }
                }
            }
            TokState::Fin | TokState::Err => return Err(Error::Bug(i)),
        }
        i += 1;
    }

    // out of input
    if flags.input_end {
        match tok.state {
            TokState::Init | TokState::Ws | TokState::SepSeen | TokState::ParamSeen => {}
            TokState::Name => tok.v.extend(i),
            _ => {
                tok.state = TokState::Err;
                return Err(Error::Bug(i));
            }
        }
        return end_of_list(tok, buf.len());
    }
    Ok(Advance::More(i))
}

/// Close the list at a line end (or forced end of input) at `ret`.
fn end_of_list<const P: usize>(tok: &mut Token<P>, ret: usize) -> Result<Advance> {
    match tok.state {
        // line end without any token
        TokState::Init => Ok(Advance::Empty(ret)),
        TokState::Name | TokState::Ws | TokState::SepSeen | TokState::ParamSeen => {
            tok.state = TokState::Fin;
            Ok(Advance::Done(ret))
        }
        _ => {
            tok.state = TokState::Err;
            Err(Error::Bug(ret))
        }
    }
}

/// Parse one `name [= value]` parameter.
///
/// The parameter ends at a `;` (more parameters follow:
/// [`Advance::NextVal`]), at a token-list separator ([`Advance::Done`]
/// with the offset *at* the separator), or at the line end
/// ([`Advance::EndOfLine`] with the offset past it; the parameter may be
/// empty, check [`TokenParam::is_empty`]).
pub fn parse_token_param(
    buf: &[u8],
    offs: usize,
    param: &mut TokenParam,
    flags: TokenFlags,
) -> Result<Advance> {
    if param.state == ParamState::Fin {
        return Ok(Advance::Done(offs));
    }

    let mut i = offs;
    while i < buf.len() {
        let c = buf[i];
        match param.state {
            ParamState::Init | ParamState::InitNext | ParamState::ParamNext => match c {
                b' ' | b'\t' | b'\r' | b'\n' => match skip_lws(buf, i) {
                    Lws::Short(_) => break,
                    Lws::Ws(n) => {
                        i = n;
                        continue;
                    }
                    Lws::Eol { at, len } => return eol_finish(param, at + len),
                },
                // allow and skip empty params
                b';' => {}
                b'(' | b')' | b'<' | b'>' | b'@' | b':' | b'\\' | b'"' | b'[' | b']' | b'?'
                | b'=' | b'{' | b'}' | b'/' | b',' => {
                    param.state = ParamState::Err;
                    return Err(Error::BadChar(i));
                }
                _ => {
                    if !is_token_byte(c) {
                        param.state = ParamState::Err;
                        return Err(Error::BadChar(i));
                    }
                    if param.state == ParamState::ParamNext {
                        param.state = ParamState::InitNext;
                        return Ok(Advance::NextVal(i));
                    }
                    param.state = ParamState::Name;
                    param.name.set(i, i);
                    param.all.set(i, i);
                    param.val.reset();
                }
            },
            ParamState::Name => match c {
                b' ' | b'\t' | b'\r' | b'\n' => match skip_lws(buf, i) {
                    Lws::Short(_) => break,
                    Lws::Ws(n) => {
                        param.state = ParamState::EqNext;
                        param.name.extend(i);
                        param.all.extend(i);
                        i = n;
                        continue;
                    }
                    Lws::Eol { at, len } => {
                        param.state = ParamState::EqNext;
                        param.name.extend(i);
                        param.all.extend(i);
                        return eol_finish(param, at + len);
                    }
                },
                b';' => {
                    // param with no value
                    param.name.extend(i);
                    param.all.extend(i);
                    param.state = ParamState::ParamNext;
                }
                b'=' => {
                    param.name.extend(i);
                    param.all.extend(i + 1);
                    param.state = ParamState::ValNext;
                }
                b',' => {
                    if flags.comma_sep {
                        param.name.extend(i);
                        param.all.extend(i);
                        param.state = ParamState::Fin;
                        return Ok(Advance::Done(i));
                    }
                    param.state = ParamState::Err;
                    return Err(Error::BadChar(i));
                }
                b'(' | b')' | b'<' | b'>' | b'@' | b':' | b'\\' | b'"' | b'[' | b']' | b'?'
                | b'{' | b'}' | b'/' => {
                    param.state = ParamState::Err;
                    return Err(Error::BadChar(i));
                }
                _ => {
                    if !is_token_byte(c) {
                        param.state = ParamState::Err;
                        return Err(Error::BadChar(i));
                    }
                }
            },
            ParamState::EqNext => match c {
                b' ' | b'\t' | b'\r' | b'\n' => match skip_lws(buf, i) {
                    Lws::Short(_) => break,
                    Lws::Ws(n) => {
                        i = n;
                        continue;
                    }
                    Lws::Eol { at, len } => return eol_finish(param, at + len),
                },
                b';' => param.state = ParamState::ParamNext,
                b'=' => param.state = ParamState::ValNext,
                b',' => {
                    if flags.comma_sep {
                        param.state = ParamState::Fin;
                        return Ok(Advance::Done(i));
                    }
                    param.state = ParamState::Err;
                    return Err(Error::BadChar(i));
                }
                b'(' | b')' | b'<' | b'>' | b'@' | b':' | b'\\' | b'"' | b'[' | b']' | b'?'
                | b'{' | b'}' | b'/' => {
                    param.state = ParamState::Err;
                    return Err(Error::BadChar(i));
                }
                _ => {
                    if !is_token_byte(c) {
                        param.state = ParamState::Err;
                        return Err(Error::BadChar(i));
                    }
                    if flags.sp_sep {
                        // space separated token after a valueless param:
                        // foo;p1 bar: bar starts a new token
                        param.state = ParamState::Fin;
                        let sep = if i >= offs + 1 { i - 1 } else { i };
                        return Ok(Advance::Done(sep));
                    }
                    param.state = ParamState::Err;
                    return Err(Error::BadChar(i));
                }
            },
            ParamState::ValNext => match c {
                b' ' | b'\t' | b'\r' | b'\n' => match skip_lws(buf, i) {
                    Lws::Short(_) => break,
                    Lws::Ws(n) => {
                        i = n;
                        continue;
                    }
                    Lws::Eol { at, len } => return eol_finish(param, at + len),
                },
                b';' => {
                    // empty value
                    param.val.set(i, i);
                    param.all.extend(i);
                    param.state = ParamState::ParamNext;
                }
                b',' => {
                    if flags.comma_sep {
                        param.val.set(i, i);
                        param.state = ParamState::Fin;
                        return Ok(Advance::Done(i));
                    }
                    param.state = ParamState::Err;
                    return Err(Error::BadChar(i));
                }
                b'"' => {
                    param.val.set(i, i);
                    param.all.extend(i);
                    param.state = ParamState::Quoted;
                }
                b'(' | b')' | b'<' | b'>' | b'@' | b':' | b'\\' | b'[' | b']' | b'?' | b'='
                | b'{' | b'}' | b'/' => {
                    param.state = ParamState::Err;
                    return Err(Error::BadChar(i));
                }
                _ => {
                    if !is_token_byte(c) {
                        param.state = ParamState::Err;
                        return Err(Error::BadChar(i));
                    }
                    param.state = ParamState::Val;
                    param.val.set(i, i);
                    param.all.extend(i);
                }
            },
            ParamState::Val => match c {
                b' ' | b'\t' | b'\r' | b'\n' => match skip_lws(buf, i) {
                    Lws::Short(_) => break,
                    Lws::Ws(n) => {
                        param.state = ParamState::SemiNext;
                        param.val.extend(i);
                        param.all.extend(i);
                        i = n;
                        continue;
                    }
                    Lws::Eol { at, len } => {
                        param.state = ParamState::SemiNext;
                        param.val.extend(i);
                        param.all.extend(i);
                        return eol_finish(param, at + len);
                    }
                },
                b';' => {
                    param.val.extend(i);
                    param.all.extend(i);
                    param.state = ParamState::ParamNext;
                }
                b',' => {
                    if flags.comma_sep {
                        param.val.extend(i);
                        param.all.extend(i);
                        param.state = ParamState::Fin;
                        return Ok(Advance::Done(i));
                    }
                    param.state = ParamState::Err;
                    return Err(Error::BadChar(i));
                }
                b'(' | b')' | b'<' | b'>' | b'@' | b':' | b'\\' | b'"' | b'[' | b']' | b'?'
                | b'=' | b'{' | b'}' | b'/' => {
                    param.state = ParamState::Err;
                    return Err(Error::BadChar(i));
                }
                _ => {
                    if !is_token_byte(c) {
                        param.state = ParamState::Err;
                        return Err(Error::BadChar(i));
                    }
                }
            },
            ParamState::Quoted => match skip_quoted(buf, i) {
                Ok(Advance::Done(n)) => {
                    i = n;
                    param.val.extend(i);
                    param.all.extend(i);
                    param.state = ParamState::SemiNext;
                    continue;
                }
                Ok(Advance::More(n)) => {
                    i = n;
                    break;
                }
                Ok(_) => {
                    param.state = ParamState::Err;
                    return Err(Error::Bug(i));
                }
                Err(e) => {
                    param.state = ParamState::Err;
                    return Err(e);
                }
            },
            ParamState::SemiNext => match c {
                b' ' | b'\t' | b'\r' | b'\n' => match skip_lws(buf, i) {
                    Lws::Short(_) => break,
                    Lws::Ws(n) => {
                        i = n;
                        continue;
                    }
                    Lws::Eol { at, len } => return eol_finish(param, at + len),
                },
                b';' => param.state = ParamState::ParamNext,
                b',' => {
                    if flags.comma_sep {
                        param.state = ParamState::Fin;
                        return Ok(Advance::Done(i));
                    }
                    param.state = ParamState::Err;
                    return Err(Error::BadChar(i));
                }
                b'(' | b')' | b'<' | b'>' | b'@' | b':' | b'\\' | b'"' | b'[' | b']' | b'?'
                | b'{' | b'}' | b'/' | b'=' => {
                    param.state = ParamState::Err;
                    return Err(Error::BadChar(i));
                }
                _ => {
                    if !is_token_byte(c) {
                        param.state = ParamState::Err;
                        return Err(Error::BadChar(i));
                    }
                    if flags.sp_sep {
                        // foo;p1=5 bar: bar starts a new token
                        param.state = ParamState::Fin;
                        let sep = if i >= offs + 1 { i - 1 } else { i };
                        return Ok(Advance::Done(sep));
                    }
                    param.state = ParamState::Err;
                    return Err(Error::BadChar(i));
                }
            },
            ParamState::Fin | ParamState::Err => return Err(Error::Bug(i)),
        }
        i += 1;
    }

    // out of input
    if flags.input_end {
        match param.state {
            ParamState::Init
            | ParamState::InitNext
            | ParamState::ParamNext
            | ParamState::SemiNext
            | ParamState::ValNext
            | ParamState::EqNext => {}
            ParamState::Name => {
                param.name.extend(i);
                param.all.extend(i);
            }
            ParamState::Val => {
                param.val.extend(i);
                param.all.extend(i);
            }
            // open quote, cannot close the value
            ParamState::Quoted => return Ok(Advance::More(i)),
            _ => return Err(Error::Bug(i)),
        }
        return eol_finish(param, buf.len());
    }
    Ok(Advance::More(i))
}

/// Close the parameter at a line end (or forced end of input) at `ret`.
fn eol_finish(param: &mut TokenParam, ret: usize) -> Result<Advance> {
    match param.state {
        // line end without any parameter; the caller sees an empty param
        ParamState::Init | ParamState::InitNext => Ok(Advance::EndOfLine(ret)),
        ParamState::ParamNext
        | ParamState::Name
        | ParamState::EqNext
        | ParamState::ValNext
        | ParamState::Val
        | ParamState::SemiNext => {
            param.state = ParamState::Fin;
            Ok(Advance::EndOfLine(ret))
        }
        _ => {
            param.state = ParamState::Err;
            Err(Error::Bug(ret))
        }
    }
}

/// Skip a quoted string from an offset *inside* the quotes. Handles
/// `\x` escape pairs; CR and LF are not allowed inside quotes
/// (rfc7230 3.2.6). On success the offset is past the closing quote.
pub fn skip_quoted(buf: &[u8], offs: usize) -> Result<Advance> {
    let mut i = offs;
    while i < buf.len() {
        match buf[i] {
            b'"' => return Ok(Advance::Done(i + 1)),
            b'\\' => match buf.get(i + 1) {
                Some(b'\r') | Some(b'\n') => return Err(Error::BadChar(i + 1)),
                Some(_) => i += 2,
                None => return Ok(Advance::More(i)),
            },
            b'\n' | b'\r' | 0x7f => return Err(Error::BadChar(i)),
            c if c < 0x21 && c != b' ' && c != b'\t' => return Err(Error::BadChar(i)),
            _ => i += 1,
        }
    }
    Ok(Advance::More(i))
}
