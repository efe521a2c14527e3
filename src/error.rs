use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Hard parse failures.
///
/// Every variant carries the offset of the offending byte (or of the
/// truncation point). Once a parser has returned one of these it is in a
/// terminal state; the enclosing message, if any, moves to
/// [`MsgState::Err`][crate::MsgState] and must be reset before reuse.
///
/// Transient conditions (out of input, more list values, grammar
/// boundaries) are not errors and travel in [`Advance`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// A byte that the grammar does not allow at this position.
    #[error("invalid character at offset {0}")]
    BadChar(usize),

    /// A header value that must be numeric is not.
    #[error("value at offset {0} is not a number")]
    NotNumber(usize),

    /// A numeric value does not fit in 64 bits.
    #[error("number at offset {0} is too large")]
    NumTooBig(usize),

    /// Body framing needed a Content-Length and none was present.
    #[error("missing content-length at offset {0}")]
    NoContentLength(usize),

    /// The caller asserted end of input while the message was incomplete.
    #[error("message truncated at offset {0}")]
    Truncated(usize),

    /// A parser was invoked in a state its design does not allow.
    #[error("parser invoked in an impossible state at offset {0}")]
    Bug(usize),
}

impl Error {
    /// Offset of the byte that triggered the failure.
    pub fn offset(&self) -> usize {
        match *self {
            Error::BadChar(o)
            | Error::NotNumber(o)
            | Error::NumTooBig(o)
            | Error::NoContentLength(o)
            | Error::Truncated(o)
            | Error::Bug(o) => o,
        }
    }
}

/// Forward progress of a resumable parser call.
///
/// Every parser in this crate returns `Result<Advance>`. The contained
/// offset is always the point to continue from: past the parsed element on
/// [`Done`][Advance::Done], the resume point on [`More`][Advance::More]
/// (re-invoke with the same state struct once bytes have been appended to
/// the buffer), the start of the next list value on
/// [`NextVal`][Advance::NextVal].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The element is fully parsed; offset points past its end.
    Done(usize),
    /// Input ran out mid-element. Append bytes and re-invoke from the
    /// offset with the same state struct.
    More(usize),
    /// One value of a list was parsed and at least one more follows at
    /// the offset (separator consumed, whitespace skipped).
    NextVal(usize),
    /// An empty line or empty list terminated the element before any
    /// content; offset points past the terminator.
    Empty(usize),
    /// The header line ended; offset points past the terminator. Produced
    /// by the token-parameter parser, whose `Done` instead stops *at* a
    /// list separator.
    EndOfLine(usize),
}

impl Advance {
    /// The continue-from offset carried by every variant.
    pub fn offset(self) -> usize {
        match self {
            Advance::Done(o)
            | Advance::More(o)
            | Advance::NextVal(o)
            | Advance::Empty(o)
            | Advance::EndOfLine(o) => o,
        }
    }

    pub fn is_done(self) -> bool {
        matches!(self, Advance::Done(_))
    }

    /// True when the caller must append input and call again.
    pub fn needs_more(self) -> bool {
        matches!(self, Advance::More(_))
    }
}
