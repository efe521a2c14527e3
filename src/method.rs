//! Request method recognition.

use core::fmt;

use once_cell::sync::Lazy;

/// Numeric request method. `Undef` is what responses report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    Undef = 0,
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
    /// Syntactically valid but unrecognised method.
    Other,
}

impl Method {
    /// The ASCII method name; empty for `Undef`.
    pub fn name(&self) -> &'static str {
        match self {
            Method::Undef => "",
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Patch => "PATCH",
            Method::Other => "OTHER",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const METHOD_NAMES: [(&[u8], Method); 9] = [
    (b"GET", Method::Get),
    (b"HEAD", Method::Head),
    (b"POST", Method::Post),
    (b"PUT", Method::Put),
    (b"DELETE", Method::Delete),
    (b"CONNECT", Method::Connect),
    (b"OPTIONS", Method::Options),
    (b"TRACE", Method::Trace),
    (b"PATCH", Method::Patch),
];

// Hash bit widths chosen so no bucket holds more than two entries; the
// distribution test below guards the choice when methods are added.
const MTH_BITS_FCHAR: u32 = 3;
const MTH_BITS_LEN: u32 = 2;
const MTH_BUCKETS: usize = 1 << (MTH_BITS_FCHAR + MTH_BITS_LEN);

type Bucket = [Option<(&'static [u8], Method)>; 2];

static METHOD_LOOKUP: Lazy<[Bucket; MTH_BUCKETS]> = Lazy::new(|| {
    let mut tbl = [[None; 2]; MTH_BUCKETS];
    for (name, m) in METHOD_NAMES {
        let bucket = &mut tbl[hash_method_name(name)];
        let slot = bucket
            .iter_mut()
            .find(|s| s.is_none())
            .expect("method lookup bucket overflow");
        *slot = Some((name, m));
    }
    tbl
});

fn hash_method_name(n: &[u8]) -> usize {
    const MC: usize = (1 << MTH_BITS_FCHAR) - 1;
    const ML: usize = (1 << MTH_BITS_LEN) - 1;
    (n[0].to_ascii_lowercase() as usize & MC) | ((n.len() & ML) << MTH_BITS_FCHAR)
}

/// Map an ASCII method name to its numeric value. Method names are
/// case-sensitive; anything unknown is [`Method::Other`].
pub fn method_kind(name: &[u8]) -> Method {
    if name.is_empty() {
        return Method::Other;
    }
    for entry in METHOD_LOOKUP[hash_method_name(name)].iter().flatten() {
        if name == entry.0 {
            return entry.1;
        }
    }
    Method::Other
}
