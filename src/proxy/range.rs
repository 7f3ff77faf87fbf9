use std::{fmt, sync::LazyLock};

use regex::Regex;

static RANGE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^bytes=(\d*)-(\d*)$").ok());

/// A single-part `Range: bytes=...` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// `bytes=a-b`, both inclusive.
    Bounded { start: u64, end: u64 },
    /// `bytes=a-`
    From { start: u64 },
    /// `bytes=-n`, the last `n` bytes.
    Suffix { len: u64 },
}

impl ByteRange {
    /// Parses a `Range` header value. Anything malformed, multi-part or
    /// inverted is `None` and the caller falls back to the full body.
    pub fn parse(header: &str) -> Option<Self> {
        let caps = RANGE_RE.as_ref()?.captures(header.trim())?;
        let start = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let end = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

        match (start.is_empty(), end.is_empty()) {
            (false, false) => {
                let start = start.parse().ok()?;
                let end = end.parse().ok()?;
                (start <= end).then_some(Self::Bounded { start, end })
            }
            (false, true) => Some(Self::From {
                start: start.parse().ok()?,
            }),
            (true, false) => {
                let len: u64 = end.parse().ok()?;
                (len > 0).then_some(Self::Suffix { len })
            }
            (true, true) => None,
        }
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded { start, end } => write!(f, "bytes={}-{}", start, end),
            Self::From { start } => write!(f, "bytes={}-", start),
            Self::Suffix { len } => write!(f, "bytes=-{}", len),
        }
    }
}
