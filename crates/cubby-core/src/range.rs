//! Byte-range model for partial reads.
//!
//! A [`RangeSpec`] is what the caller asked for (parsed from a `Range`-style
//! header); a [`ResolvedRange`] is the inclusive byte window actually served
//! after validation against the entity size. Resolution is the single place
//! range bounds are checked, so backends and handlers share one set of
//! semantics.

use crate::error::AppError;

/// A requested byte range, before validation against the entity size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    /// `bytes=a-b`: inclusive range.
    Bounded(u64, u64),
    /// `bytes=a-`: from offset to end of entity.
    From(u64),
    /// `bytes=-n`: the final n bytes of the entity.
    Suffix(u64),
}

/// An inclusive byte window validated against the entity size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: u64,
    /// Inclusive end offset, always < total.
    pub end: u64,
    pub total: u64,
}

impl ResolvedRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// True when the window covers the whole entity.
    pub fn is_full(&self) -> bool {
        self.start == 0 && self.end + 1 == self.total
    }
}

impl RangeSpec {
    /// Parse a `Range` header value. Returns `None` for anything that is not
    /// a well-formed single `bytes` range; per HTTP semantics the caller then
    /// serves the whole entity. Multi-range requests are not supported and
    /// only the first range is honored.
    pub fn parse_header(value: &str) -> Option<RangeSpec> {
        let spec = value.trim().strip_prefix("bytes=")?;
        let first = spec.split(',').next()?.trim();

        let (start, end) = first.split_once('-')?;
        match (start.is_empty(), end.is_empty()) {
            // "-n": suffix
            (true, false) => end.parse().ok().map(RangeSpec::Suffix),
            // "a-": open-ended
            (false, true) => start.parse().ok().map(RangeSpec::From),
            // "a-b"
            (false, false) => {
                let start = start.parse().ok()?;
                let end = end.parse().ok()?;
                Some(RangeSpec::Bounded(start, end))
            }
            (true, true) => None,
        }
    }

    /// Validate against the entity size, clamping an overlong end to the last
    /// byte. Fails with `RangeNotSatisfiable` when the start lies outside
    /// `[0, size)`, the range is inverted, or the entity is empty.
    pub fn resolve(&self, size: u64) -> Result<ResolvedRange, AppError> {
        let unsatisfiable = |start: u64, end: Option<u64>| AppError::RangeNotSatisfiable {
            start,
            end,
            size,
        };

        match *self {
            RangeSpec::Bounded(start, end) => {
                if start > end || start >= size {
                    return Err(unsatisfiable(start, Some(end)));
                }
                Ok(ResolvedRange {
                    start,
                    end: end.min(size - 1),
                    total: size,
                })
            }
            RangeSpec::From(start) => {
                if start >= size {
                    return Err(unsatisfiable(start, None));
                }
                Ok(ResolvedRange {
                    start,
                    end: size - 1,
                    total: size,
                })
            }
            RangeSpec::Suffix(n) => {
                if n == 0 || size == 0 {
                    return Err(unsatisfiable(0, None));
                }
                Ok(ResolvedRange {
                    start: size.saturating_sub(n),
                    end: size - 1,
                    total: size,
                })
            }
        }
    }
}
